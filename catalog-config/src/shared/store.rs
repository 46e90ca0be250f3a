use serde::Deserialize;

use crate::shared::{PgConnectionConfig, ValidationError};

/// Which catalog store backs the merge engine.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-process store; the catalog is lost on restart.
    #[default]
    Memory,
    /// Postgres store with the catalog tables in the `catalog` schema.
    Postgres {
        /// Connection to the catalog database.
        connection: PgConnectionConfig,
    },
}

impl StoreConfig {
    /// Validates the connection settings of persistent stores.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            StoreConfig::Memory => Ok(()),
            StoreConfig::Postgres { connection } => connection.tls.validate(),
        }
    }
}
