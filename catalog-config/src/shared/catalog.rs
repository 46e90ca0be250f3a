use serde::Deserialize;

use crate::load::Config;
use crate::shared::{MergeConfig, StoreConfig, ValidationError};

/// Top-level configuration of the catalog merge engine.
///
/// This intentionally does not implement `Serialize` since the store configuration may
/// carry database credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Which catalog store backs the merge engine.
    #[serde(default)]
    pub store: StoreConfig,
    /// Merge worker pool and conflict retry settings.
    #[serde(default)]
    pub merge: MergeConfig,
}

impl CatalogConfig {
    /// Validates every nested section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.store.validate()?;
        self.merge.validate()
    }
}

impl Config for CatalogConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] = &[];
}
