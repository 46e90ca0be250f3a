//! Configuration types and loading for the catalog merge engine.

mod environment;
mod load;
mod secret;
pub mod shared;

pub use environment::Environment;
pub use load::{Config, LoadConfigError, load_config, load_config_from};
pub use secret::SerializableSecretString;
