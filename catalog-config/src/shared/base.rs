use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The merge worker count cannot be zero.
    #[error("`workers` cannot be zero")]
    WorkersZero,
    /// The merge queue capacity cannot be zero.
    #[error("`queue_capacity` cannot be zero")]
    QueueCapacityZero,
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,
}
