use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Default number of concurrent merge workers.
pub const DEFAULT_MERGE_WORKERS: u16 = 4;

/// Default capacity of the inbound event queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Default number of times a merge is re-run after a uniqueness conflict.
pub const DEFAULT_MAX_CONFLICT_RETRIES: u32 = 3;

const fn default_workers() -> u16 {
    DEFAULT_MERGE_WORKERS
}

const fn default_queue_capacity() -> usize {
    DEFAULT_QUEUE_CAPACITY
}

const fn default_max_conflict_retries() -> u32 {
    DEFAULT_MAX_CONFLICT_RETRIES
}

/// Settings for the merge worker pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct MergeConfig {
    /// Number of worker tasks consuming catalog events concurrently.
    #[serde(default = "default_workers")]
    pub workers: u16,
    /// Maximum number of events buffered before senders wait.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// How many times a merge is re-run after losing a race on a natural key.
    ///
    /// Zero disables re-runs, in which case the first conflict fails the merge.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
}

impl MergeConfig {
    /// Checks that the pool can make progress.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.workers == 0 {
            return Err(ValidationError::WorkersZero);
        }

        if self.queue_capacity == 0 {
            return Err(ValidationError::QueueCapacityZero);
        }

        Ok(())
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_MERGE_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_conflict_retries: DEFAULT_MAX_CONFLICT_RETRIES,
        }
    }
}
