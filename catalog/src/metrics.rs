//! Metrics definitions for catalog merge monitoring.

/// Label for the kind of merged event (`platform`, `extension`, `compatibility`).
pub const KIND_LABEL: &str = "kind";

/// Label for the outcome of a merge (`committed`, `failed`).
pub const OUTCOME_LABEL: &str = "outcome";

/// Label for the entity type of a created row.
pub const ENTITY_LABEL: &str = "entity";

/// Label for error kind in metrics.
pub const ERROR_KIND_LABEL: &str = "error_kind";

// Merge metrics

/// Counter for merges, labeled by kind and outcome.
pub const CATALOG_MERGES_TOTAL: &str = "catalog_merges_total";

/// Counter for merges re-run after losing a race on a natural key.
pub const CATALOG_CONFLICT_RETRIES_TOTAL: &str = "catalog_conflict_retries_total";

/// Counter for rows created, labeled by entity type.
pub const CATALOG_ENTITIES_CREATED_TOTAL: &str = "catalog_entities_created_total";

/// Histogram for the duration of a merge in seconds, labeled by kind.
pub const CATALOG_MERGE_DURATION_SECONDS: &str = "catalog_merge_duration_seconds";

// Compatibility metrics

/// Counter for recorded compatibility verdicts.
pub const CATALOG_COMPATIBILITY_RECORDS_TOTAL: &str = "catalog_compatibility_records_total";

// Worker pool metrics

/// Gauge for events waiting in the merge queue.
pub const CATALOG_QUEUED_EVENTS: &str = "catalog_queued_events";
