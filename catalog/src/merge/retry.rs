use metrics::counter;
use std::future::Future;
use tracing::warn;

use crate::catalog_error;
use crate::error::{CatalogResult, ErrorKind};
use crate::metrics::{CATALOG_CONFLICT_RETRIES_TOTAL, KIND_LABEL};

/// Runs `attempt` until it succeeds, fails with a non-conflict error, or has been re-run
/// `max_retries` times after conflicts.
///
/// Each attempt must open its own unit of work: a unit of work that hit a conflict cannot
/// be reused.
pub async fn retry_on_conflict<T, F, Fut>(
    kind: &'static str,
    max_retries: u32,
    mut attempt: F,
) -> CatalogResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CatalogResult<T>>,
{
    let mut retries = 0;

    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_conflict() => {
                if retries >= max_retries {
                    return Err(catalog_error!(
                        ErrorKind::ConflictRetriesExhausted,
                        "Merge kept losing races against concurrent merges",
                        detail = format!("{kind} merge conflicted {} times", retries + 1),
                        source: err
                    ));
                }

                retries += 1;
                warn!(
                    kind,
                    retries,
                    error = %err,
                    "conflict with a concurrent merge, re-running merge"
                );
                counter!(CATALOG_CONFLICT_RETRIES_TOTAL, KIND_LABEL => kind).increment(1);
            }
            Err(err) => return Err(err),
        }
    }
}
