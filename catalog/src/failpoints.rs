use fail::fail_point;

use crate::bail;
use crate::error::{CatalogResult, ErrorKind};

pub const ASSOCIATION_BUILDER__BEFORE_LINK_EXTENSION: &str =
    "association_builder.before_link_extension";
pub const ASSOCIATION_BUILDER__BEFORE_LINK_CATEGORY: &str =
    "association_builder.before_link_category";
pub const MERGE__BEFORE_COMMIT: &str = "merge.before_commit";

/// Returns an error when the failpoint `name` is configured with `return`.
///
/// The optional parameter selects the error kind: `conflict` simulates a lost race on a
/// natural key, `storage` an unavailable store. Anything else yields
/// [`ErrorKind::FailpointTriggered`].
pub fn catalog_fail_point(name: &str) -> CatalogResult<()> {
    fail_point!(name, |parameter| {
        let mut error_kind = ErrorKind::FailpointTriggered;
        if let Some(parameter) = parameter {
            error_kind = match parameter.as_str() {
                "conflict" => ErrorKind::UniqueViolation,
                "storage" => ErrorKind::StorageUnavailable,
                _ => ErrorKind::FailpointTriggered,
            }
        }

        bail!(
            error_kind,
            "An error occurred in a fail point",
            format!("The failpoint '{name}' returned an error")
        );
    });

    Ok(())
}
