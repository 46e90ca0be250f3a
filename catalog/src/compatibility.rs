//! Compatibility matrix of extension releases against core versions.
//!
//! Rows are keyed by `(extension release, core version)`. Unlike the rest of the catalog, a
//! repeated report overwrites the stored verdict, since compatibility can legitimately
//! change. Reads go through a single bulk query per core version.

use metrics::counter;
use std::collections::HashMap;
use tracing::{debug, info};

use crate::bail;
use crate::error::{CatalogResult, ErrorKind};
use crate::events::COMPATIBILITY_KIND;
use crate::merge::resolver::resolve;
use crate::merge::retry::retry_on_conflict;
use crate::metrics::CATALOG_COMPATIBILITY_RECORDS_TOTAL;
use crate::store::base::{CatalogStore, Repository, UnitOfWork, commit_or_rollback};
use crate::types::{
    CompatibilityKey, ExtensionReleaseCompatibility, ExtensionReleaseId, NewCompatibility,
};

/// Records a verdict inside the caller's unit of work, overwriting any previous one.
pub async fn record_compatibility_in<U>(
    uow: &mut U,
    extension_release_id: ExtensionReleaseId,
    quarkus_core_version: &str,
    compatible: bool,
) -> CatalogResult<ExtensionReleaseCompatibility>
where
    U: UnitOfWork,
{
    if quarkus_core_version.trim().is_empty() {
        bail!(
            ErrorKind::MalformedDescriptor,
            "Compatibility report has no core version",
            format!("extension release {extension_release_id} has a blank core version")
        );
    }

    let key = CompatibilityKey {
        extension_release_id,
        quarkus_core_version: quarkus_core_version.to_owned(),
    };

    match resolve::<ExtensionReleaseCompatibility, U>(uow, &key).await? {
        Some(existing) if existing.compatible == compatible => Ok(existing),
        Some(existing) => {
            debug!(
                %extension_release_id,
                quarkus_core_version,
                compatible,
                "overwriting compatibility verdict"
            );
            uow.update_compatibility(existing.id, compatible).await
        }
        None => {
            <U as Repository<ExtensionReleaseCompatibility>>::insert(
                uow,
                NewCompatibility {
                    extension_release_id,
                    quarkus_core_version: quarkus_core_version.to_owned(),
                    compatible,
                },
            )
            .await
        }
    }
}

/// Write and bulk-read access to the compatibility matrix.
#[derive(Debug, Clone)]
pub struct CompatibilityIndex<S> {
    store: S,
    max_conflict_retries: u32,
}

impl<S> CompatibilityIndex<S>
where
    S: CatalogStore,
{
    pub fn new(store: S, max_conflict_retries: u32) -> Self {
        Self {
            store,
            max_conflict_retries,
        }
    }

    /// Records a verdict in its own unit of work; the latest call wins.
    ///
    /// Two first reports for the same key racing each other are resolved by re-running the
    /// loser, which then overwrites the winner's verdict.
    pub async fn record(
        &self,
        extension_release_id: ExtensionReleaseId,
        quarkus_core_version: &str,
        compatible: bool,
    ) -> CatalogResult<ExtensionReleaseCompatibility> {
        let recorded = retry_on_conflict(COMPATIBILITY_KIND, self.max_conflict_retries, || {
            self.try_record(extension_release_id, quarkus_core_version, compatible)
        })
        .await?;

        counter!(CATALOG_COMPATIBILITY_RECORDS_TOTAL).increment(1);
        info!(
            %extension_release_id,
            quarkus_core_version,
            compatible,
            "recorded compatibility"
        );

        Ok(recorded)
    }

    async fn try_record(
        &self,
        extension_release_id: ExtensionReleaseId,
        quarkus_core_version: &str,
        compatible: bool,
    ) -> CatalogResult<ExtensionReleaseCompatibility> {
        let mut uow = self.store.begin().await?;
        let result = record_compatibility_in(
            &mut uow,
            extension_release_id,
            quarkus_core_version,
            compatible,
        )
        .await;

        commit_or_rollback(uow, result).await
    }

    /// Returns every verdict recorded for `quarkus_core_version` keyed by extension release.
    ///
    /// Extension releases without a row for that core version have no entry. An unknown
    /// core version yields an empty map; an unreachable store is an error of kind
    /// [`ErrorKind::StorageUnavailable`].
    pub async fn lookup_compatibility_map(
        &self,
        quarkus_core_version: &str,
    ) -> CatalogResult<HashMap<ExtensionReleaseId, bool>> {
        self.store.get_compatibility_map(quarkus_core_version).await
    }

    pub async fn get(
        &self,
        extension_release_id: ExtensionReleaseId,
        quarkus_core_version: &str,
    ) -> CatalogResult<Option<ExtensionReleaseCompatibility>> {
        self.store
            .get_compatibility(extension_release_id, quarkus_core_version)
            .await
    }
}
