//! Join rows between platform releases and their extension releases and categories.
//!
//! A link is created at most once per pair. Every link, found or created, is recorded in the
//! merge's [`CatalogGraph`] so that it can be followed from both of its sides right away.

use crate::error::CatalogResult;
use crate::failpoints::{
    ASSOCIATION_BUILDER__BEFORE_LINK_CATEGORY, ASSOCIATION_BUILDER__BEFORE_LINK_EXTENSION,
    catalog_fail_point,
};
use crate::merge::upsert::upsert;
use crate::store::base::UnitOfWork;
use crate::types::{
    CatalogGraph, CategoryId, ExtensionReleaseId, Metadata, NewPlatformExtension,
    NewPlatformReleaseCategory, PlatformExtension, PlatformReleaseCategory, PlatformReleaseId,
};

/// Links an extension release to a platform release.
///
/// When the pair is already linked the existing row is returned and `metadata` is ignored.
pub async fn link_extension_to_platform_release<U>(
    uow: &mut U,
    graph: &mut CatalogGraph,
    platform_release_id: PlatformReleaseId,
    extension_release_id: ExtensionReleaseId,
    metadata: &Metadata,
) -> CatalogResult<PlatformExtension>
where
    U: UnitOfWork,
{
    catalog_fail_point(ASSOCIATION_BUILDER__BEFORE_LINK_EXTENSION)?;

    let upserted = upsert::<PlatformExtension, U>(
        uow,
        NewPlatformExtension {
            platform_release_id,
            extension_release_id,
            metadata: metadata.clone(),
        },
    )
    .await?;

    let link = upserted.get().clone();
    graph.add_platform_extension(upserted);

    Ok(link)
}

/// Links a category to a platform release.
pub async fn link_category_to_platform_release<U>(
    uow: &mut U,
    graph: &mut CatalogGraph,
    platform_release_id: PlatformReleaseId,
    category_id: CategoryId,
    metadata: &Metadata,
) -> CatalogResult<PlatformReleaseCategory>
where
    U: UnitOfWork,
{
    catalog_fail_point(ASSOCIATION_BUILDER__BEFORE_LINK_CATEGORY)?;

    let upserted = upsert::<PlatformReleaseCategory, U>(
        uow,
        NewPlatformReleaseCategory {
            platform_release_id,
            category_id,
            metadata: metadata.clone(),
        },
    )
    .await?;

    let link = upserted.get().clone();
    graph.add_platform_release_category(upserted);

    Ok(link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::upsert::{
        upsert_extension, upsert_extension_release, upsert_platform, upsert_platform_release,
    };
    use crate::store::base::CatalogStore;
    use crate::store::memory::MemoryStore;
    use crate::types::{ArtifactCoords, ExtensionDescriptor, PlatformDescriptor};
    use serde_json::json;

    #[tokio::test]
    async fn relinking_keeps_the_first_metadata() {
        let store = MemoryStore::new();
        let mut uow = store.begin().await.unwrap();
        let mut graph = CatalogGraph::new();

        let bom = ArtifactCoords::new("io.quarkus.platform", "quarkus-bom", "3.0.0");
        let descriptor = PlatformDescriptor {
            bom: Some(bom.clone()),
            quarkus_core_version: "3.0.0".to_owned(),
            upstream_quarkus_core_version: None,
            extensions: vec![],
            categories: vec![],
        };
        let member = ExtensionDescriptor {
            artifact: ArtifactCoords::new("io.quarkus", "quarkus-arc", "3.0.0"),
            name: "ArC".to_owned(),
            description: None,
            metadata: Default::default(),
        };

        let platform = upsert_platform(&mut uow, &bom).await.unwrap();
        let platform_id = graph.add_platform(platform);
        let release = upsert_platform_release(&mut uow, platform_id, &bom, &descriptor)
            .await
            .unwrap();
        let release_id = graph.add_platform_release(release);
        let extension = upsert_extension(&mut uow, &member).await.unwrap();
        let extension_id = graph.add_extension(extension);
        let extension_release = upsert_extension_release(&mut uow, extension_id, &member.artifact)
            .await
            .unwrap();
        let extension_release_id = graph.add_extension_release(extension_release);

        let first = link_extension_to_platform_release(
            &mut uow,
            &mut graph,
            release_id,
            extension_release_id,
            &Metadata::new(json!({"pinned": true})),
        )
        .await
        .unwrap();
        let second = link_extension_to_platform_release(
            &mut uow,
            &mut graph,
            release_id,
            extension_release_id,
            &Metadata::new(json!({"pinned": false})),
        )
        .await
        .unwrap();

        assert_eq!(first, second);
        assert_eq!(second.metadata.as_value(), &json!({"pinned": true}));
        assert_eq!(graph.created().platform_extensions, 1);
        assert_eq!(graph.extensions_of_platform_release(release_id).count(), 1);
        assert_eq!(
            graph
                .platforms_of_extension_release(extension_release_id)
                .count(),
            1
        );
    }
}
