//! Create-if-absent for every entity kind.
//!
//! An existing row is returned unchanged: descriptive fields of a later descriptor are
//! discarded even when they differ, so the first descriptor to create a row wins.

use tracing::debug;

use crate::error::CatalogResult;
use crate::merge::resolver::resolve;
use crate::store::base::{Repository, UnitOfWork};
use crate::types::{
    ArtifactCoords, Category, CategoryDescriptor, Entity, Extension, ExtensionDescriptor,
    ExtensionId, ExtensionRelease, NewCategory, NewExtension, NewExtensionRelease, NewPlatform,
    NewPlatformRelease, Platform, PlatformDescriptor, PlatformId, PlatformRelease,
};

/// Result of an upsert.
#[derive(Debug, Clone, PartialEq)]
pub enum Upserted<E> {
    /// The natural key already existed.
    Found(E),
    /// A new row was inserted in the current unit of work.
    Created(E),
}

impl<E> Upserted<E> {
    pub fn is_created(&self) -> bool {
        matches!(self, Upserted::Created(_))
    }

    pub fn get(&self) -> &E {
        match self {
            Upserted::Found(entity) | Upserted::Created(entity) => entity,
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            Upserted::Found(entity) | Upserted::Created(entity) => entity,
        }
    }
}

/// Returns the row with the natural key of `draft`, inserting `draft` when there is none.
///
/// Fails with [`crate::error::ErrorKind::UniqueViolation`] when a concurrent unit of work
/// committed the same key between the lookup and the insert. The caller is expected to
/// re-run the whole merge, whose lookup will then find the row.
pub async fn upsert<E, U>(uow: &mut U, draft: E::Draft) -> CatalogResult<Upserted<E>>
where
    E: Entity,
    U: Repository<E> + Send,
{
    let key = E::draft_key(&draft);
    if let Some(existing) = resolve::<E, U>(uow, &key).await? {
        return Ok(Upserted::Found(existing));
    }

    let created = <U as Repository<E>>::insert(uow, draft).await?;
    debug!(entity = E::NAME, id = %created.id(), "inserted catalog entity");

    Ok(Upserted::Created(created))
}

pub async fn upsert_platform<U>(
    uow: &mut U,
    bom: &ArtifactCoords,
) -> CatalogResult<Upserted<Platform>>
where
    U: UnitOfWork,
{
    upsert::<Platform, U>(
        uow,
        NewPlatform {
            group_id: bom.group_id.clone(),
            artifact_id: bom.artifact_id.clone(),
        },
    )
    .await
}

pub async fn upsert_platform_release<U>(
    uow: &mut U,
    platform_id: PlatformId,
    bom: &ArtifactCoords,
    descriptor: &PlatformDescriptor,
) -> CatalogResult<Upserted<PlatformRelease>>
where
    U: UnitOfWork,
{
    upsert::<PlatformRelease, U>(
        uow,
        NewPlatformRelease {
            platform_id,
            version: bom.version.clone(),
            quarkus_core_version: descriptor.quarkus_core_version.clone(),
            upstream_quarkus_core_version: descriptor.upstream_quarkus_core_version.clone(),
        },
    )
    .await
}

pub async fn upsert_extension<U>(
    uow: &mut U,
    descriptor: &ExtensionDescriptor,
) -> CatalogResult<Upserted<Extension>>
where
    U: UnitOfWork,
{
    upsert::<Extension, U>(
        uow,
        NewExtension {
            group_id: descriptor.artifact.group_id.clone(),
            artifact_id: descriptor.artifact.artifact_id.clone(),
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
        },
    )
    .await
}

pub async fn upsert_extension_release<U>(
    uow: &mut U,
    extension_id: ExtensionId,
    artifact: &ArtifactCoords,
) -> CatalogResult<Upserted<ExtensionRelease>>
where
    U: UnitOfWork,
{
    upsert::<ExtensionRelease, U>(
        uow,
        NewExtensionRelease {
            extension_id,
            version: artifact.version.clone(),
        },
    )
    .await
}

pub async fn upsert_category<U>(
    uow: &mut U,
    descriptor: &CategoryDescriptor,
) -> CatalogResult<Upserted<Category>>
where
    U: UnitOfWork,
{
    upsert::<Category, U>(
        uow,
        NewCategory {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
        },
    )
    .await
}
