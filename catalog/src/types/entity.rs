//! Persisted catalog entities.
//!
//! Every entity has a surrogate id assigned by the store and a natural key that is unique
//! within its entity type. Entities reference their parents by id only; the reverse
//! direction is served by [`crate::types::CatalogGraph`] and the store's read side.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

use crate::types::ids::{
    CategoryId, CompatibilityId, ExtensionId, ExtensionReleaseId, PlatformExtensionId,
    PlatformId, PlatformReleaseCategoryId, PlatformReleaseId, SurrogateId,
};
use crate::types::metadata::Metadata;

/// A catalog entity identified by a natural key.
///
/// `Draft` holds the fields of a row that was not persisted yet; the store turns it into
/// the entity by assigning an id.
pub trait Entity: fmt::Debug + Clone + Send + Sync + 'static {
    type Id: SurrogateId;
    type Key: fmt::Debug + Clone + Eq + Hash + Send + Sync + 'static;
    type Draft: fmt::Debug + Clone + Send + Sync + 'static;

    /// Entity type name used in logs, metrics and errors.
    const NAME: &'static str;

    fn id(&self) -> Self::Id;

    fn key(&self) -> Self::Key;

    fn draft_key(draft: &Self::Draft) -> Self::Key;

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: PlatformId,
    pub group_id: String,
    pub artifact_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformKey {
    pub group_id: String,
    pub artifact_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlatform {
    pub group_id: String,
    pub artifact_id: String,
}

impl Entity for Platform {
    type Id = PlatformId;
    type Key = PlatformKey;
    type Draft = NewPlatform;

    const NAME: &'static str = "platform";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn key(&self) -> Self::Key {
        PlatformKey {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
        }
    }

    fn draft_key(draft: &Self::Draft) -> Self::Key {
        PlatformKey {
            group_id: draft.group_id.clone(),
            artifact_id: draft.artifact_id.clone(),
        }
    }

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self {
        Platform {
            id,
            group_id: draft.group_id,
            artifact_id: draft.artifact_id,
        }
    }
}

/// A version of a platform bill-of-materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRelease {
    pub id: PlatformReleaseId,
    pub platform_id: PlatformId,
    pub version: String,
    pub quarkus_core_version: String,
    pub upstream_quarkus_core_version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformReleaseKey {
    pub platform_id: PlatformId,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlatformRelease {
    pub platform_id: PlatformId,
    pub version: String,
    pub quarkus_core_version: String,
    pub upstream_quarkus_core_version: Option<String>,
}

impl Entity for PlatformRelease {
    type Id = PlatformReleaseId;
    type Key = PlatformReleaseKey;
    type Draft = NewPlatformRelease;

    const NAME: &'static str = "platform_release";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn key(&self) -> Self::Key {
        PlatformReleaseKey {
            platform_id: self.platform_id,
            version: self.version.clone(),
        }
    }

    fn draft_key(draft: &Self::Draft) -> Self::Key {
        PlatformReleaseKey {
            platform_id: draft.platform_id,
            version: draft.version.clone(),
        }
    }

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self {
        PlatformRelease {
            id,
            platform_id: draft.platform_id,
            version: draft.version,
            quarkus_core_version: draft.quarkus_core_version,
            upstream_quarkus_core_version: draft.upstream_quarkus_core_version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub id: ExtensionId,
    pub group_id: String,
    pub artifact_id: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionKey {
    pub group_id: String,
    pub artifact_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExtension {
    pub group_id: String,
    pub artifact_id: String,
    pub name: String,
    pub description: Option<String>,
}

impl Entity for Extension {
    type Id = ExtensionId;
    type Key = ExtensionKey;
    type Draft = NewExtension;

    const NAME: &'static str = "extension";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn key(&self) -> Self::Key {
        ExtensionKey {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
        }
    }

    fn draft_key(draft: &Self::Draft) -> Self::Key {
        ExtensionKey {
            group_id: draft.group_id.clone(),
            artifact_id: draft.artifact_id.clone(),
        }
    }

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self {
        Extension {
            id,
            group_id: draft.group_id,
            artifact_id: draft.artifact_id,
            name: draft.name,
            description: draft.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRelease {
    pub id: ExtensionReleaseId,
    pub extension_id: ExtensionId,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtensionReleaseKey {
    pub extension_id: ExtensionId,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExtensionRelease {
    pub extension_id: ExtensionId,
    pub version: String,
}

impl Entity for ExtensionRelease {
    type Id = ExtensionReleaseId;
    type Key = ExtensionReleaseKey;
    type Draft = NewExtensionRelease;

    const NAME: &'static str = "extension_release";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn key(&self) -> Self::Key {
        ExtensionReleaseKey {
            extension_id: self.extension_id,
            version: self.version.clone(),
        }
    }

    fn draft_key(draft: &Self::Draft) -> Self::Key {
        ExtensionReleaseKey {
            extension_id: draft.extension_id,
            version: draft.version.clone(),
        }
    }

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self {
        ExtensionRelease {
            id,
            extension_id: draft.extension_id,
            version: draft.version,
        }
    }
}

/// Membership of an extension release in a platform release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformExtension {
    pub id: PlatformExtensionId,
    pub platform_release_id: PlatformReleaseId,
    pub extension_release_id: ExtensionReleaseId,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformExtensionKey {
    pub platform_release_id: PlatformReleaseId,
    pub extension_release_id: ExtensionReleaseId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPlatformExtension {
    pub platform_release_id: PlatformReleaseId,
    pub extension_release_id: ExtensionReleaseId,
    pub metadata: Metadata,
}

impl Entity for PlatformExtension {
    type Id = PlatformExtensionId;
    type Key = PlatformExtensionKey;
    type Draft = NewPlatformExtension;

    const NAME: &'static str = "platform_extension";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn key(&self) -> Self::Key {
        PlatformExtensionKey {
            platform_release_id: self.platform_release_id,
            extension_release_id: self.extension_release_id,
        }
    }

    fn draft_key(draft: &Self::Draft) -> Self::Key {
        PlatformExtensionKey {
            platform_release_id: draft.platform_release_id,
            extension_release_id: draft.extension_release_id,
        }
    }

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self {
        PlatformExtension {
            id,
            platform_release_id: draft.platform_release_id,
            extension_release_id: draft.extension_release_id,
            metadata: draft.metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CategoryKey {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

impl Entity for Category {
    type Id = CategoryId;
    type Key = CategoryKey;
    type Draft = NewCategory;

    const NAME: &'static str = "category";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn key(&self) -> Self::Key {
        CategoryKey {
            name: self.name.clone(),
        }
    }

    fn draft_key(draft: &Self::Draft) -> Self::Key {
        CategoryKey {
            name: draft.name.clone(),
        }
    }

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self {
        Category {
            id,
            name: draft.name,
            description: draft.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformReleaseCategory {
    pub id: PlatformReleaseCategoryId,
    pub platform_release_id: PlatformReleaseId,
    pub category_id: CategoryId,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlatformReleaseCategoryKey {
    pub platform_release_id: PlatformReleaseId,
    pub category_id: CategoryId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPlatformReleaseCategory {
    pub platform_release_id: PlatformReleaseId,
    pub category_id: CategoryId,
    pub metadata: Metadata,
}

impl Entity for PlatformReleaseCategory {
    type Id = PlatformReleaseCategoryId;
    type Key = PlatformReleaseCategoryKey;
    type Draft = NewPlatformReleaseCategory;

    const NAME: &'static str = "platform_release_category";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn key(&self) -> Self::Key {
        PlatformReleaseCategoryKey {
            platform_release_id: self.platform_release_id,
            category_id: self.category_id,
        }
    }

    fn draft_key(draft: &Self::Draft) -> Self::Key {
        PlatformReleaseCategoryKey {
            platform_release_id: draft.platform_release_id,
            category_id: draft.category_id,
        }
    }

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self {
        PlatformReleaseCategory {
            id,
            platform_release_id: draft.platform_release_id,
            category_id: draft.category_id,
            metadata: draft.metadata,
        }
    }
}

/// Whether an extension release is known to work with a core version.
///
/// Unlike the other entities, the `compatible` flag is overwritten on every report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionReleaseCompatibility {
    pub id: CompatibilityId,
    pub extension_release_id: ExtensionReleaseId,
    pub quarkus_core_version: String,
    pub compatible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompatibilityKey {
    pub extension_release_id: ExtensionReleaseId,
    pub quarkus_core_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCompatibility {
    pub extension_release_id: ExtensionReleaseId,
    pub quarkus_core_version: String,
    pub compatible: bool,
}

impl Entity for ExtensionReleaseCompatibility {
    type Id = CompatibilityId;
    type Key = CompatibilityKey;
    type Draft = NewCompatibility;

    const NAME: &'static str = "extension_release_compatibility";

    fn id(&self) -> Self::Id {
        self.id
    }

    fn key(&self) -> Self::Key {
        CompatibilityKey {
            extension_release_id: self.extension_release_id,
            quarkus_core_version: self.quarkus_core_version.clone(),
        }
    }

    fn draft_key(draft: &Self::Draft) -> Self::Key {
        CompatibilityKey {
            extension_release_id: draft.extension_release_id,
            quarkus_core_version: draft.quarkus_core_version.clone(),
        }
    }

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self {
        ExtensionReleaseCompatibility {
            id,
            extension_release_id: draft.extension_release_id,
            quarkus_core_version: draft.quarkus_core_version,
            compatible: draft.compatible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_key_matches_persisted_key() {
        let draft = NewPlatformRelease {
            platform_id: PlatformId::new(1),
            version: "3.0.0".to_owned(),
            quarkus_core_version: "3.0.0".to_owned(),
            upstream_quarkus_core_version: None,
        };
        let key = PlatformRelease::draft_key(&draft);
        let release = PlatformRelease::from_draft(PlatformReleaseId::new(7), draft);

        assert_eq!(release.key(), key);
        assert_eq!(release.id(), PlatformReleaseId::new(7));
    }

    #[test]
    fn descriptive_fields_are_not_part_of_the_key() {
        let first = Extension::from_draft(
            ExtensionId::new(1),
            NewExtension {
                group_id: "io.quarkus".to_owned(),
                artifact_id: "quarkus-rest".to_owned(),
                name: "REST".to_owned(),
                description: None,
            },
        );
        let second = Extension {
            name: "Quarkus REST".to_owned(),
            description: Some("Jakarta REST".to_owned()),
            ..first.clone()
        };

        assert_eq!(first.key(), second.key());
    }
}
