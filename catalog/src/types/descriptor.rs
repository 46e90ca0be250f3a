//! Pre-parsed payloads handed to the catalog by the event source.
//!
//! Field names follow the registry's JSON payloads (camelCase). Metadata maps are kept as
//! uninterpreted JSON objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::bail;
use crate::error::{CatalogResult, ErrorKind};

/// Maven coordinates of an artifact.
///
/// Ordered by group, then artifact, then version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactCoords {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

impl ArtifactCoords {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    fn validate(&self) -> CatalogResult<()> {
        if is_blank(&self.group_id) || is_blank(&self.artifact_id) || is_blank(&self.version) {
            bail!(
                ErrorKind::MalformedDescriptor,
                "Artifact coordinates are incomplete",
                format!("coordinates '{self}' have a blank group, artifact or version")
            );
        }

        Ok(())
    }
}

impl fmt::Display for ArtifactCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// A platform release together with its member extensions and categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformDescriptor {
    /// Bill-of-materials coordinates. A descriptor without them cannot be merged.
    pub bom: Option<ArtifactCoords>,
    pub quarkus_core_version: String,
    #[serde(default)]
    pub upstream_quarkus_core_version: Option<String>,
    #[serde(default)]
    pub extensions: Vec<ExtensionDescriptor>,
    #[serde(default)]
    pub categories: Vec<CategoryDescriptor>,
}

impl PlatformDescriptor {
    /// Checks the required fields of the platform and of every member.
    ///
    /// Returns the bom coordinates on success so callers don't need to unwrap them again.
    pub fn validate(&self) -> CatalogResult<&ArtifactCoords> {
        let Some(bom) = &self.bom else {
            bail!(
                ErrorKind::MalformedDescriptor,
                "Platform descriptor has no bom coordinate"
            );
        };
        bom.validate()?;

        if is_blank(&self.quarkus_core_version) {
            bail!(
                ErrorKind::MalformedDescriptor,
                "Platform descriptor has no core version",
                format!("platform '{bom}' has a blank core version")
            );
        }

        for extension in &self.extensions {
            extension.validate()?;
        }
        for category in &self.categories {
            category.validate()?;
        }

        Ok(bom)
    }
}

/// An extension release, either standalone or as a member of a platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionDescriptor {
    pub artifact: ArtifactCoords,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ExtensionDescriptor {
    pub fn validate(&self) -> CatalogResult<()> {
        self.artifact.validate()?;

        if is_blank(&self.name) {
            bail!(
                ErrorKind::MalformedDescriptor,
                "Extension descriptor has no name",
                format!("extension '{}' has a blank name", self.artifact)
            );
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl CategoryDescriptor {
    pub fn validate(&self) -> CatalogResult<()> {
        if is_blank(&self.name) {
            bail!(
                ErrorKind::MalformedDescriptor,
                "Category descriptor has no name"
            );
        }

        Ok(())
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
