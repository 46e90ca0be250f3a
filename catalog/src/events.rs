use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ExtensionDescriptor, ExtensionReleaseId, PlatformDescriptor};

/// Kind label of platform merges.
pub const PLATFORM_KIND: &str = "platform";
/// Kind label of standalone extension merges.
pub const EXTENSION_KIND: &str = "extension";
/// Kind label of compatibility reports.
pub const COMPATIBILITY_KIND: &str = "compatibility";

/// A payload delivered by the event source.
///
/// Delivery is asynchronous and at least once, with no ordering between unrelated events,
/// so handling the same event twice must leave the catalog unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum CatalogEvent {
    PlatformCreated {
        platform: PlatformDescriptor,
    },
    /// An extension released outside of any platform.
    ExtensionCreated {
        extension: ExtensionDescriptor,
    },
    CompatibilityReported {
        extension_release_id: ExtensionReleaseId,
        quarkus_core_version: String,
        compatible: bool,
    },
}

impl CatalogEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogEvent::PlatformCreated { .. } => PLATFORM_KIND,
            CatalogEvent::ExtensionCreated { .. } => EXTENSION_KIND,
            CatalogEvent::CompatibilityReported { .. } => COMPATIBILITY_KIND,
        }
    }
}

impl fmt::Display for CatalogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogEvent::PlatformCreated { platform } => match &platform.bom {
                Some(bom) => write!(f, "platform {bom}"),
                None => write!(f, "platform <no bom>"),
            },
            CatalogEvent::ExtensionCreated { extension } => {
                write!(f, "extension {}", extension.artifact)
            }
            CatalogEvent::CompatibilityReported {
                extension_release_id,
                quarkus_core_version,
                compatible,
            } => write!(
                f,
                "compatibility of extension release {extension_release_id} with \
                 {quarkus_core_version}: {compatible}"
            ),
        }
    }
}
