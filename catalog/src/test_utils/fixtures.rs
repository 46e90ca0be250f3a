use serde_json::{Map, Value, json};

use crate::types::{ArtifactCoords, CategoryDescriptor, ExtensionDescriptor, PlatformDescriptor};

pub const PLATFORM_GROUP_ID: &str = "io.quarkus.platform";
pub const PLATFORM_ARTIFACT_ID: &str = "quarkus-bom";
pub const EXTENSION_GROUP_ID: &str = "io.quarkus";

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub fn extension_descriptor(artifact_id: &str, version: &str) -> ExtensionDescriptor {
    ExtensionDescriptor {
        artifact: ArtifactCoords::new(EXTENSION_GROUP_ID, artifact_id, version),
        name: artifact_id.to_owned(),
        description: Some(format!("The {artifact_id} extension")),
        metadata: object(json!({
            "artifact": artifact_id,
            "status": "stable",
            "keywords": [artifact_id, "test"],
        })),
    }
}

pub fn category_descriptor(name: &str) -> CategoryDescriptor {
    CategoryDescriptor {
        name: name.to_owned(),
        description: Some(format!("{name} extensions")),
        metadata: object(json!({"pinned": [format!("{name}-pinned")]})),
    }
}

/// A platform release of the `quarkus-bom` platform.
///
/// Members are named `extension-{i}` and categories `category-{i}`, each with metadata that
/// is unique to it.
pub fn platform_descriptor(version: &str, members: usize, categories: usize) -> PlatformDescriptor {
    PlatformDescriptor {
        bom: Some(ArtifactCoords::new(
            PLATFORM_GROUP_ID,
            PLATFORM_ARTIFACT_ID,
            version,
        )),
        quarkus_core_version: version.to_owned(),
        upstream_quarkus_core_version: None,
        extensions: (0..members)
            .map(|i| extension_descriptor(&format!("extension-{i}"), version))
            .collect(),
        categories: (0..categories)
            .map(|i| category_descriptor(&format!("category-{i}")))
            .collect(),
    }
}

/// `io.quarkus.platform:quarkus-bom:3.0.0` with the single member
/// `io.quarkus:quarkus-resteasy:3.0.0`.
pub fn quarkus_bom_descriptor() -> PlatformDescriptor {
    PlatformDescriptor {
        bom: Some(ArtifactCoords::new(
            PLATFORM_GROUP_ID,
            PLATFORM_ARTIFACT_ID,
            "3.0.0",
        )),
        quarkus_core_version: "3.0.0".to_owned(),
        upstream_quarkus_core_version: None,
        extensions: vec![ExtensionDescriptor {
            artifact: ArtifactCoords::new(EXTENSION_GROUP_ID, "quarkus-resteasy", "3.0.0"),
            name: "RESTEasy Classic".to_owned(),
            description: None,
            metadata: Map::new(),
        }],
        categories: vec![],
    }
}

/// Platforms `bom-a-{index}` and `bom-b-{index}` sharing every member and category, listed
/// in opposite orders.
pub fn overlapping_platform_descriptors(
    index: usize,
    members: usize,
    categories: usize,
) -> (PlatformDescriptor, PlatformDescriptor) {
    let version = "1.0.0";
    let platform = |artifact_id: String| PlatformDescriptor {
        bom: Some(ArtifactCoords::new(PLATFORM_GROUP_ID, artifact_id, version)),
        quarkus_core_version: version.to_owned(),
        upstream_quarkus_core_version: None,
        extensions: (0..members)
            .map(|i| extension_descriptor(&format!("ext-{index}-{i}"), version))
            .collect(),
        categories: (0..categories)
            .map(|i| category_descriptor(&format!("category-{index}-{i}")))
            .collect(),
    };

    let first = platform(format!("bom-a-{index}"));
    let mut second = platform(format!("bom-b-{index}"));
    second.extensions.reverse();
    second.categories.reverse();

    (first, second)
}
