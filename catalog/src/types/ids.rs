use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Surrogate identity assigned by the store on first persistence of a natural key.
pub trait SurrogateId:
    fmt::Debug + fmt::Display + Copy + Eq + Ord + Hash + Send + Sync + 'static
{
    fn from_raw(raw: i64) -> Self;

    fn into_raw(self) -> i64;
}

macro_rules! surrogate_ids {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub i64);

            impl $name {
                pub fn new(raw: i64) -> Self {
                    Self(raw)
                }
            }

            impl SurrogateId for $name {
                fn from_raw(raw: i64) -> Self {
                    Self(raw)
                }

                fn into_raw(self) -> i64 {
                    self.0
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl From<$name> for i64 {
                fn from(value: $name) -> Self {
                    value.0
                }
            }
        )*
    };
}

surrogate_ids!(
    PlatformId,
    PlatformReleaseId,
    ExtensionId,
    /// Identity used as the key of compatibility lookups.
    ExtensionReleaseId,
    PlatformExtensionId,
    CategoryId,
    PlatformReleaseCategoryId,
    CompatibilityId,
);
