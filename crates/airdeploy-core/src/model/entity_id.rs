// ── Core identity types ──
//
// EntityId identifies a network entity created on the control plane.
// Sites, device groups, and profiles get their own string newtypes so a
// profile id can never be passed where a site id is expected. All of
// them are opaque: the controller's string is kept byte for byte.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── String identifiers ──────────────────────────────────────────────

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::new(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}

string_id!(
    /// Canonical identifier for a created network entity. Sent back to the
    /// controller exactly as it was issued, even when it looks like a UUID.
    EntityId
);
string_id!(
    /// Site identifier. Used as the key of every per-site container.
    SiteId
);
string_id!(
    /// Device group identifier.
    DeviceGroupId
);
string_id!(
    /// Device profile identifier.
    ProfileId
);
