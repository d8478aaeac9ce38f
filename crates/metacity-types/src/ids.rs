//! Type-safe identifier wrappers.
//!
//! Every entity the simulation creates (tiles, buildings, NFT tokens,
//! proposals, market listings) has a strongly-typed ID over [`Uuid`] to
//! prevent accidental mixing of identifiers at compile time. All generated
//! IDs use UUID v7 (time-ordered) so registries iterate in creation order.
//!
//! Actors are different: the identity layer hands the simulation an opaque
//! string (a wallet address in the browser build), so [`ActorId`] wraps a
//! [`String`] and never inspects it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a grid tile (land parcel).
    TileId
}

define_id! {
    /// Unique identifier for a building in the registry.
    BuildingId
}

define_id! {
    /// Unique identifier for an NFT ownership record.
    TokenId
}

define_id! {
    /// Unique identifier for a governance proposal.
    ProposalId
}

define_id! {
    /// Unique identifier for a marketplace listing.
    ListingId
}

/// Opaque identity of the player performing actions.
///
/// Supplied by the wallet/identity layer and trusted as given. The
/// simulation only compares actor IDs for equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct ActorId(pub String);

impl ActorId {
    /// Wrap an externally supplied identity string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying identity string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ActorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique() {
        let a = BuildingId::new();
        let b = BuildingId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = ProposalId::new();
        let json = serde_json::to_string(&original).unwrap_or_default();
        let restored: Result<ProposalId, _> = serde_json::from_str(&json);
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn actor_id_serializes_as_plain_string() {
        let actor = ActorId::new("0xPlayer1...");
        let json = serde_json::to_string(&actor).unwrap_or_default();
        assert_eq!(json, "\"0xPlayer1...\"");
        assert_eq!(actor.to_string(), "0xPlayer1...");
    }
}
