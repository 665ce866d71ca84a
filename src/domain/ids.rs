//! Type-safe document identifiers.
//!
//! Each identifier is a newtype wrapper around [`uuid::Uuid`] (v4) so that a
//! user id cannot be passed where a lead or withdrawal id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! document_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl $name {
            /// Creates a new random identifier (UUID v4).
            #[must_use]
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            /// Creates an identifier from an existing [`uuid::Uuid`].
            #[must_use]
            pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner [`uuid::Uuid`].
            #[must_use]
            pub const fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<uuid::Uuid> for $name {
            fn from(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

document_id!(
    /// Identity of a user record. Payment providers echo it back as the
    /// payment's external reference.
    UserId
);

document_id!(
    /// Identity of a sales lead.
    LeadId
);

document_id!(
    /// Identity of a withdrawal request.
    WithdrawalId
);

document_id!(
    /// Identity of a proposal sent against a lead.
    ProposalId
);

document_id!(
    /// Identity of a commission audit record.
    CommissionId
);

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn display_is_uuid_format() {
        let s = LeadId::new().to_string();
        assert_eq!(s.len(), 36);
        assert!(s.contains('-'));
    }

    #[test]
    fn parses_external_reference_with_whitespace() {
        let uuid = uuid::Uuid::new_v4();
        let Ok(id) = format!(" {uuid} ").parse::<UserId>() else {
            panic!("expected a valid user id");
        };
        assert_eq!(*id.as_uuid(), uuid);
    }

    #[test]
    fn rejects_non_uuid_reference() {
        assert!("cus_000005219613".parse::<UserId>().is_err());
    }

    #[test]
    fn serializes_transparently() {
        let id = WithdrawalId::new();
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, format!("\"{id}\""));
    }
}
