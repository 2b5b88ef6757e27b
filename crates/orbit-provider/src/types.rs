//! Wire types for the provider API surface the core depends on.

use serde::{Deserialize, Serialize};

use orbit_common::models::{Space, SpaceVisibility};

/// Metadata pushed when creating or updating a mirrored room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceMetadata {
    pub name: String,
    pub topic: Option<String>,
    pub private: bool,
}

impl From<&Space> for SpaceMetadata {
    fn from(space: &Space) -> Self {
        Self {
            name: space.title.clone(),
            topic: space.description.clone(),
            private: space.visibility == SpaceVisibility::Private,
        }
    }
}

/// Provider-assigned identifiers returned by a successful room creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedSpace {
    pub external_id: String,
    pub external_uri: Option<String>,
}

/// Provider response for an add-member call.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AddedMember {
    pub member_ref: String,
}
