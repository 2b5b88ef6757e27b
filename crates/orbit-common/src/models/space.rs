//! Space model — the shared group resource members join.
//!
//! A space is created locally first, always before any external call. The
//! provider-assigned identifiers stay `None` until the first successful
//! creation sync.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Visibility of a space in listings and for join requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "space_visibility", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum SpaceVisibility {
    Public,
    Private,
}

/// A shared space.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Space {
    pub id: Uuid,

    /// Space title (2-100 chars)
    pub title: String,

    /// Space description (up to 1000 chars)
    pub description: Option<String>,

    pub visibility: SpaceVisibility,

    /// Whether join requests on a public space are approved without an admin.
    /// Private spaces always require approval.
    pub auto_approval: bool,

    /// Soft-delete flag. Deactivated spaces are never hard-deleted while
    /// external references exist.
    pub active: bool,

    /// User who created the space. The owner's membership can never be removed.
    pub owner_id: Uuid,

    /// Provider-assigned ID, set at most once by the sync worker.
    pub external_id: Option<String>,

    /// Provider-assigned URI/handle for the mirrored room.
    pub external_uri: Option<String>,

    /// Member count (denormalized for listings)
    pub member_count: i32,

    pub like_count: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Space {
    /// Whether a join request lands directly on Approved instead of Pending.
    pub fn joins_without_approval(&self) -> bool {
        self.visibility == SpaceVisibility::Public && self.auto_approval
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSpaceRequest {
    #[validate(length(min = 2, max = 100, message = "Space title must be 2-100 characters"))]
    pub title: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub visibility: SpaceVisibility,

    pub auto_approval: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSpaceRequest {
    #[validate(length(min = 2, max = 100))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub visibility: Option<SpaceVisibility>,

    pub auto_approval: Option<bool>,
}
