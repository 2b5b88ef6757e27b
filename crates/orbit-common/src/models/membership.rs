//! Membership model — one row binding a user to a space.
//!
//! Exactly one row exists per (space, user) pair, enforced by a unique index
//! at the storage layer. Rows are never deleted; transitions mutate state in
//! place so repeated external syncs stay idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Join-request status of a membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "join_status", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinStatus {
    Pending,
    Approved,
    Disapproved,
}

/// Role of a member within a space. Admin implies Approved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "space_role", rename_all = "lowercase")]
#[serde(rename_all = "UPPERCASE")]
pub enum SpaceRole {
    Member,
    Admin,
}

/// A user's membership in a space.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub id: Uuid,
    pub space_id: Uuid,
    pub user_id: Uuid,

    pub status: JoinStatus,
    pub role: SpaceRole,

    /// The member left on their own. Mutually exclusive with `removed`.
    pub left: bool,

    /// An admin removed the member. Role is retained for audit.
    pub removed: bool,

    /// Provider-assigned member reference, written only by the sync worker.
    pub external_member_ref: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    /// An active member participates in the space: approved, not left, not removed.
    pub fn is_active(&self) -> bool {
        self.status == JoinStatus::Approved && !self.left && !self.removed
    }

    /// Whether this member currently administers the space.
    pub fn is_active_admin(&self) -> bool {
        self.is_active() && self.role == SpaceRole::Admin
    }
}

/// Filter for member listings.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemberFilter {
    pub status: Option<JoinStatus>,
    pub role: Option<SpaceRole>,
    /// Restrict to non-left, non-removed rows.
    pub active_only: bool,
}

/// Pagination window for member listings.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: 50, offset: 0 }
    }
}
