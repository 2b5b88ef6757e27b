//! # orbit-db
//!
//! Persistence layer for Orbit. PostgreSQL holds the authoritative space and
//! membership rows; the external provider is only a mirror and never appears
//! in a transaction here.
//!
//! The [`SpaceStore`] and [`MembershipStore`] traits are the seams the
//! service and sync worker are written against, so tests can run on
//! in-memory implementations while production uses [`Database`].

pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use orbit_common::models::{
    JoinStatus, MemberFilter, Membership, Page, Space, SpaceRole, SpaceVisibility,
    UpdateSpaceRequest,
};
use orbit_common::transitions::MemberState;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("space not found")]
    SpaceNotFound,

    #[error("membership not found")]
    MembershipNotFound,

    /// The unique index on (space_id, user_id) rejected a second row.
    /// Callers resolve this by re-fetching the winner.
    #[error("membership already exists for this space and user")]
    DuplicateMembership,

    /// The space already carries a provider-assigned ID; it is set at most
    /// once and never overwritten by the sync worker.
    #[error("external id is already set for this space")]
    ExternalIdAlreadySet,

    #[error("database error: {0}")]
    Database(String),

    #[error("migration error: {0}")]
    Migration(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => StoreError::Database("row not found".into()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicateMembership
            }
            _ => StoreError::Database(error.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Insert carriers
// ---------------------------------------------------------------------------

/// Fields for a new space row. The ID is generated by the caller so the
/// local row exists before any external call is even scheduled.
#[derive(Debug, Clone)]
pub struct NewSpace {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub visibility: SpaceVisibility,
    pub auto_approval: bool,
    pub owner_id: Uuid,
}

/// Fields for a new membership row.
#[derive(Debug, Clone)]
pub struct NewMembership {
    pub id: Uuid,
    pub space_id: Uuid,
    pub user_id: Uuid,
    pub status: JoinStatus,
    pub role: SpaceRole,
}

/// One row of the pending-request aggregation.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct PendingCount {
    pub space_id: Uuid,
    pub pending: i64,
}

// ---------------------------------------------------------------------------
// Store contracts
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SpaceStore: Send + Sync {
    async fn find_space(&self, space_id: Uuid) -> Result<Space, StoreError>;

    /// Create the space together with the owner's Approved/Admin membership,
    /// atomically. The owner is a member from the first committed state, so
    /// the admin invariant holds from the start.
    async fn create_space_with_owner(
        &self,
        space: NewSpace,
        owner_membership_id: Uuid,
    ) -> Result<(Space, Membership), StoreError>;

    async fn update_space(
        &self,
        space_id: Uuid,
        patch: &UpdateSpaceRequest,
    ) -> Result<Space, StoreError>;

    /// Soft-deactivate. Rows are kept while external references exist.
    async fn deactivate_space(&self, space_id: Uuid) -> Result<Space, StoreError>;

    /// Record the provider-assigned identifiers. Fails with
    /// [`StoreError::ExternalIdAlreadySet`] if a previous sync already wrote
    /// them — the external ID is append-once.
    async fn set_external_refs(
        &self,
        space_id: Uuid,
        external_id: &str,
        external_uri: Option<&str>,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Insert a membership row. The unique index on (space_id, user_id) is
    /// the sole concurrency control: the loser of a concurrent create gets
    /// [`StoreError::DuplicateMembership`] and re-fetches.
    ///
    /// A row that is active on insert (open-space join) counts toward the
    /// space's denormalized member count in the same unit of work.
    async fn create_membership(&self, membership: NewMembership)
    -> Result<Membership, StoreError>;

    async fn find_membership(&self, membership_id: Uuid) -> Result<Membership, StoreError>;

    async fn find_by_space_and_user(
        &self,
        space_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, StoreError>;

    /// Persist a state-machine result: status, role, left, removed.
    /// Only the membership service calls this.
    ///
    /// The space's denormalized member count moves with the row's activation
    /// in the same unit of work: a row turning active counts +1, a row
    /// turning inactive counts -1. Either both writes commit or neither
    /// does.
    async fn update_state(
        &self,
        membership_id: Uuid,
        state: MemberState,
    ) -> Result<Membership, StoreError>;

    /// Record (or clear) the provider-assigned member reference.
    /// Only the sync worker calls this; it never touches status or role.
    async fn set_external_member_ref(
        &self,
        membership_id: Uuid,
        member_ref: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn list_members(
        &self,
        space_id: Uuid,
        filter: MemberFilter,
        page: Page,
    ) -> Result<Vec<Membership>, StoreError>;

    async fn count_active_members(&self, space_id: Uuid) -> Result<i64, StoreError>;

    async fn count_active_admins(&self, space_id: Uuid) -> Result<i64, StoreError>;

    /// Grouped count of outstanding join requests for the given spaces.
    /// Spaces with no pending rows are simply absent from the result.
    async fn count_pending(&self, space_ids: &[Uuid]) -> Result<Vec<PendingCount>, StoreError>;
}

// ---------------------------------------------------------------------------
// Database handle
// ---------------------------------------------------------------------------

/// Shared PostgreSQL handle implementing both store traits.
#[derive(Clone)]
pub struct Database {
    pub pool: sqlx::PgPool,
}

impl Database {
    /// Connect to PostgreSQL using the global application config.
    pub async fn connect(config: &orbit_common::config::AppConfig) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL...");
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .min_connections(config.database.min_connections)
            .connect(&config.database.url)
            .await?;
        tracing::info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Run embedded database migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Migration(e.to_string()))?;
        tracing::info!("Migrations complete");
        Ok(())
    }
}
