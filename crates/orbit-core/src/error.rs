//! Error taxonomy at the membership service boundary.
//!
//! Validation, authorization, and not-found failures are returned here as
//! typed results and leave local state untouched. External sync failures
//! never appear in this enum — they stay inside the worker.

use orbit_common::transitions::TransitionError;
use orbit_common::validation::ValidationFailure;
use orbit_db::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    /// The acting user does not hold an active admin membership in the space.
    #[error("not an admin of this space")]
    NotAnAdmin,

    #[error("space not found")]
    SpaceNotFound,

    #[error("membership not found")]
    MembershipNotFound,

    #[error("space is not active")]
    SpaceInactive,

    /// The requested state change is invalid for the current state.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    Store(StoreError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for MembershipError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::SpaceNotFound => MembershipError::SpaceNotFound,
            StoreError::MembershipNotFound => MembershipError::MembershipNotFound,
            other => MembershipError::Store(other),
        }
    }
}

/// Convenience type alias for Results at the service boundary.
pub type MembershipResult<T> = Result<T, MembershipError>;
