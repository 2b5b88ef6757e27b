//! Membership state machine — pure transition logic.
//!
//! Every transition is a total function over the state space: invalid
//! requests come back as a [`TransitionError`] instead of panicking or
//! throwing from deep call stacks, so the service layer can translate
//! failures to user-facing outcomes uniformly.
//!
//! Context the state itself cannot know (owner protection, auto-approval,
//! how many admins remain) is passed in as arguments; nothing here touches
//! storage.

use crate::models::{JoinStatus, Membership, SpaceRole};

/// The transition-relevant slice of a membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemberState {
    pub status: JoinStatus,
    pub role: SpaceRole,
    pub left: bool,
    pub removed: bool,
}

impl From<&Membership> for MemberState {
    fn from(m: &Membership) -> Self {
        Self { status: m.status, role: m.role, left: m.left, removed: m.removed }
    }
}

impl MemberState {
    pub fn is_active(&self) -> bool {
        self.status == JoinStatus::Approved && !self.left && !self.removed
    }
}

/// Typed rejection of an invalid transition. Local state is unchanged
/// whenever one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("membership is already approved")]
    AlreadyApproved,

    #[error("membership is already disapproved")]
    AlreadyDisapproved,

    #[error("membership is not pending")]
    NotPending,

    #[error("membership was disapproved and must be restored first")]
    DisapprovedNeedsRestore,

    #[error("member was removed and must be restored first")]
    RemovedNeedsRestore,

    #[error("member is not active in this space")]
    NotActive,

    #[error("member already left this space")]
    AlreadyLeft,

    #[error("member is already removed")]
    AlreadyRemoved,

    #[error("member is not removed")]
    NotRemoved,

    #[error("the space owner cannot be removed or demoted")]
    OwnerProtected,

    #[error("at least one admin must remain in the space")]
    LastAdmin,

    #[error("member is already an admin")]
    AlreadyAdmin,

    #[error("member does not hold the admin role")]
    NotAdmin,
}

/// State of a brand-new membership row for a first join request.
pub fn initial_join(auto_join: bool) -> MemberState {
    MemberState {
        status: if auto_join { JoinStatus::Approved } else { JoinStatus::Pending },
        role: SpaceRole::Member,
        left: false,
        removed: false,
    }
}

/// Re-invoke a join request on an existing row.
///
/// A live row (not left, not removed) is returned unchanged — joining is
/// idempotent. A member who left starts a fresh Pending/Approved cycle on the
/// same row, back at the Member role. A removed member stays out until an
/// admin restores them.
pub fn rejoin(state: MemberState, auto_join: bool) -> Result<MemberState, TransitionError> {
    if state.removed {
        return Err(TransitionError::RemovedNeedsRestore);
    }
    if state.left {
        return Ok(initial_join(auto_join));
    }
    Ok(state)
}

/// Pending → Approved. An already-approved row is reported as such rather
/// than failing the whole caller flow; a disapproved row must be restored
/// first.
pub fn approve(state: MemberState) -> Result<MemberState, TransitionError> {
    if state.removed {
        return Err(TransitionError::RemovedNeedsRestore);
    }
    match state.status {
        JoinStatus::Approved => Err(TransitionError::AlreadyApproved),
        JoinStatus::Disapproved => Err(TransitionError::DisapprovedNeedsRestore),
        JoinStatus::Pending => Ok(MemberState { status: JoinStatus::Approved, ..state }),
    }
}

/// Pending → Disapproved. Terminal until an admin explicitly restores.
pub fn disapprove(state: MemberState) -> Result<MemberState, TransitionError> {
    if state.removed {
        return Err(TransitionError::AlreadyRemoved);
    }
    match state.status {
        JoinStatus::Approved => Err(TransitionError::AlreadyApproved),
        JoinStatus::Disapproved => Err(TransitionError::AlreadyDisapproved),
        JoinStatus::Pending => Ok(MemberState { status: JoinStatus::Disapproved, ..state }),
    }
}

/// Active member → removed. The owner can never be removed; role is retained
/// for audit.
pub fn remove(state: MemberState, is_owner: bool) -> Result<MemberState, TransitionError> {
    if is_owner {
        return Err(TransitionError::OwnerProtected);
    }
    if state.removed {
        return Err(TransitionError::AlreadyRemoved);
    }
    if state.left {
        return Err(TransitionError::AlreadyLeft);
    }
    if state.status != JoinStatus::Approved {
        return Err(TransitionError::NotActive);
    }
    Ok(MemberState { removed: true, ..state })
}

/// Removed or disapproved → active again, status reset to Approved, role
/// unchanged. Both terminal states are lifted only by an explicit admin
/// restore.
pub fn restore(state: MemberState) -> Result<MemberState, TransitionError> {
    if !state.removed && state.status != JoinStatus::Disapproved {
        return Err(TransitionError::NotRemoved);
    }
    Ok(MemberState { status: JoinStatus::Approved, removed: false, left: false, ..state })
}

/// Active member leaves on their own. The owner stays, and the last
/// remaining admin must hand over first.
pub fn leave(
    state: MemberState,
    is_owner: bool,
    active_admins: i64,
) -> Result<MemberState, TransitionError> {
    if is_owner {
        return Err(TransitionError::OwnerProtected);
    }
    if state.left {
        return Err(TransitionError::AlreadyLeft);
    }
    if state.removed {
        return Err(TransitionError::AlreadyRemoved);
    }
    if state.status != JoinStatus::Approved {
        return Err(TransitionError::NotActive);
    }
    if state.role == SpaceRole::Admin && active_admins <= 1 {
        return Err(TransitionError::LastAdmin);
    }
    Ok(MemberState { left: true, ..state })
}

/// Member → Admin. The target must be an active, approved member.
pub fn promote(state: MemberState) -> Result<MemberState, TransitionError> {
    if !state.is_active() {
        return Err(TransitionError::NotActive);
    }
    if state.role == SpaceRole::Admin {
        return Err(TransitionError::AlreadyAdmin);
    }
    Ok(MemberState { role: SpaceRole::Admin, ..state })
}

/// Admin → Member. The owner keeps admin, and at least one admin must remain
/// per active space.
pub fn demote(
    state: MemberState,
    is_owner: bool,
    active_admins: i64,
) -> Result<MemberState, TransitionError> {
    if is_owner {
        return Err(TransitionError::OwnerProtected);
    }
    if !state.is_active() {
        return Err(TransitionError::NotActive);
    }
    if state.role != SpaceRole::Admin {
        return Err(TransitionError::NotAdmin);
    }
    if active_admins <= 1 {
        return Err(TransitionError::LastAdmin);
    }
    Ok(MemberState { role: SpaceRole::Member, ..state })
}
