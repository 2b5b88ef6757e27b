//! Membership service — the authoritative write path.
//!
//! Every mutation follows the same shape: authorize, run the pure
//! transition, persist through the store (which commits atomically), and
//! only then enqueue a sync intent. Callers get their result as soon as the
//! local commit lands; they never wait on the external provider.

use std::sync::Arc;

use uuid::Uuid;

use orbit_common::id::generate_id;
use orbit_common::models::{
    CreateSpaceRequest, JoinStatus, MemberFilter, Membership, Page, Space, SpaceRole, SyncIntent,
    UpdateSpaceRequest,
};
use orbit_common::transitions::{self, MemberState};
use orbit_common::validation::{validate_request, ValidationFailure};
use orbit_db::{MembershipStore, NewMembership, NewSpace, SpaceStore, StoreError};

use crate::error::{MembershipError, MembershipResult};
use crate::worker::SyncHandle;

/// Orchestrates membership lookups, state transitions, and sync scheduling.
pub struct MembershipService {
    spaces: Arc<dyn SpaceStore>,
    memberships: Arc<dyn MembershipStore>,
    sync: SyncHandle,
}

impl MembershipService {
    pub fn new(
        spaces: Arc<dyn SpaceStore>,
        memberships: Arc<dyn MembershipStore>,
        sync: SyncHandle,
    ) -> Self {
        Self { spaces, memberships, sync }
    }

    // ── Space lifecycle ──────────────────────────────────────────────────────

    /// Create a space owned by `owner_id`. The local row and the owner's
    /// Approved/Admin membership commit together; mirroring runs afterwards
    /// on the worker, which also adds the owner externally once the room
    /// exists.
    pub async fn create_space(
        &self,
        req: CreateSpaceRequest,
        owner_id: Uuid,
    ) -> MembershipResult<Space> {
        validate_request(&req)?;

        let new_space = NewSpace {
            id: generate_id(),
            title: req.title,
            description: req.description,
            visibility: req.visibility,
            auto_approval: req.auto_approval.unwrap_or(false),
            owner_id,
        };
        let (space, _owner) =
            self.spaces.create_space_with_owner(new_space, generate_id()).await?;

        self.sync.enqueue(SyncIntent::CreateSpace { space_id: space.id });
        Ok(space)
    }

    /// Apply local metadata edits, then mirror them best-effort.
    pub async fn update_space(
        &self,
        space_id: Uuid,
        patch: UpdateSpaceRequest,
        acting_user: Uuid,
    ) -> MembershipResult<Space> {
        validate_request(&patch)?;
        self.require_admin(space_id, acting_user).await?;

        let space = self.spaces.update_space(space_id, &patch).await?;
        self.sync.enqueue(SyncIntent::UpdateSpace { space_id });
        Ok(space)
    }

    /// Soft-deactivate the space and schedule teardown of the mirror.
    pub async fn deactivate_space(
        &self,
        space_id: Uuid,
        acting_user: Uuid,
    ) -> MembershipResult<Space> {
        self.require_admin(space_id, acting_user).await?;

        let space = self.spaces.deactivate_space(space_id).await?;
        self.sync.enqueue(SyncIntent::DeleteSpace { space_id });
        Ok(space)
    }

    // ── Join lifecycle ───────────────────────────────────────────────────────

    /// Idempotent join. Returns the existing row when the user already has a
    /// live membership; re-joins after a leave; otherwise creates the row,
    /// landing on Pending or directly on Approved for open spaces.
    ///
    /// Two concurrent calls race on the store's unique index: the loser sees
    /// [`StoreError::DuplicateMembership`] and resolves to the winner's row.
    pub async fn get_or_create_membership(
        &self,
        space_id: Uuid,
        user_id: Uuid,
    ) -> MembershipResult<Membership> {
        let space = self.spaces.find_space(space_id).await?;
        if !space.active {
            return Err(MembershipError::SpaceInactive);
        }
        let auto_join = space.joins_without_approval();

        if let Some(existing) = self.memberships.find_by_space_and_user(space_id, user_id).await?
        {
            let state = MemberState::from(&existing);
            let next = transitions::rejoin(state, auto_join)?;
            if next == state {
                return Ok(existing);
            }
            let updated = self.memberships.update_state(existing.id, next).await?;
            self.after_join(&updated, next);
            return Ok(updated);
        }

        let new_membership = NewMembership {
            id: generate_id(),
            space_id,
            user_id,
            status: transitions::initial_join(auto_join).status,
            role: SpaceRole::Member,
        };
        let created = match self.memberships.create_membership(new_membership).await {
            Ok(created) => created,
            Err(StoreError::DuplicateMembership) => {
                // Lost the race; the winner's row is the membership.
                return self
                    .memberships
                    .find_by_space_and_user(space_id, user_id)
                    .await?
                    .ok_or(MembershipError::MembershipNotFound);
            }
            Err(e) => return Err(e.into()),
        };
        self.after_join(&created, MemberState::from(&created));
        Ok(created)
    }

    /// Shared by the join paths: mirror the member if the join landed
    /// directly on Approved. The store has already counted them.
    fn after_join(&self, membership: &Membership, state: MemberState) {
        if state.is_active() {
            self.sync.enqueue(SyncIntent::AddMember {
                space_id: membership.space_id,
                membership_id: membership.id,
            });
        }
    }

    /// Approve or disapprove a pending join request. On approval the member
    /// is mirrored to the provider.
    pub async fn change_join_status(
        &self,
        space_id: Uuid,
        membership_id: Uuid,
        new_status: JoinStatus,
        acting_user: Uuid,
    ) -> MembershipResult<Membership> {
        self.require_admin(space_id, acting_user).await?;
        let membership = self.membership_in_space(space_id, membership_id).await?;

        let state = MemberState::from(&membership);
        let next = match new_status {
            JoinStatus::Approved => transitions::approve(state)?,
            JoinStatus::Disapproved => transitions::disapprove(state)?,
            JoinStatus::Pending => {
                return Err(ValidationFailure(
                    "a join request cannot be reset to pending".into(),
                )
                .into());
            }
        };

        let updated = self.memberships.update_state(membership_id, next).await?;
        if next.is_active() {
            self.sync.enqueue(SyncIntent::AddMember { space_id, membership_id });
        }
        Ok(updated)
    }

    // ── Removal & restore ────────────────────────────────────────────────────

    /// Remove an active member. The space owner is protected. The local row
    /// flips immediately; the provider catches up asynchronously.
    pub async fn remove_member(
        &self,
        space_id: Uuid,
        membership_id: Uuid,
        acting_user: Uuid,
    ) -> MembershipResult<Membership> {
        self.require_admin(space_id, acting_user).await?;
        let space = self.spaces.find_space(space_id).await?;
        let membership = self.membership_in_space(space_id, membership_id).await?;

        let next = transitions::remove(
            MemberState::from(&membership),
            membership.user_id == space.owner_id,
        )?;

        let updated = self.memberships.update_state(membership_id, next).await?;
        self.sync.enqueue(SyncIntent::RemoveMember { space_id, membership_id });
        Ok(updated)
    }

    /// Lift a removal (or a disapproval): status resets to Approved, role is
    /// kept, and the member is mirrored again.
    pub async fn restore_member(
        &self,
        space_id: Uuid,
        membership_id: Uuid,
        acting_user: Uuid,
    ) -> MembershipResult<Membership> {
        self.require_admin(space_id, acting_user).await?;
        let membership = self.membership_in_space(space_id, membership_id).await?;

        let next = transitions::restore(MemberState::from(&membership))?;

        let updated = self.memberships.update_state(membership_id, next).await?;
        self.sync.enqueue(SyncIntent::AddMember { space_id, membership_id });
        Ok(updated)
    }

    /// A member leaves on their own. They may re-request to join later,
    /// starting a fresh Pending/Approved cycle on the same row.
    pub async fn leave_space(
        &self,
        space_id: Uuid,
        acting_user: Uuid,
    ) -> MembershipResult<Membership> {
        let space = self.spaces.find_space(space_id).await?;
        let membership = self
            .memberships
            .find_by_space_and_user(space_id, acting_user)
            .await?
            .ok_or(MembershipError::MembershipNotFound)?;

        let active_admins = self.memberships.count_active_admins(space_id).await?;
        let next = transitions::leave(
            MemberState::from(&membership),
            membership.user_id == space.owner_id,
            active_admins,
        )?;

        let updated = self.memberships.update_state(membership.id, next).await?;
        self.sync
            .enqueue(SyncIntent::RemoveMember { space_id, membership_id: membership.id });
        Ok(updated)
    }

    // ── Roles ────────────────────────────────────────────────────────────────

    /// Promote a member to admin or demote an admin back to member. Role is
    /// a local-only concept; no sync intent is enqueued.
    pub async fn change_role(
        &self,
        space_id: Uuid,
        membership_id: Uuid,
        new_role: SpaceRole,
        acting_user: Uuid,
    ) -> MembershipResult<Membership> {
        self.require_admin(space_id, acting_user).await?;
        let space = self.spaces.find_space(space_id).await?;
        let membership = self.membership_in_space(space_id, membership_id).await?;

        let state = MemberState::from(&membership);
        let next = match new_role {
            SpaceRole::Admin => transitions::promote(state)?,
            SpaceRole::Member => {
                let active_admins = self.memberships.count_active_admins(space_id).await?;
                transitions::demote(
                    state,
                    membership.user_id == space.owner_id,
                    active_admins,
                )?
            }
        };

        Ok(self.memberships.update_state(membership_id, next).await?)
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    pub async fn count_active_members(&self, space_id: Uuid) -> MembershipResult<i64> {
        Ok(self.memberships.count_active_members(space_id).await?)
    }

    pub async fn list_members(
        &self,
        space_id: Uuid,
        filter: MemberFilter,
        page: Page,
    ) -> MembershipResult<Vec<Membership>> {
        Ok(self.memberships.list_members(space_id, filter, page).await?)
    }

    // ── Authorization helpers ────────────────────────────────────────────────

    /// The acting user must hold an active admin membership in the space.
    /// No state is touched and nothing is enqueued when this fails.
    async fn require_admin(
        &self,
        space_id: Uuid,
        acting_user: Uuid,
    ) -> MembershipResult<Membership> {
        let membership = self
            .memberships
            .find_by_space_and_user(space_id, acting_user)
            .await?
            .ok_or(MembershipError::NotAnAdmin)?;
        if !membership.is_active_admin() {
            return Err(MembershipError::NotAnAdmin);
        }
        Ok(membership)
    }

    /// Resolve a membership and check it belongs to the given space.
    async fn membership_in_space(
        &self,
        space_id: Uuid,
        membership_id: Uuid,
    ) -> MembershipResult<Membership> {
        let membership = self.memberships.find_membership(membership_id).await?;
        if membership.space_id != space_id {
            return Err(MembershipError::MembershipNotFound);
        }
        Ok(membership)
    }
}
