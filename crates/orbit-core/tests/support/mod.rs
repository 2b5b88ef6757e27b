//! In-memory store and provider doubles for exercising the service and the
//! sync worker without PostgreSQL or a live provider.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use orbit_common::id::generate_id;
use orbit_common::models::{
    JoinStatus, MemberFilter, Membership, Page, Space, SpaceRole, SpaceVisibility, SyncIntent,
    UpdateSpaceRequest,
};
use orbit_common::transitions::MemberState;
use orbit_core::SyncReporter;
use orbit_db::{
    MembershipStore, NewMembership, NewSpace, PendingCount, SpaceStore, StoreError,
};
use orbit_provider::{ChatProvider, CreatedSpace, ProviderError, SpaceMetadata};

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Implements both store traits over plain hash maps, mirroring the
/// semantics of the PostgreSQL implementation (unique (space, user) pair,
/// append-once external ID).
#[derive(Default)]
pub struct MemoryStore {
    spaces: Mutex<HashMap<Uuid, Space>>,
    memberships: Mutex<HashMap<Uuid, Membership>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_space(&self, space: Space) {
        self.spaces.lock().unwrap().insert(space.id, space);
    }

    pub fn insert_membership(&self, membership: Membership) {
        self.memberships.lock().unwrap().insert(membership.id, membership);
    }

    pub fn space(&self, id: Uuid) -> Option<Space> {
        self.spaces.lock().unwrap().get(&id).cloned()
    }

    pub fn membership(&self, id: Uuid) -> Option<Membership> {
        self.memberships.lock().unwrap().get(&id).cloned()
    }

    pub fn membership_rows(&self, space_id: Uuid) -> Vec<Membership> {
        let mut rows: Vec<_> = self
            .memberships
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.space_id == space_id)
            .cloned()
            .collect();
        rows.sort_by_key(|m| m.created_at);
        rows
    }
}

#[async_trait]
impl SpaceStore for MemoryStore {
    async fn find_space(&self, space_id: Uuid) -> Result<Space, StoreError> {
        self.space(space_id).ok_or(StoreError::SpaceNotFound)
    }

    async fn create_space_with_owner(
        &self,
        space: NewSpace,
        owner_membership_id: Uuid,
    ) -> Result<(Space, Membership), StoreError> {
        let now = Utc::now();
        let created = Space {
            id: space.id,
            title: space.title,
            description: space.description,
            visibility: space.visibility,
            auto_approval: space.auto_approval,
            active: true,
            owner_id: space.owner_id,
            external_id: None,
            external_uri: None,
            member_count: 1,
            like_count: 0,
            created_at: now,
            updated_at: now,
        };
        let owner = Membership {
            id: owner_membership_id,
            space_id: space.id,
            user_id: created.owner_id,
            status: JoinStatus::Approved,
            role: SpaceRole::Admin,
            left: false,
            removed: false,
            external_member_ref: None,
            created_at: now,
            updated_at: now,
        };
        self.insert_space(created.clone());
        self.insert_membership(owner.clone());
        Ok((created, owner))
    }

    async fn update_space(
        &self,
        space_id: Uuid,
        patch: &UpdateSpaceRequest,
    ) -> Result<Space, StoreError> {
        let mut spaces = self.spaces.lock().unwrap();
        let space = spaces.get_mut(&space_id).ok_or(StoreError::SpaceNotFound)?;
        if let Some(title) = &patch.title {
            space.title = title.clone();
        }
        if let Some(description) = &patch.description {
            space.description = Some(description.clone());
        }
        if let Some(visibility) = patch.visibility {
            space.visibility = visibility;
        }
        if let Some(auto_approval) = patch.auto_approval {
            space.auto_approval = auto_approval;
        }
        space.updated_at = Utc::now();
        Ok(space.clone())
    }

    async fn deactivate_space(&self, space_id: Uuid) -> Result<Space, StoreError> {
        let mut spaces = self.spaces.lock().unwrap();
        let space = spaces.get_mut(&space_id).ok_or(StoreError::SpaceNotFound)?;
        space.active = false;
        space.updated_at = Utc::now();
        Ok(space.clone())
    }

    async fn set_external_refs(
        &self,
        space_id: Uuid,
        external_id: &str,
        external_uri: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut spaces = self.spaces.lock().unwrap();
        let space = spaces.get_mut(&space_id).ok_or(StoreError::SpaceNotFound)?;
        if space.external_id.is_some() {
            return Err(StoreError::ExternalIdAlreadySet);
        }
        space.external_id = Some(external_id.to_string());
        space.external_uri = external_uri.map(str::to_string);
        Ok(())
    }
}

impl MemoryStore {
    fn adjust_member_count(&self, space_id: Uuid, delta: i32) {
        let mut spaces = self.spaces.lock().unwrap();
        if let Some(space) = spaces.get_mut(&space_id) {
            space.member_count = (space.member_count + delta).max(0);
        }
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn create_membership(
        &self,
        membership: NewMembership,
    ) -> Result<Membership, StoreError> {
        let mut memberships = self.memberships.lock().unwrap();
        let duplicate = memberships
            .values()
            .any(|m| m.space_id == membership.space_id && m.user_id == membership.user_id);
        if duplicate {
            return Err(StoreError::DuplicateMembership);
        }
        let now = Utc::now();
        let created = Membership {
            id: membership.id,
            space_id: membership.space_id,
            user_id: membership.user_id,
            status: membership.status,
            role: membership.role,
            left: false,
            removed: false,
            external_member_ref: None,
            created_at: now,
            updated_at: now,
        };
        memberships.insert(created.id, created.clone());
        drop(memberships);
        // Matches the PostgreSQL store: an active row counts in the same
        // unit of work as its insert.
        if created.is_active() {
            self.adjust_member_count(created.space_id, 1);
        }
        Ok(created)
    }

    async fn find_membership(&self, membership_id: Uuid) -> Result<Membership, StoreError> {
        self.membership(membership_id).ok_or(StoreError::MembershipNotFound)
    }

    async fn find_by_space_and_user(
        &self,
        space_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>, StoreError> {
        Ok(self
            .memberships
            .lock()
            .unwrap()
            .values()
            .find(|m| m.space_id == space_id && m.user_id == user_id)
            .cloned())
    }

    async fn update_state(
        &self,
        membership_id: Uuid,
        state: MemberState,
    ) -> Result<Membership, StoreError> {
        let mut memberships = self.memberships.lock().unwrap();
        let membership =
            memberships.get_mut(&membership_id).ok_or(StoreError::MembershipNotFound)?;
        let was_active = membership.is_active();
        membership.status = state.status;
        membership.role = state.role;
        membership.left = state.left;
        membership.removed = state.removed;
        membership.updated_at = Utc::now();
        let updated = membership.clone();
        drop(memberships);

        let delta = i32::from(updated.is_active()) - i32::from(was_active);
        if delta != 0 {
            self.adjust_member_count(updated.space_id, delta);
        }
        Ok(updated)
    }

    async fn set_external_member_ref(
        &self,
        membership_id: Uuid,
        member_ref: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut memberships = self.memberships.lock().unwrap();
        let membership =
            memberships.get_mut(&membership_id).ok_or(StoreError::MembershipNotFound)?;
        membership.external_member_ref = member_ref.map(str::to_string);
        membership.updated_at = Utc::now();
        Ok(())
    }

    async fn list_members(
        &self,
        space_id: Uuid,
        filter: MemberFilter,
        page: Page,
    ) -> Result<Vec<Membership>, StoreError> {
        let rows = self
            .membership_rows(space_id)
            .into_iter()
            .filter(|m| filter.status.is_none_or(|s| m.status == s))
            .filter(|m| filter.role.is_none_or(|r| m.role == r))
            .filter(|m| !filter.active_only || (!m.left && !m.removed))
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();
        Ok(rows)
    }

    async fn count_active_members(&self, space_id: Uuid) -> Result<i64, StoreError> {
        Ok(self
            .membership_rows(space_id)
            .iter()
            .filter(|m| m.is_active())
            .count() as i64)
    }

    async fn count_active_admins(&self, space_id: Uuid) -> Result<i64, StoreError> {
        Ok(self
            .membership_rows(space_id)
            .iter()
            .filter(|m| m.is_active_admin())
            .count() as i64)
    }

    async fn count_pending(&self, space_ids: &[Uuid]) -> Result<Vec<PendingCount>, StoreError> {
        let memberships = self.memberships.lock().unwrap();
        let rows = space_ids
            .iter()
            .filter_map(|space_id| {
                let pending = memberships
                    .values()
                    .filter(|m| {
                        m.space_id == *space_id
                            && m.status == JoinStatus::Pending
                            && !m.left
                            && !m.removed
                    })
                    .count() as i64;
                (pending > 0).then_some(PendingCount { space_id: *space_id, pending })
            })
            .collect();
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Mock provider
// ---------------------------------------------------------------------------

/// What the mock provider observed, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    CreateSpace { name: String },
    AddMember { external_space_id: String, user: String },
    RemoveMember { external_space_id: String, member_ref: String },
    UpdateSpace { external_space_id: String, name: String },
    DeleteSpace { external_space_id: String },
}

/// Records every call; optionally fails everything to exercise the
/// mirror-failure isolation path.
#[derive(Default)]
pub struct MockProvider {
    calls: Mutex<Vec<ProviderCall>>,
    fail: AtomicBool,
    counter: AtomicU32,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn recover(&self) {
        self.fail.store(false, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: ProviderCall) -> Result<(), ProviderError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::Unreachable("mock provider down".into()));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn create_space(&self, metadata: &SpaceMetadata) -> Result<CreatedSpace, ProviderError> {
        self.record(ProviderCall::CreateSpace { name: metadata.name.clone() })?;
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(CreatedSpace {
            external_id: format!("ext-{n}"),
            external_uri: Some(format!("https://chat.example.com/rooms/ext-{n}")),
        })
    }

    async fn add_member(
        &self,
        external_space_id: &str,
        user_identifier: &str,
    ) -> Result<String, ProviderError> {
        self.record(ProviderCall::AddMember {
            external_space_id: external_space_id.to_string(),
            user: user_identifier.to_string(),
        })?;
        Ok(format!("ref-{user_identifier}"))
    }

    async fn remove_member(
        &self,
        external_space_id: &str,
        external_member_ref: &str,
    ) -> Result<(), ProviderError> {
        self.record(ProviderCall::RemoveMember {
            external_space_id: external_space_id.to_string(),
            member_ref: external_member_ref.to_string(),
        })
    }

    async fn update_space(
        &self,
        external_space_id: &str,
        metadata: &SpaceMetadata,
    ) -> Result<(), ProviderError> {
        self.record(ProviderCall::UpdateSpace {
            external_space_id: external_space_id.to_string(),
            name: metadata.name.clone(),
        })
    }

    async fn delete_space(&self, external_space_id: &str) -> Result<(), ProviderError> {
        self.record(ProviderCall::DeleteSpace {
            external_space_id: external_space_id.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Collecting reporter
// ---------------------------------------------------------------------------

/// Captures failure notifications as (intent kind, error string) pairs.
#[derive(Default)]
pub struct CollectingReporter {
    failures: Mutex<Vec<(String, String)>>,
}

impl CollectingReporter {
    pub fn failures(&self) -> Vec<(String, String)> {
        self.failures.lock().unwrap().clone()
    }
}

impl SyncReporter for CollectingReporter {
    fn sync_failed(&self, intent: &SyncIntent, error: &ProviderError) {
        self.failures
            .lock()
            .unwrap()
            .push((intent.kind().to_string(), error.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Row builders
// ---------------------------------------------------------------------------

pub fn space_row(owner_id: Uuid, visibility: SpaceVisibility, auto_approval: bool) -> Space {
    let now = Utc::now();
    Space {
        id: generate_id(),
        title: "Test space".into(),
        description: None,
        visibility,
        auto_approval,
        active: true,
        owner_id,
        external_id: None,
        external_uri: None,
        member_count: 1,
        like_count: 0,
        created_at: now,
        updated_at: now,
    }
}

pub fn membership_row(
    space_id: Uuid,
    user_id: Uuid,
    status: JoinStatus,
    role: SpaceRole,
) -> Membership {
    let now = Utc::now();
    Membership {
        id: generate_id(),
        space_id,
        user_id,
        status,
        role,
        left: false,
        removed: false,
        external_member_ref: None,
        created_at: now,
        updated_at: now,
    }
}
