//! External sync worker — drains sync intents and reconciles the mirror.
//!
//! A single drain task consumes the queue, so intents execute in enqueue
//! order globally and therefore FIFO per space: `CreateSpace` always runs
//! before any `AddMember` enqueued after it. An `AddMember` that arrives
//! while its space has no external ID yet is deferred, not failed, and
//! replayed the moment creation succeeds.
//!
//! The worker may only write the external-reference fields. Join status,
//! role, `left`, and `removed` belong to the service; a provider failure
//! changes nothing locally.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use orbit_common::models::{Membership, Space, SyncIntent};
use orbit_db::{MembershipStore, SpaceStore, StoreError};
use orbit_provider::{ChatProvider, SpaceMetadata};

use crate::report::SyncReporter;

/// Create the intent queue. The handle goes to the membership service, the
/// receiver into [`SyncWorker::new`].
pub fn sync_channel() -> (SyncHandle, mpsc::UnboundedReceiver<SyncIntent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SyncHandle { tx }, rx)
}

/// Cheap cloneable producer side of the sync queue.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<SyncIntent>,
}

impl SyncHandle {
    /// Schedule an intent. Fire-and-forget: enqueueing after a local commit
    /// never fails the caller, even when the worker is already shut down.
    pub fn enqueue(&self, intent: SyncIntent) {
        if self.tx.send(intent).is_err() {
            warn!("sync worker is gone; intent dropped");
        }
    }
}

/// Per-space holding area for intents that cannot run before the space has
/// been mirrored. FIFO within each space.
#[derive(Default)]
struct DeferredIntents {
    by_space: HashMap<Uuid, VecDeque<SyncIntent>>,
}

impl DeferredIntents {
    fn push(&mut self, intent: SyncIntent) {
        self.by_space.entry(intent.space_id()).or_default().push_back(intent);
    }

    fn take(&mut self, space_id: Uuid) -> VecDeque<SyncIntent> {
        self.by_space.remove(&space_id).unwrap_or_default()
    }

    fn outstanding(&self) -> usize {
        self.by_space.values().map(VecDeque::len).sum()
    }
}

/// Consumes sync intents and replays them against the external provider.
pub struct SyncWorker {
    spaces: Arc<dyn SpaceStore>,
    memberships: Arc<dyn MembershipStore>,
    provider: Arc<dyn ChatProvider>,
    reporter: Arc<dyn SyncReporter>,
    rx: mpsc::UnboundedReceiver<SyncIntent>,
    /// Intents to run before touching the channel again. Follow-ups of a
    /// completed `CreateSpace` land here so per-space order is preserved.
    backlog: VecDeque<SyncIntent>,
    deferred: DeferredIntents,
}

impl SyncWorker {
    pub fn new(
        spaces: Arc<dyn SpaceStore>,
        memberships: Arc<dyn MembershipStore>,
        provider: Arc<dyn ChatProvider>,
        reporter: Arc<dyn SyncReporter>,
        rx: mpsc::UnboundedReceiver<SyncIntent>,
    ) -> Self {
        Self {
            spaces,
            memberships,
            provider,
            reporter,
            rx,
            backlog: VecDeque::new(),
            deferred: DeferredIntents::default(),
        }
    }

    /// Drain the queue until all senders are dropped. Run this on its own
    /// task: `tokio::spawn(worker.run())`.
    pub async fn run(mut self) {
        info!("sync worker started");
        loop {
            let intent = match self.backlog.pop_front() {
                Some(intent) => intent,
                None => match self.rx.recv().await {
                    Some(intent) => intent,
                    None => break,
                },
            };
            self.process(intent).await;
        }
        if self.deferred.outstanding() > 0 {
            warn!(
                outstanding = self.deferred.outstanding(),
                "sync worker stopping with deferred intents; the mirror stays behind until re-sync"
            );
        }
        info!("sync worker stopped");
    }

    async fn process(&mut self, intent: SyncIntent) {
        debug!(kind = intent.kind(), space_id = %intent.space_id(), "processing sync intent");
        match intent {
            SyncIntent::CreateSpace { space_id } => self.create_space(space_id).await,
            SyncIntent::AddMember { space_id, membership_id } => {
                self.add_member(space_id, membership_id).await
            }
            SyncIntent::RemoveMember { space_id, membership_id } => {
                self.remove_member(space_id, membership_id).await
            }
            SyncIntent::UpdateSpace { space_id } => self.update_space(space_id).await,
            SyncIntent::DeleteSpace { space_id } => self.delete_space(space_id).await,
        }
    }

    async fn create_space(&mut self, space_id: Uuid) {
        let Some(space) = self.load_space(space_id).await else { return };

        if space.external_id.is_none() {
            let metadata = SpaceMetadata::from(&space);
            let created = match self.provider.create_space(&metadata).await {
                Ok(created) => created,
                Err(e) => {
                    self.reporter
                        .sync_failed(&SyncIntent::CreateSpace { space_id }, &e);
                    return;
                }
            };

            match self
                .spaces
                .set_external_refs(space_id, &created.external_id, created.external_uri.as_deref())
                .await
            {
                Ok(()) => {
                    info!(%space_id, external_id = %created.external_id, "space mirrored");
                }
                // A concurrent run already recorded the mirror; the first
                // write wins and this result is discarded.
                Err(StoreError::ExternalIdAlreadySet) => {
                    debug!(%space_id, "external id already recorded");
                }
                Err(e) => {
                    warn!(%space_id, "failed to record external refs: {e}");
                    return;
                }
            }
        }

        // The owner is represented externally without a second round trip
        // from the caller, then anything that waited on this space runs.
        let mut follow_ups: Vec<SyncIntent> = Vec::new();
        match self.memberships.find_by_space_and_user(space_id, space.owner_id).await {
            Ok(Some(owner)) if owner.external_member_ref.is_none() => {
                follow_ups.push(SyncIntent::AddMember { space_id, membership_id: owner.id });
            }
            Ok(_) => {}
            Err(e) => warn!(%space_id, "owner membership lookup failed: {e}"),
        }
        follow_ups.extend(self.deferred.take(space_id));

        for intent in follow_ups.into_iter().rev() {
            self.backlog.push_front(intent);
        }
    }

    async fn add_member(&mut self, space_id: Uuid, membership_id: Uuid) {
        let Some(membership) = self.load_membership(membership_id).await else { return };
        if !membership.is_active() {
            debug!(%membership_id, "member no longer active; skipping stale add");
            return;
        }
        if membership.external_member_ref.is_some() {
            debug!(%membership_id, "member already mirrored");
            return;
        }

        let Some(space) = self.load_space(space_id).await else { return };
        let Some(external_space_id) = space.external_id else {
            // Creation may still be in flight; requeue rather than fail.
            debug!(%space_id, %membership_id, "space not mirrored yet; deferring add");
            self.deferred.push(SyncIntent::AddMember { space_id, membership_id });
            return;
        };

        let user = membership.user_id.to_string();
        match self.provider.add_member(&external_space_id, &user).await {
            Ok(member_ref) => {
                if let Err(e) = self
                    .memberships
                    .set_external_member_ref(membership_id, Some(&member_ref))
                    .await
                {
                    warn!(%membership_id, "failed to record external member ref: {e}");
                }
            }
            Err(e) => {
                self.reporter
                    .sync_failed(&SyncIntent::AddMember { space_id, membership_id }, &e);
            }
        }
    }

    async fn remove_member(&mut self, space_id: Uuid, membership_id: Uuid) {
        let Some(membership) = self.load_membership(membership_id).await else { return };
        if membership.is_active() {
            debug!(%membership_id, "member is active again; skipping stale remove");
            return;
        }

        let Some(space) = self.load_space(space_id).await else { return };
        let (Some(external_space_id), Some(member_ref)) =
            (space.external_id, membership.external_member_ref)
        else {
            // Never made it to the provider; nothing to undo there.
            debug!(%membership_id, "member was never mirrored; nothing to remove");
            return;
        };

        match self.provider.remove_member(&external_space_id, &member_ref).await {
            Ok(()) => {
                if let Err(e) =
                    self.memberships.set_external_member_ref(membership_id, None).await
                {
                    warn!(%membership_id, "failed to clear external member ref: {e}");
                }
            }
            Err(e) => {
                self.reporter
                    .sync_failed(&SyncIntent::RemoveMember { space_id, membership_id }, &e);
            }
        }
    }

    async fn update_space(&mut self, space_id: Uuid) {
        let Some(space) = self.load_space(space_id).await else { return };
        let Some(external_space_id) = space.external_id.clone() else {
            debug!(%space_id, "space not mirrored yet; deferring update");
            self.deferred.push(SyncIntent::UpdateSpace { space_id });
            return;
        };

        let metadata = SpaceMetadata::from(&space);
        if let Err(e) = self.provider.update_space(&external_space_id, &metadata).await {
            self.reporter.sync_failed(&SyncIntent::UpdateSpace { space_id }, &e);
        }
    }

    async fn delete_space(&mut self, space_id: Uuid) {
        let Some(space) = self.load_space(space_id).await else { return };
        let Some(external_space_id) = space.external_id else {
            debug!(%space_id, "space was never mirrored; nothing to delete");
            return;
        };

        if let Err(e) = self.provider.delete_space(&external_space_id).await {
            self.reporter.sync_failed(&SyncIntent::DeleteSpace { space_id }, &e);
        }
    }

    async fn load_space(&self, space_id: Uuid) -> Option<Space> {
        match self.spaces.find_space(space_id).await {
            Ok(space) => Some(space),
            Err(e) => {
                warn!(%space_id, "space lookup failed during sync: {e}");
                None
            }
        }
    }

    async fn load_membership(&self, membership_id: Uuid) -> Option<Membership> {
        match self.memberships.find_membership(membership_id).await {
            Ok(membership) => Some(membership),
            Err(e) => {
                warn!(%membership_id, "membership lookup failed during sync: {e}");
                None
            }
        }
    }
}
