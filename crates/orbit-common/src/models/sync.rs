//! Sync intents — queued instructions to replay a local change against the
//! external provider.
//!
//! Intents carry IDs only. The worker re-reads the authoritative row when it
//! processes an intent and skips work the current state no longer warrants,
//! so a stale intent is harmless rather than wrong.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One outstanding action against the external provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncIntent {
    /// Mirror a newly created space. On success the worker also adds the
    /// owner so no second round trip from the caller is needed.
    CreateSpace { space_id: Uuid },
    /// Reflect an approved/restored member on the provider.
    AddMember { space_id: Uuid, membership_id: Uuid },
    /// Reflect a removed/left member on the provider.
    RemoveMember { space_id: Uuid, membership_id: Uuid },
    /// Mirror local metadata edits.
    UpdateSpace { space_id: Uuid },
    /// Mirror deactivation of the space.
    DeleteSpace { space_id: Uuid },
}

impl SyncIntent {
    /// The space this intent belongs to. Ordering is guaranteed per space only.
    pub fn space_id(&self) -> Uuid {
        match self {
            Self::CreateSpace { space_id }
            | Self::AddMember { space_id, .. }
            | Self::RemoveMember { space_id, .. }
            | Self::UpdateSpace { space_id }
            | Self::DeleteSpace { space_id } => *space_id,
        }
    }

    /// Short tag for logs and failure reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateSpace { .. } => "create_space",
            Self::AddMember { .. } => "add_member",
            Self::RemoveMember { .. } => "remove_member",
            Self::UpdateSpace { .. } => "update_space",
            Self::DeleteSpace { .. } => "delete_space",
        }
    }
}
