//! Pending-request aggregation — the read side for admin dashboards.
//!
//! One grouped query answers "how many outstanding join requests per space"
//! for a whole listing page, so badges never cost a query per space. Purely
//! derived from committed local state; no external dependency.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use orbit_db::MembershipStore;

use crate::error::MembershipResult;

pub struct PendingRequestAggregator {
    memberships: Arc<dyn MembershipStore>,
}

impl PendingRequestAggregator {
    pub fn new(memberships: Arc<dyn MembershipStore>) -> Self {
        Self { memberships }
    }

    /// Count outstanding (pending, non-left, non-removed) join requests for
    /// each given space. Spaces without pending requests report 0.
    pub async fn count_pending(
        &self,
        space_ids: &[Uuid],
    ) -> MembershipResult<HashMap<Uuid, i64>> {
        let mut counts: HashMap<Uuid, i64> =
            space_ids.iter().map(|id| (*id, 0)).collect();
        for row in self.memberships.count_pending(space_ids).await? {
            counts.insert(row.space_id, row.pending);
        }
        Ok(counts)
    }
}
