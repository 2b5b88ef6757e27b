//! Sync failure reporting.
//!
//! The worker hands every provider failure to a [`SyncReporter`] so an
//! observability collaborator (alerting, metrics pipeline) can see it.
//! Fire-and-forget: nothing is consumed from the reporter.

use orbit_common::models::SyncIntent;
use orbit_provider::ProviderError;

/// Receives sync failure notifications from the worker.
pub trait SyncReporter: Send + Sync {
    fn sync_failed(&self, intent: &SyncIntent, error: &ProviderError);
}

/// Default reporter: structured log entry per failure.
pub struct LogReporter;

impl SyncReporter for LogReporter {
    fn sync_failed(&self, intent: &SyncIntent, error: &ProviderError) {
        tracing::error!(
            kind = intent.kind(),
            space_id = %intent.space_id(),
            "external sync failed, local state stays authoritative: {error}"
        );
    }
}
