//! # orbit-provider
//!
//! Outbound client for the external chat provider that mirrors Orbit spaces
//! and members. The provider is never authoritative: every call here is a
//! best-effort replay of a change that has already committed locally, and
//! any non-success is treated uniformly as "sync failed, retry later".
//!
//! The [`ChatProvider`] trait is the seam the sync worker is written
//! against; [`ProviderClient`] is the production reqwest implementation.

pub mod client;
pub mod error;
pub mod types;

pub use client::ProviderClient;
pub use error::ProviderError;
pub use types::{CreatedSpace, SpaceMetadata};

use async_trait::async_trait;

/// Operations the sync worker replays against the external provider.
///
/// Implementations must be safe to call repeatedly with the same arguments:
/// the worker retries without deduplication, so add-member must behave as
/// add-if-absent and the deletes as idempotent acks.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Create the mirrored room, returning the provider-assigned identifiers.
    async fn create_space(&self, metadata: &SpaceMetadata) -> Result<CreatedSpace, ProviderError>;

    /// Add a user to the mirrored room, returning the provider's member reference.
    async fn add_member(
        &self,
        external_space_id: &str,
        user_identifier: &str,
    ) -> Result<String, ProviderError>;

    /// Remove a previously mirrored member.
    async fn remove_member(
        &self,
        external_space_id: &str,
        external_member_ref: &str,
    ) -> Result<(), ProviderError>;

    /// Push local metadata edits to the mirrored room.
    async fn update_space(
        &self,
        external_space_id: &str,
        metadata: &SpaceMetadata,
    ) -> Result<(), ProviderError>;

    /// Tear down the mirrored room after local deactivation.
    async fn delete_space(&self, external_space_id: &str) -> Result<(), ProviderError>;
}
