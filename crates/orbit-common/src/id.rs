//! Internal ID generation.
//!
//! Orbit rows use UUID v7 — globally unique, time-sortable, generated
//! without coordination, so the local row always exists before any external
//! call hands out a provider-assigned identifier.

use uuid::Uuid;

/// Generate a new time-sortable internal ID.
pub fn generate_id() -> Uuid {
    Uuid::now_v7()
}
