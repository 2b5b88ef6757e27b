//! Core domain models shared across all Orbit crates.
//!
//! These are the "truth" types — what the database stores. The local rows are
//! authoritative; the external provider is a best-effort mirror that may lag.

pub mod membership;
pub mod space;
pub mod sync;

/// Re-export all model types for convenience.
pub use membership::*;
pub use space::*;
pub use sync::*;
