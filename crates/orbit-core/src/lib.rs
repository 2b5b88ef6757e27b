//! # orbit-core
//!
//! The membership and join-request lifecycle for spaces, kept eventually
//! consistent with an external chat provider.
//!
//! ## Architecture
//!
//! ```text
//!  caller (HTTP surface, out of scope)
//!     │
//!     ▼                        enqueue after commit
//!  MembershipService ────────────────────────────────► SyncHandle (mpsc)
//!     │  transitions + stores                               │
//!     ▼                                                     ▼
//!  SpaceStore / MembershipStore ◄──────────────────── SyncWorker ──► ChatProvider
//!  (authoritative, PostgreSQL)     external refs only  (spawned task)  (mirror)
//! ```
//!
//! The local database decides everything: who joined, who administers, who
//! was removed. The worker drains [`SyncIntent`]s in FIFO order and replays
//! them against the provider; its failures are logged and reported but never
//! reach the caller, and it writes nothing but the external-reference
//! fields.
//!
//! [`SyncIntent`]: orbit_common::models::SyncIntent

pub mod error;
pub mod pending;
pub mod report;
pub mod service;
pub mod worker;

pub use error::{MembershipError, MembershipResult};
pub use pending::PendingRequestAggregator;
pub use report::{LogReporter, SyncReporter};
pub use service::MembershipService;
pub use worker::{sync_channel, SyncHandle, SyncWorker};
