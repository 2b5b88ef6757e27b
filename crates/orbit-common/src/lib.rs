//! # orbit-common
//!
//! Shared types, configuration, and pure membership logic used across all
//! Orbit crates. This is the foundation layer — no I/O, just primitives
//! and contracts.

pub mod config;
pub mod id;
pub mod models;
pub mod transitions;
pub mod validation;
