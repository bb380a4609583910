//! KYC Sync - Status cache and refresh coordination
//!
//! Dozens of independent gated views mount concurrently and each wants the
//! current verification status, while the authoritative value lives behind
//! an unreliable network and mutates outside the client's control. This
//! crate centralizes that state: one cache entry per user, one in-flight
//! fetch per user no matter how many callers ask, and one change event per
//! actual transition.
//!
//! The cache itself is private. Consumers interact only with
//! [`SyncCoordinator`].

#![deny(unsafe_code)]

mod cache;
pub mod config;
pub mod coordinator;
pub mod error;

pub use config::SyncConfig;
pub use coordinator::{RefreshOptions, SyncCoordinator};
pub use error::{SyncError, SyncResult};
