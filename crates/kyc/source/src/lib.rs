//! KYC Source - Boundary to the hosted verification backend
//!
//! The status source is treated as a cold, possibly slow, possibly failing
//! oracle. This crate owns the seam: the [`StatusSource`] trait everything
//! else programs against, the wire-shape normalization that turns untyped
//! backend tokens into the closed [`kyc_types::KycStatus`] enumeration, an
//! HTTP adapter for the hosted backend, and a programmable mock for tests.

#![deny(unsafe_code)]

pub mod error;
pub mod http;
pub mod mock;
pub mod wire;

pub use error::{SourceError, SourceResult};
pub use http::HttpStatusSource;
pub use mock::MockStatusSource;
pub use wire::RawStatusReport;

use async_trait::async_trait;
use kyc_types::{StatusReport, UserId};

/// Remote oracle returning the authoritative verification record.
///
/// Implementations must be safe to call concurrently; the sync coordinator
/// guarantees at most one in-flight call per user, but different users may
/// be fetched in parallel.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, user_id: &UserId) -> SourceResult<StatusReport>;
}
