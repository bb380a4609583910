//! Error types for the sync coordinator.

use kyc_types::UserId;
use thiserror::Error;

/// Errors surfaced by refresh operations.
///
/// All concurrent callers of one in-flight fetch receive the same variant;
/// there are no partial or divergent outcomes.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The status source failed; the previous record, if any, is retained.
    #[error("status fetch failed for {user_id}: {message}")]
    Fetch { user_id: UserId, message: String },

    /// The fetch did not resolve within the configured bound. The
    /// in-flight flag has been force-cleared; a later refresh will retry.
    #[error("status fetch timed out for {user_id} after {timeout_ms}ms")]
    Timeout { user_id: UserId, timeout_ms: u64 },

    /// The in-flight fetch was abandoned without an outcome.
    #[error("status fetch interrupted for {0}")]
    Interrupted(UserId),

    /// The cache mutex was poisoned by a panicking holder.
    #[error("status cache lock poisoned")]
    LockPoisoned,
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
