//! Sync coordinator configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Freshness and timeout policy for status refreshes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// A cached record younger than this is returned without a network
    /// call. This is what stops a redundant-fetch storm when many gated
    /// views mount in the same render pass.
    pub max_age: Duration,

    /// A fetch that has not resolved within this bound is treated as a
    /// failure and its in-flight flag is force-cleared.
    pub fetch_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(30),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl SyncConfig {
    /// Tight freshness for high-assurance surfaces (transfers, documents).
    ///
    /// A stale-but-verified record degrades to a forced refetch quickly,
    /// so a back-office rejection is picked up within the bound.
    pub fn strict() -> Self {
        Self {
            max_age: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(5),
        }
    }
}
