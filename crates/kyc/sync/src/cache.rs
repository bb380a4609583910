//! In-process verification status cache.
//!
//! One entry per user, owned exclusively by the coordinator. All compound
//! operations (freshness check, join-or-lead, store-and-clear) take the
//! mutex exactly once, so callers interleaved at await points can never
//! observe a half-updated entry.

use chrono::{DateTime, Utc};
use kyc_types::{KycStatus, UserId, VerificationRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;

use crate::error::{SyncError, SyncResult};

/// Outcome shared between the fetch leader and every joined waiter.
#[derive(Debug, Clone)]
pub(crate) enum FetchOutcome {
    Resolved(VerificationRecord),
    Failed(String),
    TimedOut(u64),
}

/// What a caller should do after consulting the cache.
pub(crate) enum FetchPlan {
    /// Cached record is fresh enough; no network.
    Fresh(VerificationRecord),

    /// A fetch is already in flight; await its outcome.
    Join(broadcast::Receiver<FetchOutcome>),

    /// No usable record and nothing in flight; this caller leads.
    Lead {
        fetch_id: u64,
        tx: broadcast::Sender<FetchOutcome>,
    },
}

/// Result of applying a finished fetch to the cache.
pub(crate) enum StoreResult {
    Stored { previous: Option<KycStatus> },

    /// The entry was reset (sign-out) or re-led while the fetch ran; the
    /// result must be dropped, never applied to fresh identity state.
    Superseded,
}

struct InFlight {
    id: u64,
    tx: broadcast::Sender<FetchOutcome>,
}

#[derive(Default)]
struct CacheEntry {
    record: Option<VerificationRecord>,
    in_flight: Option<InFlight>,
    last_error: Option<String>,
}

/// Per-user cache with single-flight bookkeeping.
#[derive(Default)]
pub(crate) struct StatusCache {
    entries: Mutex<HashMap<UserId, CacheEntry>>,
    next_fetch_id: AtomicU64,
}

impl StatusCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> SyncResult<MutexGuard<'_, HashMap<UserId, CacheEntry>>> {
        self.entries.lock().map_err(|_| SyncError::LockPoisoned)
    }

    /// Decide, atomically, whether a caller gets the cached record, joins
    /// the in-flight fetch, or becomes the leader of a new one.
    pub(crate) fn plan_fetch(
        &self,
        user_id: &UserId,
        max_age: Duration,
        force_refresh: bool,
        now: DateTime<Utc>,
    ) -> SyncResult<FetchPlan> {
        let mut entries = self.lock()?;
        let entry = entries.entry(user_id.clone()).or_default();

        if !force_refresh {
            if let Some(record) = &entry.record {
                if record.age(now) < max_age {
                    return Ok(FetchPlan::Fresh(record.clone()));
                }
            }
        }

        if let Some(in_flight) = &entry.in_flight {
            return Ok(FetchPlan::Join(in_flight.tx.subscribe()));
        }

        let (tx, _) = broadcast::channel(1);
        let fetch_id = self.next_fetch_id.fetch_add(1, Ordering::SeqCst);
        entry.in_flight = Some(InFlight {
            id: fetch_id,
            tx: tx.clone(),
        });
        Ok(FetchPlan::Lead { fetch_id, tx })
    }

    /// Store a resolved record and clear the in-flight marker, in that
    /// order, under one lock. Returns the previously cached status so the
    /// coordinator can detect transitions.
    pub(crate) fn complete_fetch(
        &self,
        user_id: &UserId,
        fetch_id: u64,
        record: VerificationRecord,
    ) -> SyncResult<StoreResult> {
        let mut entries = self.lock()?;
        match entries.get_mut(user_id) {
            Some(entry) if entry.owns_fetch(fetch_id) => {
                let previous = entry.record.as_ref().map(|r| r.kyc_status);
                entry.record = Some(record);
                entry.last_error = None;
                entry.in_flight = None;
                Ok(StoreResult::Stored { previous })
            }
            _ => Ok(StoreResult::Superseded),
        }
    }

    /// Record a failed or timed-out fetch: keep the previous record for
    /// display continuity, retain the error, clear the in-flight marker.
    pub(crate) fn fail_fetch(
        &self,
        user_id: &UserId,
        fetch_id: u64,
        message: String,
    ) -> SyncResult<()> {
        let mut entries = self.lock()?;
        if let Some(entry) = entries.get_mut(user_id) {
            if entry.owns_fetch(fetch_id) {
                entry.last_error = Some(message);
                entry.in_flight = None;
            }
        }
        Ok(())
    }

    pub(crate) fn get_record(&self, user_id: &UserId) -> SyncResult<Option<VerificationRecord>> {
        Ok(self
            .lock()?
            .get(user_id)
            .and_then(|entry| entry.record.clone()))
    }

    pub(crate) fn last_error(&self, user_id: &UserId) -> SyncResult<Option<String>> {
        Ok(self
            .lock()?
            .get(user_id)
            .and_then(|entry| entry.last_error.clone()))
    }

    /// Drop one user's entry. Any fetch still in flight for it becomes
    /// superseded and its result is discarded on completion.
    pub(crate) fn clear(&self, user_id: &UserId) -> SyncResult<()> {
        self.lock()?.remove(user_id);
        Ok(())
    }

    /// Drop every entry. Called on sign-out, before any UI for a new
    /// identity mounts, so stale cross-user data can never leak.
    pub(crate) fn clear_all(&self) -> SyncResult<()> {
        self.lock()?.clear();
        Ok(())
    }
}

impl CacheEntry {
    fn owns_fetch(&self, fetch_id: u64) -> bool {
        self.in_flight.as_ref().map(|f| f.id) == Some(fetch_id)
    }
}
