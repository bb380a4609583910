//! The sync coordinator: single source of truth for verification status.
//!
//! Every gated surface funnels through [`SyncCoordinator::ensure_fresh`].
//! Concurrent callers for the same user share one fetch, fresh cached
//! records short-circuit without network traffic, and status transitions
//! fan out through the change notifier exactly once.

use chrono::Utc;
use kyc_notify::{ChangeNotifier, StatusChange};
use kyc_source::StatusSource;
use kyc_types::{KycStatus, UserId, VerificationRecord};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::cache::{FetchOutcome, FetchPlan, StatusCache, StoreResult};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};

/// Per-call refresh options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshOptions {
    /// Skip the freshness short-circuit. An in-flight fetch is still
    /// joined rather than duplicated.
    pub force_refresh: bool,

    /// Override the configured freshness bound for this call.
    pub max_age: Option<Duration>,
}

impl RefreshOptions {
    pub fn forced() -> Self {
        Self {
            force_refresh: true,
            max_age: None,
        }
    }
}

/// Coordinates status fetches against the source and owns the cache.
///
/// The cache is not reachable from outside this type: displays read
/// through [`get_cached`](Self::get_cached), decisions go through the
/// policy evaluator, and every mutation happens here.
pub struct SyncCoordinator {
    cache: Arc<StatusCache>,
    source: Arc<dyn StatusSource>,
    notifier: Arc<ChangeNotifier>,
    config: SyncConfig,
}

impl SyncCoordinator {
    pub fn new(source: Arc<dyn StatusSource>) -> Self {
        Self::with_config(source, SyncConfig::default())
    }

    pub fn with_config(source: Arc<dyn StatusSource>, config: SyncConfig) -> Self {
        Self {
            cache: Arc::new(StatusCache::new()),
            source,
            notifier: Arc::new(ChangeNotifier::new()),
            config,
        }
    }

    /// Register a status change subscriber.
    ///
    /// Subscribers run synchronously after the cache update and must not
    /// call back into the coordinator.
    pub fn on_status_change(&self, subscriber: impl Fn(&StatusChange) + Send + Sync + 'static) {
        self.notifier.subscribe(subscriber);
    }

    /// Return a verification record no older than the freshness bound,
    /// fetching from the source when necessary.
    ///
    /// Safe to call redundantly and frequently: a fresh cached record
    /// costs one mutex acquisition, and N concurrent callers for the same
    /// user produce exactly one source fetch. The underlying fetch runs in
    /// its own task, so dropping this future never strands the in-flight
    /// marker.
    pub async fn ensure_fresh(
        &self,
        user_id: &UserId,
        options: RefreshOptions,
    ) -> SyncResult<VerificationRecord> {
        let max_age = options.max_age.unwrap_or(self.config.max_age);
        let plan = self
            .cache
            .plan_fetch(user_id, max_age, options.force_refresh, Utc::now())?;

        let mut rx = match plan {
            FetchPlan::Fresh(record) => {
                debug!(user_id = %user_id, "status cache hit");
                return Ok(record);
            }
            FetchPlan::Join(rx) => {
                debug!(user_id = %user_id, "joining in-flight status fetch");
                rx
            }
            FetchPlan::Lead { fetch_id, tx } => {
                debug!(user_id = %user_id, fetch_id, "leading status fetch");
                let rx = tx.subscribe();
                self.spawn_fetch(user_id.clone(), fetch_id, tx);
                rx
            }
        };

        match rx.recv().await {
            Ok(FetchOutcome::Resolved(record)) => Ok(record),
            Ok(FetchOutcome::Failed(message)) => Err(SyncError::Fetch {
                user_id: user_id.clone(),
                message,
            }),
            Ok(FetchOutcome::TimedOut(timeout_ms)) => Err(SyncError::Timeout {
                user_id: user_id.clone(),
                timeout_ms,
            }),
            Err(broadcast::error::RecvError::Closed)
            | Err(broadcast::error::RecvError::Lagged(_)) => {
                Err(SyncError::Interrupted(user_id.clone()))
            }
        }
    }

    /// Last resolved record, for display only. Access decisions must go
    /// through the policy evaluator, never ad hoc checks on this value.
    pub fn get_cached(&self, user_id: &UserId) -> Option<VerificationRecord> {
        self.cache.get_record(user_id).ok().flatten()
    }

    /// Error retained from the most recent failed fetch, cleared by the
    /// next success.
    pub fn last_error(&self, user_id: &UserId) -> Option<String> {
        self.cache.last_error(user_id).ok().flatten()
    }

    /// Drop one user's cached state.
    pub fn reset(&self, user_id: &UserId) -> SyncResult<()> {
        self.cache.clear(user_id)
    }

    /// Sign-out hook: drop everything. The authentication layer must call
    /// this before any UI for a new identity mounts. A fetch still in
    /// flight completes but its result is discarded.
    pub fn reset_all(&self) -> SyncResult<()> {
        self.cache.clear_all()
    }

    fn spawn_fetch(&self, user_id: UserId, fetch_id: u64, tx: broadcast::Sender<FetchOutcome>) {
        let cache = Arc::clone(&self.cache);
        let source = Arc::clone(&self.source);
        let notifier = Arc::clone(&self.notifier);
        let fetch_timeout = self.config.fetch_timeout;

        tokio::spawn(async move {
            let (outcome, change) =
                run_fetch(&cache, source.as_ref(), &user_id, fetch_id, fetch_timeout).await;
            // Waiters get their outcome before any subscriber runs, so
            // the resolution can never hinge on subscriber behavior.
            // Receivers may all have gone away; that is fine.
            let _ = tx.send(outcome);
            if let Some(change) = change {
                notifier.emit(&change);
            }
        });
    }
}

/// Execute one fetch and apply its outcome to the cache.
///
/// Always produces an outcome, so joined waiters can never hang on the
/// broadcast channel. The transition event, if any, is returned rather
/// than emitted here; fan-out happens after the outcome is broadcast.
async fn run_fetch(
    cache: &StatusCache,
    source: &dyn StatusSource,
    user_id: &UserId,
    fetch_id: u64,
    fetch_timeout: Duration,
) -> (FetchOutcome, Option<StatusChange>) {
    match tokio::time::timeout(fetch_timeout, source.fetch_status(user_id)).await {
        Ok(Ok(report)) => {
            let record = VerificationRecord::from_report(user_id.clone(), report, Utc::now());
            match cache.complete_fetch(user_id, fetch_id, record.clone()) {
                Ok(StoreResult::Stored { previous }) => {
                    let change = transition_change(user_id, previous, record.kyc_status);
                    (FetchOutcome::Resolved(record), change)
                }
                Ok(StoreResult::Superseded) => {
                    debug!(user_id = %user_id, fetch_id, "discarding superseded fetch result");
                    (FetchOutcome::Resolved(record), None)
                }
                Err(err) => (FetchOutcome::Failed(err.to_string()), None),
            }
        }
        Ok(Err(err)) => {
            warn!(user_id = %user_id, error = %err, "status fetch failed");
            let message = err.to_string();
            if let Err(err) = cache.fail_fetch(user_id, fetch_id, message.clone()) {
                return (FetchOutcome::Failed(err.to_string()), None);
            }
            (FetchOutcome::Failed(message), None)
        }
        Err(_elapsed) => {
            let timeout_ms = fetch_timeout.as_millis() as u64;
            warn!(user_id = %user_id, timeout_ms, "status fetch timed out");
            let message = format!("timed out after {}ms", timeout_ms);
            if let Err(err) = cache.fail_fetch(user_id, fetch_id, message) {
                return (FetchOutcome::Failed(err.to_string()), None);
            }
            (FetchOutcome::TimedOut(timeout_ms), None)
        }
    }
}

/// Build the change event when, and only when, the status actually moved.
fn transition_change(
    user_id: &UserId,
    previous: Option<KycStatus>,
    new: KycStatus,
) -> Option<StatusChange> {
    // First resolution: nothing to compare against, nothing to announce.
    let previous = previous?;
    if previous == new {
        return None;
    }

    if !KycStatus::is_expected_transition(previous, new) {
        warn!(
            user_id = %user_id,
            previous = %previous,
            new = %new,
            "unexpected status transition reported by source"
        );
    }

    info!(
        user_id = %user_id,
        previous = %previous,
        new = %new,
        "verification status changed"
    );
    Some(StatusChange {
        user_id: user_id.clone(),
        previous: Some(previous),
        new,
    })
}
