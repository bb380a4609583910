//! Access gate: resolve-then-evaluate for one requirement.

use chrono::Utc;
use kyc_policy::{evaluate, DecisionReason};
use kyc_sync::{RefreshOptions, SyncCoordinator};
use kyc_types::{AccessRequirement, UserId, VerificationRecord};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// How stale a last-known record may be and still gate content when a
/// refresh fails. Past this bound a stale `verified` degrades to denial.
const DEFAULT_MAX_STALE: Duration = Duration::from_secs(300);

/// What a gated view should render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateState {
    /// No status known yet; render the loading fallback.
    Unresolved,

    /// Requirement not satisfied; render the denial fallback.
    Denied(DecisionReason),

    /// Requirement satisfied; render protected content.
    Allowed(VerificationRecord),
}

impl GateState {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateState::Allowed(_))
    }
}

/// One gated surface: a requirement bound to the coordinator.
///
/// Cheap to construct per call site; the shared state all lives in the
/// coordinator behind the `Arc`.
#[derive(Clone)]
pub struct AccessGate {
    coordinator: Arc<SyncCoordinator>,
    requirement: AccessRequirement,
    options: RefreshOptions,
    max_stale: Duration,
}

impl AccessGate {
    pub fn new(coordinator: Arc<SyncCoordinator>, requirement: AccessRequirement) -> Self {
        Self {
            coordinator,
            requirement,
            options: RefreshOptions::default(),
            max_stale: DEFAULT_MAX_STALE,
        }
    }

    /// Override the refresh options used on every resolve.
    pub fn with_options(mut self, options: RefreshOptions) -> Self {
        self.options = options;
        self
    }

    /// Tighten the bound past which a stale record stops gating content
    /// after a failed refresh.
    pub fn with_max_stale(mut self, max_stale: Duration) -> Self {
        self.max_stale = max_stale;
        self
    }

    /// Refresh the status and evaluate the requirement.
    ///
    /// A fetch failure degrades to the last-known record for display
    /// continuity, but only within the staleness bound; beyond it, or with
    /// no record at all, the gate denies.
    pub async fn resolve(&self, user_id: &UserId) -> GateState {
        match self.coordinator.ensure_fresh(user_id, self.options).await {
            Ok(record) => self.decide(Some(record)),
            Err(err) => {
                warn!(
                    user_id = %user_id,
                    error = %err,
                    "status refresh failed, evaluating last-known record"
                );
                self.decide(self.usable_cached(user_id))
            }
        }
    }

    /// Evaluate against the cache only, without any network. Used for
    /// first paint before the resolve future completes.
    pub fn peek(&self, user_id: &UserId) -> GateState {
        match self.coordinator.get_cached(user_id) {
            None => GateState::Unresolved,
            Some(record) => self.decide(Some(record)),
        }
    }

    /// Last-known record, unless it has aged past the staleness bound.
    fn usable_cached(&self, user_id: &UserId) -> Option<VerificationRecord> {
        let record = self.coordinator.get_cached(user_id)?;
        if record.age(Utc::now()) > self.max_stale {
            warn!(
                user_id = %user_id,
                "last-known record too stale to gate content, failing closed"
            );
            return None;
        }
        Some(record)
    }

    fn decide(&self, record: Option<VerificationRecord>) -> GateState {
        let decision = evaluate(record.as_ref(), &self.requirement);
        if decision.allowed {
            match record {
                Some(record) => GateState::Allowed(record),
                // evaluate() grants only when a record exists.
                None => GateState::Denied(DecisionReason::StatusUnknown),
            }
        } else {
            GateState::Denied(decision.reason)
        }
    }
}
