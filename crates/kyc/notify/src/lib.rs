//! KYC Notify - Status transition fan-out
//!
//! Delivers status transition events to the portal's notification surface
//! (toasts, badges). Delivery is best-effort and fire-and-forget: a broken
//! subscriber must never block or fail the status resolution that produced
//! the event, so each callback is isolated and a panic inside one is
//! swallowed and logged.

#![deny(unsafe_code)]

use kyc_types::{KycStatus, UserId};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

/// A resolved status that differs from the previously cached one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub user_id: UserId,

    /// `None` only while diffing inside the coordinator; emitted events
    /// always carry the previously cached status.
    pub previous: Option<KycStatus>,

    pub new: KycStatus,
}

/// Subscriber callback invoked for each emitted change.
pub type ChangeSubscriber = Box<dyn Fn(&StatusChange) + Send + Sync>;

/// Registry of change subscribers.
///
/// Subscribers are invoked synchronously, after the coordinator has
/// broadcast the fetch outcome to its waiters. They must not call back
/// into the coordinator: a notify-triggered refresh would loop.
#[derive(Default)]
pub struct ChangeNotifier {
    subscribers: RwLock<Vec<ChangeSubscriber>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber. There is no unsubscribe: the registry lives
    /// for the process, matching the notification surface it feeds.
    pub fn subscribe(&self, subscriber: impl Fn(&StatusChange) + Send + Sync + 'static) {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(subscriber));
    }

    /// Deliver a change to every subscriber, best-effort.
    ///
    /// A subscriber panic is caught and logged; remaining subscribers
    /// still receive the event.
    pub fn emit(&self, change: &StatusChange) {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        debug!(
            user_id = %change.user_id,
            new = %change.new,
            subscribers = subscribers.len(),
            "emitting status change"
        );
        for subscriber in subscribers.iter() {
            if catch_unwind(AssertUnwindSafe(|| subscriber(change))).is_err() {
                warn!(
                    user_id = %change.user_id,
                    new = %change.new,
                    "status change subscriber panicked"
                );
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
