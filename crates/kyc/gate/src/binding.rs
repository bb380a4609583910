//! Per-mount gate binding.
//!
//! A refresh is not cancellable: the coordinator always finishes the fetch
//! and updates its state. What a view must guard against is applying the
//! result after it has unmounted. The binding carries that guard so view
//! code cannot forget it.

use kyc_types::UserId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::gate::{AccessGate, GateState};

/// An [`AccessGate`] bound to one mounted view instance.
pub struct GateBinding {
    gate: AccessGate,
    user_id: UserId,
    mounted: Arc<AtomicBool>,
}

impl GateBinding {
    pub fn new(gate: AccessGate, user_id: UserId) -> Self {
        Self {
            gate,
            user_id,
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Resolve the gate; returns `None` when the view unmounted while the
    /// refresh was in flight. Coordinator state is updated either way.
    pub async fn refresh(&self) -> Option<GateState> {
        let state = self.gate.resolve(&self.user_id).await;
        if self.mounted.load(Ordering::SeqCst) {
            Some(state)
        } else {
            None
        }
    }

    /// Cached-only evaluation for first paint.
    pub fn peek(&self) -> GateState {
        self.gate.peek(&self.user_id)
    }

    /// Mark the view as unmounted. Idempotent.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }
}
