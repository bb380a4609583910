//! KYC Gate - The contract gated views render against
//!
//! A gating view mounts, asks its gate to resolve, and renders one of
//! three states: still loading, denied with a reason, or allowed with the
//! verification record in hand. Views never touch the cache or the policy
//! evaluator directly; the gate wires ensure-fresh, cached reads, and the
//! fail-closed policy together in one place.

#![deny(unsafe_code)]

pub mod binding;
pub mod gate;

pub use binding::GateBinding;
pub use gate::{AccessGate, GateState};
