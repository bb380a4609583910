//! KYC Policy - Access decision evaluation
//!
//! A single pure function maps a verification record plus a declared
//! requirement to an allow/deny decision. No I/O, no clock, no side
//! effects: given the same two inputs it always returns the same decision,
//! which is what makes the fail-closed default auditable and the whole
//! thing unit-testable in isolation.
//!
//! Gated views must route every access decision through [`evaluate`];
//! ad hoc boolean checks on the raw record would scatter the fail-closed
//! default across the codebase.

#![deny(unsafe_code)]

use kyc_types::{AccessRequirement, KycStatus, VerificationRecord};
use serde::{Deserialize, Serialize};

/// Why a decision came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Every declared requirement is satisfied.
    Granted,

    /// No record exists yet; access is denied until status is known.
    StatusUnknown,

    /// Identity verification does not satisfy the requirement.
    KycNotVerified(KycStatus),

    /// The email axis is required but unconfirmed.
    EmailNotVerified,
}

/// Outcome of evaluating a requirement against a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl AccessDecision {
    fn granted() -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::Granted,
        }
    }

    fn denied(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.allowed
    }
}

/// Evaluate a requirement against the last-known verification record.
///
/// An absent record always denies: gating must never show protected
/// content while status is unknown, including the window before the first
/// fetch resolves.
pub fn evaluate(
    record: Option<&VerificationRecord>,
    requirement: &AccessRequirement,
) -> AccessDecision {
    let Some(record) = record else {
        return AccessDecision::denied(DecisionReason::StatusUnknown);
    };

    if requirement.require_kyc {
        let satisfied = match record.kyc_status {
            KycStatus::Verified => true,
            KycStatus::Pending => requirement.allow_pending,
            KycStatus::Unverified | KycStatus::Rejected => false,
        };
        if !satisfied {
            return AccessDecision::denied(DecisionReason::KycNotVerified(record.kyc_status));
        }
    }

    if requirement.require_email_verified && !record.email_verified {
        return AccessDecision::denied(DecisionReason::EmailNotVerified);
    }

    AccessDecision::granted()
}
