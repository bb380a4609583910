//! Verification status enumeration and transition rules.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of KYC verification states.
///
/// The client never transitions status itself; it only reflects what the
/// status source reports. `Verified` is the canonical terminal-success
/// token; the legacy `approved` spelling used by older backend responses
/// is translated at the source adapter boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    /// No verification has been submitted.
    Unverified,

    /// Documents submitted, review in progress.
    Pending,

    /// Identity check passed.
    Verified,

    /// Identity check failed; resubmission is possible.
    Rejected,
}

impl KycStatus {
    /// Parse a wire token, accepting known legacy aliases.
    ///
    /// Returns `None` for unrecognized tokens so the caller can fail
    /// closed instead of guessing.
    pub fn from_wire(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "unverified" => Some(Self::Unverified),
            "pending" => Some(Self::Pending),
            "verified" | "approved" => Some(Self::Verified),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Whether a transition reported by the source matches the expected
    /// state machine: `unverified → pending → {verified, rejected}`, with
    /// `rejected → pending` on resubmission.
    ///
    /// Advisory only. A server-side demotion away from `Verified` is
    /// unexpected but must still be applied; the coordinator logs it and
    /// stores the new status regardless.
    pub fn is_expected_transition(previous: Self, next: Self) -> bool {
        if previous == next {
            return true;
        }
        matches!(
            (previous, next),
            (Self::Unverified, Self::Pending)
                | (Self::Pending, Self::Verified)
                | (Self::Pending, Self::Rejected)
                | (Self::Rejected, Self::Pending)
        )
    }

    pub fn is_verified(self) -> bool {
        self == Self::Verified
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KycStatus::Unverified => write!(f, "unverified"),
            KycStatus::Pending => write!(f, "pending"),
            KycStatus::Verified => write!(f, "verified"),
            KycStatus::Rejected => write!(f, "rejected"),
        }
    }
}
