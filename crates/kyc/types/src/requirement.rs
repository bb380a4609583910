//! Declarative access requirements.

use serde::{Deserialize, Serialize};

/// What a gated surface demands before it renders protected content.
///
/// Constructed fresh at each call site and passed by value; requirements
/// are never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequirement {
    /// The surface is gated on identity verification at all.
    pub require_kyc: bool,

    /// A `pending` status also satisfies the KYC requirement.
    pub allow_pending: bool,

    /// The user's email address must additionally be confirmed.
    pub require_email_verified: bool,
}

impl AccessRequirement {
    /// Ungated surface (marketing pages, verification status banner).
    pub fn none() -> Self {
        Self {
            require_kyc: false,
            allow_pending: false,
            require_email_verified: false,
        }
    }

    /// Balances, cards, transfers: full verification only.
    pub fn full_verification() -> Self {
        Self {
            require_kyc: true,
            allow_pending: false,
            require_email_verified: false,
        }
    }

    /// Support messaging: applicants under review may already reach support.
    pub fn pending_allowed() -> Self {
        Self {
            require_kyc: true,
            allow_pending: true,
            require_email_verified: false,
        }
    }

    /// Document downloads: verified identity and a confirmed email address.
    pub fn verified_contact() -> Self {
        Self {
            require_kyc: true,
            allow_pending: false,
            require_email_verified: true,
        }
    }
}

impl Default for AccessRequirement {
    fn default() -> Self {
        Self::full_verification()
    }
}
