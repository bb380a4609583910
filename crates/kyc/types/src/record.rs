//! Verification records as resolved from the status source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ids::UserId;
use crate::status::KycStatus;

/// Validated payload from the status source, after wire normalization.
///
/// Carries no user identity; the coordinator pairs it with the `UserId` it
/// asked about when building a [`VerificationRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub kyc_status: KycStatus,
    pub email_verified: bool,
    pub rejection_reason: Option<String>,
}

impl StatusReport {
    /// Build a report, dropping a rejection reason that does not belong to
    /// a rejected status.
    pub fn new(
        kyc_status: KycStatus,
        email_verified: bool,
        rejection_reason: Option<String>,
    ) -> Self {
        let rejection_reason = if kyc_status == KycStatus::Rejected {
            rejection_reason
        } else {
            None
        };
        Self {
            kyc_status,
            email_verified,
            rejection_reason,
        }
    }
}

/// Authoritative KYC state for one user at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub user_id: UserId,

    pub kyc_status: KycStatus,

    /// Independent axis from `kyc_status`: a user can confirm their email
    /// before or after identity review completes.
    pub email_verified: bool,

    /// Present only when `kyc_status` is `Rejected`.
    pub rejection_reason: Option<String>,

    /// Retrieval timestamp, used for freshness decisions.
    pub fetched_at: DateTime<Utc>,
}

impl VerificationRecord {
    pub fn from_report(user_id: UserId, report: StatusReport, fetched_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            kyc_status: report.kyc_status,
            email_verified: report.email_verified,
            rejection_reason: report.rejection_reason,
            fetched_at,
        }
    }

    /// Full access is always derived from the status, never stored, so it
    /// cannot drift from the underlying record.
    pub fn has_full_access(&self) -> bool {
        self.kyc_status.is_verified()
    }

    /// Derived access including the email axis, for surfaces that require
    /// a confirmed contact address.
    pub fn full_access_with_verified_email(&self) -> bool {
        self.has_full_access() && self.email_verified
    }

    /// Age of this record relative to `now`. Clock skew that would make
    /// the record appear fetched in the future reads as zero age.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.fetched_at).to_std().unwrap_or(Duration::ZERO)
    }
}
