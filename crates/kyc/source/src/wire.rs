//! Wire-shape normalization for backend responses.
//!
//! The hosted backend has historically emitted both `verified` and
//! `approved` for the terminal-success state, and new tokens have appeared
//! without client coordination. Normalization maps aliases to the canonical
//! enumeration and fails closed on anything unrecognized.

use kyc_types::{KycStatus, StatusReport};
use serde::Deserialize;
use tracing::warn;

/// Untyped verification payload as the backend serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawStatusReport {
    /// Status token; older backend versions use `kycStatus`.
    #[serde(alias = "kycStatus")]
    pub kyc_status: String,

    #[serde(alias = "emailVerified", default)]
    pub email_verified: bool,

    #[serde(alias = "rejectionReason", default)]
    pub rejection_reason: Option<String>,
}

impl RawStatusReport {
    /// Normalize into the closed status enumeration.
    ///
    /// Unknown tokens degrade to `Unverified` rather than erroring: a new
    /// backend state must never crash the portal or, worse, be guessed as
    /// something more permissive.
    pub fn normalize(self) -> StatusReport {
        let kyc_status = match KycStatus::from_wire(&self.kyc_status) {
            Some(status) => status,
            None => {
                warn!(
                    token = %self.kyc_status,
                    "unrecognized kyc status token, treating as unverified"
                );
                KycStatus::Unverified
            }
        };
        StatusReport::new(kyc_status, self.email_verified, self.rejection_reason)
    }
}
