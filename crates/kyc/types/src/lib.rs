//! KYC Types - Data model for the verification subsystem
//!
//! Defines the closed verification status enumeration, the authoritative
//! verification record, and the declarative access requirements evaluated
//! by the policy crate. Everything here is plain data: no I/O, no clocks,
//! no interior mutability.

#![deny(unsafe_code)]

pub mod ids;
pub mod record;
pub mod requirement;
pub mod status;

pub use ids::UserId;
pub use record::{StatusReport, VerificationRecord};
pub use requirement::AccessRequirement;
pub use status::KycStatus;
