//! Test infrastructure for the RSVP-TE auto tunnel mesh manager
//!
//! Provides an in-memory device speaking the command API, fixtures for
//! common device setups and verification helpers for the configuration
//! transactions a manager submits.

pub mod device;
pub mod fixtures;
pub mod verification;

pub use device::{SimulatedDevice, TunnelConfig, INVALID_COMMAND};
pub use verification::{TransactionVerifier, VerificationError, VerifyResult};
