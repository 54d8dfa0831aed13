//! StudyTailor API client
//!
//! Wraps the StudyTailor REST backend behind a session-managed HTTP client:
//! every request carries a currently-valid bearer credential, expired
//! credentials are healed transparently through the refresh endpoint, and an
//! unrecoverable session surfaces as [`error::ClientError::SessionExpired`]
//! together with the registered session-expired signal.

pub mod claims;
pub mod client;
pub mod error;
pub mod types;

pub use client::{StudyTailorClient, StudyTailorClientBuilder};
pub use error::ClientError;
