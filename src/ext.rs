//! Extension contracts for attaching issued access secrets to outbound requests.
//!
//! [`TokenManager::sign`](crate::lifecycle::TokenManager::sign) fetches a valid access secret and
//! delegates to a [`RequestSignerExt`] so hosts can keep their own HTTP client types.

pub mod request_signer;

pub use request_signer::*;
