//! Identity provider description (data) and token error classification (behavior).
//!
//! `descriptor` exposes the validated endpoints, client authentication preference, and scope
//! delimiter of the single identity provider the manager talks to. `classify` maps RFC 6749
//! error payloads and HTTP statuses onto the crate's rejected/transient split.

pub mod classify;
pub mod descriptor;

pub use classify::*;
pub use descriptor::*;
