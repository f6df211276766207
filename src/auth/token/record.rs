//! Per-principal credential record and its expiry semantics.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Lifecycle status of the access portion of a [`CredentialRecord`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessStatus {
	/// The access secret may be handed out.
	Active,
	/// The access secret reached its expiry and must be refreshed.
	Expired,
}

/// Credentials held for one principal.
///
/// The refresh secret is always present: a principal without a record has never been
/// authorized. The access secret is only usable while `now < access_expiry`; past that instant
/// [`access_at`](Self::access_at) returns `None` even though the value is still stored.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
	/// Long-lived secret used to mint new access secrets.
	pub refresh_secret: TokenSecret,
	/// Short-lived bearer secret; callers must avoid logging it.
	pub access_secret: TokenSecret,
	/// Instant after which `access_secret` is treated as absent.
	pub access_expiry: OffsetDateTime,
	/// Instant this record was written.
	pub issued_at: OffsetDateTime,
}
impl CredentialRecord {
	/// Builds a record issued at `issued_at` whose access part stays valid for `ttl`.
	///
	/// The expiry saturates at the largest representable instant.
	pub fn new(
		refresh_secret: TokenSecret,
		access_secret: TokenSecret,
		issued_at: OffsetDateTime,
		ttl: Duration,
	) -> Self {
		Self {
			refresh_secret,
			access_secret,
			access_expiry: issued_at.saturating_add(ttl),
			issued_at,
		}
	}

	/// Computes the access status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> AccessStatus {
		if instant < self.access_expiry { AccessStatus::Active } else { AccessStatus::Expired }
	}

	/// Returns the access secret if it is still valid at `instant`.
	pub fn access_at(&self, instant: OffsetDateTime) -> Option<&TokenSecret> {
		match self.status_at(instant) {
			AccessStatus::Active => Some(&self.access_secret),
			AccessStatus::Expired => None,
		}
	}

	/// Returns `true` if the access secret has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), AccessStatus::Expired)
	}

	/// Remaining access lifetime at `instant`, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.access_expiry - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
impl Debug for CredentialRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialRecord")
			.field("refresh_secret", &"<redacted>")
			.field("access_secret", &"<redacted>")
			.field("access_expiry", &self.access_expiry)
			.field("issued_at", &self.issued_at)
			.finish()
	}
}
