//! Principal identifiers used to key credentials.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;

/// Sentinel used by [`PrincipalKey::shared`].
pub const SHARED_PRINCIPAL: &str = "global";

/// Error returned when principal key validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Principal key cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Principal key contains whitespace.")]
	ContainsWhitespace,
	/// The identifier exceeded the allowed byte count.
	#[error("Principal key exceeds {max} bytes.")]
	TooLong {
		/// Maximum permitted length.
		max: usize,
	},
}

/// Opaque identifier for whose credential a record is (session id, account id, ...).
///
/// The key must stay stable between the authorization-code exchange and every later lookup for
/// the same actor. Keys are validated on construction: non-empty, no whitespace, at most 128
/// bytes.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrincipalKey(String);
impl PrincipalKey {
	/// Creates a new key after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Single-tenant sentinel shared by every caller.
	///
	/// All principals that use this key share one credential. Only use it for deployments that
	/// genuinely act on behalf of a single account; the manager logs a warning whenever a code is
	/// exchanged for it.
	pub fn shared() -> Self {
		Self(SHARED_PRINCIPAL.to_owned())
	}

	/// Returns `true` for the [`shared`](Self::shared) sentinel.
	pub fn is_shared(&self) -> bool {
		self.0 == SHARED_PRINCIPAL
	}
}
impl Deref for PrincipalKey {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for PrincipalKey {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for PrincipalKey {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<PrincipalKey> for String {
	fn from(value: PrincipalKey) -> Self {
		value.0
	}
}
impl TryFrom<String> for PrincipalKey {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Debug for PrincipalKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Principal({})", self.0)
	}
}
impl Display for PrincipalKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
impl FromStr for PrincipalKey {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace);
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}
