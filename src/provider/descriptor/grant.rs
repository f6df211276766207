// self
use crate::_prelude::*;

/// OAuth 2.0 grant types the lifecycle manager performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Authorization Code grant, used once per principal.
	AuthorizationCode,
	/// Refresh Token grant, used to mint new access secrets.
	RefreshToken,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::RefreshToken => "refresh_token",
		}
	}

	/// Name of the form parameter carrying the grant's credential.
	pub const fn credential_param(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "code",
			GrantType::RefreshToken => "refresh_token",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for GrantType {
	type Err = UnknownGrantType;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"authorization_code" => Ok(GrantType::AuthorizationCode),
			"refresh_token" => Ok(GrantType::RefreshToken),
			other => Err(UnknownGrantType(other.to_owned())),
		}
	}
}

/// Returned when parsing a `grant_type` value the manager does not perform.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Unsupported grant type `{0}`.")]
pub struct UnknownGrantType(pub String);
