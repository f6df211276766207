//! Client registration settings injected into the manager at construction time.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	error::ConfigError,
};

/// Fraction of the provider-declared lifetime for which an access secret is served from cache.
///
/// Treating the secret as expired early avoids handing out a token that dies in flight.
pub const DEFAULT_TTL_FACTOR: f64 = 0.75;
/// Default bound on a single token endpoint call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// OAuth client registration used for every grant.
///
/// Deserializable so hosts can load it from whatever configuration source they already use:
///
/// ```toml
/// client_id = "app-123"
/// client_secret = "s3cr3t"
/// redirect_uri = "https://app.example.com/callback"
/// scope = "openid offline_access accounting.transactions"
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret; redacted in `Debug` output.
	pub client_secret: TokenSecret,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
	/// Scopes requested during authorization.
	#[serde(default)]
	pub scope: ScopeSet,
	/// Multiplier applied to `expires_in` before caching an access secret.
	#[serde(default = "default_ttl_factor")]
	pub ttl_factor: f64,
	/// Upper bound, in seconds, on a single token endpoint call.
	#[serde(default = "default_request_timeout_secs")]
	pub request_timeout_secs: u64,
}
impl ClientConfig {
	/// Creates a configuration with the default scope, TTL factor, and timeout.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		redirect_uri: Url,
	) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
			redirect_uri,
			scope: ScopeSet::default(),
			ttl_factor: DEFAULT_TTL_FACTOR,
			request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
		}
	}

	/// Sets the requested scope set.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Overrides the cached-TTL safety factor.
	pub fn with_ttl_factor(mut self, factor: f64) -> Self {
		self.ttl_factor = factor;

		self
	}

	/// Overrides the token endpoint timeout.
	pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
		self.request_timeout_secs = secs;

		self
	}

	/// Token endpoint timeout as a std duration.
	pub fn request_timeout(&self) -> std::time::Duration {
		std::time::Duration::from_secs(self.request_timeout_secs)
	}

	/// Lifetime for which an access secret issued with `expires_in` may be served.
	pub fn cached_ttl(&self, expires_in: Duration) -> Duration {
		Duration::seconds_f64(expires_in.as_seconds_f64() * self.ttl_factor)
	}

	/// Checks that required fields are set and numeric settings are in range.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::EmptyField { field: "client_id" });
		}
		if self.client_secret.is_empty() {
			return Err(ConfigError::EmptyField { field: "client_secret" });
		}
		if !(self.ttl_factor > 0. && self.ttl_factor <= 1.) {
			return Err(ConfigError::InvalidTtlFactor { factor: self.ttl_factor });
		}
		if self.request_timeout_secs == 0 {
			return Err(ConfigError::ZeroTimeout);
		}

		Ok(())
	}
}

fn default_ttl_factor() -> f64 {
	DEFAULT_TTL_FACTOR
}

fn default_request_timeout_secs() -> u64 {
	DEFAULT_REQUEST_TIMEOUT_SECS
}
