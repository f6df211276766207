//! Lifecycle-level error types shared by the manager, the exchange client, and configuration.

// self
use crate::{_prelude::*, auth::PrincipalKey, provider::GrantType};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Every failure is an explicit variant; the manager never hands out an empty token in place of
/// an error.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The principal has no stored refresh secret and must go through authorization again.
	#[error("Principal `{principal}` has not completed authorization.")]
	NotAuthorized {
		/// Principal that was looked up.
		principal: PrincipalKey,
	},
	/// The identity provider rejected the grant (bad or used code, bad client credentials).
	#[error("Identity provider rejected the {grant} grant: {reason}.")]
	ExchangeRejected {
		/// Grant that was rejected.
		grant: GrantType,
		/// Rejection category derived from the provider's error payload.
		kind: RejectionKind,
		/// Provider-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Network, timeout, or malformed-response failure.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl Error {
	/// Returns `true` for transport-class failures.
	///
	/// Retrying is only safe for `refresh_token` grants; authorization codes are single-use and
	/// must never be replayed.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Transport(_))
	}

	/// Returns `true` when the provider rejected the grant.
	pub fn is_rejected(&self) -> bool {
		matches!(self, Self::ExchangeRejected { .. })
	}
}
impl From<std::convert::Infallible> for Error {
	fn from(never: std::convert::Infallible) -> Self {
		match never {}
	}
}

/// Category of a provider-side grant rejection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
	/// The code or refresh token is invalid, expired, or already used.
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Requested scopes are invalid or exceed what was granted.
	InvalidScope,
	/// Any other client-visible OAuth error (`invalid_request`, `unsupported_grant_type`, ...).
	Other,
}
impl RejectionKind {
	/// Returns a stable label suitable for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			RejectionKind::InvalidGrant => "invalid_grant",
			RejectionKind::InvalidClient => "invalid_client",
			RejectionKind::InvalidScope => "invalid_scope",
			RejectionKind::Other => "other",
		}
	}
}
impl Display for RejectionKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Transport-class failures. Safe to retry for refresh grants.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
	/// The token endpoint did not answer within the configured timeout.
	#[error("Request to the token endpoint timed out.")]
	Timeout,
	/// Provider reported a temporary failure (5xx, 429, `temporarily_unavailable`).
	#[error("Token endpoint is temporarily unavailable: {message}.")]
	Upstream {
		/// Provider- or client-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	MalformedResponse {
		/// Structured parsing failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint response parsed but violates the token response contract.
	#[error("Token endpoint response is invalid: {reason}.")]
	InvalidResponse {
		/// Contract violation description.
		reason: &'static str,
	},
	/// Any other client-level failure reported by the transport.
	#[error("HTTP client error occurred while calling the token endpoint: {message}.")]
	Other {
		/// Client-supplied message.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A required client setting is empty.
	#[error("Client configuration field `{field}` cannot be empty.")]
	EmptyField {
		/// Name of the empty field.
		field: &'static str,
	},
	/// The cached-TTL safety factor is outside `(0, 1]`.
	#[error("The ttl_factor value {factor} must be within (0, 1].")]
	InvalidTtlFactor {
		/// Rejected factor.
		factor: f64,
	},
	/// The request timeout is zero.
	#[error("The request timeout must be at least one second.")]
	ZeroTimeout,
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Grant parameters carry a `grant_type` the exchange client does not perform.
	#[error(transparent)]
	UnknownGrantType(#[from] crate::provider::UnknownGrantType),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}
