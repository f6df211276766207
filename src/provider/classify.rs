//! Token endpoint error classification.
//!
//! The classifier prioritizes structured OAuth fields (`error`, `error_description`), then body
//! text hints, and finally the HTTP status code. It only works on primitive data so it stays
//! independent of the HTTP client.

// self
use crate::{_prelude::*, error::RejectionKind, provider::GrantType};

/// Classification of a failed token request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenErrorClass {
	/// The provider rejected the grant; retrying with the same input is pointless.
	Rejected(RejectionKind),
	/// The failure is temporary and the request may be retried.
	Transient,
}

/// Context collected from a failed token endpoint response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenErrorContext {
	/// Grant type associated with the failing request.
	pub grant_type: GrantType,
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// Provider-supplied OAuth `error` field.
	pub oauth_error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Preview of the response body for non-JSON payloads.
	pub body_preview: Option<String>,
}
impl TokenErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a new context scoped to the provided grant type.
	pub fn new(grant_type: GrantType) -> Self {
		Self {
			grant_type,
			http_status: None,
			oauth_error: None,
			error_description: None,
			body_preview: None,
		}
	}

	/// Adds an HTTP status code (e.g., 400, 401, 500).
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds a truncated body preview for providers that return non-JSON payloads.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}

	/// Human-readable reason, preferring the provider's description.
	pub fn reason(&self) -> String {
		self.error_description
			.clone()
			.or_else(|| self.oauth_error.clone())
			.or_else(|| self.body_preview.clone().filter(|body| !body.trim().is_empty()))
			.unwrap_or_else(|| match self.http_status {
				Some(status) => format!("token endpoint answered HTTP {status}"),
				None => "token endpoint returned an error".into(),
			})
	}

	/// Classifies the failure.
	pub fn classify(&self) -> TokenErrorClass {
		if let Some(class) =
			classify_oauth_error(self.oauth_error.as_deref(), self.error_description.as_deref())
		{
			return class;
		}
		if let Some(class) = classify_body(self.body_preview.as_deref()) {
			return class;
		}

		classify_status(self.http_status)
	}

	/// Converts the context into the crate error matching its classification.
	pub fn into_error(self, retry_after: Option<Duration>) -> Error {
		match self.classify() {
			TokenErrorClass::Rejected(kind) => Error::ExchangeRejected {
				grant: self.grant_type,
				kind,
				reason: self.reason(),
				status: self.http_status,
			},
			TokenErrorClass::Transient => crate::error::TransportError::Upstream {
				message: self.reason(),
				status: self.http_status,
				retry_after,
			}
			.into(),
		}
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= TokenErrorContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = body.chars().take(TokenErrorContext::BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

fn classify_oauth_error(
	oauth_error: Option<&str>,
	error_description: Option<&str>,
) -> Option<TokenErrorClass> {
	oauth_error
		.and_then(match_exact_value)
		.or_else(|| error_description.and_then(match_exact_value))
		.or_else(|| classify_body(error_description))
		.or_else(|| oauth_error.map(|_| TokenErrorClass::Rejected(RejectionKind::Other)))
}

fn match_exact_value(value: &str) -> Option<TokenErrorClass> {
	let value = value.trim();

	if value.eq_ignore_ascii_case("invalid_grant") || value.eq_ignore_ascii_case("access_denied") {
		Some(TokenErrorClass::Rejected(RejectionKind::InvalidGrant))
	} else if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(TokenErrorClass::Rejected(RejectionKind::InvalidClient))
	} else if value.eq_ignore_ascii_case("invalid_scope")
		|| value.eq_ignore_ascii_case("insufficient_scope")
	{
		Some(TokenErrorClass::Rejected(RejectionKind::InvalidScope))
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(TokenErrorClass::Transient)
	} else {
		None
	}
}

fn classify_body(body: Option<&str>) -> Option<TokenErrorClass> {
	let lowered = body?.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant") =>
			Some(TokenErrorClass::Rejected(RejectionKind::InvalidGrant)),
		text if text.contains("invalid_client") =>
			Some(TokenErrorClass::Rejected(RejectionKind::InvalidClient)),
		text if text.contains("insufficient_scope") || text.contains("invalid_scope") =>
			Some(TokenErrorClass::Rejected(RejectionKind::InvalidScope)),
		text if text.contains("temporarily_unavailable") || text.contains("server_error") =>
			Some(TokenErrorClass::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> TokenErrorClass {
	match status {
		Some(400 | 404 | 410) => TokenErrorClass::Rejected(RejectionKind::InvalidGrant),
		Some(401) => TokenErrorClass::Rejected(RejectionKind::InvalidClient),
		Some(403) => TokenErrorClass::Rejected(RejectionKind::InvalidScope),
		Some(408 | 429) => TokenErrorClass::Transient,
		Some(code) if (400..500).contains(&code) => TokenErrorClass::Rejected(RejectionKind::Other),
		_ => TokenErrorClass::Transient,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::TransportError;

	#[test]
	fn oauth_error_fields_take_priority() {
		let ctx = TokenErrorContext::new(GrantType::AuthorizationCode)
			.with_http_status(500)
			.with_oauth_error("invalid_grant");

		assert_eq!(ctx.classify(), TokenErrorClass::Rejected(RejectionKind::InvalidGrant));

		let ctx = TokenErrorContext::new(GrantType::RefreshToken)
			.with_http_status(401)
			.with_oauth_error("unauthorized_client");

		assert_eq!(ctx.classify(), TokenErrorClass::Rejected(RejectionKind::InvalidClient));

		let ctx = TokenErrorContext::new(GrantType::RefreshToken)
			.with_http_status(503)
			.with_oauth_error("temporarily_unavailable");

		assert_eq!(ctx.classify(), TokenErrorClass::Transient);
	}

	#[test]
	fn unknown_oauth_error_is_a_rejection() {
		let ctx = TokenErrorContext::new(GrantType::AuthorizationCode)
			.with_http_status(400)
			.with_oauth_error("unsupported_grant_type");

		assert_eq!(ctx.classify(), TokenErrorClass::Rejected(RejectionKind::Other));
	}

	#[test]
	fn falls_back_to_description_body_and_status() {
		let ctx = TokenErrorContext::new(GrantType::AuthorizationCode)
			.with_error_description("invalid_grant: code already used");

		assert_eq!(ctx.classify(), TokenErrorClass::Rejected(RejectionKind::InvalidGrant));

		let ctx = TokenErrorContext::new(GrantType::RefreshToken)
			.with_body_preview("<html>error=insufficient_scope</html>");

		assert_eq!(ctx.classify(), TokenErrorClass::Rejected(RejectionKind::InvalidScope));
		assert_eq!(
			TokenErrorContext::new(GrantType::RefreshToken).with_http_status(401).classify(),
			TokenErrorClass::Rejected(RejectionKind::InvalidClient)
		);
		assert_eq!(
			TokenErrorContext::new(GrantType::RefreshToken).with_http_status(429).classify(),
			TokenErrorClass::Transient
		);
		assert_eq!(
			TokenErrorContext::new(GrantType::RefreshToken).with_http_status(502).classify(),
			TokenErrorClass::Transient
		);
	}

	#[test]
	fn into_error_splits_rejections_from_transport() {
		let rejected = TokenErrorContext::new(GrantType::AuthorizationCode)
			.with_http_status(400)
			.with_oauth_error("invalid_grant")
			.with_error_description("Authorization code expired")
			.into_error(None);

		match rejected {
			Error::ExchangeRejected { grant, kind, reason, status } => {
				assert_eq!(grant, GrantType::AuthorizationCode);
				assert_eq!(kind, RejectionKind::InvalidGrant);
				assert_eq!(reason, "Authorization code expired");
				assert_eq!(status, Some(400));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}

		let transient = TokenErrorContext::new(GrantType::RefreshToken)
			.with_http_status(503)
			.into_error(Some(Duration::seconds(7)));

		assert!(matches!(
			transient,
			Error::Transport(TransportError::Upstream { status: Some(503), retry_after: Some(_), .. })
		));
	}

	#[test]
	fn long_bodies_are_truncated() {
		let ctx = TokenErrorContext::new(GrantType::RefreshToken).with_body_preview("x".repeat(400));
		let preview = ctx.body_preview.expect("Body preview should be recorded.");

		assert_eq!(preview.chars().count(), TokenErrorContext::BODY_PREVIEW_LIMIT + 1);
		assert!(preview.ends_with('…'));
	}
}
