//! Request signing contracts that attach access secrets to arbitrary HTTP clients.

// std
#[cfg(feature = "reqwest")] use std::convert::Infallible;
// crates.io
use oauth2::{
	HttpRequest,
	http::header::{AUTHORIZATION, HeaderValue},
};
// self
use crate::{_prelude::*, auth::TokenSecret, error::TransportError};

/// Describes how to attach an access secret to an outbound request without constraining the HTTP
/// client type.
pub trait RequestSignerExt<Request, Error>
where
	Self: Send + Sync,
{
	/// Consumes the provided request and injects the access secret.
	fn attach_token(&self, request: Request, token: &TokenSecret) -> Result<Request, Error>;
}

/// Signer that sets `Authorization: Bearer <access secret>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BearerSigner;
impl RequestSignerExt<HttpRequest, Error> for BearerSigner {
	fn attach_token(
		&self,
		mut request: HttpRequest,
		token: &TokenSecret,
	) -> Result<HttpRequest, Error> {
		let mut value = HeaderValue::try_from(format!("Bearer {}", token.expose())).map_err(|_| {
			TransportError::InvalidResponse { reason: "access token is not a valid header value" }
		})?;

		value.set_sensitive(true);
		request.headers_mut().insert(AUTHORIZATION, value);

		Ok(request)
	}
}
#[cfg(feature = "reqwest")]
impl RequestSignerExt<reqwest::RequestBuilder, Infallible> for BearerSigner {
	fn attach_token(
		&self,
		request: reqwest::RequestBuilder,
		token: &TokenSecret,
	) -> Result<reqwest::RequestBuilder, Infallible> {
		Ok(request.bearer_auth(token.expose()))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn bearer_header_is_sensitive() {
		let request = oauth2::http::Request::builder()
			.uri("https://api.example.com/ledger")
			.body(Vec::new())
			.expect("Request fixture should build.");
		let signed = BearerSigner
			.attach_token(request, &TokenSecret::new("AT1"))
			.expect("Valid token should be attached.");
		let header = signed.headers().get(AUTHORIZATION).expect("Authorization header should be set.");

		assert_eq!(header.to_str().ok(), Some("Bearer AT1"));
		assert!(header.is_sensitive());
	}

	#[test]
	fn control_characters_are_rejected() {
		let request = oauth2::http::Request::builder()
			.uri("https://api.example.com/ledger")
			.body(Vec::new())
			.expect("Request fixture should build.");
		let err = BearerSigner
			.attach_token(request, &TokenSecret::new("AT\n1"))
			.expect_err("Header injection must be refused.");

		assert!(matches!(err, Error::Transport(TransportError::InvalidResponse { .. })));
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn reqwest_builder_gets_bearer_auth() {
		let client = ReqwestClient::new();
		let builder = BearerSigner
			.attach_token(client.get("https://api.example.com/ledger"), &TokenSecret::new("AT1"))
			.unwrap_or_else(|never| match never {});
		let request = builder.build().expect("Request should build.");

		assert_eq!(
			request.headers().get(reqwest::header::AUTHORIZATION).and_then(|v| v.to_str().ok()),
			Some("Bearer AT1")
		);
	}
}
