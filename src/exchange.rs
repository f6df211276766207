//! Authorization exchange contract between the manager and the token endpoint.
//!
//! The manager builds [`GrantParameters`] and hands them to an [`ExchangeClient`]; the client
//! performs exactly one request against the identity provider and returns a [`TokenGrant`] or an
//! error that keeps provider rejections apart from transport failures. The crate ships
//! [`TokenEndpointClient`](crate::oauth::TokenEndpointClient); tests and hosts with unusual
//! transports can implement the trait directly.

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	provider::{GrantType, UnknownGrantType},
};

/// Boxed future returned by [`ExchangeClient::exchange`].
pub type ExchangeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Performs one token endpoint exchange.
pub trait ExchangeClient
where
	Self: Send + Sync,
{
	/// Posts `grant` to the token endpoint and parses the issued tokens.
	fn exchange<'a>(&'a self, grant: &'a GrantParameters) -> ExchangeFuture<'a, TokenGrant>;
}

const REDACTED_PARAMS: [&str; 3] = ["client_secret", "code", "refresh_token"];

/// Form parameters for a single grant request.
///
/// Kept in key order so the encoded body is deterministic. `Debug` output redacts the client
/// secret, the authorization code, and the refresh token.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct GrantParameters(BTreeMap<String, String>);
impl GrantParameters {
	/// Starts a parameter set for `grant`.
	pub fn new(grant: GrantType) -> Self {
		let mut params = Self::default();

		params.insert("grant_type", grant.as_str());

		params
	}

	/// Inserts or replaces a parameter.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
		self.0.insert(key.into(), value.into());

		self
	}

	/// Builder-style [`insert`](Self::insert).
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.insert(key, value);

		self
	}

	/// Removes a parameter, returning its value.
	pub fn remove(&mut self, key: &str) -> Option<String> {
		self.0.remove(key)
	}

	/// Returns a parameter value.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// Parses the `grant_type` parameter.
	pub fn grant_type(&self) -> Result<GrantType, UnknownGrantType> {
		self.get("grant_type").unwrap_or_default().parse()
	}

	/// Iterates parameters in key order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
	}

	/// Encodes the parameters as an `application/x-www-form-urlencoded` body.
	pub fn to_form_body(&self) -> String {
		url::form_urlencoded::Serializer::new(String::new()).extend_pairs(self.iter()).finish()
	}
}
impl Debug for GrantParameters {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut map = f.debug_map();

		for (key, value) in self.iter() {
			if REDACTED_PARAMS.contains(&key) {
				map.entry(&key, &"<redacted>");
			} else {
				map.entry(&key, &value);
			}
		}

		map.finish()
	}
}

/// Tokens issued by one successful exchange.
#[derive(Clone, Debug)]
pub struct TokenGrant {
	/// Newly issued access secret.
	pub access_secret: TokenSecret,
	/// Refresh secret, when the provider issued one with this response.
	pub refresh_secret: Option<TokenSecret>,
	/// Provider-declared access lifetime.
	pub expires_in: Duration,
}
