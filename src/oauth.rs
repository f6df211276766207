//! Token endpoint client built on the `oauth2` HTTP primitives.
//!
//! [`TokenEndpointClient`] turns [`GrantParameters`] into one form-encoded POST, hands it to a
//! [`TokenHttpClient`], and maps the answer onto [`TokenGrant`] or the crate's rejected/transport
//! error split. Transport failures go through a [`TransportErrorMapper`] so hosts can plug in
//! their own HTTP stack without losing classification.

pub use oauth2;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{
	AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
	basic::BasicErrorResponse,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransportError},
	exchange::{ExchangeClient, ExchangeFuture, GrantParameters, TokenGrant},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{ClientAuthMethod, GrantType, ProviderDescriptor, TokenErrorContext},
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_ACCEPT: &str = "application/json";

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		grant: GrantType,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		_grant: GrantType,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_generic_transport_error(meta, "unknown transport failure"),
		}
	}
}

/// [`ExchangeClient`] that talks to the provider's token endpoint over a [`TokenHttpClient`].
pub struct TokenEndpointClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	token_url: Url,
	client_auth_method: ClientAuthMethod,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> TokenEndpointClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client for the descriptor's token endpoint.
	pub fn new(
		descriptor: &ProviderDescriptor,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			token_url: descriptor.endpoints.token.clone(),
			client_auth_method: descriptor.client_auth_method,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
		}
	}

	/// Token endpoint this client posts to.
	pub fn token_url(&self) -> &Url {
		&self.token_url
	}

	/// Builds the POST request for `grant`, applying the configured client authentication.
	pub fn build_request(&self, grant: &GrantParameters) -> Result<HttpRequest> {
		let mut form = grant.clone();
		let mut builder = Request::builder()
			.method(Method::POST)
			.uri(self.token_url.as_str())
			.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
			.header(ACCEPT, JSON_ACCEPT);

		if matches!(self.client_auth_method, ClientAuthMethod::ClientSecretBasic) {
			let client_id = form.remove("client_id").unwrap_or_default();
			let client_secret = form.remove("client_secret").unwrap_or_default();

			builder = builder.header(AUTHORIZATION, basic_authorization(&client_id, &client_secret));
		}

		let request = builder.body(form.to_form_body().into_bytes()).map_err(ConfigError::from)?;

		Ok(request)
	}
}
impl<C, M> ExchangeClient for TokenEndpointClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange<'a>(&'a self, grant: &'a GrantParameters) -> ExchangeFuture<'a, TokenGrant> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let grant_type = grant.grant_type().map_err(ConfigError::from)?;
			let request = self.build_request(grant)?;
			let handle = self.http_client.with_metadata(meta.clone());
			let response = handle.call(request).await.map_err(|err| {
				self.error_mapper.map_transport_error(grant_type, meta.take().as_ref(), err)
			})?;

			map_token_response(grant_type, meta.take(), response)
		})
	}
}
impl<C, M> Debug for TokenEndpointClient<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenEndpointClient")
			.field("token_url", &self.token_url.as_str())
			.field("client_auth_method", &self.client_auth_method)
			.finish()
	}
}

// Upper bound on a provider-issued lifetime; larger values cannot be turned into an expiry.
const MAX_EXPIRES_IN: Duration = Duration::days(3650);

#[derive(Deserialize)]
struct TokenEndpointResponse {
	access_token: String,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	expires_in: Option<ExpiresIn>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
	Seconds(f64),
	Text(String),
}
impl ExpiresIn {
	fn into_duration(self) -> std::result::Result<Duration, TransportError> {
		let secs = match self {
			ExpiresIn::Seconds(secs) => secs,
			ExpiresIn::Text(text) => text.trim().parse::<f64>().map_err(|_| {
				TransportError::InvalidResponse { reason: "expires_in is not a number" }
			})?,
		};

		if !secs.is_finite() || secs <= 0. {
			return Err(TransportError::InvalidResponse { reason: "expires_in must be positive" });
		}

		Duration::checked_seconds_f64(secs)
			.filter(|ttl| *ttl <= MAX_EXPIRES_IN)
			.ok_or(TransportError::InvalidResponse { reason: "expires_in is out of range" })
	}
}

fn map_token_response(
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	response: HttpResponse,
) -> Result<TokenGrant> {
	let status = response.status();
	let body = response.body();

	if !status.is_success() {
		return Err(map_error_response(grant, status.as_u16(), meta, body));
	}

	let mut de = serde_json::Deserializer::from_slice(body);
	let parsed: TokenEndpointResponse = serde_path_to_error::deserialize(&mut de).map_err(
		|source| TransportError::MalformedResponse { source, status: Some(status.as_u16()) },
	)?;

	if parsed.access_token.is_empty() {
		return Err(TransportError::InvalidResponse { reason: "access_token is empty" }.into());
	}

	let expires_in = parsed
		.expires_in
		.ok_or(TransportError::InvalidResponse { reason: "expires_in is missing" })?
		.into_duration()?;

	Ok(TokenGrant {
		access_secret: TokenSecret::new(parsed.access_token),
		refresh_secret: parsed.refresh_token.filter(|value| !value.is_empty()).map(TokenSecret::new),
		expires_in,
	})
}

fn map_error_response(
	grant: GrantType,
	status: u16,
	meta: Option<ResponseMetadata>,
	body: &[u8],
) -> Error {
	let mut ctx = TokenErrorContext::new(grant).with_http_status(status);

	match serde_json::from_slice::<BasicErrorResponse>(body) {
		Ok(response) => {
			ctx = ctx.with_oauth_error(response.error().as_ref());

			if let Some(description) = response.error_description() {
				ctx = ctx.with_error_description(description.clone());
			}
		},
		Err(_) => ctx = ctx.with_body_preview(String::from_utf8_lossy(body)),
	}

	ctx.into_error(meta.and_then(|value| value.retry_after))
}

fn basic_authorization(client_id: &str, client_secret: &str) -> String {
	let id = form_urlencoded::byte_serialize(client_id.as_bytes()).collect::<String>();
	let secret = form_urlencoded::byte_serialize(client_secret.as_bytes()).collect::<String>();

	format!("Basic {}", STANDARD.encode(format!("{id}:{secret}")))
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	TransportError::from(err).into()
}

#[cfg(feature = "reqwest")]
fn map_generic_transport_error(meta: Option<&ResponseMetadata>, message: impl Display) -> Error {
	TransportError::Other {
		message: match meta.and_then(|value| value.status) {
			Some(status) => format!("{message} (HTTP {status})"),
			None => message.to_string(),
		},
	}
	.into()
}
