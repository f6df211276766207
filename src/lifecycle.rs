//! Token lifecycle orchestration: one code exchange per principal, cached access secrets, and lazy
//! refresh behind a per-principal guard.
//!
//! [`TokenManager`] owns no global state. Hosts construct it with a provider descriptor, the
//! client registration, a [`CredentialStore`], and an [`ExchangeClient`], then share it behind an
//! `Arc` (or clone it; clones share every component).

mod authorize;
mod metrics;
mod refresh;

pub use authorize::*;
pub use metrics::*;

// self
use crate::{
	_prelude::*,
	auth::{PrincipalKey, TokenSecret},
	config::ClientConfig,
	exchange::{ExchangeClient, GrantParameters, TokenGrant},
	ext::RequestSignerExt,
	obs::{self, FlowKind},
	provider::{GrantType, ProviderDescriptor},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")]
use crate::{
	http::ReqwestHttpClient,
	oauth::{ReqwestTransportErrorMapper, TokenEndpointClient},
};

/// Coordinates the authorization-code lifecycle for every principal of one client registration.
///
/// Principals move from unauthorized to authorized through [`TokenManager::exchange_code`] and
/// never move back; access secrets expire by the clock and are renewed on demand by
/// [`TokenManager::get_access_token`]. At most one exchange or refresh is in flight per
/// principal.
#[derive(Clone)]
pub struct TokenManager {
	descriptor: ProviderDescriptor,
	config: ClientConfig,
	store: Arc<CredentialStore>,
	exchange: Arc<dyn ExchangeClient>,
	metrics: Arc<LifecycleMetrics>,
	refresh_guards: Arc<Mutex<HashMap<PrincipalKey, Arc<AsyncMutex<()>>>>>,
}
impl TokenManager {
	/// Creates a manager from explicit components after validating the descriptor and client
	/// configuration.
	pub fn new(
		descriptor: ProviderDescriptor,
		config: ClientConfig,
		store: Arc<CredentialStore>,
		exchange: Arc<dyn ExchangeClient>,
	) -> Result<Self> {
		descriptor.validate().map_err(crate::error::ConfigError::from)?;
		config.validate()?;

		Ok(Self {
			descriptor,
			config,
			store,
			exchange,
			metrics: Default::default(),
			refresh_guards: Default::default(),
		})
	}

	/// Returns `true` once `principal` has completed a code exchange.
	///
	/// Pure in-memory lookup; an expired access secret does not change the answer.
	pub fn is_authorized(&self, principal: &PrincipalKey) -> bool {
		self.store.has_refresh_secret(principal)
	}

	/// Fetches a fresh access secret for `principal` and attaches it to `request` with `signer`.
	///
	/// The request is not sent.
	pub async fn sign<R, E, S>(
		&self,
		principal: &PrincipalKey,
		request: R,
		signer: &S,
	) -> Result<R>
	where
		S: ?Sized + RequestSignerExt<R, E>,
		E: Into<Error>,
	{
		let token = self.get_access_token(principal).await?;

		signer.attach_token(request, &token).map_err(Into::into)
	}

	/// Provider descriptor the manager was built with.
	pub fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	/// Client registration the manager was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Credential store backing the manager.
	pub fn store(&self) -> &Arc<CredentialStore> {
		&self.store
	}

	/// Lifecycle counters.
	pub fn metrics(&self) -> &LifecycleMetrics {
		&self.metrics
	}

	fn guard(&self, principal: &PrincipalKey) -> Arc<AsyncMutex<()>> {
		let mut guards = self.refresh_guards.lock();

		guards.entry(principal.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	/// Drops the principal's guard entry once nobody else holds it and no record exists, so
	/// failed exchanges do not leave entries behind.
	fn release_guard(&self, principal: &PrincipalKey, guard: Arc<AsyncMutex<()>>) {
		let mut guards = self.refresh_guards.lock();

		// Only the map and `guard` hold the mutex.
		if Arc::strong_count(&guard) == 2 && !self.store.has_refresh_secret(principal) {
			guards.remove(principal);
		}
	}

	fn grant_parameters(&self, grant: GrantType, credential: &str) -> GrantParameters {
		let mut params = GrantParameters::new(grant);

		params
			.insert("client_id", self.config.client_id.as_str())
			.insert("client_secret", self.config.client_secret.expose())
			.insert("redirect_uri", self.config.redirect_uri.as_str())
			.insert(grant.credential_param(), credential);

		if let Some(scope) = self.config.scope.join(self.descriptor.scope_delimiter) {
			params.insert("scope", scope);
		}

		params
	}

	fn store_grant(
		&self,
		kind: FlowKind,
		principal: &PrincipalKey,
		refresh_secret: TokenSecret,
		grant: TokenGrant,
	) -> TokenSecret {
		let ttl = self.config.cached_ttl(grant.expires_in);

		obs::log_credentials_stored(kind, principal, &refresh_secret, ttl);
		self.store.put(principal, refresh_secret, grant.access_secret.clone(), ttl);

		grant.access_secret
	}
}
#[cfg(feature = "reqwest")]
impl TokenManager {
	/// Creates a manager that talks to the provider over reqwest and keeps credentials in a fresh
	/// system-clock store.
	///
	/// Every token endpoint call is bounded by [`ClientConfig::request_timeout_secs`].
	pub fn with_reqwest(descriptor: ProviderDescriptor, config: ClientConfig) -> Result<Self> {
		config.validate()?;

		let http_client = ReqwestHttpClient::new(config.request_timeout())?;
		let exchange: Arc<dyn ExchangeClient> = Arc::new(TokenEndpointClient::<
			ReqwestHttpClient,
			ReqwestTransportErrorMapper,
		>::new(
			&descriptor, http_client, ReqwestTransportErrorMapper
		));

		Self::new(descriptor, config, Arc::new(CredentialStore::default()), exchange)
	}
}
impl Debug for TokenManager {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.config.client_id)
			.field("store", &self.store)
			.finish()
	}
}
