// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{PrincipalKey, TokenSecret},
	error::{RejectionKind, TransportError},
	lifecycle::TokenManager,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::GrantType,
};

const STATE_LEN: usize = 32;

/// Redirect target for the start of the authorization-code flow.
///
/// The host keeps `state` with the end-user's session and checks it with
/// [`AuthorizationRequest::validate_state`] before calling [`TokenManager::exchange_code`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRequest {
	/// Provider authorize URL the end-user should be redirected to.
	pub url: Url,
	/// Opaque anti-forgery value that must round-trip through the redirect.
	pub state: String,
}
impl AuthorizationRequest {
	/// Validates the `state` parameter returned on the redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(Error::ExchangeRejected {
				grant: GrantType::AuthorizationCode,
				kind: RejectionKind::InvalidGrant,
				reason: "authorization state mismatch".into(),
				status: None,
			})
		}
	}
}

impl TokenManager {
	/// Builds the provider authorize URL with a fresh random `state`.
	pub fn authorization_request(&self) -> AuthorizationRequest {
		let state = random_string(STATE_LEN);
		let mut url = self.descriptor.endpoints.authorization.clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", &self.config.client_id);
		pairs.append_pair("redirect_uri", self.config.redirect_uri.as_str());

		if let Some(scope) = self.config.scope.join(self.descriptor.scope_delimiter) {
			pairs.append_pair("scope", &scope);
		}

		pairs.append_pair("state", &state);

		drop(pairs);

		AuthorizationRequest { url, state }
	}

	/// Exchanges a one-time authorization `code` for the principal's first credentials.
	///
	/// On success the record is written (access secret cached for `expires_in × ttl_factor`) and
	/// the new access secret is returned. Any failure leaves the store untouched. The code is
	/// single-use, so callers must not retry a failed exchange with the same code.
	pub async fn exchange_code(&self, principal: &PrincipalKey, code: &str) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let span = FlowSpan::new(KIND, "exchange_code", principal);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		if principal.is_shared() {
			obs::log_shared_principal(principal);
		}

		let result = span
			.instrument(async move {
				let guard = self.guard(principal);
				let result = {
					let _singleflight = guard.lock().await;

					self.exchange_code_locked(principal, code).await
				};

				self.release_guard(principal, guard);

				result
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(err) => {
				obs::log_exchange_failure(KIND, principal, err);
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}

	async fn exchange_code_locked(
		&self,
		principal: &PrincipalKey,
		code: &str,
	) -> Result<TokenSecret> {
		let params = self.grant_parameters(GrantType::AuthorizationCode, code);
		let grant = self.exchange.exchange(&params).await?;
		let refresh_secret = grant.refresh_secret.clone().ok_or(TransportError::InvalidResponse {
			reason: "authorization code response is missing refresh_token",
		})?;

		self.metrics.record_code_exchange();

		Ok(self.store_grant(FlowKind::AuthorizationCode, principal, refresh_secret, grant))
	}
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::ScopeSet,
		clock::ManualClock,
		config::ClientConfig,
		exchange::{ExchangeClient, ExchangeFuture, GrantParameters, TokenGrant},
		provider::ProviderDescriptor,
		store::CredentialStore,
	};

	struct NoRefreshExchange;
	impl ExchangeClient for NoRefreshExchange {
		fn exchange<'a>(&'a self, _grant: &'a GrantParameters) -> ExchangeFuture<'a, TokenGrant> {
			Box::pin(async {
				Ok(TokenGrant {
					access_secret: TokenSecret::new("AT1"),
					refresh_secret: None,
					expires_in: Duration::seconds(3600),
				})
			})
		}
	}

	fn manager() -> TokenManager {
		let descriptor = ProviderDescriptor::builder()
			.authorization_endpoint(
				Url::parse("https://id.example.com/authorize?prompt=consent")
					.expect("Authorization endpoint fixture should parse."),
			)
			.token_endpoint(
				Url::parse("https://id.example.com/token")
					.expect("Token endpoint fixture should parse."),
			)
			.build()
			.expect("Descriptor fixture should be valid.");
		let config = ClientConfig::new(
			"app-123",
			"s3cr3t",
			Url::parse("https://app.example.com/callback").expect("Redirect URI should parse."),
		)
		.with_scope(
			ScopeSet::new(["openid", "offline_access"]).expect("Scope fixture should be valid."),
		);
		let store = Arc::new(CredentialStore::new(Arc::new(ManualClock::default())));

		TokenManager::new(descriptor, config, store, Arc::new(NoRefreshExchange))
			.expect("Manager fixture should be valid.")
	}

	#[test]
	fn authorization_request_carries_client_and_state() {
		let manager = manager();
		let request = manager.authorization_request();
		let pairs = request.url.query_pairs().into_owned().collect::<HashMap<_, _>>();

		assert_eq!(request.state.len(), STATE_LEN);
		assert!(request.state.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_eq!(pairs.get("prompt").map(String::as_str), Some("consent"));
		assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(pairs.get("client_id").map(String::as_str), Some("app-123"));
		assert_eq!(
			pairs.get("redirect_uri").map(String::as_str),
			Some("https://app.example.com/callback")
		);
		assert_eq!(pairs.get("scope").map(String::as_str), Some("offline_access openid"));
		assert_eq!(pairs.get("state"), Some(&request.state));
		assert_ne!(request.state, manager.authorization_request().state);
	}

	#[test]
	fn state_validation_errors_on_mismatch() {
		let request = manager().authorization_request();

		assert!(request.validate_state(&request.state).is_ok());

		let err = request.validate_state("forged").expect_err("State mismatch should fail.");

		assert!(matches!(
			err,
			Error::ExchangeRejected { kind: RejectionKind::InvalidGrant, status: None, .. }
		));
	}

	#[tokio::test]
	async fn code_response_without_refresh_token_writes_nothing() {
		let manager = manager();
		let principal = PrincipalKey::new("sess-1").expect("Principal fixture should be valid.");
		let err = manager
			.exchange_code(&principal, "auth-code-xyz")
			.await
			.expect_err("A code exchange must yield a refresh token.");

		assert!(matches!(err, Error::Transport(TransportError::InvalidResponse { .. })));
		assert!(!manager.is_authorized(&principal));
		assert!(manager.store().is_empty());
		assert_eq!(manager.metrics().code_exchanges(), 0);
	}
}
