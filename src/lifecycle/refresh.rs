// self
use crate::{
	_prelude::*,
	auth::{PrincipalKey, TokenSecret},
	lifecycle::TokenManager,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::GrantType,
};

impl TokenManager {
	/// Returns a valid access secret for `principal`, refreshing it first when the cached one has
	/// expired.
	///
	/// The cached path never suspends or touches the network. When a refresh is needed, callers
	/// for the same principal queue behind one guard; whoever gets the guard after a successful
	/// refresh reuses the stored secret instead of calling the provider again.
	pub async fn get_access_token(&self, principal: &PrincipalKey) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::AccessToken;

		if let Some(secret) = self.store.access_secret(principal) {
			self.metrics.record_cache_hit();
			obs::record_flow_outcome(KIND, FlowOutcome::Cached);

			return Ok(secret);
		}
		if !self.store.has_refresh_secret(principal) {
			return Err(Error::NotAuthorized { principal: principal.clone() });
		}

		let span = FlowSpan::new(KIND, "get_access_token", principal);

		span.instrument(async move {
			let guard = self.guard(principal);
			let _singleflight = guard.lock().await;

			if let Some(secret) = self.store.access_secret(principal) {
				self.metrics.record_cache_hit();
				obs::record_flow_outcome(KIND, FlowOutcome::Cached);

				return Ok(secret);
			}

			self.refresh_locked(principal).await
		})
		.await
	}

	/// Forces a `refresh_token` grant for `principal`, regardless of the cached access secret.
	///
	/// Fails with [`Error::NotAuthorized`] when no refresh secret is stored. On failure the
	/// stored record, including the old refresh secret, stays in place.
	pub async fn refresh(&self, principal: &PrincipalKey) -> Result<TokenSecret> {
		let span = FlowSpan::new(FlowKind::Refresh, "refresh", principal);

		span.instrument(async move {
			let guard = self.guard(principal);
			let result = {
				let _singleflight = guard.lock().await;

				self.refresh_locked(principal).await
			};

			self.release_guard(principal, guard);

			result
		})
		.await
	}

	/// Performs the refresh grant; callers must hold the principal's guard.
	async fn refresh_locked(&self, principal: &PrincipalKey) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::Refresh;

		let current = self
			.store
			.refresh_secret(principal)
			.ok_or_else(|| Error::NotAuthorized { principal: principal.clone() })?;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_refresh_attempt();

		let params = self.grant_parameters(GrantType::RefreshToken, current.expose());

		match self.exchange.exchange(&params).await {
			Ok(grant) => {
				let refresh_secret = grant.refresh_secret.clone().unwrap_or(current);

				self.metrics.record_refresh_success();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				Ok(self.store_grant(KIND, principal, refresh_secret, grant))
			},
			Err(err) => {
				self.metrics.record_refresh_failure();
				obs::log_exchange_failure(KIND, principal, &err);
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				Err(err)
			},
		}
	}
}
