// self
use crate::{
	_prelude::*,
	auth::{PrincipalKey, TokenSecret},
	obs::FlowKind,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by lifecycle flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the flow kind, call site, and principal.
	pub fn new(kind: FlowKind, stage: &'static str, principal: &PrincipalKey) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"oauth2_lifecycle.flow",
				flow = kind.as_str(),
				stage,
				principal = %principal
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage, principal);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Warns that the single-tenant sentinel principal is being authorized.
pub fn log_shared_principal(principal: &PrincipalKey) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			principal = %principal,
			"Authorizing the shared principal; every caller will use the same credentials."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = principal;
	}
}

/// Emits a debug event after credentials were written for `principal`.
pub fn log_credentials_stored(
	kind: FlowKind,
	principal: &PrincipalKey,
	refresh_secret: &TokenSecret,
	ttl: Duration,
) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			flow = kind.as_str(),
			principal = %principal,
			refresh_fingerprint = %refresh_secret.fingerprint(),
			ttl_secs = ttl.whole_seconds(),
			"Stored credentials."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, principal, refresh_secret, ttl);
	}
}

/// Emits an event describing a failed exchange; rejections log at `warn`, transport failures at
/// `debug`.
pub fn log_exchange_failure(kind: FlowKind, principal: &PrincipalKey, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		if error.is_rejected() {
			tracing::warn!(
				flow = kind.as_str(),
				principal = %principal,
				error = %error,
				"Identity provider rejected the exchange."
			);
		} else {
			tracing::debug!(
				flow = kind.as_str(),
				principal = %principal,
				error = %error,
				retryable = error.is_retryable(),
				"Token exchange failed."
			);
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, principal, error);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn principal() -> PrincipalKey {
		PrincipalKey::new("sess-1").expect("Principal fixture should be valid.")
	}

	#[test]
	fn log_helpers_accept_any_subscriber_state() {
		let principal = principal();

		log_shared_principal(&PrincipalKey::shared());
		log_credentials_stored(
			FlowKind::AuthorizationCode,
			&principal,
			&TokenSecret::new("RT1"),
			Duration::seconds(2700),
		);
		log_exchange_failure(
			FlowKind::Refresh,
			&principal,
			&crate::error::TransportError::Timeout.into(),
		);
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::Refresh, "instrument_wraps_future", &principal());
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}
