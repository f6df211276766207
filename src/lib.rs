//! OAuth 2.0 authorization-code token lifecycle manager: exchange a code once, cache the access
//! token with a safety margin, and refresh it lazily per principal so downstream callers only ever
//! ask for a bearer token.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod exchange;
pub mod ext;
pub mod http;
pub mod lifecycle;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod store;
#[cfg(feature = "reqwest")]
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests.

	pub use crate::_prelude::*;

	// self
	use crate::{
		clock::{Clock, ManualClock},
		config::ClientConfig,
		exchange::ExchangeClient,
		http::ReqwestHttpClient,
		lifecycle::TokenManager,
		oauth::{ReqwestTransportErrorMapper, TokenEndpointClient},
		provider::ProviderDescriptor,
		store::CredentialStore,
	};

	/// Token endpoint client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = TokenEndpointClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests and gives up after `timeout`.
	pub fn test_reqwest_http_client(timeout: std::time::Duration) -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.timeout(timeout)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a token endpoint client for `descriptor` on top of [`test_reqwest_http_client`].
	pub fn build_reqwest_test_client(
		descriptor: &ProviderDescriptor,
		timeout: std::time::Duration,
	) -> ReqwestTestClient {
		TokenEndpointClient::new(
			descriptor,
			test_reqwest_http_client(timeout),
			ReqwestTransportErrorMapper,
		)
	}

	/// Constructs a [`TokenManager`] backed by a manual clock, a fresh in-memory store, and the
	/// reqwest transport used across integration tests.
	pub fn build_reqwest_test_manager(
		descriptor: ProviderDescriptor,
		config: ClientConfig,
	) -> (TokenManager, Arc<CredentialStore>, ManualClock) {
		let clock = ManualClock::default();
		let store = Arc::new(CredentialStore::new(Arc::new(clock.clone()) as Arc<dyn Clock>));
		let client: Arc<dyn ExchangeClient> = Arc::new(build_reqwest_test_client(
			&descriptor,
			std::time::Duration::from_secs(config.request_timeout_secs),
		));
		let manager = TokenManager::new(descriptor, config, store.clone(), client)
			.expect("Test manager configuration should be valid.");

		(manager, store, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
