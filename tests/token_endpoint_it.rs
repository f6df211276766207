#![cfg(feature = "reqwest")]

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use httpmock::prelude::*;
// self
use oauth2_lifecycle::{
	_preludet::*,
	auth::PrincipalKey,
	config::ClientConfig,
	error::{RejectionKind, TransportError},
	exchange::{ExchangeClient, GrantParameters},
	provider::{ClientAuthMethod, GrantType, ProviderDescriptor},
};

const CLIENT_ID: &str = "app-123";
const CLIENT_SECRET: &str = "s3cr3t";

fn build_descriptor(server: &MockServer, method: ClientAuthMethod) -> ProviderDescriptor {
	ProviderDescriptor::builder()
		.authorization_endpoint(
			Url::parse(&server.url("/authorize"))
				.expect("Mock authorize endpoint should parse successfully."),
		)
		.token_endpoint(
			Url::parse(&server.url("/token"))
				.expect("Mock token endpoint should parse successfully."),
		)
		.client_auth_method(method)
		.build()
		.expect("Provider descriptor should build successfully.")
}

fn build_config() -> ClientConfig {
	ClientConfig::new(
		CLIENT_ID,
		CLIENT_SECRET,
		Url::parse("https://app.example.com/callback")
			.expect("Redirect URI should parse successfully."),
	)
}

fn principal() -> PrincipalKey {
	PrincipalKey::new("sess-1").expect("Principal fixture should be valid.")
}

#[tokio::test]
async fn exchange_code_caches_token_from_mock_provider() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let (manager, store, _) = build_reqwest_test_manager(
		build_descriptor(&server, ClientAuthMethod::ClientSecretPost),
		build_config(),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.header("accept", "application/json");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"AT1\",\"refresh_token\":\"RT1\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let sess = principal();
	let access = manager.exchange_code(&sess, "auth-code-xyz").await?;

	mock.assert_async().await;

	assert_eq!(access.expose(), "AT1");
	assert!(manager.is_authorized(&sess));

	let record = store.snapshot(&sess).expect("Record should be stored after exchange.");

	assert_eq!(record.access_expiry - record.issued_at, Duration::seconds(2700));
	assert_eq!(record.refresh_secret.expose(), "RT1");
	assert_eq!(manager.get_access_token(&sess).await?.expose(), "AT1");

	Ok(())
}

#[tokio::test]
async fn client_secret_basic_sends_authorization_header() {
	let server = MockServer::start_async().await;
	let (manager, _, _) = build_reqwest_test_manager(
		build_descriptor(&server, ClientAuthMethod::ClientSecretBasic),
		build_config(),
	);
	let expected = format!("Basic {}", STANDARD.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}")));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").header("authorization", expected.as_str());
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"AT1\",\"refresh_token\":\"RT1\",\"expires_in\":60}");
		})
		.await;

	manager
		.exchange_code(&principal(), "auth-code-xyz")
		.await
		.expect("Basic-authenticated exchange should succeed.");

	mock.assert_async().await;
}

#[tokio::test]
async fn invalid_grant_is_a_rejection() {
	let server = MockServer::start_async().await;
	let (manager, store, _) = build_reqwest_test_manager(
		build_descriptor(&server, ClientAuthMethod::ClientSecretPost),
		build_config(),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"already used\"}");
		})
		.await;
	let sess = principal();
	let err = manager
		.exchange_code(&sess, "stale-code")
		.await
		.expect_err("Invalid grant errors should be classified as rejections.");

	mock.assert_async().await;

	match err {
		Error::ExchangeRejected { grant, kind, reason, status } => {
			assert_eq!(grant, GrantType::AuthorizationCode);
			assert_eq!(kind, RejectionKind::InvalidGrant);
			assert_eq!(reason, "already used");
			assert_eq!(status, Some(400));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert!(!manager.is_authorized(&sess));
	assert!(store.is_empty());
}

#[tokio::test]
async fn server_errors_carry_retry_after() {
	let server = MockServer::start_async().await;
	let client = build_reqwest_test_client(
		&build_descriptor(&server, ClientAuthMethod::ClientSecretPost),
		std::time::Duration::from_secs(5),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(503)
				.header("retry-after", "7")
				.header("content-type", "application/json")
				.body("{\"error\":\"temporarily_unavailable\"}");
		})
		.await;
	let grant = GrantParameters::new(GrantType::RefreshToken)
		.with("client_id", CLIENT_ID)
		.with("client_secret", CLIENT_SECRET)
		.with("refresh_token", "RT1");
	let err = client.exchange(&grant).await.expect_err("503 responses should fail.");

	mock.assert_async().await;

	assert!(err.is_retryable());
	assert!(matches!(
		err,
		Error::Transport(TransportError::Upstream { status: Some(503), retry_after: Some(delay), .. })
			if delay == Duration::seconds(7)
	));
}

#[tokio::test]
async fn malformed_json_is_a_transport_failure() {
	let server = MockServer::start_async().await;
	let (manager, store, _) = build_reqwest_test_manager(
		build_descriptor(&server, ClientAuthMethod::ClientSecretPost),
		build_config(),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).header("content-type", "application/json").body("{\"access_token\":");
		})
		.await;
	let err = manager
		.exchange_code(&principal(), "auth-code-xyz")
		.await
		.expect_err("Malformed JSON should fail the exchange.");

	mock.assert_async().await;

	assert!(matches!(err, Error::Transport(TransportError::MalformedResponse { .. })));
	assert!(store.is_empty());
}

#[tokio::test]
async fn out_of_range_expires_in_is_an_invalid_response() {
	let server = MockServer::start_async().await;
	let (manager, store, _) = build_reqwest_test_manager(
		build_descriptor(&server, ClientAuthMethod::ClientSecretPost),
		build_config(),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"AT1\",\"refresh_token\":\"RT1\",\"expires_in\":1e300}");
		})
		.await;
	let sess = principal();
	let err = manager
		.exchange_code(&sess, "auth-code-xyz")
		.await
		.expect_err("An out-of-range lifetime should fail the exchange.");

	mock.assert_async().await;

	assert!(matches!(err, Error::Transport(TransportError::InvalidResponse { .. })));
	assert!(!manager.is_authorized(&sess));
	assert!(store.is_empty());
}

#[tokio::test]
async fn slow_provider_times_out() {
	let server = MockServer::start_async().await;
	let (manager, store, _) = build_reqwest_test_manager(
		build_descriptor(&server, ClientAuthMethod::ClientSecretPost),
		build_config().with_request_timeout_secs(1),
	);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.delay(std::time::Duration::from_secs(3))
				.header("content-type", "application/json")
				.body("{\"access_token\":\"AT1\",\"refresh_token\":\"RT1\",\"expires_in\":3600}");
		})
		.await;

	let err = manager
		.exchange_code(&principal(), "auth-code-xyz")
		.await
		.expect_err("A slow token endpoint should time out.");

	assert!(matches!(err, Error::Transport(TransportError::Timeout)));
	assert!(err.is_retryable());
	assert!(store.is_empty());
}

#[tokio::test]
async fn refresh_keeps_refresh_token_when_provider_omits_it() -> color_eyre::Result<()> {
	let server = MockServer::start_async().await;
	let (manager, store, clock) = build_reqwest_test_manager(
		build_descriptor(&server, ClientAuthMethod::ClientSecretPost),
		build_config(),
	);
	let mut code_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"AT1\",\"refresh_token\":\"RT1\",\"expires_in\":3600}");
		})
		.await;
	let sess = principal();

	manager.exchange_code(&sess, "auth-code-xyz").await?;
	code_mock.assert_async().await;
	code_mock.delete_async().await;

	let refresh_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"AT2\",\"expires_in\":\"1800\"}");
		})
		.await;

	clock.advance(Duration::seconds(2700));

	assert_eq!(manager.get_access_token(&sess).await?.expose(), "AT2");

	refresh_mock.assert_async().await;

	let record = store.snapshot(&sess).expect("Record should exist after refresh.");

	assert_eq!(record.refresh_secret.expose(), "RT1");
	assert_eq!(record.access_expiry - record.issued_at, Duration::seconds(1350));

	Ok(())
}
