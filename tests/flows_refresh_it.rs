#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use storefront_identity::{
	_preludet::*,
	config::IdentityConfig,
	session::{CustomerIdentity, CustomerSession, TokenSecret},
};

const WELL_KNOWN: &str = "/.well-known/openid-configuration";

fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse test URL.")
}

fn config_for(server: &MockServer) -> IdentityConfig {
	IdentityConfig::builder("shop-client", url("https://shop.example.com/callback"))
		.client_secret("s3cret")
		.identity_domain(server.address().to_string())
		.build()
		.expect("Refresh test configuration should build.")
}

fn ada() -> CustomerIdentity {
	CustomerIdentity {
		id: "42".into(),
		email: "a@b.com".into(),
		first_name: "Ada".into(),
		last_name: "Lovelace".into(),
	}
}

async fn mock_well_known(server: &MockServer) {
	let body = format!(
		r#"{{"issuer":"{issuer}","authorization_endpoint":"{auth}","token_endpoint":"{token}","end_session_endpoint":"{logout}"}}"#,
		issuer = server.url("/"),
		auth = server.url("/authorize"),
		token = server.url("/token"),
		logout = server.url("/logout"),
	);

	server
		.mock_async(|when, then| {
			when.method(GET).path(WELL_KNOWN);
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await;
}

#[tokio::test]
async fn refresh_rotates_both_tokens_and_keeps_the_identity() {
	let server = MockServer::start_async().await;

	mock_well_known(&server).await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"AT2","refresh_token":"RT2","expires_in":3600}"#);
		})
		.await;

	let manager = build_test_session_manager(config_for(&server));
	let session = manager
		.refresh_session("RT1", ada())
		.await
		.expect("Refresh against the mock provider should succeed.");

	assert_eq!(session.access_token.expose(), "AT2");
	assert_eq!(session.refresh_token.expose(), "RT2");
	assert_eq!(session.customer, ada());
	assert!(!session.is_stale());
}

#[tokio::test]
async fn renew_replaces_a_session_inside_the_staleness_buffer() {
	let server = MockServer::start_async().await;

	mock_well_known(&server).await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"AT2","refresh_token":"RT2","expires_in":3600}"#);
		})
		.await;

	let manager = build_test_session_manager(config_for(&server));
	let expiring = CustomerSession {
		access_token: TokenSecret::new("AT1"),
		refresh_token: TokenSecret::new("RT1"),
		expires_at: OffsetDateTime::now_utc() + Duration::seconds(120),
		customer: ada(),
	};

	assert!(expiring.is_stale());

	let renewed = manager.renew(&expiring).await.expect("Renewal should succeed.");

	assert!(!renewed.is_stale());
	assert_eq!(renewed.customer, expiring.customer);
}

#[tokio::test]
async fn revoked_refresh_token_surfaces_the_provider_status() {
	let server = MockServer::start_async().await;

	mock_well_known(&server).await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid_token"}"#);
		})
		.await;

	let manager = build_test_session_manager(config_for(&server));
	let err = manager
		.refresh_session("RT1", ada())
		.await
		.expect_err("A 401 from the token endpoint should fail the refresh.");

	match err {
		Error::TokenRefresh { status, body } => {
			assert_eq!(status, 401);
			assert!(body.contains("invalid_token"));
		},
		e => panic!("Expected a token refresh error, got {e:?}."),
	}
}
