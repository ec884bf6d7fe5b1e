//! Walks through starting a customer login: endpoint discovery, state + PKCE
//! generation, and validating the state the provider sends back.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use storefront_identity::{
	config::IdentityConfig,
	flows::{LoginOptions, SessionManager},
	http::ReqwestHttpClient,
	reqwest::Client,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/openid-configuration");
			then.status(200).header("content-type", "application/json").body(format!(
				r#"{{"issuer":"{issuer}","authorization_endpoint":"{auth}","token_endpoint":"{token}","end_session_endpoint":"{logout}"}}"#,
				issuer = server.url("/"),
				auth = server.url("/authorize"),
				token = server.url("/token"),
				logout = server.url("/logout"),
			));
		})
		.await;

	// No client secret, so every login attempt carries a PKCE pair.
	let config = IdentityConfig::builder(
		"demo-storefront",
		Url::parse("https://shop.example.com/auth/callback")?,
	)
	.identity_domain(server.address().to_string())
	.build()?;
	let http_client = ReqwestHttpClient::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
		config.http_timeout,
	);
	let manager = SessionManager::with_http_client(config, http_client);
	let attempt = manager.start_login(LoginOptions::default().login_hint("a@b.com")).await?;

	println!("Send the customer to {}.", &attempt.authorize_url);

	if let Some(pkce) = &attempt.pkce {
		println!("Stash this PKCE pair until the callback: {pkce:?}.");
	}

	// Simulate the redirect handler receiving the state back from the provider.
	let returned_state = attempt.state.as_str().to_owned();

	attempt.state.validate(&returned_state)?;
	println!("State validated; exchange the code with SessionManager::exchange_code.");

	Ok(())
}
