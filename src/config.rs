//! Deployment configuration consumed by the session manager.
//!
//! The configuration is owned by the surrounding application (environment, secret
//! store) and merely consumed here: OAuth client credentials, the redirect URI,
//! the identity provider's domain for endpoint discovery, and optional static
//! fallback endpoints for when discovery is unavailable.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, discovery::DiscoveredEndpoints, session::TokenSecret};

/// Default scopes requested during login.
pub const DEFAULT_SCOPES: [&str; 3] = ["openid", "email", "profile"];
/// Fixed deadline applied to every provider call (discovery, exchange, refresh).
pub const DEFAULT_HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(20);

/// Immutable configuration for one identity provider deployment.
///
/// A client secret marks the deployment as a confidential client: the secret
/// authenticates token exchanges and PKCE is skipped. Without a secret the
/// manager generates a PKCE pair for every login attempt instead.
#[derive(Clone)]
pub struct IdentityConfig {
	/// OAuth 2.0 client identifier sent with every grant.
	pub client_id: String,
	/// Client secret for confidential deployments.
	pub client_secret: Option<TokenSecret>,
	/// Redirect URI registered with the provider.
	pub redirect_uri: Url,
	/// Identity provider domain used to locate the well-known metadata document.
	pub identity_domain: Option<String>,
	/// Scopes requested during login.
	pub scopes: Vec<String>,
	/// Static endpoints used when discovery fails.
	pub fallback_endpoints: Option<DiscoveredEndpoints>,
	/// Where the provider should send the browser after logout.
	pub post_logout_redirect_uri: Option<Url>,
	/// Marks session cookies `Secure`; disable only for local development.
	pub secure_cookies: bool,
	/// Deadline for every provider call.
	pub http_timeout: StdDuration,
}
impl IdentityConfig {
	/// Creates a builder for the provided client identifier and redirect URI.
	pub fn builder(client_id: impl Into<String>, redirect_uri: Url) -> IdentityConfigBuilder {
		IdentityConfigBuilder::new(client_id, redirect_uri)
	}

	/// Returns the requested scopes joined with spaces, as the wire format expects.
	pub fn scope_param(&self) -> String {
		self.scopes.join(" ")
	}
}
impl Debug for IdentityConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdentityConfig")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("redirect_uri", &self.redirect_uri)
			.field("identity_domain", &self.identity_domain)
			.field("scopes", &self.scopes)
			.field("fallback_endpoints", &self.fallback_endpoints)
			.field("post_logout_redirect_uri", &self.post_logout_redirect_uri)
			.field("secure_cookies", &self.secure_cookies)
			.finish()
	}
}

/// Builder for [`IdentityConfig`] with endpoint validation.
#[derive(Clone, Debug)]
pub struct IdentityConfigBuilder {
	client_id: String,
	client_secret: Option<TokenSecret>,
	redirect_uri: Url,
	identity_domain: Option<String>,
	scopes: Vec<String>,
	fallback_endpoints: Option<DiscoveredEndpoints>,
	post_logout_redirect_uri: Option<Url>,
	secure_cookies: bool,
	http_timeout: StdDuration,
}
impl IdentityConfigBuilder {
	fn new(client_id: impl Into<String>, redirect_uri: Url) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: None,
			redirect_uri,
			identity_domain: None,
			scopes: DEFAULT_SCOPES.iter().map(ToString::to_string).collect(),
			fallback_endpoints: None,
			post_logout_redirect_uri: None,
			secure_cookies: true,
			http_timeout: DEFAULT_HTTP_TIMEOUT,
		}
	}

	/// Attaches a client secret, marking the deployment as a confidential client.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Sets the identity provider domain used for endpoint discovery.
	pub fn identity_domain(mut self, domain: impl Into<String>) -> Self {
		let domain = domain.into();

		self.identity_domain = if domain.trim().is_empty() { None } else { Some(domain) };

		self
	}

	/// Replaces the requested scope list.
	pub fn scopes<S>(mut self, scopes: impl IntoIterator<Item = S>) -> Self
	where
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Configures static endpoints used when discovery fails.
	pub fn fallback_endpoints(mut self, endpoints: DiscoveredEndpoints) -> Self {
		self.fallback_endpoints = Some(endpoints);

		self
	}

	/// Sets the post-logout redirect target for the end-session endpoint.
	pub fn post_logout_redirect_uri(mut self, uri: Url) -> Self {
		self.post_logout_redirect_uri = Some(uri);

		self
	}

	/// Overrides the `Secure` cookie attribute; disable only for local development.
	pub fn secure_cookies(mut self, secure: bool) -> Self {
		self.secure_cookies = secure;

		self
	}

	/// Overrides the fixed provider call deadline (defaults to 20 seconds).
	pub fn http_timeout(mut self, timeout: StdDuration) -> Self {
		self.http_timeout = timeout;

		self
	}

	/// Validates the assembled configuration and produces an [`IdentityConfig`].
	pub fn build(self) -> Result<IdentityConfig, ConfigError> {
		if let Some(endpoints) = &self.fallback_endpoints {
			require_https("authorization", &endpoints.authorization_endpoint)?;
			require_https("token", &endpoints.token_endpoint)?;
			require_https("end_session", &endpoints.end_session_endpoint)?;
		}

		Ok(IdentityConfig {
			client_id: self.client_id,
			client_secret: self.client_secret,
			redirect_uri: self.redirect_uri,
			identity_domain: self.identity_domain,
			scopes: self.scopes,
			fallback_endpoints: self.fallback_endpoints,
			post_logout_redirect_uri: self.post_logout_redirect_uri,
			secure_cookies: self.secure_cookies,
			http_timeout: self.http_timeout,
		})
	}
}

// Loopback hosts are exempt so local stacks can run without TLS.
fn require_https(endpoint: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.scheme() == "https" {
		return Ok(());
	}

	let loopback = matches!(url.host_str(), Some("localhost" | "127.0.0.1" | "[::1]"));

	if loopback {
		Ok(())
	} else {
		Err(ConfigError::InsecureEndpoint { endpoint, url: url.clone() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn endpoints(base: &str) -> DiscoveredEndpoints {
		DiscoveredEndpoints {
			authorization_endpoint: Url::parse(&format!("{base}/authorize"))
				.expect("Authorization endpoint fixture should parse."),
			token_endpoint: Url::parse(&format!("{base}/token"))
				.expect("Token endpoint fixture should parse."),
			end_session_endpoint: Url::parse(&format!("{base}/logout"))
				.expect("End-session endpoint fixture should parse."),
			issuer: None,
		}
	}

	#[test]
	fn builder_rejects_insecure_fallback_endpoints() {
		let err = IdentityConfig::builder(
			"client",
			Url::parse("https://shop.example.com/callback")
				.expect("Redirect URI fixture should parse."),
		)
		.fallback_endpoints(endpoints("http://idp.example.com"))
		.build()
		.expect_err("Plain HTTP fallback endpoints should be rejected.");

		assert!(matches!(err, ConfigError::InsecureEndpoint { endpoint: "authorization", .. }));
	}

	#[test]
	fn builder_allows_loopback_without_tls() {
		let config = IdentityConfig::builder(
			"client",
			Url::parse("http://localhost:3000/callback")
				.expect("Redirect URI fixture should parse."),
		)
		.fallback_endpoints(endpoints("http://localhost:8443"))
		.secure_cookies(false)
		.build()
		.expect("Loopback fallback endpoints should be accepted.");

		assert!(config.fallback_endpoints.is_some());
	}

	#[test]
	fn blank_identity_domain_is_treated_as_unset() {
		let config = IdentityConfig::builder(
			"client",
			Url::parse("https://shop.example.com/callback")
				.expect("Redirect URI fixture should parse."),
		)
		.identity_domain("  ")
		.build()
		.expect("Configuration without a domain should still build.");

		assert_eq!(config.identity_domain, None);
		assert_eq!(config.scope_param(), "openid email profile");
	}
}
