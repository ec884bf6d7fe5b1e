//! Session manager facade orchestrating discovery, login flows, and persistence.

pub mod exchange;
pub mod refresh;

pub use exchange::*;

// self
use crate::{
	_prelude::*,
	authorize::{self, AuthorizeParams, LoginState, PkcePair},
	config::IdentityConfig,
	cookie::{CookieEncoding, CookieJar, SessionCodec, SessionCookieSet},
	discovery::{DiscoveredEndpoints, EndpointResolver},
	http::{HttpResponse, IdentityHttpClient},
	session::CustomerSession,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Session manager specialized for the crate's default reqwest transport.
pub type ReqwestSessionManager = SessionManager<ReqwestHttpClient>;

/// Coordinates the customer identity lifecycle against a single provider.
///
/// The manager owns the HTTP client, deployment configuration, endpoint resolver,
/// and session codec so the storefront's request handlers only deal in the narrow
/// interface: read the current session or none, build a login URL, exchange a
/// code, refresh a session, clear the session.
///
/// Execution is request-scoped: no session state is shared across requests except
/// the process-wide endpoint cache inside the resolver. Every session read
/// re-evaluates staleness; there is no background scheduler.
#[derive(Clone)]
pub struct SessionManager<C>
where
	C: ?Sized + IdentityHttpClient,
{
	/// HTTP client used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Deployment configuration (credentials, domain, fallbacks, cookie policy).
	pub config: IdentityConfig,
	/// Endpoint resolver holding the process-wide discovery cache.
	pub resolver: Arc<EndpointResolver>,
	codec: SessionCodec,
}
impl<C> SessionManager<C>
where
	C: ?Sized + IdentityHttpClient,
{
	/// Creates a manager that reuses the caller-provided transport.
	pub fn with_http_client(config: IdentityConfig, http_client: impl Into<Arc<C>>) -> Self {
		let codec = SessionCodec::new(config.secure_cookies);

		Self {
			http_client: http_client.into(),
			resolver: Arc::new(EndpointResolver::new()),
			codec,
			config,
		}
	}

	/// Resolves the provider endpoints, consulting the process-wide cache first.
	pub async fn endpoints(&self) -> Result<DiscoveredEndpoints> {
		self.resolver.discover(&self.config, self.http_client.as_ref()).await
	}

	/// Starts a login attempt: fresh state, a PKCE pair for public clients, and
	/// the authorization URL to redirect the browser to.
	///
	/// Confidential deployments (with a client secret) omit PKCE entirely; the
	/// secret authenticates the later code exchange instead.
	pub async fn start_login(&self, options: LoginOptions) -> Result<LoginAttempt> {
		let endpoints = self.endpoints().await?;
		let state = LoginState::generate();
		let pkce =
			if self.config.client_secret.is_none() { Some(PkcePair::generate()) } else { None };
		let mut params = AuthorizeParams::new(state.as_str());

		if let Some(pkce) = &pkce {
			params = params.code_challenge(pkce.challenge());
		}
		if let Some(hint) = options.login_hint.as_deref() {
			params = params.login_hint(hint);
		}
		if let Some(prompt) = options.prompt.as_deref() {
			params = params.prompt(prompt);
		}
		if let Some(locales) = options.ui_locales.as_deref() {
			params = params.ui_locales(locales);
		}

		let authorize_url = authorize::authorize_url(&endpoints, &self.config, &params);

		Ok(LoginAttempt { state, pkce, authorize_url })
	}

	/// Reads the current session from the request cookies, or `None`.
	pub fn read_session(&self, jar: &CookieJar) -> Option<CustomerSession> {
		self.codec.decode(jar)
	}

	/// Encodes a session for persistence. New sessions always use the split
	/// cookie layout; the legacy layout remains read-only.
	pub fn session_cookies(
		&self,
		session: &CustomerSession,
		id_token: Option<&str>,
	) -> SessionCookieSet {
		self.codec.encode(session, id_token, CookieEncoding::Split)
	}

	/// Produces clearing records for every session cookie.
	pub fn clear_session_cookies(&self) -> SessionCookieSet {
		self.codec.encode_empty()
	}

	/// Returns the codec for callers that need lower-level cookie access.
	pub fn codec(&self) -> &SessionCodec {
		&self.codec
	}

	/// Builds the provider's end-session redirect, when a post-logout target is
	/// configured. The ID token hint lets the provider skip its logout prompt.
	pub async fn logout_url(&self, id_token_hint: Option<&str>) -> Result<Option<Url>> {
		let Some(target) = &self.config.post_logout_redirect_uri else {
			return Ok(None);
		};
		let endpoints = self.endpoints().await?;

		Ok(Some(authorize::end_session_url(&endpoints, target, id_token_hint)))
	}

	pub(crate) async fn post_token_request(
		&self,
		form: Vec<(&'static str, String)>,
	) -> Result<HttpResponse> {
		let endpoints = self.endpoints().await?;

		self.http_client.post_form(endpoints.token_endpoint, form).await
	}

	/// Base form for token endpoint grants: grant type, client id, and the
	/// client secret when the deployment is confidential.
	pub(crate) fn token_grant_form(&self, grant_type: &'static str) -> Vec<(&'static str, String)> {
		let mut form = vec![
			("grant_type", grant_type.to_owned()),
			("client_id", self.config.client_id.clone()),
		];

		if let Some(secret) = &self.config.client_secret {
			form.push(("client_secret", secret.expose().to_owned()));
		}

		form
	}
}
#[cfg(feature = "reqwest")]
impl SessionManager<ReqwestHttpClient> {
	/// Creates a manager with its own reqwest-backed transport, honoring the
	/// configured provider call deadline.
	pub fn new(config: IdentityConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(config.http_timeout)?;

		Ok(Self::with_http_client(config, http_client))
	}
}
impl<C> Debug for SessionManager<C>
where
	C: ?Sized + IdentityHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionManager")
			.field("config", &self.config)
			.field("cached_endpoints", &self.resolver.cached().is_some())
			.finish()
	}
}

/// Optional per-attempt login parameters passed through to the provider.
#[derive(Clone, Debug, Default)]
pub struct LoginOptions {
	/// Pre-fills the provider's login form.
	pub login_hint: Option<String>,
	/// Provider prompt behavior (`login`, `none`, ...).
	pub prompt: Option<String>,
	/// Preferred UI languages for the provider's pages.
	pub ui_locales: Option<String>,
}
impl LoginOptions {
	/// Pre-fills the provider's login form.
	pub fn login_hint(mut self, hint: impl Into<String>) -> Self {
		self.login_hint = Some(hint.into());

		self
	}

	/// Sets the provider prompt behavior.
	pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
		self.prompt = Some(prompt.into());

		self
	}

	/// Sets preferred UI languages.
	pub fn ui_locales(mut self, locales: impl Into<String>) -> Self {
		self.ui_locales = Some(locales.into());

		self
	}
}

/// Everything a login handler must persist until the provider redirects back.
#[derive(Clone, Debug)]
pub struct LoginAttempt {
	/// Single-use anti-forgery state; validate against the callback.
	pub state: LoginState,
	/// PKCE pair for public clients; its verifier feeds the code exchange.
	pub pkce: Option<PkcePair>,
	/// Fully-formed authorization URL to redirect the browser to.
	pub authorize_url: Url,
}

/// Successful token endpoint body, shared by exchange and refresh grants.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenEndpointResponse {
	pub access_token: String,
	pub refresh_token: String,
	pub expires_in: i64,
	#[serde(default)]
	pub id_token: Option<String>,
}

pub(crate) fn parse_token_response(response: &HttpResponse) -> Result<TokenEndpointResponse> {
	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::TokenResponseParse { source, status: response.status })
}

// Non-positive lifetimes and lifetimes past the representable range are both
// malformed responses; neither may panic request handling.
pub(crate) fn expires_at_from(expires_in: i64, now: OffsetDateTime) -> Result<OffsetDateTime> {
	if expires_in <= 0 {
		return Err(ConfigError::InvalidExpiresIn { expires_in }.into());
	}

	now.checked_add(Duration::seconds(expires_in))
		.ok_or_else(|| ConfigError::InvalidExpiresIn { expires_in }.into())
}
