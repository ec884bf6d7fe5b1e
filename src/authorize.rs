//! Browser redirect construction for login and logout.
//!
//! The builders are pure once endpoints are resolved: no network calls, no side
//! effects. State generation and the PKCE recipe (S256 over an alphanumeric
//! verifier) live here as well.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, config::IdentityConfig, discovery::DiscoveredEndpoints};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Single-use anti-forgery token correlating a login attempt with its callback.
///
/// Generated from the thread-local CSPRNG; must round-trip through the provider
/// redirect and be consumed exactly once by [`validate`](Self::validate).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginState(String);
impl LoginState {
	/// Generates a fresh random state value.
	pub fn generate() -> Self {
		Self(random_string(STATE_LEN))
	}

	/// Returns the state value for embedding in the authorization URL.
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Consumes the state, comparing it against the `state` query parameter the
	/// provider sent back. Consumption makes reuse of a captured state a type
	/// error rather than a runtime hazard.
	pub fn validate(self, returned_state: &str) -> Result<()> {
		if returned_state == self.0 { Ok(()) } else { Err(Error::StateMismatch) }
	}
}
impl Debug for LoginState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("LoginState").field(&self.0).finish()
	}
}

/// PKCE verifier/challenge pair for public-client deployments.
///
/// Generated only when no client secret is configured; the verifier must
/// round-trip unchanged from the authorization request to the token exchange.
#[derive(Clone, Serialize, Deserialize)]
pub struct PkcePair {
	verifier: String,
	challenge: String,
}
impl PkcePair {
	/// Generates a fresh verifier and derives its S256 challenge.
	pub fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge }
	}

	/// The secret verifier, supplied later to the token exchange.
	pub fn verifier(&self) -> &str {
		&self.verifier
	}

	/// The derived challenge, embedded in the authorization URL.
	pub fn challenge(&self) -> &str {
		&self.challenge
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair")
			.field("verifier", &"<redacted>")
			.field("challenge", &self.challenge)
			.finish()
	}
}

/// Per-attempt parameters for [`authorize_url`].
#[derive(Clone, Debug, Default)]
pub struct AuthorizeParams<'a> {
	/// Anti-forgery state value; mandatory.
	pub state: &'a str,
	/// PKCE challenge; omitted entirely for confidential clients.
	pub code_challenge: Option<&'a str>,
	/// Pre-fills the provider's login form.
	pub login_hint: Option<&'a str>,
	/// Provider prompt behavior (`login`, `none`, ...).
	pub prompt: Option<&'a str>,
	/// Preferred UI languages for the provider's pages.
	pub ui_locales: Option<&'a str>,
}
impl<'a> AuthorizeParams<'a> {
	/// Creates parameters carrying only the mandatory state.
	pub fn new(state: &'a str) -> Self {
		Self { state, ..Default::default() }
	}

	/// Attaches a PKCE challenge (`code_challenge_method=S256`).
	pub fn code_challenge(mut self, challenge: &'a str) -> Self {
		self.code_challenge = Some(challenge);

		self
	}

	/// Pre-fills the provider's login form.
	pub fn login_hint(mut self, hint: &'a str) -> Self {
		self.login_hint = Some(hint);

		self
	}

	/// Sets the provider prompt behavior.
	pub fn prompt(mut self, prompt: &'a str) -> Self {
		self.prompt = Some(prompt);

		self
	}

	/// Sets preferred UI languages.
	pub fn ui_locales(mut self, locales: &'a str) -> Self {
		self.ui_locales = Some(locales);

		self
	}
}

/// Builds the browser redirect URL that starts a login.
pub fn authorize_url(
	endpoints: &DiscoveredEndpoints,
	config: &IdentityConfig,
	params: &AuthorizeParams,
) -> Url {
	let mut url = endpoints.authorization_endpoint.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("client_id", &config.client_id);
	pairs.append_pair("scope", &config.scope_param());
	pairs.append_pair("redirect_uri", config.redirect_uri.as_str());
	pairs.append_pair("response_type", "code");
	pairs.append_pair("state", params.state);

	if let Some(challenge) = params.code_challenge {
		pairs.append_pair("code_challenge", challenge);
		pairs.append_pair("code_challenge_method", "S256");
	}
	if let Some(hint) = params.login_hint {
		pairs.append_pair("login_hint", hint);
	}
	if let Some(prompt) = params.prompt {
		pairs.append_pair("prompt", prompt);
	}
	if let Some(locales) = params.ui_locales {
		pairs.append_pair("ui_locales", locales);
	}

	drop(pairs);

	url
}

/// Builds the browser redirect URL that ends the provider-side session.
pub fn end_session_url(
	endpoints: &DiscoveredEndpoints,
	post_logout_redirect_uri: &Url,
	id_token_hint: Option<&str>,
) -> Url {
	let mut url = endpoints.end_session_endpoint.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("post_logout_redirect_uri", post_logout_redirect_uri.as_str());

	if let Some(hint) = id_token_hint {
		pairs.append_pair("id_token_hint", hint);
	}

	drop(pairs);

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(hasher.finalize())
}
