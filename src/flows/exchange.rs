//! Authorization code exchange.
//!
//! The redirect handler validates `state`, then trades the authorization code
//! (plus the PKCE verifier for public clients) for a token pair and the identity
//! claims carried by the ID token. A non-2xx answer surfaces as
//! [`Error::TokenExchange`] with the raw status and body, since it usually means
//! an expired or replayed code and the caller decides the user messaging.

// self
use crate::{
	_prelude::*,
	claims,
	flows::{self, SessionManager},
	http::IdentityHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::{CustomerIdentity, CustomerSession, TokenSecret},
};

/// Outcome of a successful code exchange.
#[derive(Clone, Debug)]
pub struct CodeExchange {
	/// The freshly minted customer session.
	pub session: CustomerSession,
	/// Raw ID token, persisted for the logout hint and the split cookie set.
	pub id_token: Option<String>,
}

impl<C> SessionManager<C>
where
	C: ?Sized + IdentityHttpClient,
{
	/// Exchanges an authorization code for a customer session.
	///
	/// `code_verifier` must be the PKCE verifier issued by
	/// [`start_login`](SessionManager::start_login) for public clients, and
	/// `None` for confidential clients - the form then carries no
	/// `code_verifier` field at all.
	pub async fn exchange_code(
		&self,
		code: &str,
		code_verifier: Option<&str>,
	) -> Result<CodeExchange> {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let span = FlowSpan::new(KIND, "exchange_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut form = self.token_grant_form("authorization_code");

				form.push(("redirect_uri", self.config.redirect_uri.to_string()));
				form.push(("code", code.to_owned()));

				if let Some(verifier) = code_verifier {
					form.push(("code_verifier", verifier.to_owned()));
				}

				let response = self.post_token_request(form).await?;

				if !response.is_success() {
					return Err(Error::TokenExchange {
						status: response.status,
						body: response.body_text(),
					});
				}

				let token_response = flows::parse_token_response(&response)?;
				let now = OffsetDateTime::now_utc();
				let expires_at = flows::expires_at_from(token_response.expires_in, now)?;
				let customer = match &token_response.id_token {
					Some(id_token) => claims::decode_id_token(id_token).into_identity(),
					None => {
						#[cfg(feature = "tracing")]
						tracing::warn!(
							"Token response carried no id_token; session identity is empty."
						);

						CustomerIdentity::default()
					},
				};
				let session = CustomerSession {
					access_token: TokenSecret::new(token_response.access_token),
					refresh_token: TokenSecret::new(token_response.refresh_token),
					expires_at,
					customer,
				};

				Ok(CodeExchange { session, id_token: token_response.id_token })
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
