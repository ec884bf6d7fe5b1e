//! Refresh token grant.
//!
//! A refresh response carries no identity claims, so the caller supplies the
//! identity from the session being refreshed and it is copied over unchanged.
//!
//! Refreshes for the same browser session are deliberately not serialized: two
//! concurrent requests may both attempt the grant, and if the provider rotates
//! refresh tokens on use, the losing request is left holding an already
//! superseded token. Known race; the loser's next refresh fails and the caller
//! restarts at login.

// self
use crate::{
	_prelude::*,
	flows::{self, SessionManager},
	http::IdentityHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::{CustomerIdentity, CustomerSession, TokenSecret},
};

impl<C> SessionManager<C>
where
	C: ?Sized + IdentityHttpClient,
{
	/// Exchanges a refresh token for a new token pair.
	///
	/// On success both tokens and the expiry are replaced together; `customer`
	/// is returned exactly as supplied. A non-2xx answer surfaces as
	/// [`Error::TokenRefresh`] and the caller should restart at login.
	pub async fn refresh_session(
		&self,
		refresh_token: &str,
		customer: CustomerIdentity,
	) -> Result<CustomerSession> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_session");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut form = self.token_grant_form("refresh_token");

				form.push(("refresh_token", refresh_token.to_owned()));

				let response = self.post_token_request(form).await?;

				if !response.is_success() {
					return Err(Error::TokenRefresh {
						status: response.status,
						body: response.body_text(),
					});
				}

				let token_response = flows::parse_token_response(&response)?;
				let now = OffsetDateTime::now_utc();
				let expires_at = flows::expires_at_from(token_response.expires_in, now)?;

				Ok(CustomerSession {
					access_token: TokenSecret::new(token_response.access_token),
					refresh_token: TokenSecret::new(token_response.refresh_token),
					expires_at,
					customer,
				})
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Convenience wrapper refreshing an existing session in place.
	pub async fn renew(&self, session: &CustomerSession) -> Result<CustomerSession> {
		self.refresh_session(session.refresh_token.expose(), session.customer.clone()).await
	}
}
