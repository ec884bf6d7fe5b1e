//! Customer session model and the staleness policy used to trigger refreshes.

// self
use crate::_prelude::*;

/// A session counts as stale this long before its actual expiry, so an in-flight
/// request that read the session just before the deadline does not fail mid-call.
pub const STALENESS_BUFFER: Duration = Duration::minutes(5);

/// Redacted token wrapper keeping bearer secrets out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Identity claims describing the authenticated customer.
///
/// Values originate from the ID token issued during the code exchange. Claims the
/// provider omitted are empty strings rather than absent fields, so downstream
/// templates can render them without unwrapping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerIdentity {
	/// Stable subject identifier assigned by the provider.
	pub id: String,
	/// Customer email address.
	pub email: String,
	/// Given name.
	pub first_name: String,
	/// Family name.
	pub last_name: String,
}

/// An authenticated customer session.
///
/// Both tokens are always issued and replaced together; `expires_at` is strictly
/// in the future at creation time. Sessions carry no signature or integrity data
/// of their own - they are trusted because they round-trip through `HttpOnly`
/// cookies the customer's browser cannot script against.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSession {
	/// Opaque bearer token presented to downstream commerce APIs.
	pub access_token: TokenSecret,
	/// Opaque token exchanged for a new pair once the session goes stale.
	pub refresh_token: TokenSecret,
	/// Absolute instant at which the access token stops being accepted.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
	/// Identity claims extracted from the ID token.
	pub customer: CustomerIdentity,
}
impl CustomerSession {
	/// Returns `true` once the session is within [`STALENESS_BUFFER`] of expiry
	/// at the provided instant.
	///
	/// Callers must refresh proactively when this trips rather than waiting for
	/// an authorization failure from a downstream API. The policy is evaluated on
	/// every session read; there is no background scheduler.
	pub fn is_stale_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at - now < STALENESS_BUFFER
	}

	/// Convenience helper that evaluates staleness against the current clock.
	pub fn is_stale(&self) -> bool {
		self.is_stale_at(OffsetDateTime::now_utc())
	}
}
impl Debug for CustomerSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CustomerSession")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.field("customer", &self.customer)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn session_expiring_in(seconds: i64, now: OffsetDateTime) -> CustomerSession {
		CustomerSession {
			access_token: TokenSecret::new("access"),
			refresh_token: TokenSecret::new("refresh"),
			expires_at: now + Duration::seconds(seconds),
			customer: CustomerIdentity::default(),
		}
	}

	#[test]
	fn staleness_buffer_boundary() {
		let now = OffsetDateTime::now_utc();

		// Under the five-minute buffer.
		assert!(session_expiring_in(200, now).is_stale_at(now));
		// Just over it.
		assert!(!session_expiring_in(301, now).is_stale_at(now));
		// Already expired sessions are trivially stale.
		assert!(session_expiring_in(-10, now).is_stale_at(now));
	}

	#[test]
	fn fresh_session_is_not_stale() {
		let now = OffsetDateTime::now_utc();

		assert!(!session_expiring_in(3_600, now).is_stale_at(now));
	}

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");

		let session = CustomerSession {
			access_token: TokenSecret::new("AT-raw-value"),
			refresh_token: TokenSecret::new("RT-raw-value"),
			expires_at: OffsetDateTime::now_utc() + Duration::hours(1),
			customer: CustomerIdentity::default(),
		};
		let rendered = format!("{session:?}");

		assert!(!rendered.contains("AT-raw-value"));
		assert!(!rendered.contains("RT-raw-value"));
		assert!(rendered.contains("<redacted>"));
	}
}
