//! Cookie-backed session persistence.
//!
//! Two encodings coexist for backward-read compatibility:
//!
//! - **Legacy**: one cookie holding the full JSON-serialized session (plus the ID
//!   token when one was issued).
//! - **Split**: four cookies - access token, refresh token, metadata (expiry +
//!   identity, no tokens), and ID token - because a single cookie capped near 4KB
//!   cannot reliably hold a session together with an ID token.
//!
//! New sessions are written in the split encoding; [`SessionCodec::decode`] reads
//! the legacy cookie first and then the split set, and resolves any missing
//! cookie or parse failure to `None`. Nothing ever errors past this boundary -
//! a malformed jar pushes the caller back to an anonymous session instead of
//! crashing request handling. Cookie names must stay stable across deploys.

// self
use crate::{
	_prelude::*,
	session::{CustomerIdentity, CustomerSession, TokenSecret},
};

/// Single-cookie encoding used by earlier deploys; still read, never written.
pub const LEGACY_COOKIE: &str = "customer_session";
/// Split-encoding cookie holding the raw access token.
pub const ACCESS_COOKIE: &str = "customer_session_at";
/// Split-encoding cookie holding the raw refresh token.
pub const REFRESH_COOKIE: &str = "customer_session_rt";
/// Split-encoding cookie holding expiry + identity JSON (no tokens).
pub const METADATA_COOKIE: &str = "customer_session_meta";
/// Split-encoding cookie holding the raw ID token.
pub const ID_TOKEN_COOKIE: &str = "customer_session_idt";
/// Every cookie name the codec has ever written, in clearing order.
pub const SESSION_COOKIE_NAMES: [&str; 5] =
	[LEGACY_COOKIE, ACCESS_COOKIE, REFRESH_COOKIE, METADATA_COOKIE, ID_TOKEN_COOKIE];

/// Lifetime of persisted session cookies.
pub const SESSION_COOKIE_MAX_AGE: Duration = Duration::days(7);

/// `SameSite` attribute values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
	/// Sent on top-level navigations; the default for session cookies.
	Lax,
	/// Never sent cross-site.
	Strict,
	/// Sent cross-site; requires `Secure`.
	None,
}
impl SameSite {
	/// Returns the attribute value as it appears in `Set-Cookie`.
	pub const fn as_str(self) -> &'static str {
		match self {
			SameSite::Lax => "Lax",
			SameSite::Strict => "Strict",
			SameSite::None => "None",
		}
	}
}

/// Attributes attached to every session cookie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieOptions {
	/// Hidden from script access.
	pub http_only: bool,
	/// Only sent over TLS.
	pub secure: bool,
	/// Cross-site send policy.
	pub same_site: SameSite,
	/// Cookie path.
	pub path: &'static str,
	/// Lifetime; zero clears the cookie.
	pub max_age: Duration,
}

/// One cookie record produced by the codec.
///
/// The codec only models records; rendering them into `Set-Cookie` headers
/// (including value escaping) is the web framework's responsibility.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionCookie {
	/// Stable cookie name.
	pub name: &'static str,
	/// Raw cookie value; empty when clearing.
	pub value: String,
	/// Attributes to apply.
	pub options: CookieOptions,
}

/// Ordered list of cookie records representing one encoded session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionCookieSet(Vec<SessionCookie>);
impl SessionCookieSet {
	/// Iterates the records in write order.
	pub fn iter(&self) -> std::slice::Iter<'_, SessionCookie> {
		self.0.iter()
	}

	/// Looks up a record by cookie name.
	pub fn get(&self, name: &str) -> Option<&SessionCookie> {
		self.0.iter().find(|cookie| cookie.name == name)
	}

	/// Number of records in the set.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when the set contains no records.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl IntoIterator for SessionCookieSet {
	type IntoIter = std::vec::IntoIter<SessionCookie>;
	type Item = SessionCookie;

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}
impl<'a> IntoIterator for &'a SessionCookieSet {
	type IntoIter = std::slice::Iter<'a, SessionCookie>;
	type Item = &'a SessionCookie;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Which cookie layout to produce when encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CookieEncoding {
	/// One JSON cookie; kept for backward-read compatibility tests and rollback.
	Legacy,
	/// Four-cookie layout written by current deploys.
	#[default]
	Split,
}

/// Request cookies as seen by the codec.
#[derive(Clone, Debug, Default)]
pub struct CookieJar(BTreeMap<String, String>);
impl CookieJar {
	/// Creates an empty jar.
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces a cookie value.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
		self.0.insert(name.into(), value.into());
	}

	/// Parses a `Cookie` request header (`name=value; other=value`).
	///
	/// Values some frameworks wrap in double quotes (`name="value"`) are
	/// unquoted, since the quotes are framing rather than cookie content.
	pub fn parse(header: &str) -> Self {
		header
			.split(';')
			.filter_map(|pair| {
				let (name, value) = pair.split_once('=')?;
				let value = value.trim();
				let value = value
					.strip_prefix('"')
					.and_then(|rest| rest.strip_suffix('"'))
					.unwrap_or(value);

				Some((name.trim().to_owned(), value.to_owned()))
			})
			.collect()
	}

	/// Returns the value for `name`; cleared (empty) cookies count as absent.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(name).map(String::as_str).filter(|value| !value.is_empty())
	}
}
impl FromIterator<(String, String)> for CookieJar {
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (String, String)>,
	{
		Self(iter.into_iter().collect())
	}
}

/// Legacy single-cookie body: the session plus the ID token it was issued with.
#[derive(Serialize, Deserialize)]
struct LegacyRecord {
	#[serde(flatten)]
	session: CustomerSession,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	id_token: Option<String>,
}

/// Split-encoding metadata body: everything a request needs to render the
/// customer without shipping the tokens twice.
#[derive(Serialize, Deserialize)]
struct SessionMetadata {
	#[serde(with = "time::serde::rfc3339")]
	expires_at: OffsetDateTime,
	customer: CustomerIdentity,
}

/// Serializes sessions into cookie records and parses them back.
#[derive(Clone, Debug)]
pub struct SessionCodec {
	secure: bool,
}
impl SessionCodec {
	/// Creates a codec; `secure` marks every cookie `Secure` (production).
	pub fn new(secure: bool) -> Self {
		Self { secure }
	}

	/// Encodes a session into cookie records using the requested layout.
	pub fn encode(
		&self,
		session: &CustomerSession,
		id_token: Option<&str>,
		encoding: CookieEncoding,
	) -> SessionCookieSet {
		let options = self.persist_options();

		match encoding {
			CookieEncoding::Legacy => {
				let record = LegacyRecord {
					session: session.clone(),
					id_token: id_token.map(ToOwned::to_owned),
				};

				SessionCookieSet(vec![SessionCookie {
					name: LEGACY_COOKIE,
					value: to_json(&record),
					options,
				}])
			},
			CookieEncoding::Split => {
				let metadata = SessionMetadata {
					expires_at: session.expires_at,
					customer: session.customer.clone(),
				};
				let mut cookies = vec![
					SessionCookie {
						name: ACCESS_COOKIE,
						value: session.access_token.expose().to_owned(),
						options: options.clone(),
					},
					SessionCookie {
						name: REFRESH_COOKIE,
						value: session.refresh_token.expose().to_owned(),
						options: options.clone(),
					},
					SessionCookie {
						name: METADATA_COOKIE,
						value: to_json(&metadata),
						options: options.clone(),
					},
				];

				if let Some(id_token) = id_token {
					cookies.push(SessionCookie {
						name: ID_TOKEN_COOKIE,
						value: id_token.to_owned(),
						options,
					});
				}

				SessionCookieSet(cookies)
			},
		}
	}

	/// Parses the jar back into a session, trying the legacy cookie first and
	/// then the split set. Returns `None` unless one encoding is fully present
	/// and parses; a partial split set never yields a partial session.
	pub fn decode(&self, jar: &CookieJar) -> Option<CustomerSession> {
		decode_legacy(jar).or_else(|| decode_split(jar))
	}

	/// Returns the ID token persisted alongside the session, if any.
	pub fn stored_id_token(&self, jar: &CookieJar) -> Option<String> {
		if let Some(value) = jar.get(LEGACY_COOKIE) {
			if let Ok(record) = serde_json::from_str::<LegacyRecord>(value) {
				return record.id_token;
			}
		}

		jar.get(ID_TOKEN_COOKIE).map(ToOwned::to_owned)
	}

	/// Produces clearing records for every cookie name the codec has ever
	/// written, with empty values and a zero `Max-Age`.
	pub fn encode_empty(&self) -> SessionCookieSet {
		let options = CookieOptions { max_age: Duration::ZERO, ..self.persist_options() };

		SessionCookieSet(
			SESSION_COOKIE_NAMES
				.iter()
				.map(|&name| SessionCookie {
					name,
					value: String::new(),
					options: options.clone(),
				})
				.collect(),
		)
	}

	fn persist_options(&self) -> CookieOptions {
		CookieOptions {
			http_only: true,
			secure: self.secure,
			same_site: SameSite::Lax,
			path: "/",
			max_age: SESSION_COOKIE_MAX_AGE,
		}
	}
}

fn decode_legacy(jar: &CookieJar) -> Option<CustomerSession> {
	let value = jar.get(LEGACY_COOKIE)?;
	let record: LegacyRecord = parse_cookie_json(LEGACY_COOKIE, value)?;

	Some(record.session)
}

fn decode_split(jar: &CookieJar) -> Option<CustomerSession> {
	let access_token = jar.get(ACCESS_COOKIE)?;
	let refresh_token = jar.get(REFRESH_COOKIE)?;
	let metadata: SessionMetadata = parse_cookie_json(METADATA_COOKIE, jar.get(METADATA_COOKIE)?)?;

	Some(CustomerSession {
		access_token: TokenSecret::new(access_token),
		refresh_token: TokenSecret::new(refresh_token),
		expires_at: metadata.expires_at,
		customer: metadata.customer,
	})
}

fn parse_cookie_json<T>(cookie: &'static str, value: &str) -> Option<T>
where
	T: serde::de::DeserializeOwned,
{
	match serde_json::from_str(value) {
		Ok(parsed) => Some(parsed),
		Err(_e) => {
			#[cfg(feature = "tracing")]
			tracing::debug!(cookie, error = %_e, "Discarding unparseable session cookie.");
			#[cfg(not(feature = "tracing"))]
			let _ = cookie;

			None
		},
	}
}

// The record types hold only strings and an RFC 3339 timestamp, so JSON
// serialization cannot fail; the impossible branch degrades to an empty value,
// which decodes as an absent cookie.
fn to_json<T>(value: &T) -> String
where
	T: Serialize,
{
	serde_json::to_string(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn session() -> CustomerSession {
		CustomerSession {
			access_token: TokenSecret::new("AT1"),
			refresh_token: TokenSecret::new("RT1"),
			expires_at: OffsetDateTime::now_utc() + Duration::hours(1),
			customer: CustomerIdentity {
				id: "cust-7".into(),
				email: "a@b.com".into(),
				first_name: "Ada".into(),
				last_name: "Lovelace".into(),
			},
		}
	}

	#[test]
	fn empty_and_garbage_jars_decode_to_none() {
		let codec = SessionCodec::new(true);

		assert_eq!(codec.decode(&CookieJar::new()), None);

		let mut jar = CookieJar::new();

		jar.insert(LEGACY_COOKIE, "{not json");
		jar.insert(ACCESS_COOKIE, "AT1");
		jar.insert(REFRESH_COOKIE, "RT1");
		jar.insert(METADATA_COOKIE, "also not json");

		assert_eq!(codec.decode(&jar), None);
	}

	#[test]
	fn split_metadata_cookie_carries_no_tokens() {
		let codec = SessionCodec::new(true);
		let cookies = codec.encode(&session(), Some("ID.TOKEN.VALUE"), CookieEncoding::Split);
		let metadata =
			cookies.get(METADATA_COOKIE).expect("Split encoding should emit a metadata cookie.");

		assert!(!metadata.value.contains("AT1"));
		assert!(!metadata.value.contains("RT1"));
		assert!(metadata.value.contains("a@b.com"));
	}

	#[test]
	fn clearing_covers_every_known_cookie() {
		let codec = SessionCodec::new(true);
		let cleared = codec.encode_empty();

		assert_eq!(cleared.len(), SESSION_COOKIE_NAMES.len());

		for cookie in &cleared {
			assert!(cookie.value.is_empty());
			assert_eq!(cookie.options.max_age, Duration::ZERO);
			assert!(cookie.options.http_only);
			assert_eq!(cookie.options.same_site, SameSite::Lax);
			assert_eq!(cookie.options.path, "/");
		}
	}

	#[test]
	fn cleared_cookies_count_as_absent_on_read() {
		let codec = SessionCodec::new(true);
		let mut jar = CookieJar::new();

		for cookie in codec.encode(&session(), None, CookieEncoding::Split) {
			jar.insert(cookie.name, cookie.value);
		}
		for cookie in codec.encode_empty() {
			jar.insert(cookie.name, cookie.value);
		}

		assert_eq!(codec.decode(&jar), None);
	}

	#[test]
	fn cookie_header_parsing_trims_pairs() {
		let jar = CookieJar::parse("a=1; customer_session_at=AT1 ;broken;b=2");

		assert_eq!(jar.get("a"), Some("1"));
		assert_eq!(jar.get("customer_session_at"), Some("AT1"));
		assert_eq!(jar.get("b"), Some("2"));
		assert_eq!(jar.get("broken"), None);
	}

	#[test]
	fn quoted_cookie_values_are_unquoted() {
		let jar = CookieJar::parse(r#"a="1"; b="x=y"; empty=""; lone=""#);

		assert_eq!(jar.get("a"), Some("1"));
		assert_eq!(jar.get("b"), Some("x=y"));
		// An unquoted empty value still counts as absent.
		assert_eq!(jar.get("empty"), None);
		// A single quote is content, not framing.
		assert_eq!(jar.get("lone"), Some("\""));
	}

	#[test]
	fn quoted_session_cookies_still_decode() {
		let codec = SessionCodec::new(true);
		let session = session();
		let header = codec
			.encode(&session, None, CookieEncoding::Split)
			.iter()
			.map(|cookie| format!("{}=\"{}\"", cookie.name, cookie.value))
			.collect::<Vec<_>>()
			.join("; ");

		assert_eq!(codec.decode(&CookieJar::parse(&header)), Some(session));
	}
}
