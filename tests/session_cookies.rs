#![cfg(feature = "reqwest")]

// self
use storefront_identity::{
	_preludet::*,
	cookie::{
		CookieEncoding, CookieJar, ID_TOKEN_COOKIE, METADATA_COOKIE, REFRESH_COOKIE,
		SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAMES, SameSite, SessionCodec, SessionCookieSet,
	},
	session::{CustomerIdentity, CustomerSession, TokenSecret},
};

const ID_TOKEN: &str = "header.payload.signature";

fn sample_session() -> CustomerSession {
	CustomerSession {
		access_token: TokenSecret::new("AT1"),
		refresh_token: TokenSecret::new("RT1"),
		// A fixed instant keeps the round-trip comparison exact.
		expires_at: OffsetDateTime::from_unix_timestamp(1_760_000_000)
			.expect("Fixture timestamp should be valid."),
		customer: CustomerIdentity {
			id: "42".into(),
			email: "a@b.com".into(),
			first_name: "Ada".into(),
			last_name: "Lovelace".into(),
		},
	}
}

fn jar_of(cookies: &SessionCookieSet) -> CookieJar {
	cookies.iter().map(|c| (c.name.to_owned(), c.value.clone())).collect()
}

#[test]
fn split_encoding_round_trips() {
	let codec = SessionCodec::new(true);
	let session = sample_session();
	let cookies = codec.encode(&session, Some(ID_TOKEN), CookieEncoding::Split);

	assert_eq!(cookies.len(), 4);

	let jar = jar_of(&cookies);

	assert_eq!(codec.decode(&jar), Some(session));
	assert_eq!(codec.stored_id_token(&jar).as_deref(), Some(ID_TOKEN));
}

#[test]
fn legacy_encoding_round_trips() {
	let codec = SessionCodec::new(true);
	let session = sample_session();
	let cookies = codec.encode(&session, Some(ID_TOKEN), CookieEncoding::Legacy);

	assert_eq!(cookies.len(), 1);

	let jar = jar_of(&cookies);

	assert_eq!(codec.decode(&jar), Some(session));
	assert_eq!(codec.stored_id_token(&jar).as_deref(), Some(ID_TOKEN));
}

#[test]
fn partial_split_set_reads_as_no_session() {
	let codec = SessionCodec::new(true);
	let cookies = codec.encode(&sample_session(), Some(ID_TOKEN), CookieEncoding::Split);
	let jar = cookies
		.iter()
		.filter(|c| c.name != REFRESH_COOKIE)
		.map(|c| (c.name.to_owned(), c.value.clone()))
		.collect::<CookieJar>();

	assert_eq!(codec.decode(&jar), None);
}

#[test]
fn split_encoding_omits_the_id_token_cookie_when_absent() {
	let codec = SessionCodec::new(true);
	let cookies = codec.encode(&sample_session(), None, CookieEncoding::Split);

	assert_eq!(cookies.len(), 3);
	assert!(cookies.get(ID_TOKEN_COOKIE).is_none());
	assert_eq!(codec.stored_id_token(&jar_of(&cookies)), None);
}

#[test]
fn persisted_cookies_carry_the_hardening_attributes() {
	let codec = SessionCodec::new(true);
	let cookies = codec.encode(&sample_session(), None, CookieEncoding::Split);
	let metadata = cookies.get(METADATA_COOKIE).expect("Metadata cookie should be present.");

	assert!(metadata.options.http_only);
	assert!(metadata.options.secure);
	assert_eq!(metadata.options.same_site, SameSite::Lax);
	assert_eq!(metadata.options.path, "/");
	assert_eq!(metadata.options.max_age, SESSION_COOKIE_MAX_AGE);
}

#[test]
fn insecure_deployments_drop_only_the_secure_flag() {
	let codec = SessionCodec::new(false);
	let cookies = codec.encode(&sample_session(), None, CookieEncoding::Split);
	let metadata = cookies.get(METADATA_COOKIE).expect("Metadata cookie should be present.");

	assert!(!metadata.options.secure);
	assert!(metadata.options.http_only);
}

#[test]
fn clearing_covers_every_cookie_ever_written() {
	let codec = SessionCodec::new(true);
	let cleared = codec.encode_empty();

	assert_eq!(cleared.len(), SESSION_COOKIE_NAMES.len());

	for cookie in cleared.iter() {
		assert!(SESSION_COOKIE_NAMES.contains(&cookie.name));
		assert!(cookie.value.is_empty());
		assert_eq!(cookie.options.max_age, Duration::ZERO);
	}

	// A jar built from clearing records reads as anonymous.
	assert_eq!(codec.decode(&jar_of(&cleared)), None);
}

#[test]
fn malformed_cookie_payloads_never_error() {
	let codec = SessionCodec::new(true);
	let jar = CookieJar::parse("customer_session=not-json; customer_session_at=AT1");

	assert_eq!(codec.decode(&jar), None);
}
