//! Shows the session codec offline: encoding a session in both cookie layouts,
//! reading a legacy jar back, and clearing everything on logout.

// crates.io
use color_eyre::Result;
use time::{Duration, OffsetDateTime};
// self
use storefront_identity::{
	cookie::{CookieEncoding, CookieJar, SessionCodec},
	session::{CustomerIdentity, CustomerSession, TokenSecret},
};

fn main() -> Result<()> {
	color_eyre::install()?;

	let codec = SessionCodec::new(true);
	let session = CustomerSession {
		access_token: TokenSecret::new("demo-access"),
		refresh_token: TokenSecret::new("demo-refresh"),
		expires_at: OffsetDateTime::now_utc() + Duration::hours(1),
		customer: CustomerIdentity {
			id: "42".into(),
			email: "a@b.com".into(),
			first_name: "Ada".into(),
			last_name: "Lovelace".into(),
		},
	};

	for encoding in [CookieEncoding::Legacy, CookieEncoding::Split] {
		let cookies = codec.encode(&session, Some("demo.id.token"), encoding);

		println!("{encoding:?} layout writes {} cookie(s):", cookies.len());

		for cookie in &cookies {
			println!("  {} = {} bytes", cookie.name, cookie.value.len());
		}
	}

	// A jar written by an earlier deploy still decodes.
	let legacy = codec.encode(&session, None, CookieEncoding::Legacy);
	let jar = legacy.iter().map(|c| (c.name.to_owned(), c.value.clone())).collect::<CookieJar>();
	let restored = codec.decode(&jar).expect("The legacy jar should decode.");

	println!("Decoded legacy session for customer {}.", &restored.customer.id);
	println!("Stale in an hour minus five minutes: {}.", restored.is_stale());

	for cookie in codec.encode_empty() {
		println!("Logout clears {} (Max-Age {}).", cookie.name, cookie.options.max_age);
	}

	Ok(())
}
