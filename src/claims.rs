//! Identity claim extraction from ID tokens.
//!
//! The payload segment of the ID token is decoded as base64url JSON **without
//! signature verification**: the token arrives directly from the trusted token
//! endpoint over TLS, never from the browser, so the transport already
//! authenticates its origin. Adding JWKS signature verification for
//! defense-in-depth remains an open hardening candidate.
//!
//! Extraction never fails. A missing or malformed claim falls back to an empty
//! value and is logged, because a login must not abort over a cosmetic claim.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, session::CustomerIdentity};

/// Typed claims extracted from an ID token payload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdTokenClaims {
	/// Subject identifier (`sub`).
	pub sub: String,
	/// Email address (`email`).
	pub email: String,
	/// Given name (`given_name`).
	pub given_name: String,
	/// Family name (`family_name`).
	pub family_name: String,
}
impl IdTokenClaims {
	/// Converts the claims into the session's customer identity.
	pub fn into_identity(self) -> CustomerIdentity {
		CustomerIdentity {
			id: self.sub,
			email: self.email,
			first_name: self.given_name,
			last_name: self.family_name,
		}
	}
}

/// Decodes the payload segment of `id_token` into [`IdTokenClaims`].
///
/// Returns all-empty claims when the token is not a three-segment JWT, the
/// payload is not valid base64url, or the JSON is not an object.
pub fn decode_id_token(id_token: &str) -> IdTokenClaims {
	let Some(payload) = id_token.split('.').nth(1) else {
		log_payload_fallback("token is not dot-delimited");

		return IdTokenClaims::default();
	};
	let Ok(bytes) = URL_SAFE_NO_PAD.decode(payload) else {
		log_payload_fallback("payload segment is not base64url");

		return IdTokenClaims::default();
	};
	let Ok(claims) = serde_json::from_slice::<Map<String, Value>>(&bytes) else {
		log_payload_fallback("payload is not a JSON object");

		return IdTokenClaims::default();
	};

	IdTokenClaims {
		sub: string_claim(&claims, "sub"),
		email: string_claim(&claims, "email"),
		given_name: string_claim(&claims, "given_name"),
		family_name: string_claim(&claims, "family_name"),
	}
}

// Providers serialize `sub` as either a string or a bare number; both map onto
// the session's string identifier.
fn string_claim(claims: &Map<String, Value>, claim: &'static str) -> String {
	match claims.get(claim) {
		Some(Value::String(value)) => value.clone(),
		Some(Value::Number(value)) => value.to_string(),
		Some(_) | None => {
			log_claim_fallback(claim);

			String::new()
		},
	}
}

fn log_claim_fallback(claim: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::warn!(claim, "ID token claim is missing or malformed; substituting an empty value.");
	#[cfg(not(feature = "tracing"))]
	let _ = claim;
}

fn log_payload_fallback(reason: &'static str) {
	#[cfg(feature = "tracing")]
	tracing::warn!(reason, "ID token payload could not be decoded; identity claims are empty.");
	#[cfg(not(feature = "tracing"))]
	let _ = reason;
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn id_token_with_payload(payload: &Value) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
		let body = URL_SAFE_NO_PAD
			.encode(serde_json::to_vec(payload).expect("Payload fixture should serialize."));

		format!("{header}.{body}.fake-signature")
	}

	#[test]
	fn all_claims_extract_when_present() {
		let token = id_token_with_payload(&serde_json::json!({
			"sub": "cust-7",
			"email": "a@b.com",
			"given_name": "Ada",
			"family_name": "Lovelace",
			"aud": "storefront",
		}));
		let claims = decode_id_token(&token);

		assert_eq!(claims, IdTokenClaims {
			sub: "cust-7".into(),
			email: "a@b.com".into(),
			given_name: "Ada".into(),
			family_name: "Lovelace".into(),
		});
	}

	#[test]
	fn numeric_sub_is_stringified() {
		let token = id_token_with_payload(&serde_json::json!({ "sub": 42, "email": "a@b.com" }));
		let claims = decode_id_token(&token);

		assert_eq!(claims.sub, "42");
		assert_eq!(claims.email, "a@b.com");
		// Absent name claims degrade to empty values instead of failing the login.
		assert_eq!(claims.given_name, "");
		assert_eq!(claims.family_name, "");
	}

	#[test]
	fn malformed_tokens_yield_empty_claims() {
		assert_eq!(decode_id_token("not-a-jwt"), IdTokenClaims::default());
		assert_eq!(decode_id_token("a.%%%.c"), IdTokenClaims::default());

		let non_object = format!("h.{}.s", URL_SAFE_NO_PAD.encode(b"[1,2,3]"));

		assert_eq!(decode_id_token(&non_object), IdTokenClaims::default());
	}

	#[test]
	fn identity_conversion_maps_field_names() {
		let identity = IdTokenClaims {
			sub: "cust-7".into(),
			email: "a@b.com".into(),
			given_name: "Ada".into(),
			family_name: "Lovelace".into(),
		}
		.into_identity();

		assert_eq!(identity.id, "cust-7");
		assert_eq!(identity.first_name, "Ada");
		assert_eq!(identity.last_name, "Lovelace");
	}
}
