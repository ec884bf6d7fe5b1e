//! Customer identity session manager - an OAuth2 authorization-code client with
//! endpoint discovery, optional PKCE, and cookie-backed session persistence for
//! storefront and back-office web applications.
//!
//! # Session lifecycle
//!
//! The lifecycle is driven by the request cycle, never by a timer:
//!
//! ```text
//! ANONYMOUS -> AUTHORIZING (state/PKCE issued)
//!           -> AUTHORIZED  (code exchanged)
//!           -> ACTIVE      (session read, not stale)
//!           -> EXPIRING    (within the 5-minute staleness buffer)
//!           -> REFRESHED   (back to ACTIVE)
//!            | LOGGED_OUT  (cookies cleared; terminal)
//!            | REFRESH_FAILED (terminal; caller restarts at ANONYMOUS)
//! ```
//!
//! Every session read re-evaluates staleness via
//! [`CustomerSession::is_stale`](session::CustomerSession::is_stale); callers
//! refresh proactively instead of waiting for a downstream authorization
//! failure. Malformed cookies never error - the codec resolves them to "no
//! session", pushing the request back to `ANONYMOUS`.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod authorize;
pub mod claims;
pub mod config;
pub mod cookie;
pub mod discovery;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod session;
#[cfg(feature = "reqwest")]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests, both this
	//! crate's and downstream consumers'. Not part of the stable API surface.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::{DEFAULT_HTTP_TIMEOUT, IdentityConfig},
		flows::SessionManager,
		http::ReqwestHttpClient,
	};

	/// Session manager type alias used by reqwest-backed integration tests.
	pub type ReqwestTestSessionManager = SessionManager<ReqwestHttpClient>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates
	/// produced by `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.timeout(DEFAULT_HTTP_TIMEOUT)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client, DEFAULT_HTTP_TIMEOUT)
	}

	/// Constructs a [`SessionManager`] backed by the insecure reqwest transport
	/// used across integration tests.
	pub fn build_test_session_manager(config: IdentityConfig) -> ReqwestTestSessionManager {
		SessionManager::with_http_client(config, test_reqwest_http_client())
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{ConfigError, Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _, tokio as _};
