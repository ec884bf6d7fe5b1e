//! Transport primitives for provider calls.
//!
//! The [`IdentityHttpClient`] trait is the crate's only dependency on an HTTP
//! stack: discovery needs a JSON `GET`, the token endpoint needs a form-encoded
//! `POST`, and both return the raw status and body so flow code can keep non-2xx
//! diagnostics verbatim. Every call blocks on a fixed deadline; timeouts are
//! surfaced as [`Error::Timeout`] so callers can distinguish "retry" from
//! "re-authenticate". There is no built-in retry, and cancellation is simply the
//! caller dropping the in-flight future.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, config::DEFAULT_HTTP_TIMEOUT, error::TransportError};

/// Future type returned by [`IdentityHttpClient`] implementations.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Raw response captured from the identity provider.
#[derive(Clone, Debug)]
pub struct HttpResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes, unparsed.
	pub body: Vec<u8>,
}
impl HttpResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Renders the body as text for diagnostics, replacing invalid UTF-8.
	pub fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Abstraction over HTTP transports capable of executing provider calls.
///
/// Implementations must be `Send + Sync + 'static` so one client can serve every
/// request in the process, and the returned futures must be `Send` so callers can
/// hop executors freely. Transport failures map to [`Error::Timeout`] or
/// [`Error::Transport`]; a non-2xx status is not a transport error and must be
/// returned as a regular [`HttpResponse`] for the flow layer to classify.
pub trait IdentityHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Executes a `GET` expecting a JSON document (discovery metadata).
	fn get(&self, url: Url) -> TransportFuture<'_, HttpResponse>;

	/// Executes a form-encoded `POST` (token endpoint grants).
	fn post_form(&self, url: Url, form: Vec<(&'static str, String)>)
	-> TransportFuture<'_, HttpResponse>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one
/// place. Token requests must not follow redirects, matching OAuth 2.0 guidance
/// that token endpoints return results directly instead of delegating to another
/// URI; configure any custom [`ReqwestClient`] the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestHttpClient {
	client: ReqwestClient,
	timeout: StdDuration,
}
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Builds a client with the default 20-second deadline.
	pub fn new() -> Result<Self, ConfigError> {
		Self::with_timeout(DEFAULT_HTTP_TIMEOUT)
	}

	/// Builds a client enforcing the provided deadline on every call.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self::with_client(client, timeout))
	}

	/// Wraps an existing [`ReqwestClient`]. The deadline must match the one the
	/// client enforces; it is only used to label timeout errors.
	pub fn with_client(client: ReqwestClient, timeout: StdDuration) -> Self {
		Self { client, timeout }
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl IdentityHttpClient for ReqwestHttpClient {
	fn get(&self, url: Url) -> TransportFuture<'_, HttpResponse> {
		let client = self.client.clone();
		let timeout = self.timeout;

		Box::pin(async move {
			let response =
				client.get(url).send().await.map_err(|e| map_reqwest_error(timeout, e))?;

			read_response(timeout, response).await
		})
	}

	fn post_form(
		&self,
		url: Url,
		form: Vec<(&'static str, String)>,
	) -> TransportFuture<'_, HttpResponse> {
		let client = self.client.clone();
		let timeout = self.timeout;

		Box::pin(async move {
			let response = client
				.post(url)
				.form(&form)
				.send()
				.await
				.map_err(|e| map_reqwest_error(timeout, e))?;

			read_response(timeout, response).await
		})
	}
}

#[cfg(feature = "reqwest")]
async fn read_response(timeout: StdDuration, response: reqwest::Response) -> Result<HttpResponse> {
	let status = response.status().as_u16();
	let body =
		response.bytes().await.map_err(|e| map_reqwest_error(timeout, e))?.to_vec();

	Ok(HttpResponse { status, body })
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(timeout: StdDuration, e: ReqwestError) -> Error {
	if e.is_timeout() {
		Error::Timeout(Duration::try_from(timeout).unwrap_or(Duration::ZERO))
	} else {
		TransportError::network(e).into()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn success_statuses_cover_the_2xx_range() {
		assert!(HttpResponse { status: 200, body: vec![] }.is_success());
		assert!(HttpResponse { status: 204, body: vec![] }.is_success());
		assert!(!HttpResponse { status: 302, body: vec![] }.is_success());
		assert!(!HttpResponse { status: 400, body: vec![] }.is_success());
	}

	#[test]
	fn body_text_replaces_invalid_utf8() {
		let response = HttpResponse { status: 200, body: vec![0x68, 0x69, 0xFF] };

		assert_eq!(response.body_text(), "hi\u{FFFD}");
	}
}
