//! Error types shared across discovery, login flows, and the session codec.
//!
//! The taxonomy distinguishes failures by how a caller should react: configuration
//! problems are fatal, timeouts and transport failures are retryable, and token
//! endpoint rejections signal an invalid/expired code or token that usually means
//! prompting the customer to sign in again. Cookie and claim parsing never surface
//! here; the session codec resolves malformed input to "no session" instead.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; fatal until the deployment is fixed.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Endpoint discovery failed and no static fallback was configured.
	#[error(transparent)]
	Discovery(#[from] DiscoveryError),
	/// The provider did not answer within the request deadline; retryable.
	#[error("Identity provider request exceeded the {0} deadline.")]
	Timeout(Duration),
	/// Transport failure (DNS, TCP, TLS); retryable.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token endpoint rejected the authorization code exchange.
	#[error("Authorization code exchange failed with HTTP {status}: {body}")]
	TokenExchange {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Raw response body, kept verbatim for diagnostics.
		body: String,
	},
	/// Token endpoint rejected the refresh token grant.
	#[error("Refresh token grant failed with HTTP {status}: {body}")]
	TokenRefresh {
		/// HTTP status returned by the token endpoint.
		status: u16,
		/// Raw response body, kept verbatim for diagnostics.
		body: String,
	},
	/// Token endpoint answered 2xx but the JSON body could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure with the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the malformed response.
		status: u16,
	},
	/// Returned `state` did not match the one issued for this login attempt.
	#[error("Authorization state mismatch.")]
	StateMismatch,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Identity domain is required for discovery but was not configured.
	#[error("Identity domain is not configured.")]
	MissingIdentityDomain,
	/// Identity domain does not form a valid well-known metadata URL.
	#[error("Identity domain `{domain}` does not form a valid URL.")]
	InvalidIdentityDomain {
		/// Offending domain value.
		domain: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A configured endpoint is plain HTTP on a non-loopback host.
	#[error("The {endpoint} endpoint `{url}` must use HTTPS.")]
	InsecureEndpoint {
		/// Endpoint label (`authorization`, `token`, `end_session`).
		endpoint: &'static str,
		/// Offending URL.
		url: Url,
	},
	/// Token endpoint returned an `expires_in` that is not a usable lifetime.
	#[error("The expires_in value `{expires_in}` is out of range.")]
	InvalidExpiresIn {
		/// Offending lifetime in seconds.
		expires_in: i64,
	},
}
impl ConfigError {
	/// Wraps a transport builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Discovery failures that could not be absorbed by a static fallback.
#[derive(Debug, ThisError)]
pub enum DiscoveryError {
	/// Metadata endpoint answered with a non-2xx status.
	#[error("Metadata document request failed with HTTP {status}.")]
	MetadataStatus {
		/// HTTP status returned by the well-known endpoint.
		status: u16,
	},
	/// Metadata document could not be parsed as JSON.
	#[error("Metadata document is malformed.")]
	MetadataParse {
		/// Structured parsing failure with the offending JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Metadata document omitted a required endpoint field.
	#[error("Metadata document is missing the `{field}` field.")]
	MissingField {
		/// Name of the absent metadata field.
		field: &'static str,
	},
	/// Discovery failed and no fallback endpoints are configured.
	#[error("Endpoint discovery failed and no fallback endpoints are configured.")]
	Unavailable {
		/// Failure that exhausted discovery.
		#[source]
		source: Box<Error>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the identity provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the identity provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
