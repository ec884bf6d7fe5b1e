//! Identity provider endpoint discovery with a process-lifetime cache.
//!
//! [`EndpointResolver::discover`] resolves the provider's operational URLs from
//! the published well-known metadata document. A successful result is cached for
//! the remaining process lifetime and returned directly on subsequent calls - no
//! TTL, no re-validation. On failure the resolver degrades to the statically
//! configured fallback endpoints when present, otherwise the failure propagates
//! as [`DiscoveryError`]. No retry is built in.

// self
use crate::{
	_prelude::*,
	config::IdentityConfig,
	error::DiscoveryError,
	http::IdentityHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Well-known path of the provider metadata document.
pub const WELL_KNOWN_PATH: &str = "/.well-known/openid-configuration";

/// Endpoint tuple resolved from provider metadata (or static fallback config).
///
/// Replaced wholesale on each successful discovery; there is no partial merge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredEndpoints {
	/// Authorization endpoint for the browser login redirect.
	pub authorization_endpoint: Url,
	/// Token endpoint for code exchanges and refreshes.
	pub token_endpoint: Url,
	/// End-session endpoint for the browser logout redirect.
	pub end_session_endpoint: Url,
	/// Issuer identifier, when the metadata document carried one.
	pub issuer: Option<Url>,
}

/// Raw metadata document shape; every field optional so validation can name the
/// first missing one instead of failing on an anonymous deserialize error.
#[derive(Debug, Deserialize)]
struct MetadataDocument {
	#[serde(default)]
	authorization_endpoint: Option<Url>,
	#[serde(default)]
	token_endpoint: Option<Url>,
	#[serde(default)]
	end_session_endpoint: Option<Url>,
	#[serde(default)]
	issuer: Option<Url>,
}
impl TryFrom<MetadataDocument> for DiscoveredEndpoints {
	type Error = DiscoveryError;

	fn try_from(doc: MetadataDocument) -> Result<Self, Self::Error> {
		let authorization_endpoint = doc
			.authorization_endpoint
			.ok_or(DiscoveryError::MissingField { field: "authorization_endpoint" })?;
		let token_endpoint =
			doc.token_endpoint.ok_or(DiscoveryError::MissingField { field: "token_endpoint" })?;
		let end_session_endpoint = doc
			.end_session_endpoint
			.ok_or(DiscoveryError::MissingField { field: "end_session_endpoint" })?;

		Ok(Self { authorization_endpoint, token_endpoint, end_session_endpoint, issuer: doc.issuer })
	}
}

/// Resolver owning the process-wide endpoint cache.
///
/// The cache is an explicit, injectable object rather than ambient module state.
/// It holds at most one [`DiscoveredEndpoints`] value and swaps it atomically as a
/// whole; there is no per-field locking. Concurrent first-time discoveries may
/// race and issue duplicate metadata requests - accepted, since every racing
/// result is equally valid and the last write wins wholesale.
#[derive(Debug, Default)]
pub struct EndpointResolver {
	cache: RwLock<Option<DiscoveredEndpoints>>,
}
impl EndpointResolver {
	/// Creates a resolver with an empty cache.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the cached endpoint tuple without touching the network.
	pub fn cached(&self) -> Option<DiscoveredEndpoints> {
		self.cache.read().clone()
	}

	/// Drops the cached tuple so the next [`discover`](Self::discover) call
	/// re-runs discovery.
	pub fn invalidate(&self) {
		*self.cache.write() = None;
	}

	/// Resolves the provider endpoints, consulting the cache first.
	///
	/// Fails with [`ConfigError::MissingIdentityDomain`] when no identity domain
	/// is configured; that error never degrades to the fallback tuple.
	pub async fn discover<C>(
		&self,
		config: &IdentityConfig,
		http_client: &C,
	) -> Result<DiscoveredEndpoints>
	where
		C: ?Sized + IdentityHttpClient,
	{
		if let Some(cached) = self.cached() {
			return Ok(cached);
		}

		const KIND: FlowKind = FlowKind::Discovery;

		let span = FlowSpan::new(KIND, "discover");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let domain = config
					.identity_domain
					.as_deref()
					.ok_or(ConfigError::MissingIdentityDomain)?;

				match self.fetch_metadata(domain, http_client).await {
					Ok(endpoints) => {
						*self.cache.write() = Some(endpoints.clone());

						Ok(endpoints)
					},
					Err(e) =>
						if let Some(fallback) = &config.fallback_endpoints {
							#[cfg(feature = "tracing")]
							tracing::warn!(
								error = %e,
								"Endpoint discovery failed; using configured fallback endpoints."
							);
							#[cfg(not(feature = "tracing"))]
							let _ = &e;

							// The fallback tuple is deliberately not cached, so a
							// later call can still recover real metadata.
							Ok(fallback.clone())
						} else {
							Err(DiscoveryError::Unavailable { source: Box::new(e) }.into())
						},
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn fetch_metadata<C>(&self, domain: &str, http_client: &C) -> Result<DiscoveredEndpoints>
	where
		C: ?Sized + IdentityHttpClient,
	{
		let url = well_known_url(domain)?;
		let response = http_client.get(url).await?;

		if !response.is_success() {
			return Err(DiscoveryError::MetadataStatus { status: response.status }.into());
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);
		let document: MetadataDocument = serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| DiscoveryError::MetadataParse { source })?;

		Ok(document.try_into()?)
	}
}

fn well_known_url(domain: &str) -> Result<Url> {
	Url::parse(&format!("https://{domain}{WELL_KNOWN_PATH}")).map_err(|source| {
		ConfigError::InvalidIdentityDomain { domain: domain.to_owned(), source }.into()
	})
}
