//! Authorization-code relay flows.

pub mod authorize;
pub mod callback;
pub mod common;

pub use authorize::*;
pub use callback::*;
pub use common::*;

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	config::RelayConfig,
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{ReqwestTransportErrorMapper, TransportErrorMapper},
	provider::{DefaultProviderStrategy, ProviderDescriptor, ProviderStrategy},
};

/// Relay specialized for the crate's default reqwest transport stack.
pub type ReqwestRelay = Relay<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Runs the authorize and callback legs against a single provider descriptor.
///
/// The relay is immutable after construction and shared by every request; all data produced
/// by a flow lives only for the request that created it.
#[derive(Clone)]
pub struct Relay<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for the token exchange.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Provider descriptor that defines OAuth endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// Strategy responsible for classifying provider errors.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret held server-side for the token exchange.
	pub client_secret: Option<TokenSecret>,
	/// Scopes requested on the authorize leg.
	pub scope: ScopeSet,
	/// Requires the callback `state` to match the value issued by the authorize leg.
	pub verify_state: bool,
}
impl<C, M> Relay<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a relay that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		client_id: impl Into<String>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			descriptor,
			strategy,
			client_id: client_id.into(),
			client_secret: None,
			scope: ScopeSet::default(),
			verify_state: false,
		}
	}

	/// Sets or replaces the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Sets the scopes requested on the authorize leg.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Enables or disables callback `state` verification.
	pub fn with_state_verification(mut self, enabled: bool) -> Self {
		self.verify_state = enabled;

		self
	}
}
impl Relay<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Builds the relay described by `config`.
	pub fn from_config(config: &RelayConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::build(config.token_timeout)?;

		Ok(Self::from_config_with_client(config, http_client))
	}

	/// Builds the relay described by `config` on top of an existing reqwest client.
	pub fn from_config_with_client(config: &RelayConfig, http_client: ReqwestHttpClient) -> Self {
		let mut relay = Self::with_http_client(
			config.descriptor.clone(),
			Arc::new(DefaultProviderStrategy),
			config.client_id.clone(),
			http_client,
			Arc::new(ReqwestTransportErrorMapper),
		)
		.with_scope(config.scope.clone())
		.with_state_verification(config.verify_state);

		relay.client_secret = config.client_secret.clone();

		relay
	}
}
impl<C, M> Debug for Relay<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Relay")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("scope", &self.scope)
			.field("verify_state", &self.verify_state)
			.finish()
	}
}
