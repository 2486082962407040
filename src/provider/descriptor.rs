//! Provider descriptor data structures and presets.
//!
//! The module exposes validated metadata and builder utilities so the relay can describe
//! the upstream authorization server in a transport-agnostic way.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{_prelude::*, auth::ProviderId};

const GITHUB_ID: &str = "github";
const GITHUB_HOST: &str = "github.com";
const GITHUB_AUTHORIZE_PATH: &str = "/login/oauth/authorize";
const GITHUB_TOKEN_PATH: &str = "/login/oauth/access_token";

/// Client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the browser is redirected to.
	pub authorization: Url,
	/// Token endpoint used for the server-to-server code exchange.
	pub token: Url,
}

/// Immutable provider descriptor consumed by the relay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier, also used as the handoff message prefix.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Client authentication mechanism for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Descriptor for github.com.
	pub fn github() -> Result<Self, ProviderDescriptorError> {
		Self::github_enterprise(GITHUB_HOST)
	}

	/// Descriptor for a GitHub Enterprise Server reachable at `hostname`.
	///
	/// Enterprise servers serve the OAuth endpoints under the same paths as github.com.
	pub fn github_enterprise(hostname: &str) -> Result<Self, ProviderDescriptorError> {
		let endpoint = |path: &str| {
			Url::parse(&format!("https://{hostname}{path}")).map_err(|_| {
				ProviderDescriptorError::InvalidHostname { hostname: hostname.to_owned() }
			})
		};
		let id = ProviderId::new(GITHUB_ID)?;

		Self::builder(id)
			.authorization_endpoint(endpoint(GITHUB_AUTHORIZE_PATH)?)
			.token_endpoint(endpoint(GITHUB_TOKEN_PATH)?)
			.client_auth_method(ClientAuthMethod::ClientSecretPost)
			.quirks(ProviderQuirks::github())
			.build()
	}
}
