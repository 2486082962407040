//! Authorize leg: builds the provider consent URL for the popup window.

// crates.io
use rand::Rng;
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	flows::{Relay, RedirectUri},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderDescriptor,
};

const STATE_BYTES: usize = 4;

/// Request-scoped data produced by [`Relay::start_authorization`].
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
	/// Redirect URI reconstructed from the inbound host.
	pub redirect_uri: RedirectUri,
	/// Scopes sent to the provider.
	pub scope: ScopeSet,
	/// Anti-forgery token; 8 lowercase hex characters.
	pub state: String,
	/// Fully-formed authorize URL the browser is redirected to.
	pub authorize_url: Url,
}

impl<C, M> Relay<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the authorize URL for a request that arrived with the given `Host` header.
	pub fn start_authorization(&self, host: &str) -> Result<AuthorizationRequest> {
		const KIND: FlowKind = FlowKind::Authorize;

		let _span = FlowSpan::new(KIND, "start_authorization").entered();

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = RedirectUri::for_host(host).map(|redirect_uri| {
			let state = generate_state();
			let authorize_url = build_authorize_url(
				&self.descriptor,
				&self.client_id,
				&redirect_uri,
				&self.scope,
				&state,
			);

			AuthorizationRequest { redirect_uri, scope: self.scope.clone(), state, authorize_url }
		});

		match &result {
			Ok(request) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				tracing::debug!(redirect_uri = %request.redirect_uri, "built authorize url");
			},
			Err(err) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				tracing::warn!(error = %err, "rejected authorize request");
			},
		}

		result
	}
}

/// Draws a fresh anti-forgery token from the thread-local CSPRNG.
pub fn generate_state() -> String {
	let mut bytes = [0_u8; STATE_BYTES];

	rand::rng().fill(&mut bytes[..]);

	hex::encode(bytes)
}

fn build_authorize_url(
	descriptor: &ProviderDescriptor,
	client_id: &str,
	redirect_uri: &RedirectUri,
	scope: &ScopeSet,
	state: &str,
) -> Url {
	let mut url = descriptor.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());

	if let Some(scope_value) = scope.join(descriptor.quirks.scope_delimiter) {
		pairs.append_pair("scope", &scope_value);
	}

	pairs.append_pair("state", state);

	drop(pairs);

	url
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashSet;
	// self
	use super::*;

	#[test]
	fn state_is_eight_lowercase_hex_chars() {
		let state = generate_state();

		assert_eq!(state.len(), 8);
		assert!(state.chars().all(|ch| matches!(ch, '0'..='9' | 'a'..='f')));
	}

	#[test]
	fn states_do_not_repeat() {
		let states = (0..1000).map(|_| generate_state()).collect::<HashSet<_>>();

		assert_eq!(states.len(), 1000);
	}

	#[test]
	fn authorize_url_encodes_parameters() {
		let descriptor = ProviderDescriptor::github().expect("GitHub preset should build.");
		let redirect_uri =
			RedirectUri::for_host("cms.example.com").expect("Host fixture should be valid.");
		let scope = ScopeSet::new(["repo", "user"]).expect("Scope fixture should be valid.");
		let url = build_authorize_url(&descriptor, "client-1", &redirect_uri, &scope, "0a1b2c3d");

		assert_eq!(
			url.as_str(),
			"https://github.com/login/oauth/authorize?response_type=code&client_id=client-1\
			 &redirect_uri=https%3A%2F%2Fcms.example.com%2Fapi%2Fcallback&scope=repo%2Cuser\
			 &state=0a1b2c3d"
		);
	}
}
