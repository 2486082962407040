//! Callback leg: exchanges the provider's authorization code for an access token.
//!
//! [`Relay::complete_callback`] rejects provider-reported errors, a mismatched `state` (when
//! verification is enabled), a missing code, and an unusable host before performing the single
//! server-to-server exchange. No retries are attempted; whatever the exchange returns is what
//! the opener receives.

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, TokenSecret},
	flows::{Relay, RedirectUri},
	http::TokenHttpClient,
	oauth::{self, BasicFacade, OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Query parameters the provider appends when redirecting back.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallbackParams {
	/// Authorization code issued by the provider.
	pub code: Option<String>,
	/// Anti-forgery token echoed back by the provider.
	pub state: Option<String>,
	/// OAuth error code when the provider refused to issue a code.
	pub error: Option<String>,
	/// Human-readable companion to `error`.
	pub error_description: Option<String>,
}

/// Inputs of the server-to-server token exchange.
#[derive(Clone, Debug)]
pub struct TokenExchangeRequest {
	/// Authorization code received on the callback.
	pub code: String,
	/// Redirect URI that must match the authorize leg exactly.
	pub redirect_uri: RedirectUri,
}

/// Access token obtained from a successful exchange.
#[derive(Clone, Debug)]
pub struct AccessGrant {
	/// Bearer token relayed to the opener window.
	pub access_token: TokenSecret,
	/// Provider that issued the token.
	pub provider: ProviderId,
}

impl<C, M> Relay<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Validates the callback request and, when it is usable, exchanges the code.
	///
	/// `issued_state` is the value the authorize leg handed to the browser (read back from the
	/// state cookie); it is only consulted when state verification is enabled.
	pub async fn complete_callback(
		&self,
		host: Option<&str>,
		params: CallbackParams,
		issued_state: Option<&str>,
	) -> Result<AccessGrant> {
		const KIND: FlowKind = FlowKind::Callback;

		let span = FlowSpan::new(KIND, "complete_callback");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = self.prepare_exchange(host, params, issued_state)?;

				self.exchange_code(request).await
			})
			.await;

		match &result {
			Ok(grant) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				tracing::info!(provider = %grant.provider, "authorization code exchanged");
			},
			Err(err) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				tracing::warn!(kind = %err.kind(), error = %err, "authorization code exchange failed");
			},
		}

		result
	}

	/// Performs the authorization-code grant against the provider token endpoint.
	pub async fn exchange_code(&self, request: TokenExchangeRequest) -> Result<AccessGrant> {
		let facade: BasicFacade<C, M> = BasicFacade::from_descriptor(
			&self.descriptor,
			&self.client_id,
			self.client_secret.as_ref(),
			self.http_client.clone(),
			self.transport_mapper.clone(),
		)?;

		facade
			.exchange_authorization_code(
				self.strategy.as_ref(),
				&request.code,
				&request.redirect_uri,
			)
			.await
	}

	fn prepare_exchange(
		&self,
		host: Option<&str>,
		params: CallbackParams,
		issued_state: Option<&str>,
	) -> Result<TokenExchangeRequest> {
		if let Some(error) = params.error.as_deref() {
			return Err(oauth::classify_redirect_error(
				self.strategy.as_ref(),
				error,
				params.error_description.as_deref(),
			));
		}

		if self.verify_state {
			match (issued_state, params.state.as_deref()) {
				(Some(issued), Some(returned)) if !issued.is_empty() && issued == returned => (),
				_ => return Err(Error::StateMismatch),
			}
		}

		let code = params
			.code
			.filter(|code| !code.is_empty())
			.ok_or_else(|| Error::invalid_request("the callback is missing the `code` parameter"))?;
		let host = host.ok_or_else(|| Error::invalid_request("the Host header is missing"))?;
		let redirect_uri = RedirectUri::for_host(host)?;

		Ok(TokenExchangeRequest { code, redirect_uri })
	}
}
