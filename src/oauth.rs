//! OAuth client facade over the `oauth2` crate.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{ProviderId, TokenSecret},
	error::{ConfigError, TransientError, TransportError},
	flows::{AccessGrant, RedirectUri},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{
		ClientAuthMethod, ProviderDescriptor, ProviderErrorContext, ProviderErrorKind,
		ProviderQuirks, ProviderStrategy,
	},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Maps HTTP transport failures into relay [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a relay error.
	fn map_transport_error(
		&self,
		strategy: &dyn ProviderStrategy,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		_strategy: &dyn ProviderStrategy,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_generic_transport_error(meta, "unrecognized client failure"),
		}
	}
}

pub(crate) trait OAuth2Facade {
	fn exchange_authorization_code<'a, 'strategy, 'code, 'redirect>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		redirect_uri: &'redirect RedirectUri,
	) -> FacadeFuture<'a, AccessGrant>
	where
		'strategy: 'a,
		'code: 'a,
		'redirect: 'a;
}

pub(crate) struct BasicFacade<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	provider: ProviderId,
	quirks: ProviderQuirks,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: Option<&TokenSecret>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		if let Some(secret) = client_secret {
			oauth_client =
				oauth_client.set_client_secret(ClientSecret::new(secret.expose().to_owned()));
		}
		if matches!(descriptor.client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self {
			oauth_client,
			provider: descriptor.id.clone(),
			quirks: descriptor.quirks,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
		})
	}
}
impl<C, M> OAuth2Facade for BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_authorization_code<'a, 'strategy, 'code, 'redirect>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		redirect_uri: &'redirect RedirectUri,
	) -> FacadeFuture<'a, AccessGrant>
	where
		'strategy: 'a,
		'code: 'a,
		'redirect: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let redirect_url = RedirectUrl::new(redirect_uri.as_str().to_owned())
				.map_err(|source| ConfigError::InvalidDescriptor { source })?;
			let response = self
				.oauth_client
				.exchange_code(AuthorizationCode::new(code.to_owned()))
				.set_redirect_uri(Cow::Owned(redirect_url))
				.request_async(&instrumented)
				.await
				.map_err(|err| {
					map_request_error(
						strategy,
						self.quirks,
						meta.take(),
						err,
						self.error_mapper.as_ref(),
					)
				})?;

			Ok(AccessGrant {
				access_token: TokenSecret::new(response.access_token().secret().to_owned()),
				provider: self.provider.clone(),
			})
		})
	}
}

fn map_request_error<E, M>(
	strategy: &dyn ProviderStrategy,
	quirks: ProviderQuirks,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(strategy, response, meta_ref),
		RequestTokenError::Request(error) => mapper.map_transport_error(strategy, meta_ref, error),
		RequestTokenError::Parse(error, body) => {
			// A `200 OK` carrying `{"error": ...}` fails token parsing; read it as an error body.
			if quirks.errors_with_ok_status {
				if let Ok(response) = serde_json::from_slice::<BasicErrorResponse>(&body) {
					return map_server_response_error(strategy, response, meta_ref);
				}
			}

			TransientError::TokenResponseParse { source: error, status: meta_status(meta_ref) }
				.into()
		},
		RequestTokenError::Other(message) => {
			let mut ctx = ProviderErrorContext::new().with_body_preview(message.clone());

			if let Some(status) = meta_status(meta_ref) {
				ctx = ctx.with_http_status(status);
			}

			classify(strategy, &ctx, message, meta_ref)
		},
	}
}

/// Maps an `error` parameter the provider appended to the callback redirect.
pub(crate) fn classify_redirect_error(
	strategy: &dyn ProviderStrategy,
	error: &str,
	description: Option<&str>,
) -> Error {
	let mut ctx = ProviderErrorContext::new().with_oauth_error(error);

	if let Some(description) = description {
		ctx = ctx.with_error_description(description);
	}

	let reason = match description {
		Some(description) => format!("{error} ({description})"),
		None => error.to_owned(),
	};

	classify(strategy, &ctx, reason, None)
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let code = response.error().as_ref().to_string();
	let mut ctx = ProviderErrorContext::new().with_oauth_error(code.clone());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	let reason = match response.error_description() {
		Some(description) => format!("{code} ({description})"),
		None => code,
	};

	classify(strategy, &ctx, reason, meta)
}

fn classify(
	strategy: &dyn ProviderStrategy,
	ctx: &ProviderErrorContext,
	reason: String,
	meta: Option<&ResponseMetadata>,
) -> Error {
	match strategy.classify_token_error(ctx) {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason },
		ProviderErrorKind::AccessDenied => Error::AccessDenied { reason },
		ProviderErrorKind::Transient =>
			TransientError::TokenEndpoint { message: reason, status: meta_status(meta) }.into(),
	}
}

fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "request timed out while calling the token endpoint".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
		}
		.into();
	}

	TransportError::from(err).into()
}

fn map_generic_transport_error(meta: Option<&ResponseMetadata>, message: impl Display) -> Error {
	TransientError::TokenEndpoint {
		message: format!("HTTP client error occurred while calling the token endpoint: {message}"),
		status: meta_status(meta),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}
