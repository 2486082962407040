//! Relay-level error types shared across flows, providers, and the HTTP surface.

// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Inbound request is missing data required to run the flow.
	#[error("Request is invalid: {reason}.")]
	InvalidRequest {
		/// Human-readable reason string.
		reason: String,
	},
	/// Provider rejected the grant (e.g., bad or expired code).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or relay-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or relay-supplied reason string.
		reason: String,
	},
	/// The resource owner (or the provider) refused the authorization.
	#[error("Authorization was denied: {reason}.")]
	AccessDenied {
		/// Provider- or relay-supplied reason string.
		reason: String,
	},
	/// Returned `state` did not match the value issued on the authorize leg.
	#[error("Authorization state mismatch.")]
	StateMismatch,
}
impl Error {
	/// Returns the stable classification used in opener payloads and logs.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Config(_) => ErrorKind::Configuration,
			Self::Transient(_) => ErrorKind::ProviderUnavailable,
			Self::Transport(_) => ErrorKind::Transport,
			Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
			Self::InvalidGrant { .. } => ErrorKind::InvalidGrant,
			Self::InvalidClient { .. } => ErrorKind::InvalidClient,
			Self::AccessDenied { .. } => ErrorKind::AccessDenied,
			Self::StateMismatch => ErrorKind::StateMismatch,
		}
	}

	pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
		Self::InvalidRequest { reason: reason.into() }
	}
}

/// Stable error categories surfaced to the opener window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
	/// Relay configuration is unusable.
	Configuration,
	/// Provider answered with a temporary or unexpected failure.
	ProviderUnavailable,
	/// Provider could not be reached.
	Transport,
	/// Inbound request lacked required data.
	InvalidRequest,
	/// Authorization code was rejected.
	InvalidGrant,
	/// Client credentials were rejected.
	InvalidClient,
	/// Authorization was refused.
	AccessDenied,
	/// Anti-forgery token did not round-trip.
	StateMismatch,
}
impl ErrorKind {
	/// Returns the snake_case label used on the wire.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Configuration => "configuration",
			Self::ProviderUnavailable => "provider_unavailable",
			Self::Transport => "transport",
			Self::InvalidRequest => "invalid_request",
			Self::InvalidGrant => "invalid_grant",
			Self::InvalidClient => "invalid_client",
			Self::AccessDenied => "access_denied",
			Self::StateMismatch => "state_mismatch",
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Configuration and validation failures raised by the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Descriptor builder validation failed.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Configured scopes cannot be normalized.
	#[error("Configured scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Provider identifier failed validation.
	#[error("Provider identifier is invalid.")]
	InvalidProviderId(#[from] crate::auth::IdentifierError),
	/// An environment variable holds a value that cannot be parsed.
	#[error("Environment variable `{key}` is invalid: {reason}.")]
	InvalidEnv {
		/// Variable name.
		key: &'static str,
		/// Parsing failure summary.
		reason: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or relay-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn kinds_use_stable_labels() {
		assert_eq!(Error::StateMismatch.kind().as_str(), "state_mismatch");
		assert_eq!(
			Error::InvalidGrant { reason: "bad code".into() }.kind(),
			ErrorKind::InvalidGrant
		);
		assert_eq!(
			Error::from(TransportError::Io(std::io::Error::other("reset"))).kind(),
			ErrorKind::Transport
		);
		assert_eq!(
			serde_json::to_string(&ErrorKind::ProviderUnavailable)
				.expect("Error kinds should serialize."),
			"\"provider_unavailable\""
		);
	}

	#[test]
	fn transport_display_hides_source_details() {
		let err = Error::from(TransportError::network(std::io::Error::other("10.0.0.7:443 refused")));

		assert_eq!(err.to_string(), "Network error occurred while calling the token endpoint.");
	}
}
