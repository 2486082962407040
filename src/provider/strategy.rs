//! Provider strategy hooks that classify token endpoint failures.
//!
//! Implementations normalize error mapping without tying the relay to any particular
//! HTTP client.

// self
use crate::_prelude::*;

/// Strategy hook that allows providers to classify token endpoint errors.
///
/// The hook works on crate-owned data so downstream crates never depend on
/// reqwest-specific structures.
pub trait ProviderStrategy: Send + Sync {
	/// Maps an OAuth error response or HTTP status into the relay taxonomy.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Provider rejected the authorization code or redirect URI.
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// The user or provider refused the authorization.
	AccessDenied,
	/// Failure is temporary or unrecognized.
	Transient,
}

/// Context passed to provider strategies when classifying token errors.
///
/// Only primitive data (status codes, OAuth fields, body preview) is kept so strategies stay
/// decoupled from the HTTP stack.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// Provider-supplied OAuth `error` field.
	pub oauth_error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Preview of the response body for non-JSON payloads.
	pub body_preview: Option<String>,
}
impl ProviderErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates an empty context.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an HTTP status code (e.g., 400, 401, 500).
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds a body preview for providers that return non-JSON payloads.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}
}

/// Default strategy covering RFC 6749 codes and GitHub's own error codes.
///
/// Structured OAuth fields win, then body text hints, then the HTTP status code. Network
/// failures are always transient.
#[derive(Debug, Default)]
pub struct DefaultProviderStrategy;
impl Display for DefaultProviderStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("default-provider-strategy")
	}
}
impl ProviderStrategy for DefaultProviderStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if let Some(kind) = ctx.oauth_error.as_deref().and_then(match_exact_value) {
			return kind;
		}
		if let Some(kind) = classify_body(ctx.error_description.as_deref()) {
			return kind;
		}
		if let Some(kind) = classify_body(ctx.body_preview.as_deref()) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= ProviderErrorContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = body.chars().take(ProviderErrorContext::BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

fn match_exact_value(value: &str) -> Option<ProviderErrorKind> {
	const INVALID_GRANT: &[&str] =
		&["invalid_grant", "bad_verification_code", "redirect_uri_mismatch"];
	const INVALID_CLIENT: &[&str] =
		&["invalid_client", "unauthorized_client", "incorrect_client_credentials"];
	const ACCESS_DENIED: &[&str] = &["access_denied", "unverified_user_email"];
	const TRANSIENT: &[&str] = &["temporarily_unavailable", "server_error"];

	let matches = |codes: &[&str]| codes.iter().any(|code| value.eq_ignore_ascii_case(code));

	if matches(INVALID_GRANT) {
		Some(ProviderErrorKind::InvalidGrant)
	} else if matches(INVALID_CLIENT) {
		Some(ProviderErrorKind::InvalidClient)
	} else if matches(ACCESS_DENIED) {
		Some(ProviderErrorKind::AccessDenied)
	} else if matches(TRANSIENT) {
		Some(ProviderErrorKind::Transient)
	} else {
		None
	}
}

fn classify_body(body: Option<&str>) -> Option<ProviderErrorKind> {
	let lowered = body?.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant") || text.contains("bad_verification_code") =>
			Some(ProviderErrorKind::InvalidGrant),
		text if text.contains("invalid_client") || text.contains("incorrect_client_credentials") =>
			Some(ProviderErrorKind::InvalidClient),
		text if text.contains("access_denied") => Some(ProviderErrorKind::AccessDenied),
		text if text.contains("temporarily_unavailable") => Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::AccessDenied,
		_ => ProviderErrorKind::Transient,
	}
}
