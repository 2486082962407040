//! Process-wide relay configuration.
//!
//! [`RelayConfig`] is assembled once at startup (usually from the environment) and then shared
//! read-only by every request.

// std
use std::{net::SocketAddr, time::Duration as StdDuration};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	error::ConfigError,
	provider::ProviderDescriptor,
};

/// OAuth application client identifier.
pub const ENV_CLIENT_ID: &str = "OAUTH_CLIENT_ID";
/// OAuth application client secret.
pub const ENV_CLIENT_SECRET: &str = "OAUTH_CLIENT_SECRET";
/// GitHub Enterprise hostname; unset means github.com.
pub const ENV_GIT_HOSTNAME: &str = "GIT_HOSTNAME";
/// Comma- or whitespace-separated scopes.
pub const ENV_SCOPES: &str = "OAUTH_SCOPES";
/// Enables callback `state` verification.
pub const ENV_VERIFY_STATE: &str = "OAUTH_VERIFY_STATE";
/// Listen address of the HTTP server.
pub const ENV_BIND: &str = "RELAY_BIND";
/// Timeout in seconds applied to the token exchange.
pub const ENV_TOKEN_TIMEOUT_SECS: &str = "RELAY_TOKEN_TIMEOUT_SECS";

const DEFAULT_BIND: SocketAddr =
	SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED), 3000);

/// Settings shared by the authorize and callback legs.
#[derive(Clone, Debug)]
pub struct RelayConfig {
	/// Provider the relay talks to.
	pub descriptor: ProviderDescriptor,
	/// OAuth application client identifier.
	pub client_id: String,
	/// OAuth application client secret.
	pub client_secret: Option<TokenSecret>,
	/// Scopes requested on the authorize leg.
	pub scope: ScopeSet,
	/// Whether the callback must echo the `state` issued by the authorize leg.
	pub verify_state: bool,
	/// Optional timeout for the token exchange request.
	pub token_timeout: Option<StdDuration>,
	/// Listen address of the HTTP server.
	pub bind: SocketAddr,
}
impl RelayConfig {
	/// Creates a github.com configuration with default scopes and state verification disabled.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, ConfigError> {
		Ok(Self {
			descriptor: ProviderDescriptor::github()?,
			client_id: client_id.into(),
			client_secret: Some(TokenSecret::new(client_secret)),
			scope: ScopeSet::repo_user(),
			verify_state: false,
			token_timeout: None,
			bind: DEFAULT_BIND,
		})
	}

	/// Reads the configuration from process environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Reads the configuration through `lookup`, which resolves a variable name to its value.
	///
	/// Blank values are treated as unset. Missing credentials are logged but do not fail, so the
	/// relay can start and surface the provider's rejection on the first exchange.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());
		let client_id = get(ENV_CLIENT_ID).unwrap_or_else(|| {
			tracing::warn!("{ENV_CLIENT_ID} is not set; token exchanges will be rejected");

			String::new()
		});
		let client_secret = get(ENV_CLIENT_SECRET).map(TokenSecret::new);

		if client_secret.is_none() {
			tracing::warn!("{ENV_CLIENT_SECRET} is not set; token exchanges will be rejected");
		}

		let descriptor = match get(ENV_GIT_HOSTNAME) {
			Some(hostname) => ProviderDescriptor::github_enterprise(&hostname)?,
			None => ProviderDescriptor::github()?,
		};
		let scope = match get(ENV_SCOPES) {
			Some(raw) => raw.parse::<ScopeSet>()?,
			None => ScopeSet::repo_user(),
		};
		let verify_state = match get(ENV_VERIFY_STATE) {
			Some(raw) => parse_flag(ENV_VERIFY_STATE, &raw)?,
			None => false,
		};
		let bind = match get(ENV_BIND) {
			Some(raw) => raw
				.parse::<SocketAddr>()
				.map_err(|e| ConfigError::InvalidEnv { key: ENV_BIND, reason: e.to_string() })?,
			None => DEFAULT_BIND,
		};
		let token_timeout = match get(ENV_TOKEN_TIMEOUT_SECS) {
			Some(raw) => Some(parse_timeout(&raw)?),
			None => None,
		};

		tracing::info!(
			provider = %descriptor.id,
			authorize = %descriptor.endpoints.authorization,
			scope = %scope,
			verify_state,
			%bind,
			"relay configuration loaded"
		);

		Ok(Self { descriptor, client_id, client_secret, scope, verify_state, token_timeout, bind })
	}

	/// Replaces the provider descriptor.
	pub fn with_descriptor(mut self, descriptor: ProviderDescriptor) -> Self {
		self.descriptor = descriptor;

		self
	}

	/// Replaces the requested scopes.
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Enables or disables callback `state` verification.
	pub fn with_state_verification(mut self, enabled: bool) -> Self {
		self.verify_state = enabled;

		self
	}

	/// Sets the token exchange timeout.
	pub fn with_token_timeout(mut self, timeout: StdDuration) -> Self {
		self.token_timeout = Some(timeout);

		self
	}

	/// Sets the listen address.
	pub fn with_bind(mut self, bind: SocketAddr) -> Self {
		self.bind = bind;

		self
	}
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
	match raw.to_ascii_lowercase().as_str() {
		"true" | "1" => Ok(true),
		"false" | "0" => Ok(false),
		_ => Err(ConfigError::InvalidEnv {
			key,
			reason: format!("expected one of true, false, 1, 0 but found `{raw}`"),
		}),
	}
}

fn parse_timeout(raw: &str) -> Result<StdDuration, ConfigError> {
	let invalid = |reason: String| ConfigError::InvalidEnv { key: ENV_TOKEN_TIMEOUT_SECS, reason };
	let secs = raw.parse::<u64>().map_err(|e| invalid(e.to_string()))?;

	if secs == 0 {
		return Err(invalid("timeout must be at least one second".into()));
	}

	Ok(StdDuration::from_secs(secs))
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashMap;
	// self
	use super::*;

	fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map = pairs
			.iter()
			.map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
			.collect::<HashMap<_, _>>();

		move |key| map.get(key).cloned()
	}

	#[test]
	fn defaults_apply_when_unset() {
		let config = RelayConfig::from_lookup(lookup(&[
			(ENV_CLIENT_ID, "client-1"),
			(ENV_CLIENT_SECRET, "secret-1"),
		]))
		.expect("Minimal environment should load.");

		assert_eq!(config.client_id, "client-1");
		assert_eq!(config.client_secret.as_ref().map(TokenSecret::expose), Some("secret-1"));
		assert_eq!(config.scope.to_string(), "repo,user");
		assert_eq!(
			config.descriptor.endpoints.authorization.as_str(),
			"https://github.com/login/oauth/authorize"
		);
		assert!(!config.verify_state);
		assert_eq!(config.token_timeout, None);
		assert_eq!(config.bind, DEFAULT_BIND);
	}

	#[test]
	fn overrides_are_parsed() {
		let config = RelayConfig::from_lookup(lookup(&[
			(ENV_GIT_HOSTNAME, "git.example.com"),
			(ENV_SCOPES, "repo read:org"),
			(ENV_VERIFY_STATE, "TRUE"),
			(ENV_BIND, "127.0.0.1:8080"),
			(ENV_TOKEN_TIMEOUT_SECS, "15"),
		]))
		.expect("Full environment should load.");

		assert_eq!(config.client_id, "");
		assert!(config.client_secret.is_none());
		assert_eq!(
			config.descriptor.endpoints.token.as_str(),
			"https://git.example.com/login/oauth/access_token"
		);
		assert_eq!(config.scope.to_string(), "repo,read:org");
		assert!(config.verify_state);
		assert_eq!(config.bind.port(), 8080);
		assert_eq!(config.token_timeout, Some(StdDuration::from_secs(15)));
	}

	#[test]
	fn blank_values_count_as_unset() {
		let config = RelayConfig::from_lookup(lookup(&[(ENV_SCOPES, "  "), (ENV_BIND, "")]))
			.expect("Blank values should fall back to defaults.");

		assert_eq!(config.scope, ScopeSet::repo_user());
		assert_eq!(config.bind, DEFAULT_BIND);
	}

	#[test]
	fn invalid_values_name_the_variable() {
		for (key, value) in [
			(ENV_VERIFY_STATE, "maybe"),
			(ENV_BIND, "not-an-addr"),
			(ENV_TOKEN_TIMEOUT_SECS, "0"),
			(ENV_TOKEN_TIMEOUT_SECS, "ten"),
		] {
			let err = RelayConfig::from_lookup(lookup(&[(key, value)]))
				.expect_err("Invalid values should be rejected.");

			assert!(
				matches!(err, ConfigError::InvalidEnv { key: k, .. } if k == key),
				"Unexpected error for {key}={value}: {err:?}."
			);
		}
	}

	#[test]
	fn programmatic_builder_matches_defaults() {
		let config = RelayConfig::new("client-1", "secret-1")
			.expect("GitHub preset should build.")
			.with_state_verification(true)
			.with_token_timeout(StdDuration::from_secs(3));

		assert!(config.verify_state);
		assert_eq!(config.token_timeout, Some(StdDuration::from_secs(3)));
		assert_eq!(config.scope, ScopeSet::repo_user());
	}
}
