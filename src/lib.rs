//! OAuth 2.0 authorization-code relay for browser-based Git CMS clients.
//!
//! The relay keeps the OAuth client secret on the server and exposes two endpoints: one that
//! redirects a popup window to the provider's consent page, and one that exchanges the returned
//! code for an access token and hands it back to the opener window with `postMessage`.

#![deny(clippy::all, missing_docs)]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod handoff;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
pub mod server;
#[doc(hidden)]
pub mod _preludet {
	//! Convenience re-exports and helpers shared by the integration tests.

	pub use std::collections::HashMap;

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::RelayConfig,
		flows::ReqwestRelay,
		http::ReqwestHttpClient,
		provider::ProviderDescriptor,
		server::{self, AppState},
	};

	/// Client identifier used across integration tests.
	pub const TEST_CLIENT_ID: &str = "client-it";
	/// Client secret used across integration tests.
	pub const TEST_CLIENT_SECRET: &str = "secret-it";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Test configuration pointing at `descriptor`.
	pub fn test_config(descriptor: ProviderDescriptor, verify_state: bool) -> RelayConfig {
		RelayConfig::new(TEST_CLIENT_ID, TEST_CLIENT_SECRET)
			.expect("GitHub preset should build for tests.")
			.with_descriptor(descriptor)
			.with_state_verification(verify_state)
	}

	/// Constructs a [`ReqwestRelay`] that talks to `descriptor` through the insecure test client.
	pub fn build_reqwest_test_relay(
		descriptor: ProviderDescriptor,
		verify_state: bool,
	) -> ReqwestRelay {
		ReqwestRelay::from_config_with_client(
			&test_config(descriptor, verify_state),
			test_reqwest_http_client(),
		)
	}

	/// Builds the full relay router on top of [`build_reqwest_test_relay`].
	pub fn build_test_router(descriptor: ProviderDescriptor, verify_state: bool) -> axum::Router {
		server::router(AppState::new(build_reqwest_test_relay(descriptor, verify_state)))
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
