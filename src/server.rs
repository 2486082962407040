//! HTTP surface: `GET /api/auth`, `GET /api/callback`, and `GET /healthz`.

// crates.io
use axum::{
	Router,
	extract::{Query, State, rejection::QueryRejection},
	http::{HeaderMap, HeaderValue, StatusCode, Uri, header},
	response::{Html, IntoResponse, Response},
	routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
// self
use crate::{
	_prelude::*,
	flows::{CallbackParams, ReqwestRelay},
	handoff::{self, HandoffMessage},
};

/// Path of the endpoint that starts the flow.
pub const AUTHORIZE_PATH: &str = "/api/auth";
/// Name of the cookie carrying the issued `state` when verification is enabled.
pub const STATE_COOKIE: &str = "oauth_relay_state";

const STATE_COOKIE_PATH: &str = "/api";
const STATE_COOKIE_MAX_MINUTES: i64 = 10;
const CALLBACK_CSP: &str = "default-src 'none'; script-src 'unsafe-inline'";

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
	/// Relay shared by every request.
	pub relay: Arc<ReqwestRelay>,
}
impl AppState {
	/// Wraps a relay for use by the router.
	pub fn new(relay: ReqwestRelay) -> Self {
		Self { relay: Arc::new(relay) }
	}
}

/// Builds the relay router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route(AUTHORIZE_PATH, get(authorize))
		.route(crate::flows::CALLBACK_PATH, get(callback))
		.route("/healthz", get(healthz))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// Serves `router` on `listener` until Ctrl-C is received.
pub async fn serve(listener: TcpListener, router: Router) -> std::io::Result<()> {
	tracing::info!(addr = ?listener.local_addr()?, "relay listening");

	axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await
}

async fn shutdown_signal() {
	match tokio::signal::ctrl_c().await {
		Ok(()) => tracing::info!("shutdown signal received"),
		Err(e) => tracing::error!(error = %e, "failed to listen for the shutdown signal"),
	}
}

async fn authorize(
	State(state): State<AppState>,
	headers: HeaderMap,
	uri: Uri,
	jar: CookieJar,
) -> Response {
	let Some(host) = request_host(&headers, &uri) else {
		return (StatusCode::BAD_REQUEST, "The request host is missing.").into_response();
	};
	let request = match state.relay.start_authorization(host) {
		Ok(request) => request,
		Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
	};
	let jar = if state.relay.verify_state {
		let max_age = time::Duration::minutes(STATE_COOKIE_MAX_MINUTES);

		jar.add(state_cookie(request.state.clone(), max_age))
	} else {
		jar
	};

	(
		StatusCode::MOVED_PERMANENTLY,
		jar,
		[(header::LOCATION, request.authorize_url.to_string())],
	)
		.into_response()
}

async fn callback(
	State(state): State<AppState>,
	headers: HeaderMap,
	uri: Uri,
	jar: CookieJar,
	query: Result<Query<CallbackParams>, QueryRejection>,
) -> Response {
	let relay = &state.relay;
	let issued_state = jar.get(STATE_COOKIE).map(|cookie| cookie.value().to_owned());
	let result = match query {
		Ok(Query(params)) => {
			let host = request_host(&headers, &uri);

			relay.complete_callback(host, params, issued_state.as_deref()).await
		},
		Err(e) => {
			tracing::warn!(error = %e, "rejected malformed callback query");

			Err(Error::invalid_request("the callback query string is malformed"))
		},
	};
	let message = match &result {
		Ok(grant) => HandoffMessage::success(grant),
		Err(e) => HandoffMessage::failure(&relay.descriptor.id, e),
	};
	let message = match message {
		Ok(message) => message,
		Err(e) => {
			tracing::error!(error = %e, "failed to serialize the handoff payload");

			return StatusCode::INTERNAL_SERVER_ERROR.into_response();
		},
	};
	let jar = if relay.verify_state {
		jar.add(state_cookie(String::new(), time::Duration::ZERO))
	} else {
		jar
	};

	(
		jar,
		[
			(header::CONTENT_SECURITY_POLICY, HeaderValue::from_static(CALLBACK_CSP)),
			(header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
		],
		Html(handoff::render_page(&message)),
	)
		.into_response()
}

async fn healthz() -> &'static str {
	"ok"
}

/// Resolves the public host from `Host`, falling back to the URI authority that HTTP/2 clients
/// send as `:authority`.
fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> Option<&'a str> {
	headers
		.get(header::HOST)
		.and_then(|value| value.to_str().ok())
		.or_else(|| uri.authority().map(|authority| authority.as_str()))
}

fn state_cookie(value: String, max_age: time::Duration) -> Cookie<'static> {
	Cookie::build((STATE_COOKIE, value))
		.http_only(true)
		.secure(true)
		.same_site(SameSite::Lax)
		.path(STATE_COOKIE_PATH)
		.max_age(max_age)
		.build()
}
