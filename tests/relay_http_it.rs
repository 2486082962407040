// crates.io
use axum::{
	Router,
	body::{Body, to_bytes},
	http::{Request, Response, StatusCode, header},
};
use httpmock::prelude::*;
use tower::ServiceExt;
// self
use oauth2_relay::{
	_preludet::*,
	auth::ProviderId,
	provider::{ClientAuthMethod, ProviderDescriptor, ProviderQuirks},
	server::STATE_COOKIE,
};

const HOST: &str = "cms.example.com";
const ENCODED_CALLBACK: &str = "https%3A%2F%2Fcms.example.com%2Fapi%2Fcallback";
const TOKEN_PATH: &str = "/login/oauth/access_token";

fn build_descriptor(server: &MockServer) -> ProviderDescriptor {
	let provider_id = ProviderId::new("github").expect("Provider identifier should be valid.");

	ProviderDescriptor::builder(provider_id)
		.authorization_endpoint(
			Url::parse(&server.url("/login/oauth/authorize"))
				.expect("Mock authorization endpoint should parse successfully."),
		)
		.token_endpoint(
			Url::parse(&server.url(TOKEN_PATH))
				.expect("Mock token endpoint should parse successfully."),
		)
		.client_auth_method(ClientAuthMethod::ClientSecretPost)
		.quirks(ProviderQuirks::github())
		.build()
		.expect("Provider descriptor should build successfully.")
}

fn github_router(verify_state: bool) -> Router {
	build_test_router(
		ProviderDescriptor::github().expect("GitHub preset should build."),
		verify_state,
	)
}

fn get(uri: &str) -> Request<Body> {
	Request::builder()
		.uri(uri)
		.header(header::HOST, HOST)
		.body(Body::empty())
		.expect("Request fixture should build.")
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
	Request::builder()
		.uri(uri)
		.header(header::HOST, HOST)
		.header(header::COOKIE, cookie)
		.body(Body::empty())
		.expect("Request fixture should build.")
}

async fn body_text(response: Response<Body>) -> String {
	let bytes =
		to_bytes(response.into_body(), usize::MAX).await.expect("Response body should be readable.");

	String::from_utf8(bytes.to_vec()).expect("Response body should be UTF-8.")
}

fn header_value<'a>(response: &'a Response<Body>, name: header::HeaderName) -> &'a str {
	response
		.headers()
		.get(name)
		.and_then(|value| value.to_str().ok())
		.expect("Header should be present and printable.")
}

fn location_state(location: &str) -> String {
	Url::parse(location)
		.expect("Location should be an absolute URL.")
		.query_pairs()
		.find(|(key, _)| key == "state")
		.map(|(_, value)| value.into_owned())
		.expect("Location should carry a state parameter.")
}

#[tokio::test]
async fn authorize_redirects_to_provider_with_callback_uri() {
	let response =
		github_router(false).oneshot(get("/api/auth")).await.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
	assert!(response.headers().get(header::SET_COOKIE).is_none());

	let location = header_value(&response, header::LOCATION);

	assert!(location.starts_with("https://github.com/login/oauth/authorize?"));
	assert!(location.contains("response_type=code"));
	assert!(location.contains("client_id=client-it"));
	assert!(location.contains(&format!("redirect_uri={ENCODED_CALLBACK}")));
	assert!(location.contains("scope=repo%2Cuser"));

	let state = location_state(location);

	assert_eq!(state.len(), 8);
	assert!(state.chars().all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_uppercase()));
}

#[tokio::test]
async fn authorize_without_host_is_a_bad_request() {
	let request =
		Request::builder().uri("/api/auth").body(Body::empty()).expect("Request should build.");
	let response = github_router(false).oneshot(request).await.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert!(response.headers().get(header::LOCATION).is_none());
}

#[tokio::test]
async fn authorize_uses_uri_authority_without_host_header() {
	let request = Request::builder()
		.uri("https://cms.example.com/api/auth")
		.body(Body::empty())
		.expect("Request should build.");
	let response = github_router(false).oneshot(request).await.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
	assert!(
		header_value(&response, header::LOCATION)
			.contains(&format!("redirect_uri={ENCODED_CALLBACK}"))
	);
}

#[tokio::test]
async fn authorize_sets_state_cookie_when_verification_is_enabled() {
	let response =
		github_router(true).oneshot(get("/api/auth")).await.expect("Router should respond.");
	let state = location_state(header_value(&response, header::LOCATION));
	let cookie = header_value(&response, header::SET_COOKIE);

	assert!(cookie.starts_with(&format!("{STATE_COOKIE}={state}")));
	assert!(cookie.contains("HttpOnly"));
	assert!(cookie.contains("Secure"));
	assert!(cookie.contains("SameSite=Lax"));
	assert!(cookie.contains("Path=/api"));
	assert!(cookie.contains("Max-Age=600"));
}

#[tokio::test]
async fn callback_relays_token_to_opener() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.header("content-type", "application/x-www-form-urlencoded")
				.form_urlencoded_tuple("grant_type", "authorization_code")
				.form_urlencoded_tuple("code", "good-code")
				.form_urlencoded_tuple("redirect_uri", "https://cms.example.com/api/callback")
				.form_urlencoded_tuple("client_id", TEST_CLIENT_ID)
				.form_urlencoded_tuple("client_secret", TEST_CLIENT_SECRET);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"gho_relay\",\"token_type\":\"bearer\",\"scope\":\"repo,user\"}");
		})
		.await;
	let router = build_test_router(build_descriptor(&server), false);
	let response =
		router.oneshot(get("/api/callback?code=good-code")).await.expect("Router should respond.");

	mock.assert_async().await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(header_value(&response, header::CONTENT_TYPE), "text/html; charset=utf-8");
	assert_eq!(header_value(&response, header::CACHE_CONTROL), "no-store");
	assert_eq!(
		header_value(&response, header::CONTENT_SECURITY_POLICY),
		"default-src 'none'; script-src 'unsafe-inline'"
	);

	let body = body_text(response).await;

	assert!(body.contains(
		r#"'authorization:github:success:{"token":"gho_relay","provider":"github"}'"#
	));
	assert!(body.contains("postMessage('authorizing:github', \"*\")"));
}

#[tokio::test]
async fn callback_reports_rejected_codes_as_error_page() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(
				"{\"error\":\"bad_verification_code\",\"error_description\":\"The code passed is incorrect or expired.\"}",
			);
		})
		.await;
	let router = build_test_router(build_descriptor(&server), false);
	let response =
		router.oneshot(get("/api/callback?code=stale-code")).await.expect("Router should respond.");

	mock.assert_async().await;

	assert_eq!(response.status(), StatusCode::OK);

	let body = body_text(response).await;

	assert!(body.contains("authorization:github:error:{\"kind\":\"invalid_grant\""));
	assert!(!body.contains("authorization:github:success:"));
}

#[tokio::test]
async fn callback_hides_upstream_failures() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(502).header("content-type", "text/html").body("<h1>Bad Gateway</h1>");
		})
		.await;
	let router = build_test_router(build_descriptor(&server), false);
	let response =
		router.oneshot(get("/api/callback?code=any-code")).await.expect("Router should respond.");

	mock.assert_async().await;

	assert_eq!(response.status(), StatusCode::OK);

	let body = body_text(response).await;

	assert!(body.contains("authorization:github:error:{\"kind\":\"provider_unavailable\""));
	assert!(!body.contains("Bad Gateway"));
}

#[tokio::test]
async fn callback_without_code_skips_the_exchange() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200);
		})
		.await;
	let router = build_test_router(build_descriptor(&server), false);
	let response = router.oneshot(get("/api/callback")).await.expect("Router should respond.");

	assert_eq!(mock.hits_async().await, 0);
	assert_eq!(response.status(), StatusCode::OK);

	let body = body_text(response).await;

	assert!(body.contains("authorization:github:error:{\"kind\":\"invalid_request\""));
}

#[tokio::test]
async fn callback_relays_provider_denial() {
	let response = github_router(false)
		.oneshot(get(
			"/api/callback?error=access_denied&error_description=The+user+has+denied+your+application+access.",
		))
		.await
		.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::OK);

	let body = body_text(response).await;

	assert!(body.contains("authorization:github:error:{\"kind\":\"access_denied\""));
	assert!(body.contains("The user has denied your application access."));
}

#[tokio::test]
async fn callback_rejects_state_mismatch_and_clears_cookie() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200);
		})
		.await;
	let router = build_test_router(build_descriptor(&server), true);
	let response = router
		.oneshot(get_with_cookie(
			"/api/callback?code=good-code&state=ffffffff",
			&format!("{STATE_COOKIE}=0a1b2c3d"),
		))
		.await
		.expect("Router should respond.");

	assert_eq!(mock.hits_async().await, 0);
	assert_eq!(response.status(), StatusCode::OK);

	let cookie = header_value(&response, header::SET_COOKIE);

	assert!(cookie.starts_with(&format!("{STATE_COOKIE}=;")));
	assert!(cookie.contains("Max-Age=0"));

	let body = body_text(response).await;

	assert!(body.contains("authorization:github:error:{\"kind\":\"state_mismatch\""));
}

#[tokio::test]
async fn callback_accepts_matching_state() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).form_urlencoded_tuple("code", "good-code");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"gho_state\",\"token_type\":\"bearer\"}");
		})
		.await;
	let router = build_test_router(build_descriptor(&server), true);
	let response = router
		.oneshot(get_with_cookie(
			"/api/callback?code=good-code&state=0a1b2c3d",
			&format!("{STATE_COOKIE}=0a1b2c3d"),
		))
		.await
		.expect("Router should respond.");

	mock.assert_async().await;

	let body = body_text(response).await;

	assert!(body.contains(r#"authorization:github:success:{"token":"gho_state","provider":"github"}"#));
}

#[tokio::test]
async fn healthz_reports_ok() {
	let response = github_router(false)
		.oneshot(get("/healthz"))
		.await
		.expect("Router should respond.");

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(body_text(response).await, "ok");
}
