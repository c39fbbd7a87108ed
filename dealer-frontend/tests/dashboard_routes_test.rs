use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use dealer_frontend::config::{
    ConnectionsSettings, OAuthSettings, RelayServiceSettings, SessionSettings, Settings,
    TokenServiceSettings,
};
use dealer_frontend::services::DashboardServices;
use dealer_frontend::{build_router, AppState};
use service_core::config::{ServerSettings, TelemetrySettings};
use tower::util::ServiceExt;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_for(token_service: &MockServer, relay: &MockServer) -> Router {
    let settings = Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        telemetry: TelemetrySettings::default(),
        oauth: OAuthSettings {
            authorize_url: "https://signin.example.com/oauth2/v1/authorize".to_string(),
            client_id: "0oa-client".to_string(),
            redirect_uri: "http://localhost:8083/auth/callback".to_string(),
            scopes: vec!["ag1".to_string(), "org1".to_string()],
            post_login_path: "/api/session".to_string(),
        },
        token_service: TokenServiceSettings {
            url: token_service.uri(),
            path: "/token".to_string(),
        },
        relay_service: RelayServiceSettings {
            url: relay.uri(),
            path: "/relay".to_string(),
            access_token_header: "x-jd-access-token".to_string(),
        },
        connections: ConnectionsSettings::default(),
        session: SessionSettings::default(),
    };

    build_router(
        AppState::new(DashboardServices::from_settings(&settings)),
        &settings.session,
    )
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Starts a login and returns the session cookie and the state sent to the provider.
async fn start_login(app: &Router) -> (String, String) {
    let response = app.clone().oneshot(get("/login", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("SameSite=Lax"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let location = response.headers()[header::LOCATION].to_str().unwrap();
    let url = reqwest::Url::parse(location).unwrap();
    assert_eq!(url.host_str(), Some("signin.example.com"));
    let state = url
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap();

    (cookie, state)
}

#[tokio::test]
async fn login_then_callback_authenticates_session() {
    let token_service = MockServer::start().await;
    let relay = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_json(serde_json::json!({ "code": "abc" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "tok123",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&token_service)
        .await;
    let app = app_for(&token_service, &relay);

    let (cookie, state) = start_login(&app).await;

    let pending = app.clone().oneshot(get("/api/session", Some(&cookie))).await.unwrap();
    assert_eq!(json_body(pending).await["state"], "login_pending");

    let callback = app
        .clone()
        .oneshot(get(
            &format!("/auth/callback?code=abc&state={}", state),
            Some(&cookie),
        ))
        .await
        .unwrap();
    assert_eq!(callback.status(), StatusCode::SEE_OTHER);
    assert_eq!(callback.headers()[header::LOCATION], "/api/session");

    let session = app.clone().oneshot(get("/api/session", Some(&cookie))).await.unwrap();
    let body = json_body(session).await;
    assert_eq!(body["state"], "authenticated");
    assert_eq!(body["authenticated"], true);
    assert!(!body.to_string().contains("tok123"));
}

#[tokio::test]
async fn callback_with_wrong_state_restarts_login() {
    let token_service = MockServer::start().await;
    let relay = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&token_service)
        .await;
    let app = app_for(&token_service, &relay);

    let (cookie, _) = start_login(&app).await;

    let response = app
        .clone()
        .oneshot(get("/auth/callback?code=abc&state=forged", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()["refresh"], "3; url=/login");
    let body = json_body(response).await;
    assert_eq!(body["view"]["kind"], "restart_login");
}

#[tokio::test]
async fn callback_with_provider_error_is_shown_inline() {
    let app = app_for(&MockServer::start().await, &MockServer::start().await);

    let response = app
        .oneshot(get(
            "/auth/callback?error=access_denied&error_description=User%20cancelled",
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "John Deere error: User cancelled");
    assert_eq!(body["view"]["kind"], "inline");
}

#[tokio::test]
async fn api_routes_require_a_session_token() {
    let relay = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&relay)
        .await;
    let app = app_for(&MockServer::start().await, &relay);

    for uri in ["/api/organizations", "/api/equipment", "/api/organizations/4242"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn organization_view_reports_forbidden_half_with_remediation() {
    let token_service = MockServer::start().await;
    let relay = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "tok123" })),
        )
        .mount(&token_service)
        .await;
    Mock::given(method("GET"))
        .and(query_param("endpoint", "equipment?status=all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "values": [{ "id": 7, "name": "Gator" }]
        })))
        .mount(&relay)
        .await;
    Mock::given(method("GET"))
        .and(query_param("endpoint", "organizations/4242/fields?status=all"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&relay)
        .await;
    let app = app_for(&token_service, &relay);

    let (cookie, state) = start_login(&app).await;
    app.clone()
        .oneshot(get(
            &format!("/auth/callback?code=abc&state={}", state),
            Some(&cookie),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get("/api/organizations/4242", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["equipment"]["status"], "loaded");
    assert_eq!(body["equipment"]["values"][0]["name"], "Gator");
    assert_eq!(body["fields"]["status"], "failed");
    assert_eq!(body["fields"]["error"]["kind"], "permission_remediation");
    assert_eq!(
        body["fields"]["error"]["manage_url"],
        "https://connections.deere.com/connections/0oa-client/connections-dialog?orgId=4242"
    );
}

#[tokio::test]
async fn malformed_ids_are_rejected() {
    let app = app_for(&MockServer::start().await, &MockServer::start().await);

    let response = app
        .oneshot(get("/api/organizations/4242/fields/a%3Fb/operations", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_is_served_without_a_session() {
    let app = app_for(&MockServer::start().await, &MockServer::start().await);

    let response = app.oneshot(get("/health", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!response.headers().contains_key(header::SET_COOKIE));
    assert_eq!(json_body(response).await["service"], "dealer-frontend");
}
