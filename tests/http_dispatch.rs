//! HTTP front end tests: requests go through the fallback handler, the router
//! and the dispatch adapter.

use std::sync::Arc;

use action_router::config::ServerConfig;
use action_router::dispatch::{ActionCall, Dispatcher};
use action_router::http::{AppState, EchoHandler, HttpServer, X_REQUEST_ID};
use action_router::routing::{ControllerRegistry, ModuleTable};
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;

mod common;
use common::{route, Site};

fn app(site: &Site, handler: Arc<dyn action_router::http::ActionHandler>) -> axum::Router {
    site.write_routes(
        &[
            route("GET", "/users/:id", "Users.Show"),
            "- method: POST\n  path: /users\n  action: Users.Create\n  params: [json]\n".to_string(),
            route("GET", "/old", "404"),
            route("GET", "/legacy", "Legacy.Page"),
        ]
        .concat(),
    );
    let router = Arc::new(site.router(ModuleTable::new()));
    router.refresh().unwrap();

    let actions = ControllerRegistry::new()
        .with_action("Users", "Show", &["id"])
        .with_action("Users", "Create", &["format"]);
    let dispatcher = Dispatcher::new(router, Arc::new(actions));
    HttpServer::build_router(&ServerConfig::default(), AppState::new(dispatcher, handler))
}

async fn send(app: axum::Router, method: &str, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let request = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_matched_route_reaches_handler() {
    let site = Site::new();
    let (status, _, body) = send(app(&site, Arc::new(EchoHandler)), "GET", "/users/42").await;

    assert_eq!(status, StatusCode::OK);
    let call: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(call["controller"], "Users");
    assert_eq!(call["method"], "Show");
    assert_eq!(call["params"]["id"][0], "42");
}

#[tokio::test]
async fn test_captures_are_percent_decoded() {
    let site = Site::new();
    let (status, _, body) = send(app(&site, Arc::new(EchoHandler)), "GET", "/users/John%20Doe").await;

    assert_eq!(status, StatusCode::OK);
    let call: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(call["params"]["id"][0], "John Doe");
}

#[tokio::test]
async fn test_path_that_is_not_utf8_is_rejected() {
    let site = Site::new();
    let (status, _, _) = send(app(&site, Arc::new(EchoHandler)), "GET", "/users/%FF").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fixed_params_are_bound() {
    let site = Site::new();
    let (status, _, body) = send(app(&site, Arc::new(EchoHandler)), "POST", "/users").await;

    assert_eq!(status, StatusCode::OK);
    let call: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(call["fixed"][0][0], "format");
    assert_eq!(call["fixed"][0][1], "json");
}

#[tokio::test]
async fn test_head_uses_get_route() {
    let site = Site::new();
    let handler = |call: ActionCall| (StatusCode::OK, [("x-action", call.action())], "").into_response();
    let (status, headers, _) = send(app(&site, Arc::new(handler)), "HEAD", "/users/1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-action"], "Users.Show");
}

#[tokio::test]
async fn test_unmatched_request_is_404() {
    let site = Site::new();
    let (status, _, body) = send(app(&site, Arc::new(EchoHandler)), "DELETE", "/users/1").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "No matching route found: /users/1");
}

#[tokio::test]
async fn test_explicit_404_route() {
    let site = Site::new();
    let (status, _, body) = send(app(&site, Arc::new(EchoHandler)), "GET", "/old").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "(intentionally)");
}

#[tokio::test]
async fn test_unregistered_action_is_404() {
    let site = Site::new();
    let (status, _, body) = send(app(&site, Arc::new(EchoHandler)), "GET", "/legacy").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Action \"Legacy.Page\" not found");
}

#[tokio::test]
async fn test_request_id_is_set_and_propagated() {
    let site = Site::new();
    let app = app(&site, Arc::new(EchoHandler));

    let (_, headers, _) = send(app.clone(), "GET", "/users/1").await;
    assert!(headers.get(X_REQUEST_ID).is_some());

    let request = Request::builder()
        .uri("/nowhere")
        .header(X_REQUEST_ID, "abc-123")
        .body(Body::empty())
        .unwrap();
    let response: Response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()[X_REQUEST_ID], "abc-123");
}
