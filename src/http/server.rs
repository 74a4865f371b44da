//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind server to listener
//! - Dispatch requests through the routing engine to the `ActionHandler`

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use percent_encoding::percent_decode_str;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::dispatch::{Dispatch, Dispatcher, NotFoundReason};
use crate::http::handler::ActionHandler;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub handler: Arc<dyn ActionHandler>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, handler: Arc<dyn ActionHandler>) -> Self {
        Self { dispatcher, handler }
    }
}

/// HTTP front end for the router.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &ServerConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The configured Axum router, for embedding or testing.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server on `listener` until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Routes every request and hands matches to the action handler.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let method = request.method().as_str().to_string();
    let uri = request.uri().clone();

    // Routes match the decoded path, so captures carry decoded values.
    let path = match percent_decode_str(uri.path()).decode_utf8() {
        Ok(path) => path,
        Err(e) => {
            tracing::debug!(request_id = %request_id, path = %uri.path(), error = %e, "Request path is not valid UTF-8");
            return (StatusCode::BAD_REQUEST, format!("Invalid request path: {uri}")).into_response();
        }
    };

    match state.dispatcher.dispatch(&method, &path) {
        Dispatch::Invoke(call) => {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, action = %call.action(), "Dispatching");
            state.handler.invoke(call)
        }
        Dispatch::NotFound(reason) => {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, reason = %reason, "Not found");
            let body = match reason {
                NotFoundReason::NoRoute => format!("{reason}: {uri}"),
                other => other.to_string(),
            };
            (StatusCode::NOT_FOUND, body).into_response()
        }
    }
}
