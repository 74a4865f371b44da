//! Boundary to the controller layer.

use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::dispatch::ActionCall;

/// Runs a dispatched action. Implemented by the controller layer.
pub trait ActionHandler: Send + Sync {
    fn invoke(&self, call: ActionCall) -> Response;
}

impl<F> ActionHandler for F
where
    F: Fn(ActionCall) -> Response + Send + Sync,
{
    fn invoke(&self, call: ActionCall) -> Response {
        self(call)
    }
}

/// Answers every dispatched action with its `ActionCall` as JSON.
///
/// Used by the bundled server binary, where no controllers are linked in.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoHandler;

impl ActionHandler for EchoHandler {
    fn invoke(&self, call: ActionCall) -> Response {
        tracing::debug!(action = %call.action(), "Echoing action call");
        Json(call).into_response()
    }
}
