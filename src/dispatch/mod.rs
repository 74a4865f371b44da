//! Dispatch adapter: turns a `RouteMatch` into an action call.
//!
//! # Responsibilities
//! - Map no-route and explicit-404 outcomes to "not found"
//! - Look up the target action's signature
//! - Bind fixed params to the target's declared parameter names, in order
//!
//! # Design Decisions
//! - The adapter never invokes anything; the HTTP layer hands the
//!   `ActionCall` to an `ActionHandler`
//! - Surplus fixed params are dropped with a warning rather than failing the
//!   request

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::routing::{ActionRegistry, MatchedAction, RouteMatch, Router};

/// Why a request is answered with 404.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    /// No route matched the request.
    NoRoute,
    /// The matched route is an explicit `404`.
    Explicit,
    /// The route resolved to an action that cannot be dispatched.
    UnknownAction(String),
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::NoRoute => f.write_str("No matching route found"),
            NotFoundReason::Explicit => f.write_str("(intentionally)"),
            NotFoundReason::UnknownAction(action) => write!(f, "Action \"{action}\" not found"),
        }
    }
}

/// Everything the controller layer needs to run an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCall {
    pub controller: String,
    pub method: String,
    /// Captured path parameters.
    pub params: HashMap<String, Vec<String>>,
    /// Fixed params keyed by the target's parameter names, in declaration order.
    pub fixed: Vec<(String, String)>,
}

impl ActionCall {
    pub fn action(&self) -> String {
        format!("{}.{}", self.controller, self.method)
    }
}

/// Result of dispatching a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    NotFound(NotFoundReason),
    Invoke(ActionCall),
}

/// Connects the router to the action registry.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    actions: Arc<dyn ActionRegistry>,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>, actions: Arc<dyn ActionRegistry>) -> Self {
        Self { router, actions }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Route and resolve a request.
    pub fn dispatch(&self, method: &str, path: &str) -> Dispatch {
        resolve(self.router.route(method, path), self.actions.as_ref())
    }
}

/// Translate a forward lookup result into a `Dispatch`.
pub fn resolve(matched: Option<RouteMatch>, actions: &dyn ActionRegistry) -> Dispatch {
    let Some(matched) = matched else {
        return Dispatch::NotFound(NotFoundReason::NoRoute);
    };

    let (controller, method) = match matched.action {
        MatchedAction::NotFound => return Dispatch::NotFound(NotFoundReason::Explicit),
        MatchedAction::Opaque(action) => {
            tracing::warn!(action = %action, route = %matched.route.path(), "Route action is not Controller.Method");
            return Dispatch::NotFound(NotFoundReason::UnknownAction(action));
        }
        MatchedAction::Invoke { controller, method } => (controller, method),
    };

    let Some(signature) = actions.find_action(&controller, &method) else {
        return Dispatch::NotFound(NotFoundReason::UnknownAction(format!("{controller}.{method}")));
    };

    let mut fixed = Vec::with_capacity(matched.fixed_params.len());
    for (i, value) in matched.fixed_params.into_iter().enumerate() {
        match signature.params.get(i) {
            Some(name) => fixed.push((name.clone(), value)),
            None => {
                tracing::warn!(
                    controller = %controller,
                    method = %method,
                    value = %value,
                    declared = signature.params.len(),
                    "Too many fixed parameters, dropping the rest"
                );
                break;
            }
        }
    }

    Dispatch::Invoke(ActionCall {
        controller: signature.controller.clone(),
        method: signature.method.clone(),
        params: matched.params,
        fixed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{ControllerRegistry, Provenance, RouteDefinition};

    fn matched(action: MatchedAction, fixed: &[&str]) -> RouteMatch {
        let route = RouteDefinition::new("GET", "/x", "X.Y", Vec::new(), Provenance::default()).unwrap();
        RouteMatch {
            action,
            params: HashMap::from([("id".to_string(), vec!["1".to_string()])]),
            fixed_params: fixed.iter().map(|s| s.to_string()).collect(),
            route: Arc::new(route),
        }
    }

    fn invoke(controller: &str, method: &str) -> MatchedAction {
        MatchedAction::Invoke {
            controller: controller.into(),
            method: method.into(),
        }
    }

    fn registry() -> ControllerRegistry {
        ControllerRegistry::new().with_action("Users", "Show", &["id", "format"])
    }

    #[test]
    fn test_not_found_outcomes() {
        let registry = registry();
        assert_eq!(resolve(None, &registry), Dispatch::NotFound(NotFoundReason::NoRoute));
        assert_eq!(
            resolve(Some(matched(MatchedAction::NotFound, &[])), &registry),
            Dispatch::NotFound(NotFoundReason::Explicit)
        );
        assert_eq!(
            resolve(Some(matched(MatchedAction::Opaque("Static".into()), &[])), &registry),
            Dispatch::NotFound(NotFoundReason::UnknownAction("Static".into()))
        );
        assert_eq!(
            resolve(Some(matched(invoke("Posts", "Show"), &[])), &registry),
            Dispatch::NotFound(NotFoundReason::UnknownAction("Posts.Show".into()))
        );
    }

    #[test]
    fn test_fixed_params_bound_by_name() {
        let Dispatch::Invoke(call) = resolve(Some(matched(invoke("users", "Show"), &["7", "json"])), &registry()) else {
            panic!("expected invoke");
        };
        assert_eq!(call.action(), "Users.Show");
        assert_eq!(
            call.fixed,
            vec![("id".to_string(), "7".to_string()), ("format".to_string(), "json".to_string())]
        );
        assert_eq!(call.params["id"], vec!["1".to_string()]);
    }

    #[test]
    fn test_extra_fixed_params_dropped() {
        let Dispatch::Invoke(call) = resolve(Some(matched(invoke("Users", "Show"), &["7", "json", "extra"])), &registry()) else {
            panic!("expected invoke");
        };
        assert_eq!(call.fixed.len(), 2);
    }

    #[test]
    fn test_not_found_messages() {
        assert_eq!(NotFoundReason::NoRoute.to_string(), "No matching route found");
        assert_eq!(NotFoundReason::Explicit.to_string(), "(intentionally)");
    }
}
