//! Reverse routing: action name + arguments → URL.
//!
//! # Design Decisions
//! - Linear scan of the route list in declaration order; first match wins
//! - Placeholder actions (`:controller.:action`) match any target and bind the
//!   target's names into the arguments before substitution
//! - A missing path argument does not fail the call: the URL gets a visible
//!   placeholder, the name is reported in `missing_args` and a warning is logged
//! - Arguments not consumed by the path become a sorted query string

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::routing::definition::{ActionPart, ActionTarget, RouteDefinition, ANY_METHOD};
use crate::routing::error::ReverseError;

/// Substituted for path arguments the caller did not supply.
pub const MISSING_ARG_PLACEHOLDER: &str = "<missing>";

/// Result of reverse routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionDefinition {
    pub url: String,
    /// Method to request `url` with; `GET` for routes declared with `*`.
    pub method: String,
    /// Set when the route was declared for any method.
    pub star: bool,
    pub action: String,
    /// Arguments that were not used in the path (and went into the query).
    pub args: BTreeMap<String, String>,
    /// Path arguments that were missing and replaced by the placeholder.
    pub missing_args: Vec<String>,
}

impl fmt::Display for ActionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

fn part_matches(part: &ActionPart, target: &str) -> bool {
    match part {
        ActionPart::Literal(name) => name == target,
        ActionPart::Placeholder(_) => true,
    }
}

/// Find the first route leading to `action` and build its URL from `args`.
pub fn reverse_route(
    routes: &[Arc<RouteDefinition>],
    action: &str,
    mut args: BTreeMap<String, String>,
) -> Result<ActionDefinition, ReverseError> {
    let parts: Vec<&str> = action.split('.').collect();
    let (controller, method) = match parts.as_slice() {
        [controller, method] => (*controller, *method),
        _ => {
            tracing::error!(action = %action, "Reverse router got invalid action");
            return Err(ReverseError::InvalidAction(action.to_string()));
        }
    };

    for route in routes {
        let ActionTarget::Named {
            controller: route_controller,
            method: route_method,
        } = route.target()
        else {
            continue;
        };
        if !part_matches(route_controller, controller) || !part_matches(route_method, method) {
            continue;
        }

        if let ActionPart::Placeholder(name) = route_controller {
            args.insert(name.clone(), controller.to_string());
        }
        if let ActionPart::Placeholder(name) = route_method {
            args.insert(name.clone(), method.to_string());
        }
        return Ok(build_url(route, action, args));
    }

    tracing::error!(action = %action, args = ?args, "Failed to find reverse route");
    Err(ReverseError::NotFound(action.to_string()))
}

fn build_url(route: &RouteDefinition, action: &str, mut args: BTreeMap<String, String>) -> ActionDefinition {
    let mut missing_args = Vec::new();

    let segments: Vec<String> = route
        .path()
        .split('/')
        .map(|segment| {
            let Some(name) = segment.strip_prefix(':').or_else(|| segment.strip_prefix('*')) else {
                return segment.to_string();
            };
            args.remove(name).unwrap_or_else(|| {
                tracing::warn!(action = %action, arg = %name, route = %route.path(), "Reverse route missing route arg");
                missing_args.push(name.to_string());
                MISSING_ARG_PLACEHOLDER.to_string()
            })
        })
        .collect();

    let mut url = segments.join("/");
    if !args.is_empty() {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(args.iter())
            .finish();
        url.push('?');
        url.push_str(&query);
    }

    let star = route.method() == ANY_METHOD;
    ActionDefinition {
        url,
        method: if star { "GET".to_string() } else { route.method().to_string() },
        star,
        action: action.to_string(),
        args,
        missing_args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::definition::Provenance;

    fn routes(defs: &[(&str, &str, &str)]) -> Vec<Arc<RouteDefinition>> {
        defs.iter()
            .map(|(method, path, action)| {
                Arc::new(RouteDefinition::new(method, path, action, Vec::new(), Provenance::default()).unwrap())
            })
            .collect()
    }

    fn args(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_substitutes_path_args() {
        let table = routes(&[("GET", "/users/:id", "Users.Show")]);
        let def = reverse_route(&table, "Users.Show", args(&[("id", "42")])).unwrap();

        assert_eq!(def.url, "/users/42");
        assert_eq!(def.method, "GET");
        assert!(!def.star);
        assert!(def.args.is_empty());
        assert!(def.missing_args.is_empty());
        assert_eq!(def.to_string(), "/users/42");
    }

    #[test]
    fn test_leftover_args_go_to_sorted_query() {
        let table = routes(&[("GET", "/users/:id", "Users.Show")]);
        let def = reverse_route(&table, "Users.Show", args(&[("id", "7"), ("tab", "a b"), ("format", "json")])).unwrap();

        assert_eq!(def.url, "/users/7?format=json&tab=a+b");
        assert_eq!(def.args, args(&[("format", "json"), ("tab", "a b")]));
    }

    #[test]
    fn test_first_matching_route_wins() {
        let table = routes(&[
            ("GET", "/old", "404"),
            ("POST", "/users", "Users.Create"),
            ("PUT", "/users/create", "Users.Create"),
        ]);
        let def = reverse_route(&table, "Users.Create", BTreeMap::new()).unwrap();
        assert_eq!(def.url, "/users");
        assert_eq!(def.method, "POST");
    }

    #[test]
    fn test_star_route_reverses_to_get() {
        let table = routes(&[("*", "/ping", "Health.Ping")]);
        let def = reverse_route(&table, "Health.Ping", BTreeMap::new()).unwrap();
        assert_eq!(def.method, "GET");
        assert!(def.star);
        assert_eq!(def.url, "/ping");
    }

    #[test]
    fn test_placeholder_action_binds_target_names() {
        let table = routes(&[("GET", "/:controller/:action", ":controller.:action")]);
        let def = reverse_route(&table, "Posts.Index", args(&[("page", "2")])).unwrap();
        assert_eq!(def.url, "/Posts/Index?page=2");
    }

    #[test]
    fn test_catch_all_is_substituted() {
        let table = routes(&[("GET", "/assets/*file", "Static.Serve")]);
        let def = reverse_route(&table, "Static.Serve", args(&[("file", "css/site.css")])).unwrap();
        assert_eq!(def.url, "/assets/css/site.css");
    }

    #[test]
    fn test_missing_arg_uses_placeholder() {
        let table = routes(&[("GET", "/users/:id/posts/:post", "Posts.Show")]);
        let def = reverse_route(&table, "Posts.Show", args(&[("id", "1")])).unwrap();
        assert_eq!(def.url, "/users/1/posts/<missing>");
        assert_eq!(def.missing_args, vec!["post".to_string()]);
    }

    #[test]
    fn test_errors() {
        let table = routes(&[("GET", "/", "App.Index")]);
        assert_eq!(
            reverse_route(&table, "Index", BTreeMap::new()),
            Err(ReverseError::InvalidAction("Index".into()))
        );
        assert_eq!(
            reverse_route(&table, "App.Missing", BTreeMap::new()),
            Err(ReverseError::NotFound("App.Missing".into()))
        );
    }
}
