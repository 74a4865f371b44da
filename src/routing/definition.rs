//! Route definition model.
//!
//! One `RouteDefinition` per route entry in a routes document. Built once at
//! parse time and never mutated; a refresh replaces the whole list.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::routing::error::{RouteError, RouteErrorKind};

/// Action value that makes a route answer with an intentional 404.
pub const NOT_FOUND_ACTION: &str = "404";

/// Method token for routes declared with `*`.
pub const ANY_METHOD: &str = "*";

/// Capture name standing in for the method of `*` routes in tree keys.
pub const METHOD_CAPTURE: &str = "METHOD";

/// One half of a `Controller.Method` action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionPart {
    /// A fixed name, e.g. `Users`.
    Literal(String),
    /// `:name`, filled from the capture called `name` at match time.
    Placeholder(String),
}

impl ActionPart {
    fn parse(part: &str) -> Self {
        match part.strip_prefix(':') {
            Some(name) => ActionPart::Placeholder(name.to_string()),
            None => ActionPart::Literal(part.to_string()),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ActionPart::Placeholder(_))
    }
}

impl fmt::Display for ActionPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionPart::Literal(name) => f.write_str(name),
            ActionPart::Placeholder(name) => write!(f, ":{name}"),
        }
    }
}

/// What a route points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionTarget {
    /// The literal `404` action.
    NotFound,
    /// A two-part `Controller.Method` action.
    Named {
        controller: ActionPart,
        method: ActionPart,
    },
    /// Anything else; matched as a terminal action and never resolved.
    Opaque,
}

impl ActionTarget {
    fn parse(action: &str) -> Self {
        if action == NOT_FOUND_ACTION {
            return ActionTarget::NotFound;
        }
        let parts: Vec<&str> = action.split('.').collect();
        match parts.as_slice() {
            [controller, method] => ActionTarget::Named {
                controller: ActionPart::parse(controller),
                method: ActionPart::parse(method),
            },
            _ => ActionTarget::Opaque,
        }
    }
}

/// Where a route was declared.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Provenance {
    pub source: PathBuf,
    pub line: Option<usize>,
}

impl Provenance {
    pub fn new(source: impl Into<PathBuf>, line: Option<usize>) -> Self {
        Self {
            source: source.into(),
            line,
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.source.display(), line),
            None => write!(f, "{}", self.source.display()),
        }
    }
}

/// A single routing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    method: String,
    path: String,
    action: String,
    target: ActionTarget,
    fixed_params: Vec<String>,
    tree_key: String,
    provenance: Provenance,
}

impl RouteDefinition {
    /// Build a route, uppercasing the method and deriving the tree key.
    ///
    /// Fails with `MalformedPath` when `path` is not absolute. Placeholders in
    /// the action are not checked here; they resolve (or fail) at match time.
    pub fn new(
        method: &str,
        path: &str,
        action: &str,
        fixed_params: Vec<String>,
        provenance: Provenance,
    ) -> Result<Self, RouteError> {
        if !path.starts_with('/') {
            return Err(RouteErrorKind::MalformedPath(path.to_string()).into());
        }

        let method = method.to_uppercase();
        Ok(Self {
            tree_key: tree_key(&method, path),
            method,
            path: path.to_string(),
            action: action.to_string(),
            target: ActionTarget::parse(action),
            fixed_params,
            provenance,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn target(&self) -> &ActionTarget {
        &self.target
    }

    pub fn fixed_params(&self) -> &[String] {
        &self.fixed_params
    }

    pub fn tree_key(&self) -> &str {
        &self.tree_key
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn source(&self) -> &Path {
        &self.provenance.source
    }

    pub fn is_any_method(&self) -> bool {
        self.method == ANY_METHOD
    }
}

/// Tree key for a method and path: `/GET/users/:id`, or `/:METHOD/ping` for `*`.
pub fn tree_key(method: &str, path: &str) -> String {
    if method == ANY_METHOD {
        format!("/:{METHOD_CAPTURE}{path}")
    } else {
        format!("/{method}{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(method: &str, path: &str, action: &str) -> Result<RouteDefinition, RouteError> {
        RouteDefinition::new(method, path, action, Vec::new(), Provenance::default())
    }

    #[test]
    fn test_two_part_action() {
        let r = route("get", "/users/:id", "Users.Show").unwrap();
        assert_eq!(r.method(), "GET");
        assert_eq!(r.tree_key(), "/GET/users/:id");
        assert_eq!(
            r.target(),
            &ActionTarget::Named {
                controller: ActionPart::Literal("Users".into()),
                method: ActionPart::Literal("Show".into()),
            }
        );
    }

    #[test]
    fn test_placeholder_parts() {
        let r = route("GET", "/:controller/:action", ":controller.:action").unwrap();
        match r.target() {
            ActionTarget::Named { controller, method } => {
                assert_eq!(controller, &ActionPart::Placeholder("controller".into()));
                assert_eq!(method, &ActionPart::Placeholder("action".into()));
                assert_eq!(controller.to_string(), ":controller");
            }
            other => panic!("unexpected target {other:?}"),
        }
    }

    #[test]
    fn test_not_found_and_opaque_actions() {
        assert_eq!(route("GET", "/old", "404").unwrap().target(), &ActionTarget::NotFound);
        assert_eq!(route("GET", "/x", "Static").unwrap().target(), &ActionTarget::Opaque);
        assert_eq!(route("GET", "/x", "A.B.C").unwrap().target(), &ActionTarget::Opaque);
    }

    #[test]
    fn test_any_method_key() {
        let r = route("*", "/ping", "Health.Ping").unwrap();
        assert!(r.is_any_method());
        assert_eq!(r.tree_key(), "/:METHOD/ping");
    }

    #[test]
    fn test_relative_path_rejected() {
        let err = route("GET", "users", "Users.Index").unwrap_err();
        assert!(matches!(err.kind(), RouteErrorKind::MalformedPath(p) if p == "users"));
    }
}
