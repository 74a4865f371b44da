//! Route lookup and reload.
//!
//! # Responsibilities
//! - Own the current generation (route list + match tree)
//! - Rebuild and publish a generation on `refresh`
//! - Forward lookup (method, path) → `RouteMatch`
//! - Reverse lookup (action, args) → `ActionDefinition`
//!
//! # Design Decisions
//! - A generation is immutable; `refresh` builds a new one off to the side
//!   and publishes it with a single `ArcSwapOption::store`
//! - Readers `load()` the generation once per call and never lock
//! - A failed refresh leaves the published generation untouched
//! - Refreshes are serialised so a slow reload cannot overwrite a newer one

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use arc_swap::ArcSwapOption;

use crate::observability::metrics;
use crate::routing::definition::{tree_key, ActionPart, ActionTarget, RouteDefinition};
use crate::routing::error::{ReverseError, RouteError, RouteErrorKind};
use crate::routing::parser::{ParsedRoutes, RoutesParser};
use crate::routing::reverse::{reverse_route, ActionDefinition};
use crate::routing::tree::MatchTree;

/// Action a request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchedAction {
    /// Controller and method, with placeholders already filled in.
    Invoke { controller: String, method: String },
    /// The route is an explicit `404`.
    NotFound,
    /// The route's action is not of the form `Controller.Method`.
    Opaque(String),
}

/// Result of a successful forward lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub action: MatchedAction,
    /// Captured path parameters.
    pub params: HashMap<String, Vec<String>>,
    pub fixed_params: Vec<String>,
    /// The route that matched.
    pub route: Arc<RouteDefinition>,
}

impl RouteMatch {
    pub fn is_explicit_not_found(&self) -> bool {
        self.action == MatchedAction::NotFound
    }

    /// First value captured under `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(|v| v.first()).map(String::as_str)
    }
}

/// One consistent snapshot of the routing table.
#[derive(Debug)]
pub struct Generation {
    routes: Vec<Arc<RouteDefinition>>,
    tree: MatchTree<Arc<RouteDefinition>>,
    sources: Vec<PathBuf>,
}

impl Generation {
    /// Build the match tree for a parsed route list. GET routes are also
    /// registered for HEAD.
    pub fn build(parsed: ParsedRoutes) -> Result<Self, RouteError> {
        let mut tree = MatchTree::new();
        let mut routes = Vec::with_capacity(parsed.routes.len());

        for route in &parsed.routes {
            let route = Arc::new(route.clone());
            tree.insert(route.tree_key(), Arc::clone(&route))
                .and_then(|()| {
                    if route.method() == "GET" {
                        tree.insert(&tree_key("HEAD", route.path()), Arc::clone(&route))
                    } else {
                        Ok(())
                    }
                })
                .map_err(|e| {
                    RouteError::new(RouteErrorKind::TreeConflict(e.to_string()))
                        .with_context(parsed.context_for(&route))
                })?;
            routes.push(route);
        }

        Ok(Self {
            routes,
            tree,
            sources: parsed.sources,
        })
    }

    pub fn routes(&self) -> &[Arc<RouteDefinition>] {
        &self.routes
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }
}

/// The routing engine.
pub struct Router {
    routes_path: PathBuf,
    parser: RoutesParser,
    current: ArcSwapOption<Generation>,
    refresh_lock: Mutex<()>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes_path", &self.routes_path)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

impl Router {
    /// Create an unloaded router for the routes file at `routes_path`.
    pub fn new(routes_path: impl Into<PathBuf>, parser: RoutesParser) -> Self {
        Self {
            routes_path: routes_path.into(),
            parser,
            current: ArcSwapOption::empty(),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn routes_path(&self) -> &Path {
        &self.routes_path
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// Current generation, if any.
    pub fn generation(&self) -> Option<Arc<Generation>> {
        self.current.load_full()
    }

    /// Routes of the current generation, in declaration order.
    pub fn routes(&self) -> Vec<Arc<RouteDefinition>> {
        self.generation()
            .map(|g| g.routes.clone())
            .unwrap_or_default()
    }

    /// Files read to build the current generation.
    pub fn sources(&self) -> Vec<PathBuf> {
        self.generation()
            .map(|g| g.sources.clone())
            .unwrap_or_default()
    }

    /// Re-read the routes file (validating actions) and publish a new
    /// generation. On error nothing changes.
    pub fn refresh(&self) -> Result<(), RouteError> {
        let _guard = self.refresh_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let started = Instant::now();

        let result = self
            .parser
            .parse_file(&self.routes_path, "", true)
            .and_then(Generation::build);

        match result {
            Ok(generation) => {
                let count = generation.routes.len();
                self.current.store(Some(Arc::new(generation)));
                metrics::record_refresh(true, started, Some(count));
                tracing::info!(
                    path = %self.routes_path.display(),
                    routes = count,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Routes loaded"
                );
                Ok(())
            }
            Err(e) => {
                metrics::record_refresh(false, started, None);
                Err(e)
            }
        }
    }

    /// Find the route for a request.
    ///
    /// Returns `None` when nothing matches, when the router has not been
    /// loaded, and when an action placeholder has no matching capture.
    pub fn route(&self, method: &str, path: &str) -> Option<RouteMatch> {
        let guard = self.current.load();
        let Some(generation) = (*guard).as_deref() else {
            metrics::record_lookup("unloaded");
            return None;
        };

        let key = format!("/{}{}", method.to_uppercase(), path);
        let Some((route, captures)) = generation.tree.find(&key) else {
            metrics::record_lookup("no_route");
            return None;
        };

        // The first capture of a `*` route is the request method.
        let mut params: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in captures.into_iter().skip(usize::from(route.is_any_method())) {
            params.entry(name).or_default().push(value);
        }

        let action = match route.target() {
            ActionTarget::NotFound => {
                metrics::record_lookup("explicit_404");
                MatchedAction::NotFound
            }
            ActionTarget::Opaque => MatchedAction::Opaque(route.action().to_string()),
            ActionTarget::Named { controller, method } => {
                let resolved = resolve_part(controller, &params).zip(resolve_part(method, &params));
                let Some((controller, method)) = resolved else {
                    tracing::warn!(
                        action = %route.action(),
                        route = %route.path(),
                        source = %route.provenance(),
                        "Action placeholder has no matching path capture"
                    );
                    metrics::record_lookup("unresolved");
                    return None;
                };
                MatchedAction::Invoke { controller, method }
            }
        };
        if action != MatchedAction::NotFound {
            metrics::record_lookup("matched");
        }

        tracing::debug!(method = %method, path = %path, route = %route.path(), action = %route.action(), "Route matched");
        Some(RouteMatch {
            action,
            params,
            fixed_params: route.fixed_params().to_vec(),
            route: Arc::clone(route),
        })
    }

    /// Build a URL for `action` (`Controller.Method`) from `args`.
    pub fn reverse(
        &self,
        action: &str,
        args: BTreeMap<String, String>,
    ) -> Result<ActionDefinition, ReverseError> {
        let guard = self.current.load();
        let routes = (*guard).as_deref().map(|g| g.routes.as_slice()).unwrap_or_default();
        reverse_route(routes, action, args)
    }
}

fn resolve_part(part: &ActionPart, params: &HashMap<String, Vec<String>>) -> Option<String> {
    match part {
        ActionPart::Literal(name) => Some(name.clone()),
        ActionPart::Placeholder(name) => params.get(name).and_then(|v| v.first()).cloned(),
    }
}
