//! Routes document parser.
//!
//! # Document Format
//! ```yaml
//! - method: GET                # GET|POST|PUT|DELETE|PATCH|OPTIONS|HEAD|WS|*
//!   path: /users/:id
//!   action: Users.Show
//!   params: ["summary"]        # optional, bound positionally
//! - import: admin              # splice in another module's conf/routes.yml
//!   prefix: /admin             # optional
//! ```
//!
//! # Design Decisions
//! - Each entry is decoded into a tagged `Entry` in one pass; unknown keys and
//!   wrongly typed values are rejected instead of being ignored
//! - Imports recurse with an accumulated path prefix and are bounded by
//!   `max_import_depth`, which also stops self-importing modules
//! - Unknown or inactive modules contribute no routes (environment-specific
//!   modules such as a test runner are routinely absent)
//! - Every error is tagged with the document it came from; errors from an
//!   imported module keep that module's context

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_yaml::Value;

use crate::routing::definition::{ActionPart, ActionTarget, Provenance, RouteDefinition};
use crate::routing::error::{RouteError, RouteErrorKind, SourceContext};
use crate::routing::registry::{ActionRegistry, ModuleRegistry};

/// Import nesting allowed before the parser gives up.
pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 16;

/// Methods accepted in route entries (compared case-insensitively).
pub const ROUTE_METHODS: [&str; 9] = ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS", "HEAD", "WS", "*"];

const REQUIRED_ROUTE_OPTIONS: [&str; 3] = ["method", "path", "action"];
const ROUTE_OPTIONS: [&str; 4] = ["method", "path", "action", "params"];
const IMPORT_OPTIONS: [&str; 2] = ["import", "prefix"];

/// One decoded entry of a routes document.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Import {
        module: String,
        prefix: String,
    },
    Route {
        method: String,
        path: String,
        action: String,
        params: Vec<String>,
    },
}

impl Entry {
    /// Decode a document entry. `Ok(None)` for null or empty entries.
    fn from_yaml(value: &Value) -> Result<Option<Self>, RouteErrorKind> {
        let mapping = match value {
            Value::Null => return Ok(None),
            Value::Mapping(mapping) => mapping,
            other => {
                return Err(RouteErrorKind::InvalidEntry(format!(
                    "expected a mapping, got {}",
                    describe(other)
                )))
            }
        };
        if mapping.is_empty() {
            return Ok(None);
        }

        let mut fields = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let key = key.as_str().ok_or_else(|| {
                RouteErrorKind::InvalidEntry(format!("option names must be strings, got {}", describe(key)))
            })?;
            fields.push((key, value));
        }
        let get = |name: &str| fields.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);

        if let Some(module) = get("import") {
            reject_unknown(&fields, &IMPORT_OPTIONS)?;
            let prefix = match get("prefix") {
                Some(Value::Null) | None => String::new(),
                Some(value) => scalar("prefix", value)?,
            };
            return Ok(Some(Entry::Import {
                module: scalar("import", module)?,
                prefix,
            }));
        }

        for key in REQUIRED_ROUTE_OPTIONS {
            if get(key).is_none() {
                return Err(RouteErrorKind::MissingRouteOption(key.to_string()));
            }
        }
        reject_unknown(&fields, &ROUTE_OPTIONS)?;

        let params = match get("params") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Sequence(items)) => items
                .iter()
                .map(|item| scalar("params", item))
                .collect::<Result<_, _>>()?,
            Some(other) => {
                return Err(RouteErrorKind::InvalidEntry(format!(
                    "\"params\" must be a sequence, got {}",
                    describe(other)
                )))
            }
        };

        let method = scalar("method", get("method").unwrap_or(&Value::Null))?;
        if !ROUTE_METHODS.iter().any(|m| m.eq_ignore_ascii_case(&method)) {
            return Err(RouteErrorKind::UnknownMethod(method));
        }

        Ok(Some(Entry::Route {
            method,
            path: scalar("path", get("path").unwrap_or(&Value::Null))?,
            action: scalar("action", get("action").unwrap_or(&Value::Null))?,
            params,
        }))
    }
}

fn reject_unknown(fields: &[(&str, &Value)], allowed: &[&str]) -> Result<(), RouteErrorKind> {
    match fields.iter().find(|(k, _)| !allowed.contains(k)) {
        Some((key, _)) => Err(RouteErrorKind::UnknownRouteOption(key.to_string())),
        None => Ok(()),
    }
}

/// Scalars are accepted as strings so that `action: 404` works unquoted.
fn scalar(option: &str, value: &Value) -> Result<String, RouteErrorKind> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(RouteErrorKind::InvalidEntry(format!(
            "\"{option}\" must be a string, got {}",
            describe(other)
        ))),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Concatenate two path pieces, collapsing a doubled `/` at the seam.
pub fn join_path(prefix: &str, path: &str) -> String {
    match prefix.strip_suffix('/') {
        Some(trimmed) if path.starts_with('/') => format!("{trimmed}{path}"),
        _ => format!("{prefix}{path}"),
    }
}

/// Path of a route declared as `path` under `prefix`.
fn prefixed_route_path(prefix: &str, path: &str) -> String {
    if path == "/" && !prefix.is_empty() {
        prefix.to_string()
    } else {
        join_path(prefix, path)
    }
}

/// 1-based line numbers of the top-level `- ` markers of a block sequence.
fn entry_lines(content: &str) -> Vec<usize> {
    let markers: Vec<(usize, usize)> = content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let trimmed = line.trim_start();
            let is_marker = trimmed == "-" || trimmed.starts_with("- ");
            is_marker.then(|| (line.len() - trimmed.len(), i + 1))
        })
        .collect();
    let Some(indent) = markers.iter().map(|(indent, _)| *indent).min() else {
        return Vec::new();
    };
    markers
        .into_iter()
        .filter(|(i, _)| *i == indent)
        .map(|(_, line)| line)
        .collect()
}

/// Routes produced by one parse, with every file that was read.
#[derive(Debug, Clone, Default)]
pub struct ParsedRoutes {
    pub routes: Vec<RouteDefinition>,
    pub sources: Vec<PathBuf>,
    /// Text of each parsed document, for diagnostics raised after parsing.
    pub documents: HashMap<PathBuf, String>,
}

impl ParsedRoutes {
    /// Diagnostic context for `route`, built from the text it was parsed from.
    pub fn context_for(&self, route: &RouteDefinition) -> SourceContext {
        let content = self.documents.get(route.source()).map(String::as_str).unwrap_or_default();
        SourceContext::new(route.source(), route.provenance().line, content)
    }
}

/// Parses routes documents and resolves module imports.
#[derive(Clone)]
pub struct RoutesParser {
    modules: Arc<dyn ModuleRegistry>,
    actions: Option<Arc<dyn ActionRegistry>>,
    max_import_depth: usize,
}

impl RoutesParser {
    pub fn new(modules: Arc<dyn ModuleRegistry>) -> Self {
        Self {
            modules,
            actions: None,
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
        }
    }

    /// Check route targets against `actions` when validating.
    pub fn with_actions(mut self, actions: Arc<dyn ActionRegistry>) -> Self {
        self.actions = Some(actions);
        self
    }

    pub fn with_max_import_depth(mut self, depth: usize) -> Self {
        self.max_import_depth = depth;
        self
    }

    /// Read and parse a routes file.
    pub fn parse_file(&self, path: &Path, prefix: &str, validate: bool) -> Result<ParsedRoutes, RouteError> {
        let mut walk = Walk::new(self, validate);
        walk.file(path, prefix, 0)?;
        Ok(walk.out)
    }

    /// Parse the content of a routes document that was read from `source_path`.
    pub fn parse(
        &self,
        source_path: &Path,
        prefix: &str,
        content: &str,
        validate: bool,
    ) -> Result<ParsedRoutes, RouteError> {
        let mut walk = Walk::new(self, validate);
        walk.document(source_path, prefix, content, 0)?;
        Ok(walk.out)
    }

    /// Check that a route's action can be dispatched.
    fn validate_route(&self, route: &RouteDefinition) -> Result<(), RouteErrorKind> {
        let (controller, method) = match route.target() {
            ActionTarget::NotFound => return Ok(()),
            ActionTarget::Opaque => {
                return Err(RouteErrorKind::RouteValidation(format!(
                    "Expected two parts (Controller.Action), but got {}: {}",
                    route.action().split('.').count(),
                    route.action()
                )))
            }
            ActionTarget::Named { controller, method } => (controller, method),
        };

        let (ActionPart::Literal(controller), ActionPart::Literal(method)) = (controller, method) else {
            return Ok(());
        };
        let Some(actions) = &self.actions else {
            return Ok(());
        };
        if !actions.has_controller(controller) {
            return Err(RouteErrorKind::RouteValidation(format!(
                "Controller \"{controller}\" not found"
            )));
        }
        if actions.find_action(controller, method).is_none() {
            return Err(RouteErrorKind::RouteValidation(format!(
                "Action \"{controller}.{method}\" not found"
            )));
        }
        Ok(())
    }
}

/// State of one recursive parse.
struct Walk<'p> {
    parser: &'p RoutesParser,
    validate: bool,
    out: ParsedRoutes,
}

impl<'p> Walk<'p> {
    fn new(parser: &'p RoutesParser, validate: bool) -> Self {
        Self {
            parser,
            validate,
            out: ParsedRoutes::default(),
        }
    }

    fn file(&mut self, path: &Path, prefix: &str, depth: usize) -> Result<(), RouteError> {
        let content = fs::read_to_string(path)
            .map_err(|e| RouteError::new(e.into()).with_context(SourceContext::new(path, None, "")))?;
        self.out.sources.push(path.to_path_buf());
        self.document(path, prefix, &content, depth)
    }

    fn document(&mut self, source: &Path, prefix: &str, content: &str, depth: usize) -> Result<(), RouteError> {
        self.out.documents.insert(source.to_path_buf(), content.to_string());
        let doc: Value = serde_yaml::from_str(content).map_err(|e| {
            let line = e.location().map(|l| l.line());
            RouteError::new(e.into()).with_context(SourceContext::new(source, line, content))
        })?;

        let entries = match doc {
            Value::Null => return Ok(()),
            Value::Sequence(entries) => entries,
            other => {
                let kind = RouteErrorKind::InvalidEntry(format!(
                    "routes document must be a sequence, got {}",
                    describe(&other)
                ));
                return Err(RouteError::new(kind).with_context(SourceContext::new(source, None, content)));
            }
        };

        let lines = entry_lines(content);
        for (index, value) in entries.iter().enumerate() {
            let line = lines.get(index).copied();
            let context = || SourceContext::new(source, line, content);

            let entry = match Entry::from_yaml(value) {
                Ok(Some(entry)) => entry,
                Ok(None) => continue,
                Err(kind) => return Err(RouteError::new(kind).with_context(context())),
            };

            match entry {
                Entry::Import { module, prefix: import_prefix } => {
                    let module_prefix = join_path(prefix, &import_prefix);
                    self.import(&module, &module_prefix, depth + 1)
                        .map_err(|e| e.with_context(context()))?;
                }
                Entry::Route {
                    method,
                    path,
                    action,
                    params,
                } => {
                    if !path.starts_with('/') {
                        return Err(RouteError::new(RouteErrorKind::MalformedPath(path)).with_context(context()));
                    }
                    let route = RouteDefinition::new(
                        &method,
                        &prefixed_route_path(prefix, &path),
                        &action,
                        params,
                        Provenance::new(source, line),
                    )
                    .map_err(|e| e.with_context(context()))?;

                    if self.validate {
                        self.parser
                            .validate_route(&route)
                            .map_err(|kind| RouteError::new(kind).with_context(context()))?;
                    }
                    self.out.routes.push(route);
                }
            }
        }
        Ok(())
    }

    fn import(&mut self, name: &str, prefix: &str, depth: usize) -> Result<(), RouteError> {
        if depth > self.parser.max_import_depth {
            return Err(RouteErrorKind::ImportDepthExceeded {
                module: name.to_string(),
                depth,
            }
            .into());
        }

        let module = match self.parser.modules.lookup_module(name) {
            Some(module) if module.active => module,
            _ => {
                tracing::info!(module = %name, "Skipping routes for inactive module");
                return Ok(());
            }
        };

        tracing::debug!(module = %name, prefix = %prefix, path = ?module.routes_path(), "Importing module routes");
        self.file(&module.routes_path(), prefix, depth)
    }
}
