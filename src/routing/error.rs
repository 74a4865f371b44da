//! Routing error taxonomy.
//!
//! # Design Decisions
//! - Parse, validation and tree-build failures share one `RouteError` so a
//!   refresh can return a single error type
//! - Diagnostics (file, line, source text) are attached once, at the document
//!   where the error was raised; errors bubbling out of nested module imports
//!   keep their original context
//! - Reverse routing has its own error type because it never touches refresh

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// What went wrong while loading or building a routing table.
#[derive(Debug, Error)]
pub enum RouteErrorKind {
    /// A routes file could not be read.
    #[error("Failed to load routes file: {0}")]
    Load(#[from] std::io::Error),

    /// The document is not valid YAML.
    #[error("Invalid routes document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A path pattern does not start with `/`.
    #[error("Absolute URL required, got \"{0}\"")]
    MalformedPath(String),

    /// A route entry lacks one of `method`, `path` or `action`.
    #[error("Missing required route option \"{0}\"")]
    MissingRouteOption(String),

    /// A route entry names a method outside the supported set.
    #[error("Unknown route method \"{0}\"")]
    UnknownMethod(String),

    /// An entry carries a key that does not belong to its shape.
    #[error("Unknown route option \"{0}\"")]
    UnknownRouteOption(String),

    /// An entry has the wrong shape or a value of the wrong type.
    #[error("Invalid route entry: {0}")]
    InvalidEntry(String),

    /// A route targets an action that is not registered.
    #[error("Route validation error: {0}")]
    RouteValidation(String),

    /// Two routes collide in the match tree.
    #[error("Route conflict: {0}")]
    TreeConflict(String),

    /// Module imports nest deeper than allowed (usually an import cycle).
    #[error("Module \"{module}\" imported at depth {depth}, exceeding the import limit")]
    ImportDepthExceeded { module: String, depth: usize },
}

/// Where an error was raised, for rendering a contextual diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceContext {
    /// Routes file the error belongs to.
    pub path: PathBuf,
    /// 1-based line, when it could be determined.
    pub line: Option<usize>,
    /// Full text of the routes file, split into lines.
    pub source_lines: Vec<String>,
}

impl SourceContext {
    pub fn new(path: &Path, line: Option<usize>, content: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            line,
            source_lines: content.lines().map(str::to_owned).collect(),
        }
    }
}

impl fmt::Display for SourceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}", self.path.display(), line),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

/// Error raised while parsing route documents or building the match tree.
#[derive(Debug, Error)]
#[error("{kind}{}", .context.as_ref().map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct RouteError {
    #[source]
    kind: RouteErrorKind,
    context: Option<SourceContext>,
}

impl RouteError {
    pub fn new(kind: RouteErrorKind) -> Self {
        Self { kind, context: None }
    }

    /// Attach diagnostic context unless the error already carries some.
    pub fn with_context(mut self, context: SourceContext) -> Self {
        if self.context.is_none() {
            self.context = Some(context);
        }
        self
    }

    pub fn kind(&self) -> &RouteErrorKind {
        &self.kind
    }

    pub fn context(&self) -> Option<&SourceContext> {
        self.context.as_ref()
    }

    /// Render the error with a few lines of source around the failing line.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.kind);
        let Some(ctx) = &self.context else {
            return out;
        };
        out.push_str(&format!("  --> {ctx}\n"));
        if let Some(line) = ctx.line {
            let first = line.saturating_sub(3).max(1);
            let last = (line + 2).min(ctx.source_lines.len());
            for n in first..=last {
                let marker = if n == line { ">" } else { " " };
                out.push_str(&format!("{marker}{n:>4} | {}\n", ctx.source_lines[n - 1]));
            }
        }
        out
    }
}

impl From<RouteErrorKind> for RouteError {
    fn from(kind: RouteErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Errors from reverse routing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReverseError {
    /// The action is not of the form `Controller.Method`.
    #[error("Reverse router got invalid action \"{0}\"")]
    InvalidAction(String),

    /// No route in the table leads to the action.
    #[error("Failed to find reverse route for \"{0}\"")]
    NotFound(String),
}
