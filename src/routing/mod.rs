//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Refresh (startup, file change, SIGHUP):
//!     conf/routes.yml
//!     → parser.rs (decode entries, resolve module imports, validate actions)
//!     → Vec<RouteDefinition> (definition.rs)
//!     → tree.rs (insert every tree key, GET also as HEAD)
//!     → router.rs (publish generation with one atomic swap)
//!
//! Per request:
//!     (method, path) → router.rs → tree.rs lookup → RouteMatch
//!
//! URL generation:
//!     (action, args) → reverse.rs (scan route list) → ActionDefinition
//! ```
//!
//! # Design Decisions
//! - Route list and tree are rebuilt together and never mutated in place
//! - Deterministic: literal segments beat captures, captures beat catch-alls
//! - First matching route wins for reverse routing
//! - No regex: per-segment captures and a trailing catch-all only

pub mod definition;
pub mod error;
pub mod parser;
pub mod registry;
pub mod reverse;
pub mod router;
pub mod tree;

pub use definition::{ActionPart, ActionTarget, Provenance, RouteDefinition};
pub use error::{ReverseError, RouteError, RouteErrorKind, SourceContext};
pub use parser::{ParsedRoutes, RoutesParser};
pub use registry::{ActionRegistry, ActionSignature, ControllerRegistry, Module, ModuleRegistry, ModuleTable};
pub use reverse::ActionDefinition;
pub use router::{Generation, MatchedAction, RouteMatch, Router};
pub use tree::{MatchTree, TreeError};
