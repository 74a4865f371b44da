//! Collaborator interfaces consumed by the parser and the dispatch adapter.
//!
//! - `ModuleRegistry`: resolves `import` entries to a module's base directory
//! - `ActionRegistry`: answers whether `Controller.Method` exists and which
//!   parameter names it declares

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::schema::{ControllersConfig, ModuleConfig};

/// Location of a module's routes file, relative to its base path.
pub const MODULE_ROUTES_FILE: &str = "conf/routes.yml";

/// An application module that may contribute routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub base_path: PathBuf,
    pub active: bool,
}

impl Module {
    pub fn routes_path(&self) -> PathBuf {
        self.base_path.join(MODULE_ROUTES_FILE)
    }
}

/// Looks up modules by name.
pub trait ModuleRegistry: Send + Sync {
    fn lookup_module(&self, name: &str) -> Option<Module>;
}

/// Module registry backed by a fixed table.
#[derive(Debug, Clone, Default)]
pub struct ModuleTable {
    modules: HashMap<String, Module>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration, resolving relative module paths against `root`.
    pub fn from_config(configs: &[ModuleConfig], root: &Path) -> Self {
        let mut table = Self::new();
        for config in configs {
            table.insert(Module {
                name: config.name.clone(),
                base_path: root.join(&config.path),
                active: config.active,
            });
        }
        table
    }

    pub fn insert(&mut self, module: Module) {
        self.modules.insert(module.name.clone(), module);
    }

    pub fn with_module(mut self, name: &str, base_path: impl Into<PathBuf>, active: bool) -> Self {
        self.insert(Module {
            name: name.to_string(),
            base_path: base_path.into(),
            active,
        });
        self
    }
}

impl ModuleRegistry for ModuleTable {
    fn lookup_module(&self, name: &str) -> Option<Module> {
        self.modules.get(name).cloned()
    }
}

/// Declared shape of a controller method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionSignature {
    pub controller: String,
    pub method: String,
    /// Parameter names in declaration order; fixed params bind to these.
    pub params: Vec<String>,
}

/// Resolves `Controller.Method` pairs to their signatures.
pub trait ActionRegistry: Send + Sync {
    fn find_action(&self, controller: &str, method: &str) -> Option<&ActionSignature>;

    /// Whether a controller of this name exists at all.
    fn has_controller(&self, controller: &str) -> bool;
}

/// In-memory action registry.
///
/// Controller names are matched case-insensitively, method names exactly.
#[derive(Debug, Clone, Default)]
pub struct ControllerRegistry {
    controllers: HashMap<String, HashMap<String, ActionSignature>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ControllersConfig) -> Self {
        let mut registry = Self::new();
        for (controller, methods) in config {
            for (method, params) in methods {
                registry.register(controller, method, params.as_slice());
            }
        }
        registry
    }

    pub fn register<S: AsRef<str>>(&mut self, controller: &str, method: &str, params: &[S]) {
        self.controllers
            .entry(controller.to_lowercase())
            .or_default()
            .insert(
                method.to_string(),
                ActionSignature {
                    controller: controller.to_string(),
                    method: method.to_string(),
                    params: params.iter().map(|p| p.as_ref().to_string()).collect(),
                },
            );
    }

    pub fn with_action(mut self, controller: &str, method: &str, params: &[&str]) -> Self {
        self.register(controller, method, params);
        self
    }
}

impl ActionRegistry for ControllerRegistry {
    fn find_action(&self, controller: &str, method: &str) -> Option<&ActionSignature> {
        self.controllers
            .get(&controller.to_lowercase())
            .and_then(|methods| methods.get(method))
    }

    fn has_controller(&self, controller: &str) -> bool {
        self.controllers.contains_key(&controller.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_lookup_is_case_insensitive() {
        let registry = ControllerRegistry::new().with_action("Users", "Show", &["id"]);

        let sig = registry.find_action("users", "Show").unwrap();
        assert_eq!(sig.controller, "Users");
        assert_eq!(sig.params, vec!["id".to_string()]);
        assert!(registry.has_controller("USERS"));
        assert!(registry.find_action("Users", "show").is_none());
        assert!(registry.find_action("Posts", "Show").is_none());
    }

    #[test]
    fn test_module_table_from_config() {
        let configs = vec![
            ModuleConfig {
                name: "admin".into(),
                path: "modules/admin".into(),
                active: true,
            },
            ModuleConfig {
                name: "testrunner".into(),
                path: "/opt/testrunner".into(),
                active: false,
            },
        ];
        let table = ModuleTable::from_config(&configs, Path::new("/srv/app"));

        let admin = table.lookup_module("admin").unwrap();
        assert_eq!(admin.routes_path(), PathBuf::from("/srv/app/modules/admin/conf/routes.yml"));
        let runner = table.lookup_module("testrunner").unwrap();
        assert!(!runner.active);
        assert_eq!(runner.base_path, PathBuf::from("/opt/testrunner"));
        assert!(table.lookup_module("missing").is_none());
    }
}
