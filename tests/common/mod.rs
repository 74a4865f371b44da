//! Shared utilities for integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use action_router::routing::{ControllerRegistry, ModuleTable, Router, RoutesParser};
use tempfile::TempDir;

/// A throwaway application tree with a root routes file and modules.
pub struct Site {
    dir: TempDir,
}

#[allow(dead_code)]
impl Site {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    pub fn root_routes(&self) -> PathBuf {
        self.dir.path().join("conf/routes.yml")
    }

    pub fn write_routes(&self, content: &str) -> PathBuf {
        self.write("conf/routes.yml", content)
    }

    pub fn module_dir(&self, name: &str) -> PathBuf {
        self.dir.path().join("modules").join(name)
    }

    pub fn write_module_routes(&self, name: &str, content: &str) -> PathBuf {
        self.write(&format!("modules/{name}/conf/routes.yml"), content)
    }

    /// Module table with each `(name, active)` pointing at `modules/<name>`.
    pub fn modules(&self, modules: &[(&str, bool)]) -> ModuleTable {
        modules.iter().fold(ModuleTable::new(), |table, (name, active)| {
            table.with_module(name, self.module_dir(name), *active)
        })
    }

    pub fn router(&self, modules: ModuleTable) -> Router {
        Router::new(self.root_routes(), RoutesParser::new(Arc::new(modules)))
    }

    pub fn validating_router(&self, modules: ModuleTable, actions: ControllerRegistry) -> Router {
        let parser = RoutesParser::new(Arc::new(modules)).with_actions(Arc::new(actions));
        Router::new(self.root_routes(), parser)
    }
}

/// Build a route entry in YAML block form.
#[allow(dead_code)]
pub fn route(method: &str, path: &str, action: &str) -> String {
    format!("- method: \"{method}\"\n  path: \"{path}\"\n  action: \"{action}\"\n")
}
