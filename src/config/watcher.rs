//! Routes file watcher for hot reload.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::routing::Router;

/// Outcome of a reload triggered by a file change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// A new generation was published with this many routes.
    Reloaded(usize),
    /// The reload failed; the previous generation is still serving.
    Failed(String),
}

/// Watches the routes files of a router and refreshes it on change.
pub struct RoutesWatcher {
    router: Arc<Router>,
    paths: Vec<PathBuf>,
    events_tx: mpsc::UnboundedSender<ReloadEvent>,
}

impl RoutesWatcher {
    /// Create a watcher for the root routes file and every file the current
    /// generation was built from.
    ///
    /// Returns the watcher and a receiver for reload outcomes.
    pub fn new(router: Arc<Router>) -> (Self, mpsc::UnboundedReceiver<ReloadEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let mut paths = vec![router.routes_path().to_path_buf()];
        for source in router.sources() {
            if !paths.contains(&source) {
                paths.push(source);
            }
        }

        (Self {
            router,
            paths,
            events_tx,
        }, events_rx)
    }

    /// Files this watcher will observe.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Directories to watch: the parent of every watched file, deduplicated.
    ///
    /// Editors often save by replacing the file, which drops a watch placed on
    /// the file itself; a directory watch survives that.
    pub fn directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = Vec::new();
        for path in &self.paths {
            let dir = parent_dir(path);
            if !dirs.contains(&dir) {
                dirs.push(dir);
            }
        }
        dirs
    }

    /// Start watching in a background thread. The returned watcher must be
    /// kept alive for as long as reloads are wanted.
    // TODO: re-register watches when a reload changes the set of imported module files.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.events_tx.clone();
        let router = Arc::clone(&self.router);
        let targets = WatchTargets::new(&self.paths);

        let mut watcher = RecommendedWatcher::new(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create()) {
                        return;
                    }
                    if !event.paths.iter().any(|p| targets.matches(p)) {
                        return;
                    }
                    tracing::info!(paths = ?event.paths, "Routes file change detected, reloading...");
                    let outcome = match router.refresh() {
                        Ok(()) => ReloadEvent::Reloaded(router.routes().len()),
                        Err(e) => {
                            tracing::error!("Failed to reload routes: {}. Keeping current routes.", e);
                            ReloadEvent::Failed(e.to_string())
                        }
                    };
                    let _ = tx.send(outcome);
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            }
        }, Config::default().with_poll_interval(Duration::from_secs(2)))?;

        for dir in self.directories() {
            watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        }

        tracing::info!(paths = ?self.paths, "Routes watcher started");
        Ok(watcher)
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Watched files as (canonical directory, file name), so event paths match
/// whether notify reports them absolute or relative.
#[derive(Debug, Clone)]
struct WatchTargets {
    files: Vec<(PathBuf, OsString)>,
}

impl WatchTargets {
    fn new(paths: &[PathBuf]) -> Self {
        let files = paths
            .iter()
            .filter_map(|path| Some((canonical_dir(path), path.file_name()?.to_os_string())))
            .collect();
        Self { files }
    }

    fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let dir = canonical_dir(path);
        self.files.iter().any(|(d, n)| n == name && *d == dir)
    }
}

fn canonical_dir(path: &Path) -> PathBuf {
    let dir = parent_dir(path);
    fs::canonicalize(&dir).unwrap_or(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{ModuleTable, RoutesParser};

    #[test]
    fn test_watches_root_and_imported_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("routes.yml");
        let module_root = dir.path().join("admin");
        fs::create_dir_all(module_root.join("conf")).unwrap();
        fs::write(&root, "- import: admin\n- import: admin\n  prefix: /again\n").unwrap();
        fs::write(
            module_root.join("conf/routes.yml"),
            "- method: GET\n  path: /x\n  action: Admin.X\n",
        )
        .unwrap();

        let modules = ModuleTable::new().with_module("admin", &module_root, true);
        let router = Arc::new(Router::new(&root, RoutesParser::new(Arc::new(modules))));
        router.refresh().unwrap();

        let (watcher, _events) = RoutesWatcher::new(router);
        assert_eq!(watcher.paths(), &[root.clone(), module_root.join("conf/routes.yml")]);
        assert_eq!(
            watcher.directories(),
            vec![dir.path().to_path_buf(), module_root.join("conf")]
        );
    }

    #[test]
    fn test_targets_match_replaced_file_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("routes.yml");
        fs::write(&root, "").unwrap();
        let targets = WatchTargets::new(&[root.clone()]);

        // an atomic save lands a new file at the same path
        fs::write(dir.path().join("routes.yml.tmp"), "- import: x\n").unwrap();
        fs::rename(dir.path().join("routes.yml.tmp"), &root).unwrap();

        assert!(targets.matches(&root));
        assert!(targets.matches(&dir.path().join(".").join("routes.yml")));
        assert!(!targets.matches(&dir.path().join("routes.yml.tmp")));
        assert!(!targets.matches(&dir.path().join("other.yml")));
    }

    #[tokio::test]
    async fn test_reload_after_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("routes.yml");
        fs::write(&root, "- method: GET\n  path: /a\n  action: A.B\n").unwrap();
        let router = Arc::new(Router::new(&root, RoutesParser::new(Arc::new(ModuleTable::new()))));
        router.refresh().unwrap();

        let (watcher, mut events) = RoutesWatcher::new(Arc::clone(&router));
        let _watcher = watcher.run().unwrap();

        let replacement = dir.path().join("routes.yml.new");
        fs::write(
            &replacement,
            "- method: GET\n  path: /a\n  action: A.B\n- method: GET\n  path: /b\n  action: A.C\n",
        )
        .unwrap();
        fs::rename(&replacement, &root).unwrap();

        let reloaded = tokio::time::timeout(Duration::from_secs(10), async {
            while let Some(event) = events.recv().await {
                if event == ReloadEvent::Reloaded(2) {
                    return true;
                }
            }
            false
        })
        .await;
        assert_eq!(reloaded, Ok(true));
        assert!(router.route("GET", "/b").is_some());
    }

    #[test]
    fn test_unloaded_router_watches_root_only() {
        let router = Arc::new(Router::new(
            "conf/routes.yml",
            RoutesParser::new(Arc::new(ModuleTable::new())),
        ));
        let (watcher, _events) = RoutesWatcher::new(router);
        assert_eq!(watcher.paths(), &[PathBuf::from("conf/routes.yml")]);
    }
}
