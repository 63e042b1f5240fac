//! Bundled node-name bindings
//!
//! A small set of bindings ships with the crate for nodes identified by
//! name rather than by `compatible`: `aliases`, `chosen`, `cpus`, `memory`,
//! `reserved-memory`, plus a generic `fallback` binding used when nothing
//! else applies.
//!
//! The table is process-scoped: the host constructs one `BundledBindings`
//! at startup and shares it. Loading is lazy and non-blocking: the first
//! `poll` starts a background load and returns `None`; callers re-poll.
//! Inside a tokio runtime the load runs on the blocking pool; without one
//! the first `poll` loads synchronously instead.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use tracing::{debug, error};

use crate::loader;
use crate::model::Binding;
use crate::parser::BindingGraphParser;

/// Node names with a bundled binding.
pub const BUNDLED_NODE_NAMES: &[&str] =
    &["aliases", "chosen", "cpus", "memory", "reserved-memory"];

/// Source name of the generic fallback binding.
pub const FALLBACK_BINDING_NAME: &str = "fallback";

/// Resolved bundled bindings keyed by node name.
pub struct BundledTable {
    by_node_name: HashMap<String, Arc<Binding>>,
    fallback: Option<Arc<Binding>>,
}

impl BundledTable {
    pub fn get(&self, node_name: &str) -> Option<&Arc<Binding>> {
        self.by_node_name.get(node_name)
    }

    pub fn fallback(&self) -> Option<&Arc<Binding>> {
        self.fallback.as_ref()
    }
}

/// Lazily loaded process-wide bundled binding table.
pub struct BundledBindings {
    dir: PathBuf,
    started: AtomicBool,
    table: Arc<OnceCell<Arc<BundledTable>>>,
}

impl BundledBindings {
    /// `dir` is the flat directory of bundled binding YAML (the crate
    /// ships one under `bindings/`). Nothing is read until first `poll`.
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            started: AtomicBool::new(false),
            table: Arc::new(OnceCell::new()),
        }
    }

    /// Current table, starting the load on first call. `None` until the
    /// background load completes; callers re-poll. The completed table is
    /// cached for the process lifetime.
    pub fn poll(&self) -> Option<Arc<BundledTable>> {
        if let Some(table) = self.table.get() {
            return Some(Arc::clone(table));
        }
        if !self.started.swap(true, Ordering::SeqCst) {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let dir = self.dir.clone();
                    let cell = Arc::clone(&self.table);
                    handle.spawn_blocking(move || {
                        let _ = cell.set(Arc::new(load_table(&dir)));
                    });
                }
                Err(_) => {
                    // No runtime to offload to; load in place.
                    let _ = self.table.set(Arc::new(load_table(&self.dir)));
                }
            }
        }
        self.table.get().map(Arc::clone)
    }

    /// Bundled binding for a node name (without unit address), or `None`
    /// when unknown or still loading.
    pub fn get(&self, node_name: &str) -> Option<Arc<Binding>> {
        self.poll()?.get(node_name).map(Arc::clone)
    }

    /// The generic fallback binding, or `None` while loading.
    pub fn fallback(&self) -> Option<Arc<Binding>> {
        self.poll()?.fallback().map(Arc::clone)
    }
}

fn load_table(dir: &std::path::Path) -> BundledTable {
    let sources = match loader::load_bundled_bindings(dir) {
        Ok(sources) => sources,
        Err(err) => {
            error!(dir = %dir.display(), %err, "bundled bindings unavailable");
            return BundledTable {
                by_node_name: HashMap::new(),
                fallback: None,
            };
        }
    };

    let parser = BindingGraphParser::new(sources, None);
    let by_node_name = BUNDLED_NODE_NAMES
        .iter()
        .filter_map(|name| Some((name.to_string(), parser.parse(name)?)))
        .collect();
    let fallback = parser.parse(FALLBACK_BINDING_NAME);
    debug!(dir = %dir.display(), "bundled binding table loaded");
    BundledTable {
        by_node_name,
        fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn bundled_dir() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("chosen.yaml"),
            "description: chosen node\nundeclared-properties: true",
        )
        .unwrap();
        fs::write(
            dir.path().join("fallback.yaml"),
            "description: generic node\nundeclared-properties: true",
        )
        .unwrap();
        dir
    }

    #[test]
    fn synchronous_poll_outside_runtime() {
        let dir = bundled_dir();
        let bundled = BundledBindings::new(dir.path().to_path_buf());
        let table = bundled.poll().unwrap();
        assert!(table.get("chosen").is_some());
        assert!(table.get("cpus").is_none());
        assert!(table.fallback().is_some());
    }

    #[tokio::test]
    async fn background_poll_inside_runtime() {
        let dir = bundled_dir();
        let bundled = BundledBindings::new(dir.path().to_path_buf());
        // First poll only starts the load; re-poll until it lands.
        let mut table = bundled.poll();
        for _ in 0..100 {
            if table.is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            table = bundled.poll();
        }
        let table = table.expect("bundled table never became ready");
        assert!(table.get("chosen").is_some());
    }

    #[test]
    fn completed_table_is_cached() {
        let dir = bundled_dir();
        let bundled = BundledBindings::new(dir.path().to_path_buf());
        let first = bundled.poll().unwrap();
        let second = bundled.poll().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn missing_dir_yields_empty_table() {
        let dir = tempdir().unwrap();
        let bundled = BundledBindings::new(dir.path().join("nope"));
        let table = bundled.poll().unwrap();
        assert!(table.get("chosen").is_none());
        assert!(table.fallback().is_none());
    }
}
