//! Include-graph resolution
//!
//! `BindingGraphParser` turns one named source plus its transitive
//! `include:` graph into a flat `Binding`. The graph is flattened into an
//! ordered application list first, then folded through the first-write-wins
//! accumulator, so earlier entries always win field conflicts:
//!
//! 1. the project default source, unfiltered, if configured
//! 2. the named source itself, unfiltered
//! 3. included sources, LIFO over the frontier, each under its own filter
//!
//! Results are memoized per name; under concurrent access each name is
//! resolved at most once (DashMap entry API holds the shard lock while the
//! value is computed).

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::builder::BindingAccumulator;
use crate::loader::SourceMap;
use crate::model::{Binding, Filter, Include};
use crate::source::Source;

pub struct BindingGraphParser {
    sources: SourceMap,
    default_source: Option<Arc<Source>>,
    cache: DashMap<String, Arc<Binding>>,
}

impl BindingGraphParser {
    pub fn new(sources: SourceMap, default_source: Option<Arc<Source>>) -> Self {
        Self {
            sources,
            default_source,
            cache: DashMap::new(),
        }
    }

    /// Names of all known sources.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Resolve one binding by source name. `None` for unknown names;
    /// otherwise the memoized resolution.
    pub fn parse(&self, name: &str) -> Option<Arc<Binding>> {
        let source = Arc::clone(self.sources.get(name)?);
        let binding = self
            .cache
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(self.resolve(name, &source)));
        Some(Arc::clone(binding.value()))
    }

    /// Resolve every known source.
    pub fn parse_all(&self) -> Vec<Arc<Binding>> {
        let names: Vec<String> = self.sources.keys().cloned().collect();
        names.iter().filter_map(|name| self.parse(name)).collect()
    }

    fn resolve(&self, name: &str, source: &Arc<Source>) -> Binding {
        trace!(name, "resolving binding");
        let mut acc = BindingAccumulator::new();
        if let Some(compatible) = source.str_key("compatible") {
            acc.set_compatible(compatible);
        }
        if let Some(path) = &source.path {
            acc.set_path(path.display().to_string());
        }
        for (src, filter) in self.flatten(name, source) {
            acc.apply(&src, &filter);
        }
        acc.build()
    }

    /// Flatten the include graph into application order. Include names may
    /// carry a `.yaml` suffix; it is stripped before lookup. Names with no
    /// matching source are skipped: optional vendor bindings may simply be
    /// absent. The visited set is keyed on name plus filter: re-including a
    /// source under a different filter is legitimate and must apply (each
    /// filter admits different properties), while repeating an identical
    /// inclusion can never change the first-write-wins outcome, so dropping
    /// it only makes cyclic graphs terminate.
    fn flatten(&self, name: &str, root: &Arc<Source>) -> Vec<(Arc<Source>, Filter)> {
        let mut ordered = Vec::new();
        if let Some(default) = &self.default_source {
            ordered.push((Arc::clone(default), Filter::empty()));
        }
        ordered.push((Arc::clone(root), Filter::empty()));

        let mut visited: HashSet<(String, Filter)> = HashSet::new();
        visited.insert((name.to_string(), Filter::empty()));

        let mut frontier = Include::list_from_yaml(root.get("include"));
        while let Some(include) = frontier.pop() {
            let key = include
                .name
                .strip_suffix(".yaml")
                .unwrap_or(&include.name);
            if !visited.insert((key.to_string(), include.filter.clone())) {
                continue;
            }
            let Some(source) = self.sources.get(key) else {
                debug!(binding = name, include = key, "include not found, skipping");
                continue;
            };
            ordered.push((Arc::clone(source), include.filter));
            frontier.extend(Include::list_from_yaml(source.get("include")));
        }
        ordered
    }
}
