//! Binding registry and provider
//!
//! `BindingRegistry` is the plain lookup structure: a multimap from
//! `compatible` string to resolved bindings (several bindings may share a
//! compatible string and differ only in the bus they sit on).
//! `BindingProvider` ties loader, parser, registry, and the bundled table
//! together for a project.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::bundled::BundledBindings;
use crate::error::BindingError;
use crate::loader::{self, SourceMap};
use crate::model::{Binding, PropertyBinding};
use crate::node::{DtsNode, DtsProperty};
use crate::parser::BindingGraphParser;
use crate::search::search_binding;

/// Multimap of `compatible` string to resolved bindings. Insertion order
/// within each key is preserved.
#[derive(Default)]
pub struct BindingRegistry {
    by_compatible: HashMap<String, Vec<Arc<Binding>>>,
    all: Vec<Arc<Binding>>,
}

impl BindingRegistry {
    pub fn from_bindings(bindings: impl IntoIterator<Item = Arc<Binding>>) -> Self {
        let mut registry = Self::default();
        for binding in bindings {
            if let Some(compatible) = &binding.compatible {
                registry
                    .by_compatible
                    .entry(compatible.clone())
                    .or_default()
                    .push(Arc::clone(&binding));
            }
            registry.all.push(binding);
        }
        registry
    }

    /// Every binding registered for `compatible`, in registration order.
    pub fn bindings_for_compatible(&self, compatible: &str) -> &[Arc<Binding>] {
        self.by_compatible
            .get(compatible)
            .map_or(&[], Vec::as_slice)
    }

    pub fn all_bindings(&self) -> &[Arc<Binding>] {
        &self.all
    }
}

/// Per-project binding access: resolved external bindings plus the shared
/// bundled node-name table.
pub struct BindingProvider {
    registry: BindingRegistry,
    bundled: Arc<BundledBindings>,
}

impl BindingProvider {
    pub fn new(registry: BindingRegistry, bundled: Arc<BundledBindings>) -> Self {
        Self { registry, bundled }
    }

    /// Load all binding sources under `external_dirs`, resolve every
    /// binding, and index the results. `default_source_name` selects the
    /// project-wide default source applied to every binding; naming a
    /// source that does not exist is a configuration error.
    pub fn load(
        external_dirs: &[PathBuf],
        default_source_name: Option<&str>,
        bundled: Arc<BundledBindings>,
    ) -> Result<Self, BindingError> {
        let mut sources = SourceMap::new();
        for dir in external_dirs {
            sources.extend(loader::load_external_bindings(dir));
        }
        debug!(count = sources.len(), "loaded binding sources");

        let default_source = match default_source_name {
            Some(name) => Some(Arc::clone(sources.get(name).ok_or_else(|| {
                BindingError::UnknownDefaultSource(name.to_string())
            })?)),
            None => None,
        };

        let parser = BindingGraphParser::new(sources, default_source);
        let registry = BindingRegistry::from_bindings(parser.parse_all());
        Ok(Self::new(registry, bundled))
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    pub fn bundled(&self) -> &BundledBindings {
        &self.bundled
    }

    /// Binding for `node` using its own compatible strings.
    pub fn binding_for_node(&self, node: &dyn DtsNode) -> Option<Arc<Binding>> {
        self.binding_for_node_with(node, &node.compatible_strings())
    }

    /// Binding for `node` with an explicit compatible list (the caller may
    /// be checking hypothetical compatibles, e.g. for completion).
    pub fn binding_for_node_with(
        &self,
        node: &dyn DtsNode,
        compatibles: &[String],
    ) -> Option<Arc<Binding>> {
        search_binding(&self.registry, &self.bundled, node, compatibles)
    }

    /// Walk upward from `node` (inclusive) until some ancestor resolves.
    /// With `use_fallback`, an unresolvable chain yields the bundled
    /// generic fallback binding instead of `None`.
    pub fn binding_for(&self, node: &dyn DtsNode, use_fallback: bool) -> Option<Arc<Binding>> {
        let mut current: Option<&dyn DtsNode> = Some(node);
        while let Some(n) = current {
            if let Some(binding) = self.binding_for_node(n) {
                return Some(binding);
            }
            current = n.parent();
        }
        if use_fallback {
            self.bundled.fallback()
        } else {
            None
        }
    }

    /// Schema for one property: the owning node's binding, then the
    /// property by name.
    pub fn property_binding_for(&self, property: &dyn DtsProperty) -> Option<PropertyBinding> {
        let binding = self.binding_for(property.node(), true)?;
        binding.property(&property.name()).cloned()
    }
}
