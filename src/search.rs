//! Binding search
//!
//! Given a node and its compatible strings, pick the binding that applies.
//! The parent's binding is resolved first (recursively and unmemoized; the
//! chain is short and callers run off the UI thread) because it decides
//! the bus context: a binding restricted to a bus via `on-bus` only applies
//! under a parent that hosts that bus via `bus`.

use std::sync::Arc;

use tracing::trace;

use crate::bundled::BundledBindings;
use crate::model::Binding;
use crate::node::{base_node_name, DtsNode};
use crate::registry::BindingRegistry;

/// Resolve the binding for `node` given its compatible strings.
///
/// 1. Resolve the parent's binding, walking the full ancestor chain.
/// 2. With a parent binding: an empty compatible list means the node is
///    described by the parent's `child-binding`; otherwise candidates on a
///    bus the parent hosts beat bus-neutral candidates, per compatible
///    string in order.
/// 3. Without one: bus-neutral candidates are preferred, else the first
///    candidate of any bus.
/// 4. Still nothing: bundled node-name bindings (`chosen`, `cpus`, ...),
///    unit address stripped.
pub fn search_binding(
    registry: &BindingRegistry,
    bundled: &BundledBindings,
    node: &dyn DtsNode,
    compatibles: &[String],
) -> Option<Arc<Binding>> {
    let parent_binding = node
        .parent()
        .and_then(|parent| search_binding(registry, bundled, parent, &parent.compatible_strings()));

    let found = match &parent_binding {
        Some(parent) => binding_with_parent(registry, compatibles, parent),
        None => binding_fallback(registry, compatibles),
    };
    if found.is_some() {
        return found;
    }

    let name = node.node_name();
    let base = base_node_name(&name);
    trace!(node = base, "no compatible match, trying bundled node names");
    bundled.get(base)
}

fn binding_with_parent(
    registry: &BindingRegistry,
    compatibles: &[String],
    parent: &Arc<Binding>,
) -> Option<Arc<Binding>> {
    if compatibles.is_empty() {
        return parent.child.clone();
    }
    for compatible in compatibles {
        let candidates = registry.bindings_for_compatible(compatible);
        let on_parent_bus = candidates.iter().find(|candidate| {
            candidate
                .on_bus
                .as_ref()
                .is_some_and(|bus| parent.buses.contains(bus))
        });
        if let Some(binding) = on_parent_bus.or_else(|| {
            candidates.iter().find(|candidate| candidate.on_bus.is_none())
        }) {
            return Some(Arc::clone(binding));
        }
    }
    None
}

fn binding_fallback(
    registry: &BindingRegistry,
    compatibles: &[String],
) -> Option<Arc<Binding>> {
    for compatible in compatibles {
        let candidates = registry.bindings_for_compatible(compatible);
        if let Some(binding) = candidates
            .iter()
            .find(|candidate| candidate.on_bus.is_none())
            .or_else(|| candidates.first())
        {
            return Some(Arc::clone(binding));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BindingAccumulator;
    use crate::model::Filter;
    use crate::source::Source;
    use tempfile::tempdir;

    struct MockNode {
        name: String,
        compatibles: Vec<String>,
        parent: Option<Box<MockNode>>,
    }

    impl MockNode {
        fn root(name: &str, compatibles: &[&str]) -> Self {
            Self {
                name: name.to_string(),
                compatibles: compatibles.iter().map(|c| c.to_string()).collect(),
                parent: None,
            }
        }

        fn child(self, name: &str, compatibles: &[&str]) -> Self {
            Self {
                name: name.to_string(),
                compatibles: compatibles.iter().map(|c| c.to_string()).collect(),
                parent: Some(Box::new(self)),
            }
        }
    }

    impl DtsNode for MockNode {
        fn compatible_strings(&self) -> Vec<String> {
            self.compatibles.clone()
        }

        fn node_name(&self) -> String {
            self.name.clone()
        }

        fn parent(&self) -> Option<&dyn DtsNode> {
            self.parent.as_deref().map(|p| p as &dyn DtsNode)
        }
    }

    fn binding(compatible: &str, yaml: &str) -> Arc<Binding> {
        let mut acc = BindingAccumulator::new();
        acc.set_compatible(compatible);
        let source = Source::synthetic(serde_yaml::from_str(yaml).unwrap());
        acc.apply(&source, &Filter::empty());
        Arc::new(acc.build())
    }

    fn empty_bundled() -> (tempfile::TempDir, BundledBindings) {
        let dir = tempdir().unwrap();
        let bundled = BundledBindings::new(dir.path().to_path_buf());
        (dir, bundled)
    }

    fn search(
        registry: &BindingRegistry,
        bundled: &BundledBindings,
        node: &MockNode,
    ) -> Option<Arc<Binding>> {
        search_binding(registry, bundled, node, &node.compatible_strings())
    }

    #[test]
    fn bus_candidate_beats_bus_neutral_under_bus_host() {
        let controller = binding("vendor,i2c-ctrl", "bus: i2c");
        let on_i2c = binding("vendor,x", "on-bus: i2c");
        let neutral = binding("vendor,x", "description: plain");
        let registry = BindingRegistry::from_bindings([
            controller,
            Arc::clone(&neutral),
            Arc::clone(&on_i2c),
        ]);
        let (_dir, bundled) = empty_bundled();

        let node = MockNode::root("soc", &["vendor,i2c-ctrl"]).child("dev@20", &["vendor,x"]);
        let found = search(&registry, &bundled, &node).unwrap();
        assert!(Arc::ptr_eq(&found, &on_i2c));
    }

    #[test]
    fn bus_neutral_preferred_without_parent_binding() {
        let on_spi = binding("vendor,x", "on-bus: spi");
        let neutral = binding("vendor,x", "description: plain");
        let registry = BindingRegistry::from_bindings([Arc::clone(&on_spi), Arc::clone(&neutral)]);
        let (_dir, bundled) = empty_bundled();

        let node = MockNode::root("dev", &["vendor,x"]);
        let found = search(&registry, &bundled, &node).unwrap();
        assert!(Arc::ptr_eq(&found, &neutral));
    }

    #[test]
    fn any_bus_taken_when_no_neutral_exists() {
        let on_spi = binding("vendor,x", "on-bus: spi");
        let registry = BindingRegistry::from_bindings([Arc::clone(&on_spi)]);
        let (_dir, bundled) = empty_bundled();

        let node = MockNode::root("dev", &["vendor,x"]);
        let found = search(&registry, &bundled, &node).unwrap();
        assert!(Arc::ptr_eq(&found, &on_spi));
    }

    #[test]
    fn first_compatible_with_candidates_wins() {
        let second = binding("vendor,b", "description: b");
        let registry = BindingRegistry::from_bindings([Arc::clone(&second)]);
        let (_dir, bundled) = empty_bundled();

        let node = MockNode::root("dev", &["vendor,a", "vendor,b"]);
        let found = search(&registry, &bundled, &node).unwrap();
        assert!(Arc::ptr_eq(&found, &second));
    }

    #[test]
    fn empty_compatibles_resolve_to_parent_child_binding() {
        let parent = binding(
            "vendor,bus",
            "child-binding:\n  properties:\n    reg:\n      type: int",
        );
        let registry = BindingRegistry::from_bindings([Arc::clone(&parent)]);
        let (_dir, bundled) = empty_bundled();

        let node = MockNode::root("ctrl", &["vendor,bus"]).child("dev@1", &[]);
        let found = search(&registry, &bundled, &node).unwrap();
        assert!(found.is_child);
        assert_eq!(found.compatible.as_deref(), Some("vendor,bus"));
    }

    #[test]
    fn empty_compatibles_without_child_binding_is_none() {
        let parent = binding("vendor,bus", "description: no child schema");
        let registry = BindingRegistry::from_bindings([parent]);
        let (_dir, bundled) = empty_bundled();

        let node = MockNode::root("ctrl", &["vendor,bus"]).child("dev@1", &[]);
        assert!(search(&registry, &bundled, &node).is_none());
    }

    #[test]
    fn node_name_falls_back_to_bundled_binding() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("chosen.yaml"),
            "description: chosen\nundeclared-properties: true",
        )
        .unwrap();
        let bundled = BundledBindings::new(dir.path().to_path_buf());
        let registry = BindingRegistry::default();

        let node = MockNode::root("/", &[]).child("chosen", &[]);
        let found = search(&registry, &bundled, &node).unwrap();
        assert_eq!(found.description.as_deref(), Some("chosen"));

        let node = MockNode::root("/", &[]).child("other", &[]);
        assert!(search(&registry, &bundled, &node).is_none());
    }

    #[test]
    fn unit_address_is_stripped_for_bundled_lookup() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("memory.yaml"),
            "properties:\n  reg:\n    type: array",
        )
        .unwrap();
        let bundled = BundledBindings::new(dir.path().to_path_buf());
        let registry = BindingRegistry::default();

        let node = MockNode::root("/", &[]).child("memory@20000000", &[]);
        assert!(search(&registry, &bundled, &node).is_some());
    }

    #[test]
    fn wrong_bus_restriction_moves_to_next_compatible() {
        // All "vendor,a" candidates demand a bus the parent does not host;
        // the search moves on to "vendor,b".
        let parent = binding("vendor,ctrl", "bus: i2c");
        let a_on_spi = binding("vendor,a", "on-bus: spi");
        let b_neutral = binding("vendor,b", "description: b");
        let registry = BindingRegistry::from_bindings([
            parent,
            a_on_spi,
            Arc::clone(&b_neutral),
        ]);
        let (_dir, bundled) = empty_bundled();

        let node = MockNode::root("ctrl", &["vendor,ctrl"]).child("dev", &["vendor,a", "vendor,b"]);
        let found = search(&registry, &bundled, &node).unwrap();
        assert!(Arc::ptr_eq(&found, &b_neutral));
    }
}
