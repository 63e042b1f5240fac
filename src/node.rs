//! Collaborator traits
//!
//! The engine does not parse devicetree source itself; the host supplies
//! node and property handles through these traits and consumes resolved
//! bindings in return.

/// A devicetree node as seen by binding resolution.
pub trait DtsNode {
    /// Values of the node's `compatible` property, in declaration order.
    /// Empty when the node has none.
    fn compatible_strings(&self) -> Vec<String>;

    /// Last path segment, possibly carrying an `@unit-address` suffix.
    fn node_name(&self) -> String;

    fn parent(&self) -> Option<&dyn DtsNode>;
}

/// A devicetree property together with its owning node.
pub trait DtsProperty {
    fn name(&self) -> String;

    fn node(&self) -> &dyn DtsNode;
}

/// Node name with any `@unit-address` suffix removed.
pub fn base_node_name(name: &str) -> &str {
    name.split_once('@').map_or(name, |(base, _)| base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_address_is_stripped() {
        assert_eq!(base_node_name("uart@40001000"), "uart");
        assert_eq!(base_node_name("chosen"), "chosen");
        assert_eq!(base_node_name("memory@0"), "memory");
    }
}
