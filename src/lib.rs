//! Devicetree binding resolution engine
//!
//! Loads YAML binding files (the schemas describing which properties a
//! devicetree node must or may carry for a given `compatible` string),
//! resolves each binding's `include:` graph into a flat immutable
//! `Binding`, and picks the binding that applies to a node, taking bus
//! context into account, with bundled node-name fallbacks for `aliases`,
//! `chosen`, `cpus`, `memory` and `reserved-memory`. A separate checker
//! decides whether a
//! property's parsed values satisfy a declared type.
//!
//! Devicetree parsing itself is the host's job: nodes and properties come
//! in through the `DtsNode`/`DtsProperty` traits, value tokens as
//! `DtsValue`.

pub mod builder;
pub mod bundled;
pub mod dts_value;
pub mod error;
pub mod loader;
pub mod model;
pub mod node;
pub mod parser;
pub mod registry;
pub mod search;
pub mod source;
pub mod typecheck;

pub use bundled::{BundledBindings, BundledTable, BUNDLED_NODE_NAMES, FALLBACK_BINDING_NAME};
pub use dts_value::DtsValue;
pub use error::BindingError;
pub use model::{Binding, Filter, Include, PropertyBinding, PropertyType, PropertyValue};
pub use node::{base_node_name, DtsNode, DtsProperty};
pub use parser::BindingGraphParser;
pub use registry::{BindingProvider, BindingRegistry};
pub use search::search_binding;
pub use source::Source;
pub use typecheck::assignable_to;
