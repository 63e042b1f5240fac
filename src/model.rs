//! Binding data model
//!
//! Immutable value types produced by include-graph resolution: one
//! `Binding` per schema file, holding `PropertyBinding`s keyed by property
//! name. `Filter` and `Include` describe the per-include property
//! allow/block lists read from `include:` entries.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Deserialize;
use serde_yaml::Value;

/// Declared type of a devicetree property, from the binding's `type:` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyType {
    String,
    StringList,
    Int,
    Ints,
    Boolean,
    Bytes,
    PHandle,
    PHandles,
    PHandleList,
    Path,
    /// Catch-all; every value shape is acceptable.
    Compound,
}

impl PropertyType {
    /// Parse the YAML `type:` key. Unknown names yield `None` so that a
    /// later source in the include graph may still supply the type.
    pub fn from_yaml_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "string-array" => Some(Self::StringList),
            "int" => Some(Self::Int),
            "array" => Some(Self::Ints),
            "boolean" => Some(Self::Boolean),
            "uint8-array" => Some(Self::Bytes),
            "phandle" => Some(Self::PHandle),
            "phandles" => Some(Self::PHandles),
            "phandle-array" => Some(Self::PHandleList),
            "path" => Some(Self::Path),
            "compound" => Some(Self::Compound),
            _ => None,
        }
    }

    /// Name used in binding YAML, for diagnostics.
    pub fn yaml_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::StringList => "string-array",
            Self::Int => "int",
            Self::Ints => "array",
            Self::Boolean => "boolean",
            Self::Bytes => "uint8-array",
            Self::PHandle => "phandle",
            Self::PHandles => "phandles",
            Self::PHandleList => "phandle-array",
            Self::Path => "path",
            Self::Compound => "compound",
        }
    }
}

/// A literal value appearing in a binding (`default:`, `const:`, `enum:`
/// elements).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Str(String),
    StrList(Vec<String>),
    Int(i64),
    IntList(Vec<i64>),
}

impl PropertyValue {
    /// Convert a raw YAML value. Accepts strings, integers, and homogeneous
    /// lists of either. Anything else yields `None`.
    pub fn from_yaml(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Str(s.clone())),
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::Sequence(seq) => {
                if seq.iter().all(|v| v.is_string()) {
                    Some(Self::StrList(
                        seq.iter().filter_map(Value::as_str).map(str::to_string).collect(),
                    ))
                } else if seq.iter().all(|v| v.as_i64().is_some()) {
                    Some(Self::IntList(seq.iter().filter_map(Value::as_i64).collect()))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Property types this literal shape is directly assignable to.
    pub fn assignable_types(&self) -> BTreeSet<PropertyType> {
        let mut types = BTreeSet::new();
        match self {
            Self::Str(_) => {
                types.insert(PropertyType::String);
                types.insert(PropertyType::Path);
            }
            Self::StrList(_) => {
                types.insert(PropertyType::StringList);
            }
            Self::Int(_) => {
                types.insert(PropertyType::Int);
            }
            Self::IntList(items) => {
                types.insert(PropertyType::Ints);
                if items.iter().all(|i| (0..=255).contains(i)) {
                    types.insert(PropertyType::Bytes);
                }
            }
        }
        types
    }
}

/// Resolved schema for one property of a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyBinding {
    pub name: String,
    pub description: Option<String>,
    pub r#type: PropertyType,
    pub default: Option<PropertyValue>,
    pub const_value: Option<PropertyValue>,
    pub enum_values: Option<Vec<PropertyValue>>,
    pub required: bool,
}

/// Resolved schema for one devicetree node shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub compatible: Option<String>,
    /// Origin file of the binding's own source, if any.
    pub path: Option<String>,
    pub description: Option<String>,
    pub properties: BTreeMap<String, PropertyBinding>,
    /// Schema for child nodes, from `child-binding:`.
    pub child: Option<Arc<Binding>>,
    pub is_child: bool,
    pub allow_undeclared_properties: bool,
    /// Bus this binding's nodes must sit on (`on-bus:`).
    pub on_bus: Option<String>,
    /// Buses this binding's nodes host for their children (`bus:`).
    pub buses: BTreeSet<String>,
}

impl Binding {
    pub fn property(&self, name: &str) -> Option<&PropertyBinding> {
        self.properties.get(name)
    }
}

/// Property allow/block lists attached to one `include:` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Filter {
    pub allowed: Option<Vec<String>>,
    pub blocked: Option<Vec<String>>,
    pub child: Option<Box<Filter>>,
}

impl Filter {
    /// Filter that permits every property.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn permits(&self, property: &str) -> bool {
        if let Some(allowed) = &self.allowed {
            if !allowed.iter().any(|p| p == property) {
                return false;
            }
        }
        if let Some(blocked) = &self.blocked {
            if blocked.iter().any(|p| p == property) {
                return false;
            }
        }
        true
    }

    /// Filter to apply inside `child-binding:` maps of the included source.
    pub fn child_filter(&self) -> Filter {
        self.child.as_deref().cloned().unwrap_or_default()
    }
}

/// One `include:` entry, either a bare name or a filtered map form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub name: String,
    pub filter: Filter,
}

/// Raw wire shape of one `include:` element; serde auto-detects which form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IncludeRaw {
    Name(String),
    Filtered(FilteredIncludeRaw),
}

#[derive(Debug, Deserialize)]
struct FilteredIncludeRaw {
    name: String,
    #[serde(flatten)]
    filter: FilterRaw,
}

#[derive(Debug, Deserialize)]
struct FilterRaw {
    #[serde(default, rename = "property-allowlist")]
    allowed: Option<Vec<String>>,
    #[serde(default, rename = "property-blocklist")]
    blocked: Option<Vec<String>>,
    #[serde(default, rename = "child-binding")]
    child: Option<Box<FilterRaw>>,
}

impl From<FilterRaw> for Filter {
    fn from(raw: FilterRaw) -> Self {
        Self {
            allowed: raw.allowed,
            blocked: raw.blocked,
            child: raw.child.map(|c| Box::new(Filter::from(*c))),
        }
    }
}

impl Include {
    /// Parse one element of an `include:` list. Bare strings include the
    /// whole named binding; maps carry `name` plus optional filters.
    pub fn from_yaml(value: &Value) -> Option<Self> {
        match serde_yaml::from_value(value.clone()).ok()? {
            IncludeRaw::Name(name) => Some(Self {
                name,
                filter: Filter::empty(),
            }),
            IncludeRaw::Filtered(raw) => Some(Self {
                name: raw.name,
                filter: raw.filter.into(),
            }),
        }
    }

    /// Parse the whole `include:` key: absent, a single string, or a list
    /// of strings/maps. Unparseable elements are dropped.
    pub fn list_from_yaml(value: Option<&Value>) -> Vec<Self> {
        match value {
            None => Vec::new(),
            Some(Value::Sequence(seq)) => seq.iter().filter_map(Self::from_yaml).collect(),
            Some(v) => Self::from_yaml(v).into_iter().collect(),
        }
    }
}
