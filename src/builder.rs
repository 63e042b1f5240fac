//! First-write-wins binding accumulators
//!
//! Include resolution applies an ordered list of `(Source, Filter)` pairs
//! to one accumulator. Every field keeps the first value written to it;
//! later sources in the fold never overwrite. The same rule applies per
//! sub-field inside each property, merged by property name.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_yaml::{Mapping, Value};

use crate::model::{Binding, Filter, PropertyBinding, PropertyType, PropertyValue};
use crate::source::Source;

/// Accumulator for one property's fields.
#[derive(Debug, Default)]
struct PropertyAccumulator {
    description: Option<String>,
    r#type: Option<PropertyType>,
    default: Option<PropertyValue>,
    const_value: Option<PropertyValue>,
    enum_values: Option<Vec<PropertyValue>>,
    required: Option<bool>,
}

impl PropertyAccumulator {
    fn apply(&mut self, map: &Mapping) {
        let get = |key: &str| map.get(Value::String(key.to_string()));

        if self.description.is_none() {
            self.description = get("description").and_then(Value::as_str).map(str::to_string);
        }
        if self.r#type.is_none() {
            self.r#type = get("type")
                .and_then(Value::as_str)
                .and_then(PropertyType::from_yaml_name);
        }
        if self.required.is_none() {
            self.required = get("required").and_then(Value::as_bool);
        }
        if self.default.is_none() {
            self.default = get("default").and_then(PropertyValue::from_yaml);
        }
        if self.const_value.is_none() {
            self.const_value = get("const").and_then(PropertyValue::from_yaml);
        }
        if self.enum_values.is_none() {
            self.enum_values = get("enum")
                .and_then(Value::as_sequence)
                .and_then(|seq| parse_enum(seq));
        }
    }

    fn build(self, name: String) -> PropertyBinding {
        PropertyBinding {
            name,
            description: self.description,
            r#type: self.r#type.unwrap_or(PropertyType::Compound),
            default: self.default,
            const_value: self.const_value,
            enum_values: self.enum_values,
            required: self.required.unwrap_or(false),
        }
    }
}

/// An `enum:` list is accepted only if every element converts to a string
/// or integer literal; a single bad element discards the whole list.
fn parse_enum(seq: &[Value]) -> Option<Vec<PropertyValue>> {
    seq.iter()
        .map(|v| match PropertyValue::from_yaml(v) {
            Some(pv @ (PropertyValue::Str(_) | PropertyValue::Int(_))) => Some(pv),
            _ => None,
        })
        .collect()
}

/// Accumulator for one binding, including its recursive child accumulator.
#[derive(Debug, Default)]
pub struct BindingAccumulator {
    compatible: Option<String>,
    path: Option<String>,
    description: Option<String>,
    allow_undeclared: Option<bool>,
    on_bus: Option<String>,
    buses: Option<Vec<String>>,
    properties: BTreeMap<String, PropertyAccumulator>,
    child: Option<Box<BindingAccumulator>>,
}

impl BindingAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the binding's own `compatible`. First write wins; included
    /// sources never contribute this field.
    pub fn set_compatible(&mut self, compatible: &str) {
        if self.compatible.is_none() {
            self.compatible = Some(compatible.to_string());
        }
    }

    /// Record the origin file of the binding's own source.
    pub fn set_path(&mut self, path: String) {
        if self.path.is_none() {
            self.path = Some(path);
        }
    }

    /// Apply one source's fields under a filter. Called once per entry of
    /// the flattened include list, in application order.
    pub fn apply(&mut self, source: &Source, filter: &Filter) {
        if self.description.is_none() {
            self.description = source.str_key("description").map(str::to_string);
        }
        if self.allow_undeclared.is_none() {
            self.allow_undeclared = source.bool_key("undeclared-properties");
        }
        if self.on_bus.is_none() {
            self.on_bus = source.str_key("on-bus").map(str::to_string);
        }
        if self.buses.is_none() {
            self.buses = parse_buses(source.get("bus"));
        }

        if let Some(properties) = source.map_key("properties") {
            for (key, value) in properties {
                let (Some(name), Some(map)) = (key.as_str(), value.as_mapping()) else {
                    continue;
                };
                if !filter.permits(name) {
                    continue;
                }
                self.properties.entry(name.to_string()).or_default().apply(map);
            }
        }

        if let Some(child_map) = source.map_key("child-binding") {
            let child_source = Source::synthetic(child_map.clone());
            self.child
                .get_or_insert_with(Default::default)
                .apply(&child_source, &filter.child_filter());
        }
    }

    /// Finalize into an immutable `Binding`. A child without its own
    /// `compatible` inherits the parent's, exactly once, here.
    pub fn build(self) -> Binding {
        self.build_inner(false, None)
    }

    fn build_inner(self, is_child: bool, inherited_compatible: Option<&str>) -> Binding {
        let compatible = self
            .compatible
            .or_else(|| inherited_compatible.map(str::to_string));

        let child = self.child.map(|acc| {
            Arc::new(acc.build_inner(true, compatible.as_deref()))
        });

        Binding {
            compatible,
            path: self.path,
            description: self.description,
            properties: self
                .properties
                .into_iter()
                .map(|(name, acc)| {
                    let built = acc.build(name.clone());
                    (name, built)
                })
                .collect(),
            child,
            is_child,
            allow_undeclared_properties: self.allow_undeclared.unwrap_or(false),
            on_bus: self.on_bus,
            buses: self.buses.unwrap_or_default().into_iter().collect(),
        }
    }
}

/// `bus:` accepts a single name or a list of names.
fn parse_buses(value: Option<&Value>) -> Option<Vec<String>> {
    match value {
        Some(Value::String(bus)) => Some(vec![bus.clone()]),
        Some(Value::Sequence(seq)) => Some(
            seq.iter().filter_map(Value::as_str).map(str::to_string).collect(),
        ),
        _ => None,
    }
}
