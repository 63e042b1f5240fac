//! Raw binding sources
//!
//! A `Source` is one parsed binding YAML document before include
//! resolution. Binding merge semantics are dynamic (first write wins per
//! field across an include graph), so sources keep the raw
//! `serde_yaml::Mapping` and expose typed accessors instead of a derived
//! struct.

use std::path::PathBuf;

use serde_yaml::{Mapping, Value};

/// One binding YAML document, pre-resolution.
#[derive(Debug, Clone)]
pub struct Source {
    /// Origin file. `None` for synthetic sources (bundled defaults,
    /// nested `child-binding` maps).
    pub path: Option<PathBuf>,
    /// Raw top-level mapping.
    pub data: Mapping,
}

impl Source {
    pub fn new(path: Option<PathBuf>, data: Mapping) -> Self {
        Self { path, data }
    }

    /// Synthetic source with no backing file.
    pub fn synthetic(data: Mapping) -> Self {
        Self { path: None, data }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(Value::String(key.to_string()))
    }

    pub fn str_key(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn bool_key(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn map_key(&self, key: &str) -> Option<&Mapping> {
        self.get(key).and_then(Value::as_mapping)
    }

    pub fn seq_key(&self, key: &str) -> Option<&[Value]> {
        self.get(key).and_then(Value::as_sequence).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(yaml: &str) -> Source {
        Source::synthetic(serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn typed_accessors() {
        let s = source(
            r#"
compatible: vendor,device
undeclared-properties: true
properties:
  reg:
    type: int
include:
  - base.yaml
"#,
        );
        assert_eq!(s.str_key("compatible"), Some("vendor,device"));
        assert_eq!(s.bool_key("undeclared-properties"), Some(true));
        assert!(s.map_key("properties").is_some());
        assert_eq!(s.seq_key("include").map(<[Value]>::len), Some(1));
        assert!(s.get("on-bus").is_none());
    }

    #[test]
    fn wrong_shape_yields_none() {
        let s = source("compatible: [a, b]");
        assert_eq!(s.str_key("compatible"), None);
        assert!(s.seq_key("compatible").is_some());
    }
}
