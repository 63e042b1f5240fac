//! Binding source loading
//!
//! Reads directories of binding YAML files into raw `Source`s keyed by
//! file stem. External (project) directories are walked recursively;
//! the bundled directory shipped with the crate is flat. Per-file parse
//! failures never abort the scan: external files are skipped quietly,
//! bundled ones are a packaging defect and logged as errors.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_yaml::Value;
use tracing::{debug, error};
use walkdir::WalkDir;

use crate::error::BindingError;
use crate::source::Source;

/// Name → raw source map. Later files win on duplicate stems.
pub type SourceMap = HashMap<String, Arc<Source>>;

fn is_yaml(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "yaml")
}

/// `Ok(None)` means the file parsed but its top level is not a mapping;
/// such files are not binding sources and are skipped.
fn read_source(path: &Path) -> Result<Option<Source>, BindingError> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_yaml::from_str(&text)?;
    match value {
        Value::Mapping(data) => Ok(Some(Source::new(Some(path.to_path_buf()), data))),
        _ => Ok(None),
    }
}

fn stem(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// Recursively load every `.yaml` file under `dir`. Unreadable or
/// unparseable files are skipped.
pub fn load_external_bindings(dir: &Path) -> SourceMap {
    let mut sources = SourceMap::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(Result::ok) {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_yaml(path) {
            continue;
        }
        match read_source(path) {
            Ok(Some(source)) => {
                if let Some(name) = stem(path) {
                    sources.insert(name, Arc::new(source));
                }
            }
            Ok(None) => debug!(path = %path.display(), "skipping non-mapping yaml file"),
            Err(err) => debug!(path = %path.display(), %err, "skipping unparseable binding"),
        }
    }
    sources
}

/// Load the flat directory of bundled bindings shipped with the crate.
/// Failures here mean a broken package, not bad user input.
pub fn load_bundled_bindings(dir: &Path) -> Result<SourceMap, BindingError> {
    if !dir.is_dir() {
        return Err(BindingError::MissingDirectory(dir.to_path_buf()));
    }
    let mut sources = SourceMap::new();
    for entry in fs::read_dir(dir)?.filter_map(Result::ok) {
        let path = entry.path();
        if !path.is_file() || !is_yaml(&path) {
            continue;
        }
        match read_source(&path) {
            Ok(Some(source)) => {
                if let Some(name) = stem(&path) {
                    sources.insert(name, Arc::new(source));
                }
            }
            Ok(None) => error!(path = %path.display(), "bundled binding is not a yaml mapping"),
            Err(err) => error!(path = %path.display(), %err, "broken bundled binding"),
        }
    }
    Ok(sources)
}
