//! Error types for binding loading and resolution

use std::path::PathBuf;
use thiserror::Error;

/// All error variants are part of the public API.
/// Per-file parse failures are not errors: the loader logs and skips them.
#[derive(Error, Debug)]
pub enum BindingError {
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Binding directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("Configured default binding source '{0}' was not found among the loaded sources")]
    UnknownDefaultSource(String),
}
