//! YAML loading for output specs and generator options.
//!
//! Output files may hold:
//! - a forwarder document (K8s-style with apiVersion, kind, metadata, spec.outputs)
//! - a list of outputs
//! - a single output
//!
//! Forwarder documents are tried first, then lists, then single outputs.

use crate::output::{ForwarderV1, OptionsBag, OutputSpec};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for loading configuration files
#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: std::io::Error },
    Yaml { path: PathBuf, message: String },
    Invalid(String),
    NotFound(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => write!(f, "Failed to read {}: {}", path.display(), source),
            LoadError::Yaml { path, message } => write!(f, "Failed to parse {}: {}", path.display(), message),
            LoadError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
            LoadError::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Parse outputs from YAML text
pub fn parse_outputs(yaml: &str) -> Result<Vec<OutputSpec>, String> {
    if let Ok(forwarder) = serde_yaml::from_str::<ForwarderV1>(yaml) {
        return Ok(forwarder.spec.outputs);
    }

    if let Ok(outputs) = serde_yaml::from_str::<Vec<OutputSpec>>(yaml) {
        return Ok(outputs);
    }

    serde_yaml::from_str::<OutputSpec>(yaml)
        .map(|output| vec![output])
        .map_err(|e| format!("Failed to parse YAML (tried forwarder, list and single output formats): {}", e))
}

/// Load and validate all outputs in a file
pub fn load_outputs<P: AsRef<Path>>(path: P) -> Result<Vec<OutputSpec>, LoadError> {
    let path = path.as_ref();
    let contents = read(path)?;

    let outputs = parse_outputs(&contents).map_err(|message| LoadError::Yaml {
        path: path.to_path_buf(),
        message,
    })?;

    validate_outputs(&outputs).map_err(LoadError::Invalid)?;
    tracing::debug!(path = %path.display(), count = outputs.len(), "loaded outputs");

    Ok(outputs)
}

/// Load one output by name, or the only output when no name is given
pub fn load_output<P: AsRef<Path>>(path: P, name: Option<&str>) -> Result<OutputSpec, LoadError> {
    let outputs = load_outputs(&path)?;
    select_output(outputs, name)
}

/// Pick an output from a loaded list
pub fn select_output(outputs: Vec<OutputSpec>, name: Option<&str>) -> Result<OutputSpec, LoadError> {
    match name {
        Some(name) => outputs
            .into_iter()
            .find(|o| o.name == name)
            .ok_or_else(|| LoadError::NotFound(format!("output '{}'", name))),
        None => {
            if outputs.len() != 1 {
                return Err(LoadError::Invalid(format!(
                    "{} outputs defined, select one by name",
                    outputs.len()
                )));
            }
            outputs
                .into_iter()
                .next()
                .ok_or_else(|| LoadError::NotFound("output".to_string()))
        }
    }
}

/// Load generator options from a YAML mapping
pub fn load_options<P: AsRef<Path>>(path: P) -> Result<OptionsBag, LoadError> {
    let path = path.as_ref();
    let contents = read(path)?;
    let options = parse_options(&contents).map_err(|message| LoadError::Yaml {
        path: path.to_path_buf(),
        message,
    })?;

    let unrecognized = options.unrecognized_keys();
    if !unrecognized.is_empty() {
        tracing::warn!(path = %path.display(), keys = ?unrecognized, "ignoring unrecognized options");
    }

    Ok(options)
}

/// Parse generator options from YAML text; an empty document is an empty bag
pub fn parse_options(yaml: &str) -> Result<OptionsBag, String> {
    if yaml.trim().is_empty() {
        return Ok(OptionsBag::new());
    }
    serde_yaml::from_str(yaml).map_err(|e| format!("Failed to parse options: {}", e))
}

/// Validate output definitions
///
/// Checks for:
/// - Non-empty output names
/// - Unique output names
pub fn validate_outputs(outputs: &[OutputSpec]) -> Result<(), String> {
    let mut seen = std::collections::HashSet::new();
    for output in outputs {
        validate_output(output)?;
        if !seen.insert(output.name.as_str()) {
            return Err(format!("Duplicate output name '{}'", output.name));
        }
    }
    Ok(())
}

pub fn validate_output(output: &OutputSpec) -> Result<(), String> {
    if output.name.trim().is_empty() {
        return Err("Output name cannot be empty".to_string());
    }
    if output.output_type.trim().is_empty() {
        return Err(format!("Output '{}' has an empty type", output.name));
    }
    if output.elasticsearch.is_some() && !output.is_elasticsearch() {
        return Err(format!(
            "Output '{}' of type '{}' cannot carry elasticsearch settings",
            output.name, output.output_type
        ));
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}
