//! Type definitions for output destination configuration.
//!
//! These types mirror the `outputs` entries of a log-forwarder resource and
//! are what the filter chain builder reads. They are never mutated by the
//! generator.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Option key carrying a character-encoding override for record modifiers.
pub const CHAR_ENCODING: &str = "charEncoding";

/// Output type handled by this generator
pub const OUTPUT_TYPE_ELASTICSEARCH: &str = "elasticsearch";

/// Elasticsearch-specific output settings that affect normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElasticsearchSpec {
    /// Record path whose value names the structured type (e.g. `kubernetes.labels.logFormat`)
    #[serde(default)]
    pub structured_type_key: Option<String>,
    /// Fixed structured type name used when no key is configured
    #[serde(default)]
    pub structured_type_name: Option<String>,
    /// Use per-container annotations to pick the structured type
    #[serde(default)]
    pub enable_structured_container_logs: bool,
}

/// One output destination from a forwarder configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSpec {
    pub name: String,
    #[serde(rename = "type", default = "default_output_type")]
    pub output_type: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub elasticsearch: Option<ElasticsearchSpec>,
}

fn default_output_type() -> String {
    OUTPUT_TYPE_ELASTICSEARCH.to_string()
}

impl OutputSpec {
    /// Create an elasticsearch output with the given settings
    pub fn elasticsearch(name: impl Into<String>, spec: Option<ElasticsearchSpec>) -> Self {
        Self {
            name: name.into(),
            output_type: OUTPUT_TYPE_ELASTICSEARCH.to_string(),
            url: None,
            elasticsearch: spec,
        }
    }

    pub fn is_elasticsearch(&self) -> bool {
        self.output_type.eq_ignore_ascii_case(OUTPUT_TYPE_ELASTICSEARCH)
    }
}

/// Forwarder-style document holding several outputs (K8s-style)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwarderV1 {
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: ForwarderMetadata,
    pub spec: ForwarderSpec,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ForwarderMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ForwarderSpec {
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
}

/// Generator options passed alongside an output
///
/// Values are kept as raw JSON so unknown options survive loading untouched;
/// only [`CHAR_ENCODING`] is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct OptionsBag {
    options: IndexMap<String, JsonValue>,
}

impl OptionsBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        self.options.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.options.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    /// Keys this generator does not interpret
    pub fn unrecognized_keys(&self) -> Vec<&str> {
        self.keys().filter(|k| *k != CHAR_ENCODING).collect()
    }

    /// Character encoding override, coerced to text when not a string.
    ///
    /// A JSON `null` or a blank value counts as unset.
    pub fn char_encoding(&self) -> Option<String> {
        let encoding = match self.options.get(CHAR_ENCODING)? {
            JsonValue::Null => return None,
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        };
        if encoding.trim().is_empty() {
            None
        } else {
            Some(encoding)
        }
    }
}

impl<K: Into<String>, V: Into<JsonValue>> FromIterator<(K, V)> for OptionsBag {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = OptionsBag::new();
        for (k, v) in iter {
            bag.insert(k, v);
        }
        bag
    }
}
