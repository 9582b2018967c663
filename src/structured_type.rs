//! Structured type resolution for Elasticsearch outputs.
//!
//! An output may name its structured type by record key, by fixed name, or
//! by container annotations. Only one of these is ever advertised to the
//! index-naming rules, chosen with strict precedence:
//! key > name > annotation prefix.

use crate::output::ElasticsearchSpec;
use std::fmt;

/// Annotation prefix used when structured container logs are enabled
pub const ANNOTATION_PREFIX: &str = "containerType.logging.openshift.io";

/// How records sent to an output are tagged with a structured type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum StructuredTypeStrategy {
    /// Structured payloads are not routed; the `structured` field is dropped
    #[default]
    None,
    /// Read the type from a record path
    ExplicitKey(String),
    /// Use a fixed type name
    ExplicitName(String),
    /// Read the type from a pod annotation `<prefix>/<container name>`
    AnnotationPrefix(String),
}

/// Flattened view of a strategy; at most one member is non-empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredTypeTriple {
    pub key: String,
    pub name: String,
    pub annotation_prefix: String,
}

impl StructuredTypeStrategy {
    /// Resolve the strategy for an output. A missing spec is treated as empty.
    pub fn resolve(spec: Option<&ElasticsearchSpec>) -> Self {
        let Some(spec) = spec else {
            return StructuredTypeStrategy::None;
        };

        let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(String::from);

        match (
            non_empty(&spec.structured_type_key),
            non_empty(&spec.structured_type_name),
            spec.enable_structured_container_logs,
        ) {
            (Some(key), _, _) => StructuredTypeStrategy::ExplicitKey(key),
            (None, Some(name), _) => StructuredTypeStrategy::ExplicitName(name),
            (None, None, true) => StructuredTypeStrategy::AnnotationPrefix(ANNOTATION_PREFIX.to_string()),
            (None, None, false) => StructuredTypeStrategy::None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, StructuredTypeStrategy::None)
    }

    pub fn key(&self) -> &str {
        match self {
            StructuredTypeStrategy::ExplicitKey(k) => k,
            _ => "",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StructuredTypeStrategy::ExplicitName(n) => n,
            _ => "",
        }
    }

    pub fn annotation_prefix(&self) -> &str {
        match self {
            StructuredTypeStrategy::AnnotationPrefix(p) => p,
            _ => "",
        }
    }

    pub fn triple(&self) -> StructuredTypeTriple {
        StructuredTypeTriple {
            key: self.key().to_string(),
            name: self.name().to_string(),
            annotation_prefix: self.annotation_prefix().to_string(),
        }
    }
}

impl fmt::Display for StructuredTypeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuredTypeStrategy::None => write!(f, "none"),
            StructuredTypeStrategy::ExplicitKey(k) => write!(f, "key={}", k),
            StructuredTypeStrategy::ExplicitName(n) => write!(f, "name={}", n),
            StructuredTypeStrategy::AnnotationPrefix(p) => write!(f, "annotation_prefix={}", p),
        }
    }
}
