//! Index naming directive.
//!
//! Assigns every record an index identifier (e.g. `app-write`) from an ordered
//! list of tag-scoped rules. The first rule whose tag pattern matches wins, and
//! the list must end with a catch-all rule so every record gets a name.

use crate::elements::field_path::FieldPath;
use crate::elements::tag_pattern::TagPattern;
use crate::structured_type::StructuredTypeStrategy;
use serde_json::Value;

/// Record field that receives the index identifier
pub const INDEX_NAME_FIELD: &str = "viaq_index_name";

/// Record field holding the parsed structured payload
pub const STRUCTURED_FIELD: &str = "structured";

/// How a rule derives its index name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingMode {
    /// Always the static name
    Static,
    /// `<base>-<type>-write` when a structured type is found, else the static name
    Structured,
}

impl RoutingMode {
    pub fn as_str(&self) -> &str {
        match self {
            RoutingMode::Static => "static",
            RoutingMode::Structured => "structured",
        }
    }
}

/// One tag-scoped index rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRule {
    pub tag: TagPattern,
    pub mode: RoutingMode,
    pub static_index_name: String,
    pub structured_type: StructuredTypeStrategy,
}

impl IndexRule {
    pub fn fixed(tag: TagPattern, static_index_name: impl Into<String>) -> Self {
        Self {
            tag,
            mode: RoutingMode::Static,
            static_index_name: static_index_name.into(),
            structured_type: StructuredTypeStrategy::None,
        }
    }

    pub fn with_structured_type(mut self, strategy: StructuredTypeStrategy) -> Self {
        self.structured_type = strategy;
        self
    }

    pub fn with_mode(mut self, mode: RoutingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Index name for a record matched by this rule
    pub fn index_name_for(&self, record: &Value) -> String {
        if self.mode == RoutingMode::Static {
            return self.static_index_name.clone();
        }

        let has_payload = FieldPath::parse(STRUCTURED_FIELD)
            .get(record)
            .map_or(false, Value::is_object);
        if !has_payload {
            return self.static_index_name.clone();
        }

        match self.structured_type_of(record) {
            Some(type_name) => structured_index_name(&self.static_index_name, &type_name),
            None => self.static_index_name.clone(),
        }
    }

    fn structured_type_of(&self, record: &Value) -> Option<String> {
        let found = match &self.structured_type {
            StructuredTypeStrategy::None => None,
            StructuredTypeStrategy::ExplicitKey(key) => FieldPath::parse(key)
                .get(record)
                .and_then(Value::as_str)
                .map(String::from),
            StructuredTypeStrategy::ExplicitName(name) => Some(name.clone()),
            StructuredTypeStrategy::AnnotationPrefix(prefix) => {
                let container = FieldPath::parse("kubernetes.container_name")
                    .get(record)
                    .and_then(Value::as_str)?;
                // annotation keys contain dots, so index the map directly
                record
                    .get("kubernetes")
                    .and_then(|k| k.get("annotations"))
                    .and_then(|a| a.get(format!("{}/{}", prefix, container)))
                    .and_then(Value::as_str)
                    .map(String::from)
            }
        };
        found.filter(|t| !t.is_empty())
    }
}

/// Insert a structured type into a base index name: `app-write` + `nginx` → `app-nginx-write`
pub fn structured_index_name(base: &str, type_name: &str) -> String {
    match base.strip_suffix("-write") {
        Some(prefix) => format!("{}-{}-write", prefix, type_name),
        None => format!("{}-{}", base, type_name),
    }
}

/// Ordered, exhaustive list of index rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNamingDirective {
    rules: Vec<IndexRule>,
    index_field: FieldPath,
}

impl IndexNamingDirective {
    /// Build a directive; the last rule must match every tag
    pub fn new(rules: Vec<IndexRule>) -> Result<Self, String> {
        match rules.last() {
            None => Err("Index naming directive needs at least one rule".to_string()),
            Some(last) if !last.tag.is_catch_all() => Err(format!(
                "Last index rule must be a catch-all '**', found '{}'",
                last.tag
            )),
            Some(_) => Ok(Self {
                rules,
                index_field: FieldPath::parse(INDEX_NAME_FIELD),
            }),
        }
    }

    pub fn rules(&self) -> &[IndexRule] {
        &self.rules
    }

    pub fn index_field(&self) -> &FieldPath {
        &self.index_field
    }

    /// First rule matching the tag
    pub fn rule_for(&self, tag: &str) -> &IndexRule {
        self.rules
            .iter()
            .find(|rule| rule.tag.matches(tag))
            .unwrap_or_else(|| &self.rules[self.rules.len() - 1])
    }

    /// Write the index identifier into the record
    pub fn apply(&self, tag: &str, record: &mut Value) {
        let name = self.rule_for(tag).index_name_for(record);
        self.index_field.set(record, Value::String(name));
    }
}
