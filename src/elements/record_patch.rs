//! Atomic multi-field record patches.
//!
//! A [`RecordPatch`] is a list of field writes plus a set of fields to remove.
//! All write expressions are evaluated against the record as it was before
//! the patch, then written, then the removals are applied.

use crate::elements::field_path::FieldPath;
use serde_json::{Map, Value};

/// Replace characters that are unsafe in backend field names
pub fn dedot(name: &str) -> String {
    name.replace(['.', '/'], "_")
}

/// How a written value is computed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Copy of the object at `source` with every key dedotted
    DedotKeys { source: FieldPath },
    /// Copy of the string list at `source` with every element dedotted
    DedotValues { source: FieldPath },
    /// JSON text of `source`, only when `source` is set (not null or false)
    /// and `index_field` equals `index_name`
    SerializeWhenIndex {
        source: FieldPath,
        index_field: FieldPath,
        index_name: String,
    },
}

impl Expression {
    /// Evaluate against a record; `None` means the write is skipped
    pub fn evaluate(&self, record: &Value) -> Option<Value> {
        match self {
            Expression::DedotKeys { source } => {
                let map = source.get(record)?.as_object()?;
                let dedotted: Map<String, Value> = map
                    .iter()
                    .map(|(k, v)| (dedot(k), v.clone()))
                    .collect();
                Some(Value::Object(dedotted))
            }
            Expression::DedotValues { source } => {
                let items = source.get(record)?.as_array()?;
                Some(Value::Array(
                    items
                        .iter()
                        .map(|item| match item {
                            Value::String(s) => Value::String(dedot(s)),
                            other => other.clone(),
                        })
                        .collect(),
                ))
            }
            Expression::SerializeWhenIndex { source, index_field, index_name } => {
                let payload = source.get(record)?;
                if matches!(payload, Value::Null | Value::Bool(false)) {
                    return None;
                }
                if index_field.get(record)?.as_str()? != index_name {
                    return None;
                }
                serde_json::to_string(payload).ok().map(Value::String)
            }
        }
    }
}

/// One field write in a patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWrite {
    pub target: FieldPath,
    pub expression: Expression,
    /// Human-readable note carried into rendered output
    pub comment: Option<String>,
}

/// An atomic record modification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    writes: Vec<FieldWrite>,
    removals: Vec<FieldPath>,
    char_encoding: Option<String>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a write; writes keep insertion order
    pub fn write(mut self, target: impl Into<FieldPath>, expression: Expression) -> Self {
        self.writes.push(FieldWrite { target: target.into(), expression, comment: None });
        self
    }

    /// Append a write with a comment for the rendered config
    pub fn write_commented(
        mut self,
        target: impl Into<FieldPath>,
        expression: Expression,
        comment: impl Into<String>,
    ) -> Self {
        self.writes.push(FieldWrite {
            target: target.into(),
            expression,
            comment: Some(comment.into()),
        });
        self
    }

    /// Remove a field after the writes; duplicates are ignored
    pub fn remove(mut self, field: impl Into<FieldPath>) -> Self {
        let field = field.into();
        if !self.removals.contains(&field) {
            self.removals.push(field);
        }
        self
    }

    pub fn with_char_encoding(mut self, encoding: Option<String>) -> Self {
        self.char_encoding = encoding;
        self
    }

    pub fn writes(&self) -> &[FieldWrite] {
        &self.writes
    }

    pub fn removals(&self) -> &[FieldPath] {
        &self.removals
    }

    pub fn char_encoding(&self) -> Option<&str> {
        self.char_encoding.as_deref()
    }

    /// Apply the patch in place
    pub fn apply(&self, record: &mut Value) {
        let computed: Vec<(&FieldPath, Value)> = self
            .writes
            .iter()
            .filter_map(|w| w.expression.evaluate(record).map(|v| (&w.target, v)))
            .collect();

        for (target, value) in computed {
            target.set(record, value);
        }
        for field in &self.removals {
            field.remove(record);
        }
    }
}
