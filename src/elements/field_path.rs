//! Dotted paths into nested JSON records.

use serde_json::{Map, Value};
use std::fmt;

/// Path to a (possibly nested) record field, e.g. `kubernetes.labels`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a dotted path. Empty segments are dropped.
    pub fn parse(dotted: &str) -> Self {
        Self::new(dotted.split('.').filter(|s| !s.is_empty()))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up the value at this path
    pub fn get<'a>(&self, record: &'a Value) -> Option<&'a Value> {
        let mut current = record;
        for segment in &self.0 {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    pub fn get_mut<'a>(&self, record: &'a mut Value) -> Option<&'a mut Value> {
        let mut current = record;
        for segment in &self.0 {
            current = current.as_object_mut()?.get_mut(segment)?;
        }
        Some(current)
    }

    /// Write a value, creating intermediate objects as needed.
    ///
    /// Returns `false` when an intermediate value exists but is not an object.
    pub fn set(&self, record: &mut Value, value: Value) -> bool {
        let Some((last, parents)) = self.0.split_last() else {
            return false;
        };

        let mut current = record;
        for segment in parents {
            let Some(map) = current.as_object_mut() else {
                return false;
            };
            current = map
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        match current.as_object_mut() {
            Some(map) => {
                map.insert(last.clone(), value);
                true
            }
            None => false,
        }
    }

    /// Remove the value at this path, returning it if present
    pub fn remove(&self, record: &mut Value) -> Option<Value> {
        let (last, parents) = self.0.split_last()?;
        let mut current = record;
        for segment in parents {
            current = current.as_object_mut()?.get_mut(segment)?;
        }
        current.as_object_mut()?.remove(last)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(dotted: &str) -> Self {
        FieldPath::parse(dotted)
    }
}
