//! Label pruning directive.
//!
//! Drops every pod label except a fixed set of well-known
//! `app.kubernetes.io/*` labels. Runs after dedotting, so the allow-list uses
//! the dedotted names. The list is a global policy and is not configurable
//! per output.

use crate::elements::field_path::FieldPath;
use serde_json::Value;

/// Labels kept by pruning (dedotted form)
pub const PRUNE_LABELS_EXCLUSIONS: &[&str] = &[
    "app_kubernetes_io_name",
    "app_kubernetes_io_instance",
    "app_kubernetes_io_version",
    "app_kubernetes_io_component",
    "app_kubernetes_io_part-of",
    "app_kubernetes_io_managed-by",
    "app_kubernetes_io_created-by",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneLabelsDirective {
    labels: FieldPath,
    exclusions: Vec<String>,
}

impl Default for PruneLabelsDirective {
    fn default() -> Self {
        Self {
            labels: FieldPath::parse("kubernetes.labels"),
            exclusions: PRUNE_LABELS_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PruneLabelsDirective {
    pub fn exclusions(&self) -> &[String] {
        &self.exclusions
    }

    pub fn apply(&self, record: &mut Value) {
        if let Some(Value::Object(map)) = self.labels.get_mut(record) {
            map.retain(|k, _| self.exclusions.iter().any(|e| e == k));
        }
    }
}
