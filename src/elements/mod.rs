//! Filter chain building blocks.
//!
//! These types describe the transformations of a normalization stage
//! independently of any config dialect. Renderers turn them into text; the
//! `apply` methods run them directly against JSON records.

pub mod field_path;
pub mod filter;
pub mod index_naming;
pub mod prune_labels;
pub mod record_patch;
pub mod tag_pattern;

pub use field_path::FieldPath;
pub use filter::{Directive, FilterChain, FilterElement};
pub use index_naming::{IndexNamingDirective, IndexRule, RoutingMode, INDEX_NAME_FIELD, STRUCTURED_FIELD};
pub use prune_labels::{PruneLabelsDirective, PRUNE_LABELS_EXCLUSIONS};
pub use record_patch::{Expression, FieldWrite, RecordPatch};
pub use tag_pattern::{TagPattern, MATCH_ALL};
