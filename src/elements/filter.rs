//! Tag-scoped filter elements and ordered filter chains.

use crate::elements::index_naming::IndexNamingDirective;
use crate::elements::prune_labels::PruneLabelsDirective;
use crate::elements::record_patch::RecordPatch;
use crate::elements::tag_pattern::TagPattern;
use serde_json::Value;

/// The transformation a filter element performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Patch(RecordPatch),
    IndexNaming(IndexNamingDirective),
    PruneLabels(PruneLabelsDirective),
}

/// One step of a filter chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterElement {
    pub tag: TagPattern,
    pub description: String,
    pub directive: Directive,
}

impl FilterElement {
    pub fn new(tag: TagPattern, description: impl Into<String>, directive: Directive) -> Self {
        Self {
            tag,
            description: description.into(),
            directive,
        }
    }

    /// Run the directive if the tag matches; returns whether it ran
    pub fn apply(&self, tag: &str, record: &mut Value) -> bool {
        if !self.tag.matches(tag) {
            return false;
        }
        match &self.directive {
            Directive::Patch(patch) => patch.apply(record),
            Directive::IndexNaming(naming) => naming.apply(tag, record),
            Directive::PruneLabels(prune) => prune.apply(record),
        }
        true
    }
}

/// Ordered filter elements for one output; position is execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChain {
    elements: Vec<FilterElement>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: FilterElement) {
        self.elements.push(element);
    }

    pub fn elements(&self) -> &[FilterElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FilterElement> {
        self.elements.iter()
    }

    /// Position of the first element with this description
    pub fn position(&self, description: &str) -> Option<usize> {
        self.elements.iter().position(|e| e.description == description)
    }

    /// Run every element against a record, in order
    pub fn apply(&self, tag: &str, record: &mut Value) {
        for element in &self.elements {
            element.apply(tag, record);
        }
    }
}

impl<'a> IntoIterator for &'a FilterChain {
    type Item = &'a FilterElement;
    type IntoIter = std::slice::Iter<'a, FilterElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
