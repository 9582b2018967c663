//! Rendering filter chains into forwarder configuration text.
//!
//! A renderer receives the ordered chain plus a small parameter set and must
//! produce the same text for the same input.

use crate::elements::FilterChain;
use crate::structured_type::StructuredTypeTriple;

pub mod fluentd;

pub use fluentd::FluentdRenderer;

/// Values resolved for the output alongside its chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderParams {
    pub structured_type: StructuredTypeTriple,
    /// Encoding applied to the structured-field cleanup, if any
    pub char_encoding: Option<String>,
}

/// Turns a filter chain into configuration text
pub trait Renderer {
    fn render(&self, chain: &FilterChain, params: &RenderParams) -> String;
}
