//! # viaqgen: ViaQ normalization filters for Elasticsearch outputs
//!
//! viaqgen builds the normalization stage a log forwarder runs before sending
//! records to an Elasticsearch output, and renders it as fluentd configuration.
//!
//! ## Features
//!
//! - **Dedotting**: label and namespace-label keys lose `.` and `/`
//! - **Index naming**: records are routed to `infra-write`, `audit-write` or
//!   `app-write` by tag, with structured routing for application logs
//! - **Structured types**: one strategy per output (key, name or container
//!   annotations), resolved with fixed precedence
//! - **Dry runs**: filter chains can be applied to JSON records directly
//!
//! ## Example
//!
//! ```yaml
//! name: es-app
//! type: elasticsearch
//! elasticsearch:
//!   structuredTypeKey: kubernetes.labels.logFormat
//! ```
//!
//! ```
//! use viaqgen::{generate, ElasticsearchSpec, OptionsBag, OutputSpec};
//!
//! let output = OutputSpec::elasticsearch("es-app", Some(ElasticsearchSpec {
//!     structured_type_key: Some("kubernetes.labels.logFormat".to_string()),
//!     ..Default::default()
//! }));
//! let conf = generate(&output, &OptionsBag::new());
//! assert!(conf.contains("structured_type_key kubernetes.labels.logFormat"));
//! ```

pub mod elements;
pub mod fs_utils;
pub mod generate;
pub mod loader;
pub mod output;
pub mod render;
pub mod structured_type;
pub mod utils;
pub mod viaq;

pub use elements::{Directive, FilterChain, FilterElement, RecordPatch, TagPattern};
pub use loader::{load_options, load_output, load_outputs, LoadError};
pub use output::{ElasticsearchSpec, OptionsBag, OutputSpec, CHAR_ENCODING};
pub use render::{FluentdRenderer, RenderParams, Renderer};
pub use structured_type::{StructuredTypeStrategy, StructuredTypeTriple, ANNOTATION_PREFIX};
pub use viaq::{viaq_data_model, FilterChainBuilder};

/// Build and render the fluentd normalization filters for an output
pub fn generate(output: &OutputSpec, options: &OptionsBag) -> String {
    render_with(&FluentdRenderer::new(), output, options)
}

/// Build the chain for an output and render it with any renderer
pub fn render_with<R: Renderer>(renderer: &R, output: &OutputSpec, options: &OptionsBag) -> String {
    let builder = FilterChainBuilder::new(output, options);
    renderer.render(&builder.build(), &builder.render_params())
}
