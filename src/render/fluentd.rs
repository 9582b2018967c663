//! Fluentd configuration renderer.
//!
//! Record patches become `record_modifier` filters. The record_modifier
//! plugin has no multi-field assignment, so each write is lowered to a Ruby
//! expression stored under a synthetic marker key (`_dummy_`, `_dummy2_`, ...)
//! that the same filter lists in `remove_keys`. Markers are numbered across
//! the whole chain so no two filters share one.

use crate::elements::{
    Directive, Expression, FieldPath, FilterElement, IndexNamingDirective, IndexRule,
    PruneLabelsDirective, RecordPatch,
};
use crate::elements::FilterChain;
use crate::render::{RenderParams, Renderer};

const INDENT: &str = "  ";

#[derive(Debug, Clone, Default)]
pub struct FluentdRenderer;

impl FluentdRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for FluentdRenderer {
    fn render(&self, chain: &FilterChain, params: &RenderParams) -> String {
        tracing::debug!(
            structured_type = ?params.structured_type,
            char_encoding = ?params.char_encoding,
            elements = chain.len(),
            "rendering fluentd filters"
        );

        let mut markers = MarkerAllocator::default();
        let mut blocks = Vec::with_capacity(chain.len());

        for element in chain {
            let block = match &element.directive {
                Directive::Patch(patch) => render_patch(element, patch, &mut markers),
                Directive::IndexNaming(naming) => render_index_naming(element, naming),
                Directive::PruneLabels(prune) => render_prune_labels(element, prune),
            };
            blocks.push(block);
        }

        blocks.join("\n")
    }
}

/// Hands out chain-unique marker keys
#[derive(Debug, Default)]
struct MarkerAllocator {
    next: usize,
}

impl MarkerAllocator {
    fn next(&mut self) -> String {
        self.next += 1;
        if self.next == 1 {
            "_dummy_".to_string()
        } else {
            format!("_dummy{}_", self.next)
        }
    }
}

fn render_patch(element: &FilterElement, patch: &RecordPatch, markers: &mut MarkerAllocator) -> String {
    let mut out = format!("# {}\n<filter {}>\n{}@type record_modifier\n", element.description, element.tag, INDENT);

    if let Some(encoding) = patch.char_encoding() {
        out.push_str(&format!("{}char_encoding {}\n", INDENT, encoding));
    }

    let mut record_lines = Vec::new();
    let mut remove_keys = Vec::new();

    for write in patch.writes() {
        let marker = markers.next();
        if let Some(ref comment) = write.comment {
            record_lines.push(format!("# {}", comment));
        }
        record_lines.push(format!("{} {}", marker, lower_expression(&write.target, &write.expression)));
        remove_keys.push(marker);
    }

    for field in patch.removals() {
        if field.segments().len() == 1 {
            remove_keys.push(field.to_string());
        } else {
            let marker = markers.next();
            record_lines.push(format!("{} {}", marker, lower_nested_removal(field)));
            remove_keys.push(marker);
        }
    }

    if !record_lines.is_empty() {
        out.push_str(&format!("{}<record>\n", INDENT));
        for line in &record_lines {
            out.push_str(&format!("{}{}{}\n", INDENT, INDENT, line));
        }
        out.push_str(&format!("{}</record>\n", INDENT));
    }
    if !remove_keys.is_empty() {
        out.push_str(&format!("{}remove_keys {}\n", INDENT, remove_keys.join(",")));
    }

    out.push_str("</filter>\n");
    out
}

fn render_index_naming(element: &FilterElement, naming: &IndexNamingDirective) -> String {
    let mut out = format!(
        r#"# {}
<filter {}>
  @type viaq_data_model
  enable_openshift_model false
  enable_prune_empty_fields false
  rename_time false
  undefined_dot_replace_char UNUSED
  elasticsearch_index_prefix_field '{}'
"#,
        element.description,
        element.tag,
        naming.index_field()
    );

    for rule in naming.rules() {
        out.push_str(&render_index_rule(rule));
    }

    out.push_str("</filter>\n");
    out
}

fn render_index_rule(rule: &IndexRule) -> String {
    let mut out = format!(
        r#"  <elasticsearch_index_name>
    enabled 'true'
    tag "{}"
    name_type {}
    static_index_name {}
"#,
        rule.tag,
        rule.mode.as_str(),
        rule.static_index_name
    );

    let strategy = &rule.structured_type;
    for (directive, value) in [
        ("structured_type_key", strategy.key()),
        ("structured_type_name", strategy.name()),
        ("structured_type_annotation_prefix", strategy.annotation_prefix()),
    ] {
        if !value.is_empty() {
            out.push_str(&format!("    {} {}\n", directive, value));
        }
    }

    out.push_str("  </elasticsearch_index_name>\n");
    out
}

fn render_prune_labels(element: &FilterElement, prune: &PruneLabelsDirective) -> String {
    format!(
        r#"# {}
<filter {}>
  @type viaq_data_model
  enable_prune_labels true
  enable_openshift_model false
  rename_time false
  undefined_dot_replace_char UNUSED
  prune_labels_exclusions {}
</filter>
"#,
        element.description,
        element.tag,
        prune.exclusions().join(",")
    )
}

fn lower_expression(target: &FieldPath, expression: &Expression) -> String {
    match expression {
        Expression::DedotKeys { source } => format!(
            r#"${{if m={};{}={{}}.tap{{|n|m.each{{|k,v|n[k.gsub(/[.\/]/,'_')]=v}}}};end}}"#,
            ruby_dig(source),
            ruby_index(target)
        ),
        Expression::DedotValues { source } => format!(
            r#"${{if m={};{}=[].tap{{|n|m.each_with_index{{|s, i|n[i] = s.is_a?(String) ? s.gsub(/[.\/]/,'_') : s}}}};end}}"#,
            ruby_dig(source),
            ruby_index(target)
        ),
        Expression::SerializeWhenIndex { source, index_field, index_name } => format!(
            r#"${{(require 'json';{}=JSON.dump({})) if {} and {} == '{}'}}"#,
            ruby_index(target),
            ruby_dig(source),
            ruby_dig(source),
            ruby_dig(index_field),
            index_name.replace('\'', "\\'")
        ),
    }
}

fn lower_nested_removal(field: &FieldPath) -> String {
    let segments = field.segments();
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return "${nil}".to_string(),
    };
    format!(
        "${{p={};p.delete({}) if p.is_a?(Hash);nil}}",
        ruby_dig(&FieldPath::new(parents.iter().cloned())),
        ruby_quote(last)
    )
}

fn ruby_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// `record.dig("a","b")`
fn ruby_dig(path: &FieldPath) -> String {
    let args: Vec<String> = path.segments().iter().map(|s| ruby_quote(s)).collect();
    format!("record.dig({})", args.join(","))
}

/// `record["a"]["b"]`
fn ruby_index(path: &FieldPath) -> String {
    let mut out = "record".to_string();
    for segment in path.segments() {
        out.push_str(&format!("[{}]", ruby_quote(segment)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::{RoutingMode, TagPattern};
    use crate::structured_type::StructuredTypeStrategy;

    fn single_patch_chain(patch: RecordPatch) -> FilterChain {
        let mut chain = FilterChain::new();
        chain.push(FilterElement::new(TagPattern::match_all(), "patch", Directive::Patch(patch)));
        chain
    }

    #[test]
    fn test_marker_numbering() {
        let mut markers = MarkerAllocator::default();
        assert_eq!(markers.next(), "_dummy_");
        assert_eq!(markers.next(), "_dummy2_");
        assert_eq!(markers.next(), "_dummy3_");
    }

    #[test]
    fn test_ruby_paths() {
        let path = FieldPath::parse("kubernetes.labels");
        assert_eq!(ruby_dig(&path), r#"record.dig("kubernetes","labels")"#);
        assert_eq!(ruby_index(&path), r#"record["kubernetes"]["labels"]"#);
        assert_eq!(ruby_quote(r#"a"b"#), r#""a\"b""#);
    }

    #[test]
    fn test_dedot_lowering() {
        let path = FieldPath::parse("kubernetes.namespace_labels");
        let ruby = lower_expression(&path, &Expression::DedotKeys { source: path.clone() });
        assert_eq!(
            ruby,
            r#"${if m=record.dig("kubernetes","namespace_labels");record["kubernetes"]["namespace_labels"]={}.tap{|n|m.each{|k,v|n[k.gsub(/[.\/]/,'_')]=v}};end}"#
        );
    }

    #[test]
    fn test_rebuild_lowering() {
        let ruby = lower_expression(
            &FieldPath::parse("message"),
            &Expression::SerializeWhenIndex {
                source: "structured".into(),
                index_field: "viaq_index_name".into(),
                index_name: "app-write".to_string(),
            },
        );
        assert_eq!(
            ruby,
            r#"${(require 'json';record["message"]=JSON.dump(record.dig("structured"))) if record.dig("structured") and record.dig("viaq_index_name") == 'app-write'}"#
        );
    }

    #[test]
    fn test_blocks_only_from_chain() {
        let patch = RecordPatch::new().remove("structured");
        let params = RenderParams {
            structured_type: StructuredTypeStrategy::ExplicitKey("openshift".into()).triple(),
            char_encoding: Some("UTF-8".into()),
        };
        let text = FluentdRenderer::new().render(&single_patch_chain(patch), &params);
        assert_eq!(text, "# patch\n<filter **>\n  @type record_modifier\n  remove_keys structured\n</filter>\n");
    }

    #[test]
    fn test_removal_only_patch() {
        let patch = RecordPatch::new().remove("structured").with_char_encoding(Some("UTF-8".into()));
        let text = FluentdRenderer::new().render(&single_patch_chain(patch), &RenderParams::default());
        assert!(text.contains("  @type record_modifier\n  char_encoding UTF-8\n  remove_keys structured\n</filter>\n"));
        assert!(!text.contains("<record>"));
    }

    #[test]
    fn test_nested_removal_uses_marker() {
        let patch = RecordPatch::new().remove("kubernetes.flat_labels");
        let text = FluentdRenderer::new().render(&single_patch_chain(patch), &RenderParams::default());
        assert!(text.contains(r#"_dummy_ ${p=record.dig("kubernetes");p.delete("flat_labels") if p.is_a?(Hash);nil}"#));
        assert!(text.contains("remove_keys _dummy_\n"));
    }

    #[test]
    fn test_index_rule_lines() {
        let rule = IndexRule::fixed(TagPattern::match_all(), "app-write")
            .with_mode(RoutingMode::Structured)
            .with_structured_type(StructuredTypeStrategy::ExplicitName("nginx".into()));
        let text = render_index_rule(&rule);
        assert_eq!(
            text,
            "  <elasticsearch_index_name>\n    enabled 'true'\n    tag \"**\"\n    name_type structured\n    static_index_name app-write\n    structured_type_name nginx\n  </elasticsearch_index_name>\n"
        );
    }
}
