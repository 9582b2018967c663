//! ViaQ data model filter chain for Elasticsearch outputs.
//!
//! Builds the ordered normalization filters placed in front of an
//! Elasticsearch output:
//!
//! 1. dedot namespace labels, pod labels and flattened labels
//! 2. assign the index name (`infra-write`, `audit-write`, `app-write` or a
//!    structured `app-<type>-write`), then prune labels
//! 3. rebuild `message` from `structured` for records left on `app-write`
//! 4. drop `structured` when the output has no structured type strategy
//!
//! Stage order matters: stage 3 reads the index name written by stage 2.

use crate::elements::{
    Directive, Expression, FilterChain, FilterElement, IndexNamingDirective, IndexRule,
    PruneLabelsDirective, RecordPatch, RoutingMode, TagPattern, INDEX_NAME_FIELD,
    STRUCTURED_FIELD,
};
use crate::output::{OptionsBag, OutputSpec};
use crate::render::RenderParams;
use crate::structured_type::StructuredTypeStrategy;

/// Tags of infrastructure namespaces and node journals
pub const INFRA_TAGS: &str = "kubernetes.var.log.pods.openshift_** kubernetes.var.log.pods.openshift-*_** \
kubernetes.var.log.pods.default_** kubernetes.var.log.pods.kube-*_** var.log.pods.openshift_** \
var.log.pods.openshift-*_** var.log.pods.default_** var.log.pods.kube-*_** journal.system** system.var.log**";

/// Tags of audit log sources
pub const AUDIT_TAGS: &str = "linux-audit.log** k8s-audit.log** openshift-audit.log** ovn-audit.log**";

pub const INFRA_INDEX: &str = "infra-write";
pub const AUDIT_INDEX: &str = "audit-write";
pub const APP_INDEX: &str = "app-write";

pub const DESC_DEDOT: &str = "dedot namespace_labels";
pub const DESC_INDEX_NAMING: &str = "Viaq Data Model";
pub const DESC_PRUNE_LABELS: &str = "prune kubernetes labels";
pub const DESC_REBUILD_MESSAGE: &str = "rebuild message field if present";
pub const DESC_REMOVE_STRUCTURED: &str = "remove structured field if present";

/// Assembles the ViaQ filter chain for one output
#[derive(Debug, Clone)]
pub struct FilterChainBuilder<'a> {
    output: &'a OutputSpec,
    options: &'a OptionsBag,
}

impl<'a> FilterChainBuilder<'a> {
    pub fn new(output: &'a OutputSpec, options: &'a OptionsBag) -> Self {
        Self { output, options }
    }

    /// Structured type strategy of the output
    pub fn strategy(&self) -> StructuredTypeStrategy {
        StructuredTypeStrategy::resolve(self.output.elasticsearch.as_ref())
    }

    /// Parameters handed to renderers alongside the chain
    pub fn render_params(&self) -> RenderParams {
        let strategy = self.strategy();
        RenderParams {
            structured_type: strategy.triple(),
            char_encoding: if strategy.is_none() { self.options.char_encoding() } else { None },
        }
    }

    /// Build the chain
    pub fn build(&self) -> FilterChain {
        let strategy = self.strategy();
        tracing::debug!(output = %self.output.name, strategy = %strategy, "building viaq filter chain");

        let mut chain = FilterChain::new();
        chain.push(dedot_element());
        chain.push(index_naming_element(&strategy));
        chain.push(FilterElement::new(
            TagPattern::match_all(),
            DESC_PRUNE_LABELS,
            Directive::PruneLabels(PruneLabelsDirective::default()),
        ));
        chain.push(rebuild_message_element());

        if strategy.is_none() {
            let patch = RecordPatch::new()
                .remove(STRUCTURED_FIELD)
                .with_char_encoding(self.options.char_encoding());
            chain.push(FilterElement::new(
                TagPattern::match_all(),
                DESC_REMOVE_STRUCTURED,
                Directive::Patch(patch),
            ));
        }

        tracing::debug!(output = %self.output.name, elements = chain.len(), "viaq filter chain built");
        chain
    }
}

/// Build the ViaQ filter chain for an output
///
/// # Example
///
/// ```
/// use viaqgen::{viaq_data_model, OptionsBag, OutputSpec};
///
/// let output = OutputSpec::elasticsearch("default", None);
/// let chain = viaq_data_model(&output, &OptionsBag::new());
/// assert_eq!(chain.len(), 5);
/// ```
pub fn viaq_data_model(output: &OutputSpec, options: &OptionsBag) -> FilterChain {
    FilterChainBuilder::new(output, options).build()
}

fn dedot_element() -> FilterElement {
    let patch = RecordPatch::new()
        .write_commented(
            "kubernetes.namespace_labels",
            Expression::DedotKeys { source: "kubernetes.namespace_labels".into() },
            "Replace namespace label names that have '.' & '/' with '_'",
        )
        .write_commented(
            "kubernetes.labels",
            Expression::DedotKeys { source: "kubernetes.labels".into() },
            "Replace label names that have '.' & '/' with '_'",
        )
        .write_commented(
            "kubernetes.flat_labels",
            Expression::DedotValues { source: "kubernetes.flat_labels".into() },
            "Replace flattened label names that have '.' & '/' with '_'",
        );

    FilterElement::new(TagPattern::match_all(), DESC_DEDOT, Directive::Patch(patch))
}

fn index_naming_element(strategy: &StructuredTypeStrategy) -> FilterElement {
    let rules = vec![
        IndexRule::fixed(builtin_pattern(INFRA_TAGS), INFRA_INDEX)
            .with_structured_type(strategy.clone()),
        IndexRule::fixed(builtin_pattern(AUDIT_TAGS), AUDIT_INDEX),
        IndexRule::fixed(TagPattern::match_all(), APP_INDEX)
            .with_mode(RoutingMode::Structured)
            .with_structured_type(strategy.clone()),
    ];
    let naming = IndexNamingDirective::new(rules).expect("built-in index rules end with a catch-all");

    FilterElement::new(TagPattern::match_all(), DESC_INDEX_NAMING, Directive::IndexNaming(naming))
}

fn rebuild_message_element() -> FilterElement {
    let patch = RecordPatch::new().write(
        "message",
        Expression::SerializeWhenIndex {
            source: STRUCTURED_FIELD.into(),
            index_field: INDEX_NAME_FIELD.into(),
            index_name: APP_INDEX.to_string(),
        },
    );

    FilterElement::new(TagPattern::match_all(), DESC_REBUILD_MESSAGE, Directive::Patch(patch))
}

fn builtin_pattern(pattern: &str) -> TagPattern {
    TagPattern::new(pattern).expect("built-in tag patterns are valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::FieldPath;
    use crate::output::{ElasticsearchSpec, CHAR_ENCODING};
    use serde_json::json;

    fn es_output(key: Option<&str>, name: Option<&str>, containers: bool) -> OutputSpec {
        OutputSpec::elasticsearch(
            "es",
            Some(ElasticsearchSpec {
                structured_type_key: key.map(String::from),
                structured_type_name: name.map(String::from),
                enable_structured_container_logs: containers,
            }),
        )
    }

    fn naming(chain: &FilterChain) -> &IndexNamingDirective {
        chain
            .iter()
            .find_map(|e| match &e.directive {
                Directive::IndexNaming(n) => Some(n),
                _ => None,
            })
            .expect("chain has an index naming stage")
    }

    #[test]
    fn test_stage_order_without_strategy() {
        let chain = viaq_data_model(&OutputSpec::elasticsearch("es", None), &OptionsBag::new());
        let descriptions: Vec<&str> = chain.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec![
                DESC_DEDOT,
                DESC_INDEX_NAMING,
                DESC_PRUNE_LABELS,
                DESC_REBUILD_MESSAGE,
                DESC_REMOVE_STRUCTURED
            ]
        );
        assert!(chain.iter().all(|e| e.tag.is_catch_all()));
    }

    #[test]
    fn test_cleanup_omitted_with_strategy() {
        for output in [
            es_output(Some("openshift"), None, false),
            es_output(None, Some("nginx"), false),
            es_output(None, None, true),
        ] {
            let chain = viaq_data_model(&output, &OptionsBag::new());
            assert_eq!(chain.len(), 4);
            assert!(chain.position(DESC_REMOVE_STRUCTURED).is_none());
        }
    }

    #[test]
    fn test_rules_share_strategy_and_audit_has_none() {
        let chain = viaq_data_model(&es_output(Some("openshift"), None, false), &OptionsBag::new());
        let rules = naming(&chain).rules();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules[0].static_index_name, INFRA_INDEX);
        assert_eq!(rules[1].static_index_name, AUDIT_INDEX);
        assert_eq!(rules[2].static_index_name, APP_INDEX);
        assert_eq!(rules[0].structured_type, rules[2].structured_type);
        assert_eq!(rules[0].structured_type, StructuredTypeStrategy::ExplicitKey("openshift".into()));
        assert!(rules[1].structured_type.is_none());
        assert_eq!(rules[2].mode, RoutingMode::Structured);
    }

    #[test]
    fn test_cleanup_carries_char_encoding() {
        let options = OptionsBag::new().with(CHAR_ENCODING, "UTF-8");
        let chain = viaq_data_model(&es_output(None, None, false), &options);
        let last = chain.elements().last().unwrap();
        match &last.directive {
            Directive::Patch(patch) => {
                assert_eq!(patch.char_encoding(), Some("UTF-8"));
                assert_eq!(patch.removals(), [FieldPath::parse("structured")].as_slice());
            }
            other => panic!("unexpected directive {:?}", other),
        }
    }

    #[test]
    fn test_render_params() {
        let options = OptionsBag::new().with(CHAR_ENCODING, "UTF-8");
        let output = es_output(None, Some("nginx"), false);
        let params = FilterChainBuilder::new(&output, &options).render_params();
        assert_eq!(params.structured_type.name, "nginx");
        assert_eq!(params.char_encoding, None);

        let output = OutputSpec::elasticsearch("es", None);
        let params = FilterChainBuilder::new(&output, &options).render_params();
        assert_eq!(params.char_encoding.as_deref(), Some("UTF-8"));
    }

    #[test]
    fn test_app_record_end_to_end() {
        let chain = viaq_data_model(&OutputSpec::elasticsearch("es", None), &OptionsBag::new());
        let mut record = json!({
            "message": "{\"level\":\"info\"}",
            "structured": {"level": "info"},
            "kubernetes": {
                "namespace_name": "shop",
                "labels": {"app.kubernetes.io/name": "web", "pod-template-hash": "x"},
                "namespace_labels": {"team.example.com/owner": "payments"},
                "flat_labels": ["app.kubernetes.io/name=web"]
            }
        });
        chain.apply("kubernetes.var.log.pods.shop_web-1_uid.web.0.log", &mut record);

        assert_eq!(record[INDEX_NAME_FIELD], APP_INDEX);
        assert_eq!(record["message"], "{\"level\":\"info\"}");
        assert!(record.get(STRUCTURED_FIELD).is_none());
        assert_eq!(record["kubernetes"]["labels"], json!({"app_kubernetes_io_name": "web"}));
        assert_eq!(
            record["kubernetes"]["namespace_labels"],
            json!({"team_example_com_owner": "payments"})
        );
        assert_eq!(record["kubernetes"]["flat_labels"], json!(["app_kubernetes_io_name=web"]));
    }

    #[test]
    fn test_infra_and_audit_routing() {
        let chain = viaq_data_model(&OutputSpec::elasticsearch("es", None), &OptionsBag::new());

        let mut record = json!({"message": "x"});
        chain.apply("kubernetes.var.log.pods.openshift-dns_dns-x_uid.dns.0.log", &mut record);
        assert_eq!(record[INDEX_NAME_FIELD], INFRA_INDEX);

        let mut record = json!({"message": "x"});
        chain.apply("journal.system", &mut record);
        assert_eq!(record[INDEX_NAME_FIELD], INFRA_INDEX);

        let mut record = json!({"message": "x"});
        chain.apply("k8s-audit.log", &mut record);
        assert_eq!(record[INDEX_NAME_FIELD], AUDIT_INDEX);
    }

    #[test]
    fn test_structured_record_keeps_payload_and_message() {
        let output = es_output(Some("kubernetes.labels.logFormat"), None, false);
        let chain = viaq_data_model(&output, &OptionsBag::new());
        let mut record = json!({
            "message": "original",
            "structured": {"status": 200},
            "kubernetes": {"labels": {"logFormat": "nginx"}}
        });
        chain.apply("kubernetes.var.log.pods.shop_web_uid.web.0.log", &mut record);

        assert_eq!(record[INDEX_NAME_FIELD], "app-nginx-write");
        assert_eq!(record["message"], "original");
        assert_eq!(record[STRUCTURED_FIELD], json!({"status": 200}));
    }
}
