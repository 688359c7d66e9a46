use std::collections::HashSet;

use tracing::debug;

use crate::config::{CompiledProfile, ResolvedRule};
use crate::knowledge_graph::{Term, TripleSource};

/// Resolves extraction rules against single individuals of a graph.
///
/// Every method returns a finished cell value: labels joined with the
/// profile separator, or the "no links" placeholder when the path reached
/// nothing. Missing labels never fail; they become the "unknown" placeholder.
pub struct PathExtractor<'a, G: TripleSource + ?Sized> {
    graph: &'a G,
    profile: &'a CompiledProfile,
}

impl<'a, G: TripleSource + ?Sized> PathExtractor<'a, G> {
    pub fn new(graph: &'a G, profile: &'a CompiledProfile) -> Self {
        Self { graph, profile }
    }

    pub fn profile(&self) -> &CompiledProfile {
        self.profile
    }

    /// Apply one rule to one individual.
    pub fn extract(&self, individual: &Term, rule: &ResolvedRule) -> String {
        match rule {
            ResolvedRule::OneHop {
                properties,
                required_types,
                ..
            } => self.one_hop(individual, properties, required_types),
            ResolvedRule::TwoHop {
                first_hop,
                keyword,
                second_hop,
                ..
            } => self.two_hop(individual, first_hop, keyword, second_hop),
        }
    }

    /// Label of a node: the label property, else the fallback property when
    /// one is configured. Empty literals count as missing.
    pub fn resolve_label(&self, node: &Term) -> Option<String> {
        self.non_empty_value(node, &self.profile.label_property)
            .or_else(|| {
                self.profile
                    .label_fallback
                    .as_deref()
                    .and_then(|fallback| self.non_empty_value(node, fallback))
            })
    }

    /// First value of a data property, or the "no links" placeholder.
    pub fn value_or_default(&self, individual: &Term, property: &str) -> String {
        self.non_empty_value(individual, property)
            .unwrap_or_else(|| self.profile.placeholders.no_links.clone())
    }

    pub fn one_hop(
        &self,
        individual: &Term,
        properties: &[String],
        required_types: &[String],
    ) -> String {
        let mut labels = Vec::new();

        for property in properties {
            for linked in self.graph.objects(individual, property) {
                if !required_types.is_empty()
                    && !required_types
                        .iter()
                        .any(|class| self.graph.has_type(linked, class))
                {
                    debug!("{} excluded by type filter on {}", linked, property);
                    continue;
                }

                labels.push(self.label_or_unknown(linked));
            }
        }

        self.finish(labels)
    }

    pub fn two_hop(
        &self,
        individual: &Term,
        first_hop: &str,
        keyword: &str,
        second_hop: &str,
    ) -> String {
        let keyword = keyword.to_lowercase();
        let mut labels = Vec::new();

        for mid in self.graph.objects(individual, first_hop) {
            // Unlabelled intermediate nodes cannot match the keyword.
            let Some(mid_label) = self.resolve_label(mid) else {
                continue;
            };

            if !mid_label.to_lowercase().contains(&keyword) {
                continue;
            }

            debug!("{} matched keyword '{}' via {}", mid_label, keyword, mid);

            for target in self.graph.objects(mid, second_hop) {
                labels.push(self.label_or_unknown(target));
            }
        }

        self.finish(labels)
    }

    fn label_or_unknown(&self, node: &Term) -> String {
        self.resolve_label(node)
            .unwrap_or_else(|| self.profile.placeholders.unknown.clone())
    }

    fn non_empty_value(&self, node: &Term, property: &str) -> Option<String> {
        self.graph
            .value(node, property)
            .map(Term::lexical)
            .filter(|value| !value.is_empty())
    }

    fn finish(&self, labels: Vec<String>) -> String {
        if labels.is_empty() {
            return self.profile.placeholders.no_links.clone();
        }

        let labels = if self.profile.deduplicate {
            deduplicate(labels)
        } else {
            labels
        };

        labels.join(&self.profile.separator)
    }
}

/// Remove repeated labels (case-sensitive), keeping first occurrences in order.
pub fn deduplicate(labels: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .into_iter()
        .filter(|label| seen.insert(label.clone()))
        .collect()
}
