use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

pub mod rules;
pub mod vocabulary;

pub use rules::{ExtractionRule, ResolvedRule};
pub use vocabulary::Vocabulary;

/// An extraction profile: which ontology terms to read and which columns to
/// produce from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub schema: OntologySchema,
    #[serde(default)]
    pub placeholders: Placeholders,
    #[serde(default)]
    pub post_processing: PostProcessing,
    pub rules: Vec<ExtractionRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OntologySchema {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub prefixes: BTreeMap<String, String>,
    #[serde(default = "default_target_class")]
    pub target_class: String,
    #[serde(default = "default_label_property")]
    pub label_property: String,
    #[serde(default = "default_name_property")]
    pub name_property: String,
    /// Read when a reached node has no label; `null` turns the fallback off.
    #[serde(default = "default_label_fallback")]
    pub label_fallback: Option<String>,
    #[serde(default = "default_description_property")]
    pub description_property: String,
    #[serde(default = "default_name_column")]
    pub name_column: String,
    #[serde(default = "default_description_column")]
    pub description_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Placeholders {
    /// Cell value when a path reaches nothing.
    #[serde(default = "default_placeholder")]
    pub no_links: String,
    /// Stands in for a reached node that has neither label nor name.
    #[serde(default = "default_placeholder")]
    pub unknown: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostProcessing {
    /// Drop repeated labels inside a cell, keeping the first occurrence.
    #[serde(default = "default_true")]
    pub deduplicate: bool,
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_version() -> String { "1.0".to_string() }
fn default_namespace() -> String { vocabulary::WEBPROTEGE_NS.to_string() }
fn default_target_class() -> String { "Aesthetic".to_string() }
fn default_label_property() -> String { "rdfs:label".to_string() }
fn default_name_property() -> String { "hasName".to_string() }
fn default_label_fallback() -> Option<String> { Some(default_name_property()) }
fn default_description_property() -> String { "dc:description".to_string() }
fn default_name_column() -> String { "Aesthetic".to_string() }
fn default_description_column() -> String { "Description".to_string() }
fn default_placeholder() -> String { " ".to_string() }
fn default_separator() -> String { ", ".to_string() }
fn default_true() -> bool { true }

impl Default for OntologySchema {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            prefixes: BTreeMap::new(),
            target_class: default_target_class(),
            label_property: default_label_property(),
            name_property: default_name_property(),
            label_fallback: default_label_fallback(),
            description_property: default_description_property(),
            name_column: default_name_column(),
            description_column: default_description_column(),
        }
    }
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            no_links: default_placeholder(),
            unknown: default_placeholder(),
        }
    }
}

impl Default for PostProcessing {
    fn default() -> Self {
        Self {
            deduplicate: true,
            separator: default_separator(),
        }
    }
}

/// A validated configuration with every reference resolved. Built once per
/// run and shared read-only by the extractor and the table builder.
#[derive(Debug, Clone)]
pub struct CompiledProfile {
    pub name: String,
    pub vocabulary: Vocabulary,
    pub target_class: String,
    pub label_property: String,
    pub name_property: String,
    pub label_fallback: Option<String>,
    pub description_property: String,
    pub name_column: String,
    pub description_column: String,
    pub placeholders: Placeholders,
    pub deduplicate: bool,
    pub separator: String,
    pub rules: Vec<ResolvedRule>,
}

impl CompiledProfile {
    /// Table header: the two fixed columns followed by one column per rule.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.rules.len() + 2);
        columns.push(self.name_column.clone());
        columns.push(self.description_column.clone());
        columns.extend(self.rules.iter().map(|rule| rule.column().to_string()));
        columns
    }
}

impl Configuration {
    /// Load configuration from a YAML or JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let config = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(|e| {
                Error::configuration(format!("{}: {}", path.display(), e))
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                Error::configuration(format!("{}: {}", path.display(), e))
            })?
        };

        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.rules.is_empty() {
            return Err(Error::configuration("No extraction rules defined"));
        }

        if self.schema.namespace.is_empty() {
            return Err(Error::configuration("No ontology namespace defined"));
        }

        if self.schema.name_column == self.schema.description_column {
            return Err(Error::configuration(format!(
                "name and description columns are both '{}'",
                self.schema.name_column
            )));
        }

        if self.post_processing.separator.is_empty() {
            return Err(Error::configuration("Empty label separator"));
        }

        let mut columns: HashSet<&str> = HashSet::new();
        columns.insert(self.schema.name_column.as_str());
        columns.insert(self.schema.description_column.as_str());

        for rule in &self.rules {
            if !columns.insert(rule.column()) {
                return Err(Error::configuration(format!(
                    "duplicate column '{}'",
                    rule.column()
                )));
            }
        }

        Ok(())
    }

    pub fn vocabulary(&self) -> Vocabulary {
        self.schema
            .prefixes
            .iter()
            .fold(Vocabulary::new(&self.schema.namespace), |vocab, (prefix, ns)| {
                vocab.with_prefix(prefix, ns)
            })
    }

    /// Validate and resolve every rule up front so that a bad rule fails the
    /// run before any individual is processed.
    pub fn compile(&self) -> Result<CompiledProfile> {
        self.validate()?;

        let vocabulary = self.vocabulary();
        let rules = self
            .rules
            .iter()
            .map(|rule| rule.resolve(&vocabulary))
            .collect::<Result<Vec<_>>>()?;

        let profile = CompiledProfile {
            name: self.name.clone(),
            target_class: vocabulary.resolve(&self.schema.target_class)?,
            label_property: vocabulary.resolve(&self.schema.label_property)?,
            name_property: vocabulary.resolve(&self.schema.name_property)?,
            label_fallback: self
                .schema
                .label_fallback
                .as_deref()
                .map(|reference| vocabulary.resolve(reference))
                .transpose()?,
            description_property: vocabulary.resolve(&self.schema.description_property)?,
            name_column: self.schema.name_column.clone(),
            description_column: self.schema.description_column.clone(),
            placeholders: self.placeholders.clone(),
            deduplicate: self.post_processing.deduplicate,
            separator: self.post_processing.separator.clone(),
            rules,
            vocabulary,
        };

        debug!(
            "Compiled profile '{}' with {} rules, target class {}",
            profile.name,
            profile.rules.len(),
            profile.target_class
        );

        Ok(profile)
    }

    /// The full aesthetics rule set.
    pub fn canonical() -> Self {
        Configuration {
            name: "Aesthetics dataset".to_string(),
            description: "Aesthetic individuals with their contexts, influences, elements and creative processes".to_string(),
            version: default_version(),
            schema: OntologySchema::default(),
            placeholders: Placeholders::default(),
            post_processing: PostProcessing::default(),
            rules: vec![
                ExtractionRule::one_hop(
                    "Context",
                    &[
                        "hasTemporalContext",
                        "hasCulturalContext",
                        "hasSpatialContext",
                        "hasTechnologicalContext",
                    ],
                ),
                ExtractionRule::one_hop("User", &["experiencedBy"]),
                ExtractionRule::one_hop("Creator", &["createdBy"]),
                ExtractionRule::one_hop("Influence", &["influencedBy"]),
                ExtractionRule::one_hop("Spread Through", &["spreadThrough"]),
                ExtractionRule::one_hop("Inspiration", &["inspiredBy"]),
                ExtractionRule::one_hop_typed(
                    "Aesthetic Element",
                    &["characterizedBy"],
                    &["AestheticElement"],
                ),
                ExtractionRule::one_hop_typed(
                    "Lifestyle",
                    &["involvesBehaviour"],
                    &["LifeStyle", "BehaviourPattern"],
                ),
                ExtractionRule::one_hop("Creative Result", &["resultsIn"]),
                ExtractionRule::one_hop("Emotion", &["involvesEmotion"]),
                ExtractionRule::two_hop(
                    "Convergence processes",
                    "involvesProcess",
                    "Convergence",
                    "involvesProcess",
                ),
                ExtractionRule::two_hop(
                    "Divergence processes",
                    "involvesProcess",
                    "Divergence",
                    "involvesProcess",
                ),
                ExtractionRule::two_hop(
                    "Metaconvergence processes",
                    "involvesProcess",
                    "Metaconvergence",
                    "involvesProcess",
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_compiles() {
        let profile = Configuration::canonical().compile().unwrap();
        let columns = profile.columns();

        assert_eq!(columns.len(), 15);
        assert_eq!(columns[0], "Aesthetic");
        assert_eq!(columns[1], "Description");
        assert_eq!(columns[2], "Context");
        assert_eq!(columns[14], "Metaconvergence processes");
        assert_eq!(profile.target_class, "http://webprotege.stanford.edu/Aesthetic");
        assert_eq!(profile.description_property, vocabulary::DC_DESCRIPTION);
        assert_eq!(profile.label_property, vocabulary::RDFS_LABEL);
        assert!(profile.deduplicate);
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let mut config = Configuration::canonical();
        config.rules.push(ExtractionRule::one_hop("Emotion", &["involvesEmotion"]));
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let mut config = Configuration::canonical();
        config.rules.push(ExtractionRule::one_hop("Aesthetic", &["hasName"]));
        assert!(config.compile().is_err());
    }

    #[test]
    fn test_unknown_schema_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        fs::write(
            &path,
            "name: typo\nschema:\n  target_clas: Aesthetic\nrules:\n  - kind: one_hop\n    column: Influence\n    properties: influencedBy\n",
        )
        .unwrap();

        assert!(matches!(Configuration::from_file(&path), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_label_fallback_can_be_disabled() {
        let yaml = "name: plain labels\nschema:\n  label_fallback: null\nrules:\n  - kind: one_hop\n    column: Influence\n    properties: influencedBy\n";
        let config: Configuration = serde_yaml::from_str(yaml).unwrap();
        let profile = config.compile().unwrap();
        assert_eq!(profile.label_fallback, None);

        let profile = Configuration::canonical().compile().unwrap();
        assert_eq!(
            profile.label_fallback.as_deref(),
            Some("http://webprotege.stanford.edu/hasName")
        );
    }

    #[test]
    fn test_empty_rules_rejected() {
        let mut config = Configuration::canonical();
        config.rules.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_roundtrip_keeps_rules() {
        let config = Configuration::canonical();
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("kind: two_hop"));

        let parsed: Configuration = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.rules, config.rules);
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let yaml = r#"
name: Early variant
rules:
  - kind: one_hop
    column: Temporal Context
    properties: hasTemporalContext
"#;
        let config: Configuration = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.schema.target_class, "Aesthetic");
        assert_eq!(config.placeholders.no_links, " ");
        assert!(config.post_processing.deduplicate);

        let profile = config.compile().unwrap();
        assert_eq!(
            profile.columns(),
            vec!["Aesthetic", "Description", "Temporal Context"]
        );
    }

    #[test]
    fn test_custom_prefix_in_schema() {
        let yaml = r#"
name: Custom
schema:
  prefixes:
    ex: "http://example.org/"
rules:
  - kind: one_hop
    column: Related
    properties: ex:related
"#;
        let config: Configuration = serde_yaml::from_str(yaml).unwrap();
        let profile = config.compile().unwrap();
        assert_eq!(
            profile.rules[0],
            ResolvedRule::OneHop {
                column: "Related".to_string(),
                properties: vec!["http://example.org/related".to_string()],
                required_types: vec![],
            }
        );
    }
}
