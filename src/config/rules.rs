use serde::{Deserialize, Deserializer, Serialize};

use crate::config::vocabulary::Vocabulary;
use crate::error::{Error, Result};

/// One output column and the path that fills it, as written in a rules file.
///
/// Property and class references are unresolved strings here; see
/// [`ExtractionRule::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum ExtractionRule {
    /// Follow each property from the individual and label what it reaches.
    OneHop {
        column: String,
        #[serde(deserialize_with = "one_or_many")]
        properties: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        required_types: Vec<String>,
    },
    /// Follow `first_hop`, keep intermediate nodes whose label contains
    /// `keyword`, then follow `second_hop` from them.
    TwoHop {
        column: String,
        first_hop: String,
        keyword: String,
        second_hop: String,
    },
}

impl ExtractionRule {
    pub fn one_hop(column: &str, properties: &[&str]) -> Self {
        ExtractionRule::OneHop {
            column: column.to_string(),
            properties: properties.iter().map(|p| p.to_string()).collect(),
            required_types: Vec::new(),
        }
    }

    pub fn one_hop_typed(column: &str, properties: &[&str], required_types: &[&str]) -> Self {
        ExtractionRule::OneHop {
            column: column.to_string(),
            properties: properties.iter().map(|p| p.to_string()).collect(),
            required_types: required_types.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn two_hop(column: &str, first_hop: &str, keyword: &str, second_hop: &str) -> Self {
        ExtractionRule::TwoHop {
            column: column.to_string(),
            first_hop: first_hop.to_string(),
            keyword: keyword.to_string(),
            second_hop: second_hop.to_string(),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            ExtractionRule::OneHop { column, .. } | ExtractionRule::TwoHop { column, .. } => column,
        }
    }

    /// Check the rule shape and resolve every reference to an IRI.
    pub fn resolve(&self, vocabulary: &Vocabulary) -> Result<ResolvedRule> {
        if self.column().trim().is_empty() {
            return Err(Error::configuration("rule with an empty column name"));
        }

        let in_rule = |e: Error| match e {
            Error::Configuration(message) => {
                Error::Configuration(format!("column '{}': {}", self.column(), message))
            }
            other => other,
        };

        match self {
            ExtractionRule::OneHop {
                column,
                properties,
                required_types,
            } => {
                if properties.is_empty() {
                    return Err(Error::configuration(format!(
                        "column '{}': one-hop rule needs at least one property",
                        column
                    )));
                }
                let properties = properties
                    .iter()
                    .map(|p| vocabulary.resolve(p))
                    .collect::<Result<Vec<_>>>()
                    .map_err(in_rule)?;
                let required_types = required_types
                    .iter()
                    .map(|t| vocabulary.resolve(t))
                    .collect::<Result<Vec<_>>>()
                    .map_err(in_rule)?;

                Ok(ResolvedRule::OneHop {
                    column: column.clone(),
                    properties,
                    required_types,
                })
            }
            ExtractionRule::TwoHop {
                column,
                first_hop,
                keyword,
                second_hop,
            } => {
                if keyword.trim().is_empty() {
                    return Err(Error::configuration(format!(
                        "column '{}': two-hop rule needs a non-empty keyword",
                        column
                    )));
                }

                Ok(ResolvedRule::TwoHop {
                    column: column.clone(),
                    first_hop: vocabulary.resolve(first_hop).map_err(in_rule)?,
                    keyword: keyword.clone(),
                    second_hop: vocabulary.resolve(second_hop).map_err(in_rule)?,
                })
            }
        }
    }
}

/// An [`ExtractionRule`] with all references expanded to IRIs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedRule {
    OneHop {
        column: String,
        properties: Vec<String>,
        required_types: Vec<String>,
    },
    TwoHop {
        column: String,
        first_hop: String,
        keyword: String,
        second_hop: String,
    },
}

impl ResolvedRule {
    pub fn column(&self) -> &str {
        match self {
            ResolvedRule::OneHop { column, .. } | ResolvedRule::TwoHop { column, .. } => column,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}
