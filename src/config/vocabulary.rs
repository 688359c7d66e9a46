use std::collections::BTreeMap;

use crate::error::{Error, Result};

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const WEBPROTEGE_NS: &str = "http://webprotege.stanford.edu/";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const DC_DESCRIPTION: &str = "http://purl.org/dc/elements/1.1/description";

/// IRI lookup table shared by every rule of a run.
///
/// References are accepted in three shapes: a full IRI (optionally wrapped in
/// `<...>`), a `prefix:local` name, or a bare local name that is appended to
/// the ontology namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    namespace: String,
    prefixes: BTreeMap<String, String>,
}

impl Vocabulary {
    pub fn new(namespace: impl Into<String>) -> Self {
        let mut prefixes = BTreeMap::new();
        prefixes.insert("rdf".to_string(), RDF_NS.to_string());
        prefixes.insert("rdfs".to_string(), RDFS_NS.to_string());
        prefixes.insert("owl".to_string(), OWL_NS.to_string());
        prefixes.insert("xsd".to_string(), XSD_NS.to_string());
        prefixes.insert("dc".to_string(), DC_NS.to_string());

        Self {
            namespace: namespace.into(),
            prefixes,
        }
    }

    /// Register an extra prefix; an existing binding is replaced.
    pub fn with_prefix(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into(), namespace.into());
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn prefixes(&self) -> &BTreeMap<String, String> {
        &self.prefixes
    }

    /// Turn a property or class reference into an absolute IRI.
    pub fn resolve(&self, reference: &str) -> Result<String> {
        let reference = reference.trim();

        if reference.is_empty() {
            return Err(Error::configuration("empty property or class reference"));
        }

        if let Some(iri) = reference.strip_prefix('<').and_then(|r| r.strip_suffix('>')) {
            return Ok(iri.to_string());
        }

        if is_absolute_iri(reference) {
            return Ok(reference.to_string());
        }

        match reference.split_once(':') {
            Some((prefix, local)) => {
                let namespace = self.prefixes.get(prefix).ok_or_else(|| {
                    Error::configuration(format!(
                        "unknown prefix '{}' in reference '{}'",
                        prefix, reference
                    ))
                })?;
                Ok(format!("{}{}", namespace, local))
            }
            None => {
                if self.namespace.is_empty() {
                    return Err(Error::configuration(format!(
                        "cannot resolve '{}': no ontology namespace configured",
                        reference
                    )));
                }
                Ok(format!("{}{}", self.namespace, reference))
            }
        }
    }

    /// Shorten an IRI to `prefix:local` (or a bare local name for the ontology
    /// namespace) for log and preview output.
    pub fn compact(&self, iri: &str) -> String {
        if !self.namespace.is_empty() {
            if let Some(local) = iri.strip_prefix(self.namespace.as_str()) {
                return local.to_string();
            }
        }
        for (prefix, namespace) in &self.prefixes {
            if let Some(local) = iri.strip_prefix(namespace.as_str()) {
                return format!("{}:{}", prefix, local);
            }
        }
        format!("<{}>", iri)
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(WEBPROTEGE_NS)
    }
}

fn is_absolute_iri(reference: &str) -> bool {
    reference.starts_with("http://")
        || reference.starts_with("https://")
        || reference.starts_with("urn:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_reference_shapes() {
        let vocab = Vocabulary::default();

        assert_eq!(
            vocab.resolve("hasName").unwrap(),
            "http://webprotege.stanford.edu/hasName"
        );
        assert_eq!(vocab.resolve("rdfs:label").unwrap(), RDFS_LABEL);
        assert_eq!(vocab.resolve("dc:description").unwrap(), DC_DESCRIPTION);
        assert_eq!(
            vocab.resolve("<http://example.org/p>").unwrap(),
            "http://example.org/p"
        );
        assert_eq!(
            vocab.resolve("http://example.org/q").unwrap(),
            "http://example.org/q"
        );
    }

    #[test]
    fn test_unknown_prefix_is_configuration_error() {
        let vocab = Vocabulary::default();
        let err = vocab.resolve("foaf:name").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("foaf"));
    }

    #[test]
    fn test_custom_prefix() {
        let vocab = Vocabulary::default().with_prefix("foaf", "http://xmlns.com/foaf/0.1/");
        assert_eq!(
            vocab.resolve("foaf:name").unwrap(),
            "http://xmlns.com/foaf/0.1/name"
        );
        assert_eq!(
            vocab.prefixes().get("foaf").map(String::as_str),
            Some("http://xmlns.com/foaf/0.1/")
        );
        assert!(vocab.prefixes().contains_key("rdfs"));
    }

    #[test]
    fn test_empty_reference_rejected() {
        assert!(Vocabulary::default().resolve("  ").is_err());
    }

    #[test]
    fn test_compact() {
        let vocab = Vocabulary::default();
        assert_eq!(vocab.compact("http://webprotege.stanford.edu/Aesthetic"), "Aesthetic");
        assert_eq!(vocab.compact(RDF_TYPE), "rdf:type");
        assert_eq!(vocab.compact("http://other.org/x"), "<http://other.org/x>");
    }
}
