use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::vocabulary::RDF_TYPE;
use crate::error::{Error, Result};

pub mod turtle_loader;

/// An RDF node or value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    NamedNode(String),
    BlankNode(String),
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl Term {
    pub fn iri(iri: impl Into<String>) -> Self {
        Term::NamedNode(iri.into())
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Term::BlankNode(id.into())
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            datatype: None,
            language: None,
        })
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal(Literal {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    /// Plain string form used in table cells: the lexical value of a literal,
    /// the IRI of a named node, `_:id` for a blank node.
    pub fn lexical(&self) -> String {
        match self {
            Term::NamedNode(iri) => iri.clone(),
            Term::BlankNode(id) => format!("_:{}", id),
            Term::Literal(literal) => literal.value.clone(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::NamedNode(iri) => write!(f, "<{}>", iri),
            Term::BlankNode(id) => write!(f, "_:{}", id),
            Term::Literal(literal) => {
                write!(f, "\"{}\"", literal.value.replace('"', "\\\""))?;
                if let Some(language) = &literal.language {
                    write!(f, "@{}", language)
                } else if let Some(datatype) = &literal.datatype {
                    write!(f, "^^<{}>", datatype)
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: impl Into<String>, object: Term) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
        }
    }

    pub fn to_ntriple(&self) -> String {
        format!("{} <{}> {} .", self.subject, self.predicate, self.object)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GraphFormat {
    Turtle,
    NTriples,
}

impl GraphFormat {
    /// Infer the serialization from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "ttl" | "turtle" => Ok(GraphFormat::Turtle),
            "nt" | "ntriples" => Ok(GraphFormat::NTriples),
            _ => Err(Error::UnsupportedFormat(format!(
                "cannot infer RDF format of {} (expected .ttl or .nt)",
                path.display()
            ))),
        }
    }
}

impl FromStr for GraphFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "turtle" | "ttl" => Ok(GraphFormat::Turtle),
            "ntriples" | "n-triples" | "nt" => Ok(GraphFormat::NTriples),
            other => Err(Error::UnsupportedFormat(format!(
                "{}. Supported: turtle, ntriples",
                other
            ))),
        }
    }
}

impl fmt::Display for GraphFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphFormat::Turtle => write!(f, "turtle"),
            GraphFormat::NTriples => write!(f, "n-triples"),
        }
    }
}

/// Read access to a set of triples.
///
/// Enumeration order is whatever the backend stores; callers must not depend
/// on it for correctness.
pub trait TripleSource {
    /// All subjects `s` with a triple `(s, predicate, object)`.
    fn subjects(&self, predicate: &str, object: &Term) -> Vec<&Term>;

    /// All objects `o` with a triple `(subject, predicate, o)`.
    fn objects(&self, subject: &Term, predicate: &str) -> Vec<&Term>;

    fn contains(&self, subject: &Term, predicate: &str, object: &Term) -> bool;

    /// Any one object of `(subject, predicate)`.
    fn value(&self, subject: &Term, predicate: &str) -> Option<&Term> {
        self.objects(subject, predicate).into_iter().next()
    }

    fn has_type(&self, node: &Term, class_iri: &str) -> bool {
        self.contains(node, RDF_TYPE, &Term::iri(class_iri))
    }
}

/// Immutable in-memory triple graph indexed by subject and by
/// (predicate, object). Triples keep document order; exact duplicates are
/// stored once.
#[derive(Debug, Default)]
pub struct OntologyGraph {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
    by_subject: HashMap<Term, HashMap<String, Vec<usize>>>,
    by_predicate: HashMap<String, HashMap<Term, Vec<usize>>>,
}

impl OntologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an RDF file from disk.
    pub fn load<P: AsRef<Path>>(path: P, format: GraphFormat) -> Result<Self> {
        Self::load_with_base(path, format, None)
    }

    pub fn load_with_base<P: AsRef<Path>>(
        path: P,
        format: GraphFormat,
        base_iri: Option<&str>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        let graph = turtle_loader::parse(BufReader::new(file), format, base_iri)
            .map_err(|message| Error::GraphParse {
                path: path.to_path_buf(),
                message,
            })?;

        info!(
            "Loaded {} triples from {} ({})",
            graph.len(),
            path.display(),
            format
        );
        Ok(graph)
    }

    /// Parse a document from any buffered reader. `base_iri` resolves relative
    /// IRIs in Turtle input.
    pub fn from_reader<R: BufRead>(
        reader: R,
        format: GraphFormat,
        base_iri: Option<&str>,
    ) -> Result<Self> {
        turtle_loader::parse(reader, format, base_iri).map_err(|message| Error::GraphParse {
            path: "<reader>".into(),
            message,
        })
    }

    pub fn parse_str(document: &str, format: GraphFormat) -> Result<Self> {
        Self::from_reader(document.as_bytes(), format, None)
    }

    pub fn from_triples<I: IntoIterator<Item = Triple>>(triples: I) -> Self {
        let mut graph = Self::new();
        for triple in triples {
            graph.insert(triple);
        }
        graph
    }

    /// Returns `false` when the triple was already present.
    pub(crate) fn insert(&mut self, triple: Triple) -> bool {
        if self.seen.contains(&triple) {
            debug!("Skipping duplicate triple: {}", triple.to_ntriple());
            return false;
        }

        let index = self.triples.len();
        self.by_subject
            .entry(triple.subject.clone())
            .or_default()
            .entry(triple.predicate.clone())
            .or_default()
            .push(index);
        self.by_predicate
            .entry(triple.predicate.clone())
            .or_default()
            .entry(triple.object.clone())
            .or_default()
            .push(index);
        self.seen.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn triples(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Subjects typed as `class_iri`, in document order.
    pub fn individuals_of(&self, class_iri: &str) -> Vec<&Term> {
        self.subjects(RDF_TYPE, &Term::iri(class_iri))
    }

    pub fn statistics(&self) -> GraphStatistics {
        let mut unique_subjects = HashSet::new();
        let mut unique_predicates = HashSet::new();
        let mut unique_objects = HashSet::new();
        let mut literal_objects = 0;

        for triple in self.triples() {
            unique_subjects.insert(&triple.subject);
            unique_predicates.insert(&triple.predicate);
            unique_objects.insert(&triple.object);
            if triple.object.is_literal() {
                literal_objects += 1;
            }
        }

        GraphStatistics {
            total_triples: self.triples.len(),
            unique_subjects: unique_subjects.len(),
            unique_predicates: unique_predicates.len(),
            unique_objects: unique_objects.len(),
            literal_objects,
        }
    }
}

impl TripleSource for OntologyGraph {
    fn subjects(&self, predicate: &str, object: &Term) -> Vec<&Term> {
        self.by_predicate
            .get(predicate)
            .and_then(|objects| objects.get(object))
            .map(|indices| indices.iter().map(|&i| &self.triples[i].subject).collect())
            .unwrap_or_default()
    }

    fn objects(&self, subject: &Term, predicate: &str) -> Vec<&Term> {
        self.by_subject
            .get(subject)
            .and_then(|predicates| predicates.get(predicate))
            .map(|indices| indices.iter().map(|&i| &self.triples[i].object).collect())
            .unwrap_or_default()
    }

    fn contains(&self, subject: &Term, predicate: &str, object: &Term) -> bool {
        self.by_subject
            .get(subject)
            .and_then(|predicates| predicates.get(predicate))
            .map(|indices| indices.iter().any(|&i| &self.triples[i].object == object))
            .unwrap_or(false)
    }

    fn value(&self, subject: &Term, predicate: &str) -> Option<&Term> {
        self.by_subject
            .get(subject)
            .and_then(|predicates| predicates.get(predicate))
            .and_then(|indices| indices.first())
            .map(|&i| &self.triples[i].object)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub total_triples: usize,
    pub unique_subjects: usize,
    pub unique_predicates: usize,
    pub unique_objects: usize,
    pub literal_objects: usize,
}

impl fmt::Display for GraphStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Graph Statistics:\n\
             Total Triples: {}\n\
             Unique Subjects: {}\n\
             Unique Predicates: {}\n\
             Unique Objects: {}\n\
             Literal Objects: {}",
            self.total_triples,
            self.unique_subjects,
            self.unique_predicates,
            self.unique_objects,
            self.literal_objects
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EX: &str = "http://example.org/";

    fn ex(local: &str) -> Term {
        Term::iri(format!("{}{}", EX, local))
    }

    fn ex_p(local: &str) -> String {
        format!("{}{}", EX, local)
    }

    fn sample() -> OntologyGraph {
        OntologyGraph::from_triples(vec![
            Triple::new(ex("y2k"), RDF_TYPE, ex("Aesthetic")),
            Triple::new(ex("y2k"), ex_p("influencedBy"), ex("retro")),
            Triple::new(ex("y2k"), ex_p("influencedBy"), ex("internet")),
            Triple::new(ex("y2k"), ex_p("influencedBy"), ex("retro")),
            Triple::new(ex("cottagecore"), RDF_TYPE, ex("Aesthetic")),
            Triple::new(ex("retro"), ex_p("label"), Term::literal("Retro-futurism")),
        ])
    }

    #[test]
    fn test_duplicate_triples_stored_once() {
        let graph = sample();
        assert_eq!(graph.len(), 5);
        assert_eq!(graph.objects(&ex("y2k"), &ex_p("influencedBy")).len(), 2);
    }

    #[test]
    fn test_objects_keep_insertion_order() {
        let graph = sample();
        let objects = graph.objects(&ex("y2k"), &ex_p("influencedBy"));
        assert_eq!(objects, vec![&ex("retro"), &ex("internet")]);
    }

    #[test]
    fn test_subjects_and_individuals() {
        let graph = sample();
        let individuals = graph.individuals_of(&ex_p("Aesthetic"));
        assert_eq!(individuals, vec![&ex("y2k"), &ex("cottagecore")]);
        assert!(graph.subjects(RDF_TYPE, &ex("Missing")).is_empty());
    }

    #[test]
    fn test_value_and_contains() {
        let graph = sample();
        assert_eq!(
            graph.value(&ex("retro"), &ex_p("label")),
            Some(&Term::literal("Retro-futurism"))
        );
        assert_eq!(graph.value(&ex("internet"), &ex_p("label")), None);
        assert!(graph.contains(&ex("y2k"), RDF_TYPE, &ex("Aesthetic")));
        assert!(!graph.contains(&ex("retro"), RDF_TYPE, &ex("Aesthetic")));
        assert!(graph.has_type(&ex("cottagecore"), &ex_p("Aesthetic")));
    }

    #[test]
    fn test_statistics() {
        let stats = sample().statistics();
        assert_eq!(stats.total_triples, 5);
        assert_eq!(stats.unique_subjects, 3);
        assert_eq!(stats.unique_predicates, 3);
        assert_eq!(stats.literal_objects, 1);
        assert!(stats.to_string().contains("Total Triples: 5"));
    }

    #[test]
    fn test_format_inference() {
        assert_eq!(
            GraphFormat::from_path(Path::new("onto/core.ttl")).unwrap(),
            GraphFormat::Turtle
        );
        assert_eq!(
            GraphFormat::from_path(Path::new("dump.NT")).unwrap(),
            GraphFormat::NTriples
        );
        assert!(matches!(
            GraphFormat::from_path(Path::new("onto.owl")),
            Err(Error::UnsupportedFormat(_))
        ));
        assert_eq!("n-triples".parse::<GraphFormat>().unwrap(), GraphFormat::NTriples);
        assert!("rdfxml".parse::<GraphFormat>().is_err());
    }

    #[test]
    fn test_term_display() {
        assert_eq!(ex("a").to_string(), "<http://example.org/a>");
        assert_eq!(Term::lang_literal("hi", "en").to_string(), "\"hi\"@en");
        assert_eq!(Term::blank("b0").lexical(), "_:b0");
    }
}
