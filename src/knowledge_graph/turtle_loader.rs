//! Turtle / N-Triples parsing through Rio.

use std::io::BufRead;

use oxiri::Iri;
use rio_api::model::{Literal as RioLiteral, Subject, Term as RioTerm, Triple as RioTriple};
use rio_api::parser::TriplesParser;
use rio_turtle::{NTriplesParser, TurtleError, TurtleParser};
use tracing::{debug, warn};

use super::{GraphFormat, Literal, OntologyGraph, Term, Triple};

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// Parse a whole document into a graph. Errors carry the parser message,
/// including the position Rio reports.
pub(crate) fn parse<R: BufRead>(
    reader: R,
    format: GraphFormat,
    base_iri: Option<&str>,
) -> Result<OntologyGraph, String> {
    let mut graph = OntologyGraph::new();
    let mut skipped = 0usize;

    let mut on_triple = |triple: RioTriple<'_>| -> Result<(), TurtleError> {
        match convert_triple(&triple) {
            Some(converted) => {
                graph.insert(converted);
            }
            None => {
                debug!("Skipping RDF-star statement: {}", triple);
                skipped += 1;
            }
        }
        Ok(())
    };

    match format {
        GraphFormat::Turtle => {
            let base = base_iri
                .map(|base| Iri::parse(base.to_string()))
                .transpose()
                .map_err(|e| format!("invalid base IRI: {}", e))?;
            TurtleParser::new(reader, base)
                .parse_all(&mut on_triple)
                .map_err(|e| e.to_string())?;
        }
        GraphFormat::NTriples => {
            NTriplesParser::new(reader)
                .parse_all(&mut on_triple)
                .map_err(|e| e.to_string())?;
        }
    }

    if skipped > 0 {
        warn!("Ignored {} quoted-triple statements", skipped);
    }

    Ok(graph)
}

fn convert_triple(triple: &RioTriple<'_>) -> Option<Triple> {
    let subject = match triple.subject {
        Subject::NamedNode(node) => Term::iri(node.iri),
        Subject::BlankNode(node) => Term::blank(node.id),
        Subject::Triple(_) => return None,
    };

    let object = match triple.object {
        RioTerm::NamedNode(node) => Term::iri(node.iri),
        RioTerm::BlankNode(node) => Term::blank(node.id),
        RioTerm::Literal(literal) => Term::Literal(convert_literal(literal)),
        RioTerm::Triple(_) => return None,
    };

    Some(Triple::new(subject, triple.predicate.iri, object))
}

fn convert_literal(literal: RioLiteral<'_>) -> Literal {
    match literal {
        RioLiteral::Simple { value } => Literal {
            value: value.to_string(),
            datatype: None,
            language: None,
        },
        RioLiteral::LanguageTaggedString { value, language } => Literal {
            value: value.to_string(),
            datatype: None,
            language: Some(language.to_string()),
        },
        RioLiteral::Typed { value, datatype } => Literal {
            value: value.to_string(),
            datatype: (datatype.iri != XSD_STRING).then(|| datatype.iri.to_string()),
            language: None,
        },
    }
}
