use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::vocabulary::RDF_TYPE;
use crate::config::CompiledProfile;
use crate::core::extractor::PathExtractor;
use crate::knowledge_graph::{Term, TripleSource};

/// One individual's cells, aligned with [`AestheticTable::columns`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub individual: String,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AestheticTable {
    pub profile: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub generated_at: DateTime<Utc>,
    pub processing_time_seconds: f64,
}

impl AestheticTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell of `row` under `column`, if both exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(index))
            .map(String::as_str)
    }

    /// The row whose name column equals `name`.
    pub fn find_row(&self, name: &str) -> Option<&Row> {
        self.rows
            .iter()
            .find(|row| row.cells.first().map(String::as_str) == Some(name))
    }

    pub fn get<'r>(&self, row: &'r Row, column: &str) -> Option<&'r str> {
        let index = self.column_index(column)?;
        row.cells.get(index).map(String::as_str)
    }
}

/// Builds one row per individual of the profile's target class.
pub struct TableBuilder<'a, G: TripleSource + ?Sized> {
    graph: &'a G,
    extractor: PathExtractor<'a, G>,
}

impl<'a, G: TripleSource + ?Sized> TableBuilder<'a, G> {
    pub fn new(graph: &'a G, profile: &'a CompiledProfile) -> Self {
        Self {
            graph,
            extractor: PathExtractor::new(graph, profile),
        }
    }

    pub fn build(&self) -> AestheticTable {
        let start_time = Instant::now();
        let profile = self.extractor.profile();
        let columns = profile.columns();

        let individuals = self.graph.subjects(RDF_TYPE, &Term::iri(&profile.target_class));
        info!(
            "Found {} individuals of {}",
            individuals.len(),
            profile.vocabulary.compact(&profile.target_class)
        );
        if individuals.is_empty() {
            warn!("No individuals of {} in the graph", profile.target_class);
        }

        let rows: Vec<Row> = individuals
            .into_iter()
            .map(|individual| self.build_row(individual))
            .collect();

        let processing_time = start_time.elapsed().as_secs_f64();
        info!(
            "Built table with {} rows and {} columns in {:.3}s",
            rows.len(),
            columns.len(),
            processing_time
        );

        AestheticTable {
            profile: profile.name.clone(),
            columns,
            rows,
            generated_at: Utc::now(),
            processing_time_seconds: processing_time,
        }
    }

    pub fn build_row(&self, individual: &Term) -> Row {
        let profile = self.extractor.profile();
        let mut cells = Vec::with_capacity(profile.rules.len() + 2);

        cells.push(self.extractor.value_or_default(individual, &profile.name_property));
        cells.push(
            self.extractor
                .value_or_default(individual, &profile.description_property),
        );

        for rule in &profile.rules {
            cells.push(self.extractor.extract(individual, rule));
        }

        debug!("Row for {}: {:?}", individual, cells);

        Row {
            individual: individual.lexical(),
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::vocabulary::RDFS_LABEL;
    use crate::config::Configuration;
    use crate::knowledge_graph::{OntologyGraph, Triple};

    const WS: &str = "http://webprotege.stanford.edu/";

    fn node(local: &str) -> Term {
        Term::iri(format!("{}{}", WS, local))
    }

    fn graph() -> OntologyGraph {
        OntologyGraph::from_triples(vec![
            Triple::new(node("Y2K"), RDF_TYPE, node("Aesthetic")),
            Triple::new(node("Y2K"), format!("{}hasName", WS), Term::literal("Y2K")),
            Triple::new(node("Y2K"), format!("{}influencedBy", WS), node("Retro")),
            Triple::new(node("Retro"), RDFS_LABEL, Term::literal("Retro-futurism")),
            Triple::new(node("Cottagecore"), RDF_TYPE, node("Aesthetic")),
            Triple::new(node("Retro"), RDF_TYPE, node("Influence")),
        ])
    }

    #[test]
    fn test_one_row_per_individual_with_same_columns() {
        let graph = graph();
        let profile = Configuration::canonical().compile().unwrap();
        let table = TableBuilder::new(&graph, &profile).build();

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns, profile.columns());
        for row in &table.rows {
            assert_eq!(row.cells.len(), table.columns.len());
        }
        assert_eq!(table.profile, "Aesthetics dataset");
    }

    #[test]
    fn test_cells_and_placeholders() {
        let graph = graph();
        let profile = Configuration::canonical().compile().unwrap();
        let table = TableBuilder::new(&graph, &profile).build();

        let y2k = table.find_row("Y2K").unwrap();
        assert_eq!(y2k.individual, format!("{}Y2K", WS));
        assert_eq!(table.get(y2k, "Influence"), Some("Retro-futurism"));
        assert_eq!(table.get(y2k, "Description"), Some(" "));
        assert_eq!(table.get(y2k, "Emotion"), Some(" "));

        // Cottagecore has no hasName triple
        assert_eq!(table.cell(1, "Aesthetic"), Some(" "));
        assert_eq!(table.cell(1, "Missing column"), None);
    }

    #[test]
    fn test_empty_graph_builds_empty_table() {
        let graph = OntologyGraph::new();
        let profile = Configuration::canonical().compile().unwrap();
        let table = TableBuilder::new(&graph, &profile).build();

        assert!(table.is_empty());
        assert_eq!(table.columns.len(), 15);
    }
}
