pub mod config;
pub mod core;
pub mod error;
pub mod knowledge_graph;
pub mod utils;

pub use crate::config::{CompiledProfile, Configuration, ExtractionRule};
pub use crate::core::{AestheticTable, PathExtractor, Row, TableBuilder};
pub use crate::error::{Error, Result};
pub use crate::knowledge_graph::{GraphFormat, OntologyGraph, Term, Triple, TripleSource};
pub use crate::utils::{TableFormat, TableSerializer};
