pub mod extractor;
pub mod table;

pub use extractor::PathExtractor;
pub use table::{AestheticTable, Row, TableBuilder};
