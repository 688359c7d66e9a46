pub mod serialization;

pub use serialization::{TableFormat, TableSerializer};
