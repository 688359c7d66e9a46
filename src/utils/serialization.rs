use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::AestheticTable;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableFormat {
    Csv,
    Tsv,
    Json,
}

impl TableFormat {
    /// Format implied by an output file extension; unknown extensions fall
    /// back to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("tsv") | Some("tab") => TableFormat::Tsv,
            Some("json") => TableFormat::Json,
            _ => TableFormat::Csv,
        }
    }
}

impl FromStr for TableFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(TableFormat::Csv),
            "tsv" => Ok(TableFormat::Tsv),
            "json" => Ok(TableFormat::Json),
            other => Err(Error::UnsupportedFormat(format!(
                "{}. Supported: csv, tsv, json",
                other
            ))),
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableFormat::Csv => "csv",
            TableFormat::Tsv => "tsv",
            TableFormat::Json => "json",
        };
        write!(f, "{}", name)
    }
}

pub struct TableSerializer;

impl TableSerializer {
    pub fn new() -> Self {
        Self
    }

    pub fn write<W: Write>(&self, table: &AestheticTable, format: TableFormat, writer: W) -> Result<()> {
        match format {
            TableFormat::Csv => self.write_delimited(table, b',', writer),
            TableFormat::Tsv => self.write_delimited(table, b'\t', writer),
            TableFormat::Json => self.write_json(table, writer),
        }
    }

    pub fn serialize(&self, table: &AestheticTable, format: TableFormat) -> Result<String> {
        let mut buffer = Vec::new();
        self.write(table, format, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    pub fn write_to_path<P: AsRef<Path>>(
        &self,
        table: &AestheticTable,
        path: P,
        format: TableFormat,
    ) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write(table, format, &mut writer)?;
        writer.flush()?;

        info!(
            "Wrote {} rows to {} (format: {})",
            table.len(),
            path.display(),
            format
        );
        Ok(())
    }

    /// Header row plus one record per row; no index column.
    fn write_delimited<W: Write>(&self, table: &AestheticTable, delimiter: u8, writer: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);

        writer.write_record(&table.columns)?;
        for row in &table.rows {
            writer.write_record(&row.cells)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_json<W: Write>(&self, table: &AestheticTable, writer: W) -> Result<()> {
        let rows: Vec<serde_json::Value> = table
            .rows
            .iter()
            .map(|row| {
                let record: serde_json::Map<String, serde_json::Value> = table
                    .columns
                    .iter()
                    .zip(&row.cells)
                    .map(|(column, cell)| (column.clone(), serde_json::Value::String(cell.clone())))
                    .collect();
                serde_json::Value::Object(record)
            })
            .collect();

        let document = serde_json::json!({
            "profile": table.profile,
            "generated_at": table.generated_at.to_rfc3339(),
            "columns": table.columns,
            "rows": rows,
        });

        serde_json::to_writer_pretty(writer, &document)?;
        Ok(())
    }
}

impl Default for TableSerializer {
    fn default() -> Self {
        Self::new()
    }
}
