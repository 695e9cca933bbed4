use std::fs::File;
use std::path::Path;

use crate::error::Result;
use crate::pipeline::writers::base_writer::{BaseWriter, ReportRow};

/// Writes rows to a CSV file with a fixed column order. Keys outside the
/// column list are ignored and absent keys become empty cells.
pub struct CsvSink {
    columns: Vec<String>,
    writer: csv::Writer<File>,
}

impl CsvSink {
    /// Creates the file and writes the header row.
    pub fn new<P: AsRef<Path>>(path: P, columns: Vec<String>) -> Result<Self> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&columns)?;
        Ok(CsvSink { columns, writer })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl BaseWriter for CsvSink {
    fn write_rows(&mut self, rows: &[ReportRow]) -> Result<()> {
        for row in rows {
            let record = self
                .columns
                .iter()
                .map(|c| row.get(c).map(String::as_str).unwrap_or(""));
            self.writer.write_record(record)?;
        }
        Ok(())
    }

    fn close(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
