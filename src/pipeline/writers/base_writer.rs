use std::collections::HashMap;

use crate::error::Result;

/// One report row keyed by column name.
pub type ReportRow = HashMap<String, String>;

/// Trait for writing batches of report rows to an output sink (e.g. file).
pub trait BaseWriter {
    /// Write a batch of rows to the sink.
    fn write_rows(&mut self, rows: &[ReportRow]) -> Result<()>;

    /// Finalize and close the output writer.
    fn close(self) -> Result<()>;
}
