pub mod base_writer;
pub mod csv_writer;
pub mod failure_list;
pub mod markdown_archive;

pub use base_writer::{BaseWriter, ReportRow};
pub use csv_writer::CsvSink;
pub use failure_list::{failure_list_path, write_failure_list};
pub use markdown_archive::MarkdownArchive;
