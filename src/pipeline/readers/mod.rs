// src/pipeline/readers/mod.rs

pub mod base_reader;
pub mod docx_reader;
pub mod file_reader;

pub use base_reader::BaseReader;
pub use file_reader::FileReader;
