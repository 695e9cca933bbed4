use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// `<report>_failed_contracts.txt` next to the report. A `.csv` suffix is
/// replaced; any other name gets the suffix appended.
pub fn failure_list_path(report_path: &Path) -> PathBuf {
    let as_str = report_path.to_string_lossy();
    match as_str.strip_suffix(".csv") {
        Some(stem) => PathBuf::from(format!("{}_failed_contracts.txt", stem)),
        None => PathBuf::from(format!("{}_failed_contracts.txt", as_str)),
    }
}

/// Header, an 80 character rule, a blank line, then one identity per line.
pub fn write_failure_list(path: &Path, document_ids: &[String]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "Failed Contracts ({} total)", document_ids.len())?;
    writeln!(out, "{}", "=".repeat(80))?;
    writeln!(out)?;
    for id in document_ids {
        writeln!(out, "{}", id)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_derivation() {
        assert_eq!(
            failure_list_path(Path::new("out/sirion_metadata.csv")),
            PathBuf::from("out/sirion_metadata_failed_contracts.txt")
        );
        assert_eq!(
            failure_list_path(Path::new("report")),
            PathBuf::from("report_failed_contracts.txt")
        );
    }

    #[test]
    fn test_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        write_failure_list(&path, &["a.docx".to_string(), "b/c.pdf".to_string()]).unwrap();
        let expected = format!(
            "Failed Contracts (2 total)\n{}\n\na.docx\nb/c.pdf\n",
            "=".repeat(80)
        );
        assert_eq!(std::fs::read_to_string(&path).unwrap(), expected);
    }
}
