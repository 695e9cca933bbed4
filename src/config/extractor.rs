use std::path::PathBuf;

use clap::Parser;

use crate::config::pipeline::PipelineConfig;
use crate::config::schema::SchemaVariant;
use crate::orchestrator::DocumentSource;

/// Extract contract metadata into a CSV report.
///
/// With no FILE argument the tool asks where the contracts live (object
/// storage or a local folder). With a FILE it processes that one document and
/// prints the extracted record.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Process a single local contract and write <stem>_metadata.json
    pub file: Option<PathBuf>,

    /// Path to the pipeline configuration YAML file.
    #[arg(short = 'c', long)]
    pub pipeline_config: Option<PathBuf>,

    /// Field set to extract
    #[arg(long, value_enum)]
    pub schema: Option<SchemaVariant>,

    /// Maximum number of documents processed at once
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Process documents one at a time in enumeration order
    #[arg(long)]
    pub sequential: bool,

    /// Read contracts from this storage container instead of prompting
    #[arg(long, conflicts_with = "input_dir")]
    pub container: Option<String>,

    /// Read contracts from this local folder instead of prompting
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Report file name used together with --container or --input-dir
    #[arg(short = 'o', long, default_value = "sirion_metadata.csv")]
    pub output: PathBuf,

    /// Optional: Port for the Prometheus metrics HTTP endpoint
    #[arg(long)]
    pub metrics_port: Option<u16>,

    /// Also write JSON logs to daily files in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Validate the pipeline configuration and exit
    #[arg(long)]
    pub validate_config: bool,
}

impl Args {
    /// Command-line flags win over both the YAML file and the environment.
    pub fn apply_to(&self, config: &mut PipelineConfig) {
        if let Some(schema) = self.schema {
            config.schema = schema;
        }
        if let Some(workers) = self.workers {
            config.max_workers = workers;
        }
        if self.sequential {
            config.parallel = false;
        }
    }

    /// Batch source named on the command line; `None` means ask interactively.
    pub fn batch_source(&self) -> Option<DocumentSource> {
        if let Some(container) = &self.container {
            return Some(DocumentSource::ObjectStore {
                container: container.clone(),
            });
        }
        self.input_dir.clone().map(DocumentSource::LocalDirectory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "extractor",
            "--schema",
            "commercial",
            "-w",
            "3",
            "--sequential",
        ]);
        let mut config = PipelineConfig::default();
        args.apply_to(&mut config);
        assert_eq!(config.schema, SchemaVariant::Commercial);
        assert_eq!(config.max_workers, 3);
        assert!(!config.parallel);
        assert!(args.file.is_none());
    }

    #[test]
    fn test_positional_file() {
        let args = Args::parse_from(["extractor", "contract.pdf"]);
        assert_eq!(args.file, Some(PathBuf::from("contract.pdf")));
        assert!(args.batch_source().is_none());
    }

    #[test]
    fn test_batch_source_from_flags() {
        let args = Args::parse_from(["extractor", "--container", "contracts"]);
        assert_eq!(
            args.batch_source(),
            Some(DocumentSource::ObjectStore {
                container: "contracts".to_string()
            })
        );
        let args = Args::parse_from(["extractor", "--input-dir", "avtal", "-o", "r.csv"]);
        assert_eq!(
            args.batch_source(),
            Some(DocumentSource::LocalDirectory(PathBuf::from("avtal")))
        );
        assert_eq!(args.output, PathBuf::from("r.csv"));
    }

    #[test]
    fn test_container_conflicts_with_input_dir() {
        let result =
            Args::try_parse_from(["extractor", "--container", "docs", "--input-dir", "x"]);
        assert!(result.is_err());
    }
}
