#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use ContractBlaster::config::pipeline::*;
    use ContractBlaster::config::schema::SchemaVariant;
    use ContractBlaster::error::PipelineError;

    // Helper to create a temporary config file with given content
    fn create_temp_config_file(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "{}", content).expect("Failed to write to temp file");
        temp_file
    }

    #[test]
    fn test_load_valid_config() {
        let yaml_content = r#"
schema: commercial
max_workers: 4
max_retries: 5
retry_delay_secs: 0.5
use_two_call_for_pdfs: false
translation_char_budget: 50000
markdown_container: contract-text
llm_deployment: gpt-4o-mini
        "#;
        let temp_file = create_temp_config_file(yaml_content);
        let config_result = load_pipeline_config(temp_file.path());

        assert!(
            config_result.is_ok(),
            "Should load valid config: {:?}",
            config_result.err()
        );
        let config = config_result.unwrap();
        assert_eq!(config.schema, SchemaVariant::Commercial);
        assert_eq!(config.max_workers, 4);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_delay(), std::time::Duration::from_millis(500));
        assert!(!config.use_two_call_for_pdfs);
        assert_eq!(config.translation_char_budget, 50_000);
        assert_eq!(config.markdown_container, "contract-text");
        assert_eq!(config.llm_deployment.as_deref(), Some("gpt-4o-mini"));
        // Untouched keys keep their defaults.
        assert!(config.parallel);
        assert_eq!(config.direct_char_budget, 16_000);
    }

    #[test]
    fn test_load_empty_file_gives_defaults() {
        let temp_file = create_temp_config_file("");
        let config = load_pipeline_config(temp_file.path()).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_load_invalid_yaml_syntax() {
        let temp_file = create_temp_config_file("max_workers: [1, 2\nschema: clm");
        let result = load_pipeline_config(temp_file.path());
        assert!(matches!(result, Err(PipelineError::ConfigError(_))));
    }

    #[test]
    fn test_load_unknown_schema() {
        let temp_file = create_temp_config_file("schema: procurement");
        let result = load_pipeline_config(temp_file.path());
        match result {
            Err(PipelineError::ConfigError(msg)) => {
                assert!(msg.contains("procurement") || msg.contains("schema"))
            }
            other => panic!("Expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_pipeline_config("does/not/exist.yaml");
        match result {
            Err(PipelineError::ConfigError(msg)) => assert!(msg.contains("does/not/exist.yaml")),
            other => panic!("Expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn test_env_overrides_win_over_file() {
        let temp_file = create_temp_config_file("max_workers: 4\nsave_markdown: true");
        let mut config = load_pipeline_config(temp_file.path()).unwrap();
        let env: HashMap<&str, &str> = HashMap::from([
            ("MAX_WORKERS", "12"),
            ("SAVE_MARKDOWN", "false"),
            ("RETRY_DELAY", "1.5"),
        ]);
        config.apply_overrides_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.max_workers, 12);
        assert!(!config.save_markdown);
        assert_eq!(config.retry_delay_secs, 1.5);
        assert!(config.validate().is_ok());
    }
}
