use crate::config::prompts::{CLM_SYSTEM_PROMPT, COMMERCIAL_SYSTEM_PROMPT};
use crate::data_model::ExtractionRecord;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const FOLDER_PATH_COLUMN: &str = "Folder Path";
pub const FILE_NAME_COLUMN: &str = "File Name";
pub const SOURCE_LANGUAGE_COLUMN: &str = "Source Language";
pub const TIMESTAMP_COLUMN: &str = "Extraction Timestamp";
pub const CONFIDENCE_COLUMN: &str = "Confidence";
pub const NOTES_COLUMN: &str = "Notes";

/// Built-in field sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVariant {
    /// Twelve CLM ingestion fields with folder-aware identity columns.
    #[default]
    Clm,
    /// Twelve commercial-terms fields.
    Commercial,
}

impl SchemaVariant {
    pub fn schema(&self) -> ExtractionSchema {
        match self {
            SchemaVariant::Clm => ExtractionSchema::clm(),
            SchemaVariant::Commercial => ExtractionSchema::commercial(),
        }
    }
}

/// Post-extraction consistency check applied to every record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    /// Clear `clear_field` whenever `when_field` equals `equals` (case-insensitive).
    ClearWhenEquals {
        when_field: String,
        equals: String,
        clear_field: String,
    },
}

impl ValidationRule {
    pub fn apply(&self, record: &mut ExtractionRecord) {
        match self {
            ValidationRule::ClearWhenEquals {
                when_field,
                equals,
                clear_field,
            } => {
                let triggered = record
                    .fields
                    .get(when_field)
                    .map(|v| v.trim().eq_ignore_ascii_case(equals))
                    .unwrap_or(false);
                if triggered && record.fields.get(clear_field).is_some() {
                    record.fields.set(clear_field, None);
                    record.append_note(&format!(
                        "{} removed because {} is {}.",
                        clear_field, when_field, equals
                    ));
                }
            }
        }
    }
}

/// Everything the pipeline needs to know about one field set.
#[derive(Debug, Clone)]
pub struct ExtractionSchema {
    pub name: String,
    /// Field names in output order.
    pub fields: Vec<String>,
    /// Fields whose absence is called out in quality warnings.
    pub critical_fields: Vec<String>,
    /// Field overwritten with the literal document name after extraction.
    pub file_name_field: Option<String>,
    /// Emit a separate folder column ahead of the file name.
    pub split_folder_path: bool,
    pub system_prompt: String,
    /// Appended to every extraction request.
    pub extra_instructions: Option<String>,
    pub rules: Vec<ValidationRule>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl ExtractionSchema {
    pub fn clm() -> Self {
        ExtractionSchema {
            name: "clm".to_string(),
            fields: owned(&[
                "Original File Name",
                "Counterparty Legal Entity Name",
                "Internal Contracting Entity",
                "Contract Type",
                "Term Type",
                "Effective Date",
                "Expiration Date",
                "Governing Law",
                "Payment Term",
                "Contract Name",
                "Scope Category level 1",
                "Related Master Agreement",
            ]),
            critical_fields: owned(&[
                "Internal Contracting Entity",
                "Counterparty Legal Entity Name",
                "Effective Date",
                "Contract Type",
            ]),
            file_name_field: Some("Original File Name".to_string()),
            split_folder_path: true,
            system_prompt: CLM_SYSTEM_PROMPT.to_string(),
            extra_instructions: Some(
                "For \"Related Master Agreement\" use the form \"{Document Type} to: {Parent Agreement}\", \
                 for example \"Amendment to: Framework Agreement_03/15/2023\"."
                    .to_string(),
            ),
            rules: vec![ValidationRule::ClearWhenEquals {
                when_field: "Term Type".to_string(),
                equals: "Perpetual".to_string(),
                clear_field: "Expiration Date".to_string(),
            }],
        }
    }

    pub fn commercial() -> Self {
        ExtractionSchema {
            name: "commercial".to_string(),
            fields: owned(&[
                "Customer (CK) Entity",
                "Supplier Entity",
                "Effective Date",
                "Expiration Date",
                "Term Type",
                "Governing Law",
                "Contract Type",
                "Contract Currency",
                "Payment Term",
                "Termination for Convenience",
                "Notice Period for Termination for Convenience",
                "Party with the Right to Terminate for Convenience",
            ]),
            critical_fields: owned(&["Customer (CK) Entity", "Supplier Entity", "Effective Date"]),
            file_name_field: None,
            split_folder_path: false,
            system_prompt: COMMERCIAL_SYSTEM_PROMPT.to_string(),
            extra_instructions: None,
            rules: Vec::new(),
        }
    }

    pub fn identity_columns(&self) -> Vec<&'static str> {
        if self.split_folder_path {
            vec![FOLDER_PATH_COLUMN, FILE_NAME_COLUMN]
        } else {
            vec![FILE_NAME_COLUMN]
        }
    }

    /// Report header: identity, language, timestamp, schema fields, confidence, notes.
    pub fn output_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .identity_columns()
            .into_iter()
            .map(str::to_string)
            .collect();
        columns.push(SOURCE_LANGUAGE_COLUMN.to_string());
        columns.push(TIMESTAMP_COLUMN.to_string());
        columns.extend(self.fields.iter().cloned());
        columns.push(CONFIDENCE_COLUMN.to_string());
        columns.push(NOTES_COLUMN.to_string());
        columns
    }

    pub fn apply_rules(&self, record: &mut ExtractionRecord) {
        for rule in &self.rules {
            rule.apply(record);
        }
    }

    pub fn missing_fields(&self, record: &ExtractionRecord) -> Vec<String> {
        self.fields
            .iter()
            .filter(|f| record.fields.get(f).is_none())
            .cloned()
            .collect()
    }

    pub fn missing_critical_fields(&self, record: &ExtractionRecord) -> Vec<String> {
        self.critical_fields
            .iter()
            .filter(|f| record.fields.get(f).is_none())
            .cloned()
            .collect()
    }
}
