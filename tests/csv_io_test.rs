// tests/csv_io_test.rs

use tempfile::tempdir;

use ContractBlaster::config::ExtractionSchema;
use ContractBlaster::data_model::{
    Confidence, ExtractionMethod, ExtractionRecord, FieldMap, ProcessingOutcome,
};
use ContractBlaster::report::BatchReport;

fn record(id: &str, values: &[(&str, &str)], notes: Option<&str>) -> ExtractionRecord {
    let schema = ExtractionSchema::clm();
    let mut fields = FieldMap::with_fields(schema.fields.iter().cloned());
    for (k, v) in values {
        fields.set(k, Some(v.to_string()));
    }
    ExtractionRecord {
        document_id: id.to_string(),
        fields,
        source_language: "da".to_string(),
        confidence: Confidence::Low,
        notes: notes.map(str::to_string),
        extraction_timestamp: "2024-06-11T09:30:00+00:00".to_string(),
        method: ExtractionMethod::TwoCallTranslation,
    }
}

#[test]
fn test_report_preserves_awkward_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sirion_metadata.csv");
    let schema = ExtractionSchema::clm();

    let report = BatchReport::new(vec![
        ProcessingOutcome::Success(record(
            "dk/Rammeaftale, \"Nord\".pdf",
            &[
                ("Counterparty Legal Entity Name", "Fjordline Handel A/S, Filial Sverige"),
                ("Related Master Agreement", "Amendment to: \"Rammeaftale 2019\""),
            ],
            Some("Line one.\nLine two."),
        )),
        ProcessingOutcome::Failure {
            document_id: "broken.docx".to_string(),
            error_message: "Read error: not a zip".to_string(),
        },
    ]);
    assert_eq!(report.write_csv(&path, &schema).unwrap(), 1);

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers: Vec<String> = reader.headers().unwrap().iter().map(str::to_string).collect();
    assert_eq!(headers, schema.output_columns());

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    let cell = |name: &str| {
        let idx = headers.iter().position(|h| h == name).unwrap();
        rows[0][idx].to_string()
    };
    assert_eq!(cell("Folder Path"), "dk");
    assert_eq!(cell("File Name"), "Rammeaftale, \"Nord\".pdf");
    assert_eq!(cell("Counterparty Legal Entity Name"), "Fjordline Handel A/S, Filial Sverige");
    assert_eq!(cell("Related Master Agreement"), "Amendment to: \"Rammeaftale 2019\"");
    assert_eq!(cell("Notes"), "Line one.\nLine two.");
    assert_eq!(cell("Confidence"), "low");
    assert_eq!(cell("Source Language"), "da");
    assert_eq!(cell("Expiration Date"), "");
}

#[test]
fn test_commercial_report_uses_full_identity() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("commercial.csv");
    let schema = ExtractionSchema::commercial();

    let mut fields = FieldMap::with_fields(schema.fields.iter().cloned());
    fields.set("Contract Currency", Some("SEK".to_string()));
    let report = BatchReport::new(vec![ProcessingOutcome::Success(ExtractionRecord {
        document_id: "kund/avtal.docx".to_string(),
        fields,
        source_language: "sv".to_string(),
        confidence: Confidence::High,
        notes: None,
        extraction_timestamp: "2024-06-11T09:30:00+00:00".to_string(),
        method: ExtractionMethod::Direct,
    })]);
    report.write_csv(&path, &schema).unwrap();

    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    let row = reader.records().next().unwrap().unwrap();
    assert_eq!(&headers[0], "File Name");
    assert_eq!(&row[0], "kund/avtal.docx");
    let currency = headers.iter().position(|h| h == "Contract Currency").unwrap();
    assert_eq!(&row[currency], "SEK");
}
