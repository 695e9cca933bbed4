//! User-message templates for the extraction and translation calls.

use crate::config::schema::ExtractionSchema;

/// Extraction request over `text` (already truncated). The file name is
/// repeated so the model copies it instead of inventing a title.
pub fn extraction_message(
    schema: &ExtractionSchema,
    file_name: &str,
    text: &str,
    english: bool,
) -> String {
    let mut message = String::new();

    if let Some(field) = &schema.file_name_field {
        message.push_str(&format!(
            "The file name of this document is: {file_name}\n\
             Use \"{file_name}\" exactly as the \"{field}\" value. Do not derive a name from titles or headings.\n\n"
        ));
    } else {
        message.push_str(&format!("File name: {file_name}\n\n"));
    }

    if english {
        message.push_str("Extract metadata from this English translation of the contract.\n\n");
    } else {
        message.push_str(
            "Extract metadata from this contract and give every value in ENGLISH.\n\n",
        );
    }

    message.push_str("CONTRACT TEXT:\n");
    message.push_str(text);
    message.push_str("\n\n");
    message.push_str(&format!(
        "Return a JSON object with the {} fields listed in the instructions, plus source_language, confidence and extraction_notes.",
        schema.fields.len()
    ));

    if let Some(field) = &schema.file_name_field {
        message.push_str(&format!("\n\"{field}\" must be exactly: {file_name}"));
    }
    if let Some(extra) = &schema.extra_instructions {
        message.push('\n');
        message.push_str(extra);
    }
    message
}

/// Translation request over `text` (already truncated).
pub fn translation_message(text: &str) -> String {
    format!(
        "Translate this contract into English. Keep every company name as written, \
         give dates as YYYY-MM-DD, keep numbers and amounts unchanged and preserve the \
         document structure.\n\nCONTRACT TEXT:\n{text}\n\nReturn only the English translation."
    )
}
