// Text utils

use whatlang::detect;

/// Returns at most `max_chars` characters of `text`, cut on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Detects the dominant language and returns its ISO 639-1 code. Returns
/// `None` when detection is unreliable or the language has no mapping.
pub fn detect_language(text: &str) -> Option<String> {
    let info = detect(text)?;
    if !info.is_reliable() {
        return None;
    }
    iso639_1(info.lang().code()).map(str::to_string)
}

// whatlang reports ISO 639-3 codes.
fn iso639_1(code: &str) -> Option<&'static str> {
    let mapped = match code {
        "eng" => "en",
        "swe" => "sv",
        "nob" => "no",
        "dan" => "da",
        "fin" => "fi",
        "pol" => "pl",
        "lav" => "lv",
        "lit" => "lt",
        "est" => "et",
        "deu" => "de",
        "nld" => "nl",
        "fra" => "fr",
        "spa" => "es",
        "ita" => "it",
        "por" => "pt",
        "rus" => "ru",
        "ukr" => "uk",
        "ces" => "cs",
        "slk" => "sk",
        "hun" => "hu",
        "ron" => "ro",
        _ => return None,
    };
    Some(mapped)
}

/// Treats `null`, blank and the literal string "null" as absent.
pub fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(trimmed)
    }
}
