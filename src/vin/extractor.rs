use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::code::{is_code_char, IdentificationCode, CODE_LENGTH};

/// Recognized text shorter than this is treated as unreadable.
pub const MIN_TEXT_LENGTH: usize = 10;

static BARE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[A-HJ-NPR-Z0-9]{17}").expect("bare code pattern compiles"));

// Marker keyword, optional punctuation, then up to 17 code characters with
// single hyphens tolerated between them.
static LABELED_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:VIN|VEHICLE\s+ID(?:ENTIFICATION)?(?:\s+(?:NO|NUMBER))?|CHASSIS(?:\s+NO)?)\b\s*[:#.\-]?\s*([A-HJ-NPR-Z0-9](?:-?[A-HJ-NPR-Z0-9]){0,16})",
    )
    .expect("labeled code pattern compiles")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("no readable text ({length} characters recognized)")]
    TextTooShort { length: usize },
    #[error("no identification code found in recognized text")]
    NotFound,
}

/// Find the single identification code in recognized text.
///
/// Bare 17-character runs are tried before labeled matches; the first
/// candidate that cleans up to a valid code wins.
pub fn extract_code(text: &str) -> Result<IdentificationCode, ExtractionError> {
    let trimmed = text.trim();
    let length = trimmed.chars().count();
    if length < MIN_TEXT_LENGTH {
        return Err(ExtractionError::TextTooShort { length });
    }

    let bare = BARE_PATTERN.find_iter(trimmed).map(|m| m.as_str());
    let labeled = LABELED_PATTERN
        .captures_iter(trimmed)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str());

    bare.chain(labeled)
        .find_map(accept_candidate)
        .ok_or(ExtractionError::NotFound)
}

fn accept_candidate(candidate: &str) -> Option<IdentificationCode> {
    let cleaned: String = candidate
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| is_code_char(*c))
        .collect();

    if cleaned.len() != CODE_LENGTH {
        return None;
    }
    IdentificationCode::parse(&cleaned).ok()
}
