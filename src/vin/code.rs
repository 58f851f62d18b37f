use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every identification code is exactly this many characters.
pub const CODE_LENGTH: usize = 17;

/// Position (zero-based) of the model-year character.
pub const YEAR_POSITION: usize = 9;

/// Position (zero-based) of the ISO 3779 check digit.
pub const CHECK_DIGIT_POSITION: usize = 8;

const CHECK_WEIGHTS: [u32; CODE_LENGTH] = [8, 7, 6, 5, 4, 3, 2, 10, 0, 9, 8, 7, 6, 5, 4, 3, 2];

/// `A–Z0–9` without `I`, `O` and `Q`.
pub fn is_code_char(c: char) -> bool {
    matches!(c, 'A'..='H' | 'J'..='N' | 'P' | 'R'..='Z' | '0'..='9')
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("identification code is empty")]
    Empty,
    #[error("identification code must be 17 characters, got {0}")]
    WrongLength(usize),
    #[error("identification code contains invalid character '{character}' at position {position}")]
    InvalidCharacter { character: char, position: usize },
}

/// A validated 17-character vehicle identification code.
///
/// The only way to obtain one is through [`IdentificationCode::parse`], so
/// every value in circulation satisfies the grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentificationCode(String);

impl IdentificationCode {
    /// Validate operator or recognizer input. Surrounding whitespace is
    /// trimmed and letters are uppercased before the grammar check; nothing
    /// else is corrected.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().to_ascii_uppercase();

        if normalized.is_empty() {
            return Err(ValidationError::Empty);
        }

        let length = normalized.chars().count();
        if length != CODE_LENGTH {
            return Err(ValidationError::WrongLength(length));
        }

        if let Some((position, character)) = normalized
            .chars()
            .enumerate()
            .find(|(_, c)| !is_code_char(*c))
        {
            return Err(ValidationError::InvalidCharacter {
                character,
                position,
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// World manufacturer identifier: the first three characters.
    pub fn wmi(&self) -> &str {
        &self.0[..3]
    }

    pub fn year_char(&self) -> char {
        char::from(self.0.as_bytes()[YEAR_POSITION])
    }

    /// Advisory ISO 3779 check. Many markets do not populate position 9, so
    /// a mismatch never invalidates the code.
    pub fn check_digit_matches(&self) -> bool {
        let sum: u32 = self
            .0
            .chars()
            .zip(CHECK_WEIGHTS)
            .map(|(c, weight)| transliterate(c) * weight)
            .sum();

        let expected = match sum % 11 {
            10 => 'X',
            digit => char::from_digit(digit, 10).unwrap_or('X'),
        };

        char::from(self.0.as_bytes()[CHECK_DIGIT_POSITION]) == expected
    }
}

fn transliterate(c: char) -> u32 {
    match c {
        '0'..='9' => c.to_digit(10).unwrap_or(0),
        'A' | 'J' => 1,
        'B' | 'K' | 'S' => 2,
        'C' | 'L' | 'T' => 3,
        'D' | 'M' | 'U' => 4,
        'E' | 'N' | 'V' => 5,
        'F' | 'W' => 6,
        'G' | 'P' | 'X' => 7,
        'H' | 'Y' => 8,
        'R' | 'Z' => 9,
        _ => 0,
    }
}

impl fmt::Display for IdentificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for IdentificationCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for IdentificationCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for IdentificationCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<IdentificationCode> for String {
    fn from(code: IdentificationCode) -> Self {
        code.0
    }
}
