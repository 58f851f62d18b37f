use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::vin::IdentificationCode;

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_optional_datetime(
    value: Option<String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>> {
    match value {
        Some(raw) => parse_datetime(&raw, field).map(Some),
        None => Ok(None),
    }
}

/// Parse a TEXT column stored via an enum's `as_str`.
pub fn parse_column<T>(value: &str, field: &str) -> Result<T>
where
    T: FromStr<Err = anyhow::Error>,
{
    value
        .parse()
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_code(value: &str) -> Result<IdentificationCode> {
    IdentificationCode::parse(value).with_context(|| format!("stored vin '{value}' is invalid"))
}
