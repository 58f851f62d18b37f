use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

use super::code::IdentificationCode;
use super::tables::{BASE_PRICES, DEFAULT_BASE_PRICE, WMI_TABLE, YEAR_CODES};

pub const UNKNOWN_MANUFACTURER: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleCategory {
    #[serde(rename = "EV")]
    Ev,
    #[serde(rename = "REV")]
    Rev,
    #[serde(rename = "ICEV")]
    Icev,
    Other,
}

impl VehicleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::Ev => "EV",
            VehicleCategory::Rev => "REV",
            VehicleCategory::Icev => "ICEV",
            VehicleCategory::Other => "Other",
        }
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleCategory {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "EV" => Ok(VehicleCategory::Ev),
            "REV" => Ok(VehicleCategory::Rev),
            "ICEV" => Ok(VehicleCategory::Icev),
            "Other" => Ok(VehicleCategory::Other),
            other => Err(anyhow!("unknown vehicle category '{other}'")),
        }
    }
}

/// Advisory guess derived from an identification code. Never persisted; the
/// operator confirms or edits it before anything reaches the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedVehicle {
    pub manufacturer: String,
    pub category_guess: VehicleCategory,
    pub model_year_guess: i32,
    pub price_estimate: u32,
    pub check_digit_valid: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Decoder {
    price_overrides: BTreeMap<String, u32>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-manufacturer base prices that take precedence over the built-in table.
    pub fn with_price_overrides(price_overrides: BTreeMap<String, u32>) -> Self {
        Self { price_overrides }
    }

    pub fn decode(&self, code: &IdentificationCode) -> DecodedVehicle {
        self.decode_for_year(code, Local::now().year())
    }

    /// Decode against an explicit "current year", used when the year
    /// character is not in the table.
    pub fn decode_for_year(&self, code: &IdentificationCode, current_year: i32) -> DecodedVehicle {
        let (manufacturer, category) = lookup_manufacturer(code);
        let model_year = lookup_model_year(code.year_char()).unwrap_or(current_year);

        DecodedVehicle {
            manufacturer: manufacturer.to_string(),
            category_guess: category,
            model_year_guess: model_year,
            price_estimate: self.price_for(manufacturer),
            check_digit_valid: code.check_digit_matches(),
        }
    }

    pub fn price_for(&self, manufacturer: &str) -> u32 {
        if let Some(price) = self.price_overrides.get(manufacturer) {
            return *price;
        }
        BASE_PRICES
            .iter()
            .find(|(name, _)| *name == manufacturer)
            .map(|(_, price)| *price)
            .unwrap_or(DEFAULT_BASE_PRICE)
    }
}

pub fn lookup_manufacturer(code: &IdentificationCode) -> (&'static str, VehicleCategory) {
    let wmi = code.wmi();
    WMI_TABLE
        .iter()
        .find(|entry| wmi.starts_with(entry.prefix))
        .map(|entry| (entry.manufacturer, entry.category))
        .unwrap_or((UNKNOWN_MANUFACTURER, VehicleCategory::Other))
}

pub fn lookup_model_year(year_char: char) -> Option<i32> {
    YEAR_CODES
        .iter()
        .find(|(c, _)| *c == year_char)
        .map(|(_, year)| *year)
}
