use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageTable {
    Inventory,
    Showroom,
    Garage,
}

impl StorageTable {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageTable::Inventory => "inventory",
            StorageTable::Showroom => "showroom",
            StorageTable::Garage => "garage",
        }
    }
}

impl fmt::Display for StorageTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageTable {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "inventory" => Ok(StorageTable::Inventory),
            "showroom" => Ok(StorageTable::Showroom),
            "garage" => Ok(StorageTable::Garage),
            other => Err(anyhow!("unknown storage table '{other}'")),
        }
    }
}

/// Where the operator currently is in the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "camelCase")]
pub enum NavigationContext {
    Inventory { location: Option<String> },
    Showroom { floor: String },
    Garage { bay: Option<String> },
}

pub const DEFAULT_INVENTORY_LOCATION: &str = "Inventory";
pub const SHOWROOM_LOCATION: &str = "Showroom";
pub const GARAGE_LOCATION: &str = "Garage";

/// Destination a scanned vehicle is recorded against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementTarget {
    pub storage_table: StorageTable,
    pub location_label: String,
    pub floor_label: Option<String>,
    pub is_showroom: bool,
    pub showroom_entry_timestamp: Option<DateTime<Utc>>,
}

impl PlacementTarget {
    /// Pure function of the context and the supplied clock reading.
    pub fn from_context(context: &NavigationContext, now: DateTime<Utc>) -> Self {
        match context {
            NavigationContext::Inventory { location } => Self {
                storage_table: StorageTable::Inventory,
                location_label: location
                    .clone()
                    .filter(|label| !label.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_INVENTORY_LOCATION.to_string()),
                floor_label: None,
                is_showroom: false,
                showroom_entry_timestamp: None,
            },
            NavigationContext::Showroom { floor } => Self {
                storage_table: StorageTable::Showroom,
                location_label: SHOWROOM_LOCATION.to_string(),
                floor_label: Some(floor.clone()),
                is_showroom: true,
                showroom_entry_timestamp: Some(now),
            },
            NavigationContext::Garage { bay } => Self {
                storage_table: StorageTable::Garage,
                location_label: match bay {
                    Some(bay) if !bay.trim().is_empty() => format!("{GARAGE_LOCATION} {bay}"),
                    _ => GARAGE_LOCATION.to_string(),
                },
                floor_label: None,
                is_showroom: false,
                showroom_entry_timestamp: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn showroom_context_stamps_entry_time() {
        let target = PlacementTarget::from_context(
            &NavigationContext::Showroom { floor: "2".into() },
            clock(),
        );
        assert_eq!(target.storage_table, StorageTable::Showroom);
        assert_eq!(target.floor_label.as_deref(), Some("2"));
        assert!(target.is_showroom);
        assert_eq!(target.showroom_entry_timestamp, Some(clock()));
    }

    #[test]
    fn inventory_defaults_location_label() {
        let target = PlacementTarget::from_context(
            &NavigationContext::Inventory { location: None },
            clock(),
        );
        assert_eq!(target.location_label, DEFAULT_INVENTORY_LOCATION);
        assert!(!target.is_showroom);
        assert_eq!(target.showroom_entry_timestamp, None);

        let lot = PlacementTarget::from_context(
            &NavigationContext::Inventory {
                location: Some("North Lot".into()),
            },
            clock(),
        );
        assert_eq!(lot.location_label, "North Lot");
    }

    #[test]
    fn garage_bay_is_part_of_location() {
        let target = PlacementTarget::from_context(
            &NavigationContext::Garage {
                bay: Some("B4".into()),
            },
            clock(),
        );
        assert_eq!(target.storage_table, StorageTable::Garage);
        assert_eq!(target.location_label, "Garage B4");
    }

    #[test]
    fn derivation_is_deterministic() {
        let context = NavigationContext::Showroom { floor: "1".into() };
        assert_eq!(
            PlacementTarget::from_context(&context, clock()),
            PlacementTarget::from_context(&context, clock())
        );
    }

    #[test]
    fn navigation_context_uses_view_tag() {
        let context: NavigationContext =
            serde_json::from_str(r#"{"view":"showroom","floor":"G"}"#).unwrap();
        assert_eq!(context, NavigationContext::Showroom { floor: "G".into() });
    }
}
