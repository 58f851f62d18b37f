//! Record-store shapes the resolver reads and writes. These are kept apart
//! from [`DecodedVehicle`] so an advisory guess only reaches the store after
//! the operator has confirmed it as a [`VehicleDraft`].

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::placement::{PlacementTarget, StorageTable};
use crate::vin::{DecodedVehicle, IdentificationCode, VehicleCategory};

pub const FULL_BATTERY_LEVEL: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CustomsStatus {
    Unpaid,
    Paid,
}

impl CustomsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomsStatus::Unpaid => "unpaid",
            CustomsStatus::Paid => "paid",
        }
    }
}

impl FromStr for CustomsStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "unpaid" => Ok(CustomsStatus::Unpaid),
            "paid" => Ok(CustomsStatus::Paid),
            other => Err(anyhow!("unknown customs status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleStatus {
    InStock,
    Reserved,
    Sold,
    Delivered,
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::InStock => "in_stock",
            LifecycleStatus::Reserved => "reserved",
            LifecycleStatus::Sold => "sold",
            LifecycleStatus::Delivered => "delivered",
        }
    }
}

impl FromStr for LifecycleStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "in_stock" => Ok(LifecycleStatus::InStock),
            "reserved" => Ok(LifecycleStatus::Reserved),
            "sold" => Ok(LifecycleStatus::Sold),
            "delivered" => Ok(LifecycleStatus::Delivered),
            other => Err(anyhow!("unknown lifecycle status '{other}'")),
        }
    }
}

/// Operator-confirmed vehicle details, seeded from a decode and editable
/// before commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDraft {
    pub manufacturer: String,
    pub category: VehicleCategory,
    pub model_year: i32,
    pub price: u32,
}

impl From<&DecodedVehicle> for VehicleDraft {
    fn from(decoded: &DecodedVehicle) -> Self {
        Self {
            manufacturer: decoded.manufacturer.clone(),
            category: decoded.category_guess,
            model_year: decoded.model_year_guess,
            price: decoded.price_estimate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVehicleRecord {
    pub vin: IdentificationCode,
    pub manufacturer: String,
    pub category: VehicleCategory,
    pub model_year: i32,
    pub price: u32,
    pub battery_level: Option<u8>,
    pub customs_status: CustomsStatus,
    pub status: LifecycleStatus,
    pub storage_table: StorageTable,
    pub location: String,
    pub floor: Option<String>,
    pub is_showroom: bool,
    pub showroom_entered_at: Option<DateTime<Utc>>,
}

impl NewVehicleRecord {
    /// Combine a confirmed draft with the placement and intake defaults.
    pub fn assemble(code: &IdentificationCode, draft: &VehicleDraft, target: &PlacementTarget) -> Self {
        Self {
            vin: code.clone(),
            manufacturer: draft.manufacturer.clone(),
            category: draft.category,
            model_year: draft.model_year,
            price: draft.price,
            battery_level: (draft.category == VehicleCategory::Ev).then_some(FULL_BATTERY_LEVEL),
            customs_status: CustomsStatus::Unpaid,
            status: LifecycleStatus::InStock,
            storage_table: target.storage_table,
            location: target.location_label.clone(),
            floor: target.floor_label.clone(),
            is_showroom: target.is_showroom,
            showroom_entered_at: target.showroom_entry_timestamp,
        }
    }
}

/// The only fields a relocation may touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    pub storage_table: StorageTable,
    pub location: String,
    pub floor: Option<String>,
    pub is_showroom: bool,
    pub showroom_entered_at: Option<DateTime<Utc>>,
}

impl From<&PlacementTarget> for LocationUpdate {
    fn from(target: &PlacementTarget) -> Self {
        Self {
            storage_table: target.storage_table,
            location: target.location_label.clone(),
            floor: target.floor_label.clone(),
            is_showroom: target.is_showroom,
            showroom_entered_at: if target.is_showroom {
                target.showroom_entry_timestamp
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviousLocation {
    pub storage_table: StorageTable,
    pub location: String,
    pub floor: Option<String>,
}

impl fmt::Display for PreviousLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.floor {
            Some(floor) => write!(f, "{} / {} (floor {})", self.storage_table, self.location, floor),
            None => write!(f, "{} / {}", self.storage_table, self.location),
        }
    }
}

/// What `find_by_code` reports about an existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredVehicle {
    pub id: String,
    pub vin: IdentificationCode,
    pub storage_table: StorageTable,
    pub location: String,
    pub floor: Option<String>,
}

impl StoredVehicle {
    pub fn previous_location(&self) -> PreviousLocation {
        PreviousLocation {
            storage_table: self.storage_table,
            location: self.location.clone(),
            floor: self.floor.clone(),
        }
    }
}
