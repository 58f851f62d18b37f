use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::reconcile::{CustomsStatus, LifecycleStatus, StorageTable};
use crate::vin::{IdentificationCode, VehicleCategory};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    pub id: String,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One relocation, written in the same transaction as the location update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleMove {
    pub id: String,
    pub vehicle_id: String,
    pub from_storage_table: StorageTable,
    pub from_location: String,
    pub from_floor: Option<String>,
    pub to_storage_table: StorageTable,
    pub to_location: String,
    pub to_floor: Option<String>,
    pub moved_at: DateTime<Utc>,
}
