use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::placement::PlacementTarget;
use super::record::{LocationUpdate, NewVehicleRecord, PreviousLocation, StoredVehicle, VehicleDraft};
use crate::vin::IdentificationCode;

const ENABLE_LOGS: bool = true;

use crate::log_info;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Unique-code constraint hit, typically a concurrent scan of the same
    /// new vehicle that inserted first.
    #[error("a record with code {0} already exists")]
    DuplicateCode(String),
    #[error("record {0} no longer exists")]
    MissingRecord(String),
    #[error("record store failure: {0}")]
    Backend(String),
}

impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<StoreError>() {
            Ok(store_err) => store_err,
            Err(other) => StoreError::Backend(format!("{other:#}")),
        }
    }
}

/// The record store as the pipeline sees it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_by_code(&self, code: &IdentificationCode) -> Result<Option<StoredVehicle>, StoreError>;

    async fn insert(&self, record: &NewVehicleRecord) -> Result<String, StoreError>;

    async fn update_location_fields(&self, id: &str, update: &LocationUpdate) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ReconciliationOutcome {
    #[serde(rename_all = "camelCase")]
    Created { record_id: String },
    #[serde(rename_all = "camelCase")]
    Relocated {
        record_id: String,
        previous_location: PreviousLocation,
    },
}

impl ReconciliationOutcome {
    pub fn record_id(&self) -> &str {
        match self {
            ReconciliationOutcome::Created { record_id }
            | ReconciliationOutcome::Relocated { record_id, .. } => record_id,
        }
    }
}

/// Decides between relocating an existing record and creating a new one.
/// Runs exactly once per call; failures are returned, never retried.
#[derive(Clone)]
pub struct ReconciliationResolver {
    store: Arc<dyn RecordStore>,
}

impl ReconciliationResolver {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(
        &self,
        code: &IdentificationCode,
        draft: &VehicleDraft,
        target: &PlacementTarget,
    ) -> Result<ReconciliationOutcome, StoreError> {
        match self.store.find_by_code(code).await? {
            Some(existing) => {
                let previous_location = existing.previous_location();
                self.store
                    .update_location_fields(&existing.id, &LocationUpdate::from(target))
                    .await?;
                log_info!(
                    "relocated {} ({}) from {} to {} / {}",
                    code,
                    existing.id,
                    previous_location,
                    target.storage_table,
                    target.location_label
                );
                Ok(ReconciliationOutcome::Relocated {
                    record_id: existing.id,
                    previous_location,
                })
            }
            None => {
                let record = NewVehicleRecord::assemble(code, draft, target);
                let record_id = self.store.insert(&record).await?;
                log_info!(
                    "created {} as {} at {} / {}",
                    code,
                    record_id,
                    target.storage_table,
                    target.location_label
                );
                Ok(ReconciliationOutcome::Created { record_id })
            }
        }
    }
}
