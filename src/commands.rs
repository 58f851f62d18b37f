use serde::Serialize;

use crate::{
    db::{VehicleMove, VehicleRecord},
    reconcile::{NavigationContext, StorageTable},
    scanner::{FailureReport, PipelineError, ScanCandidate, ScanReport},
    settings::ScannerSettings,
    vin::IdentificationCode,
    AppState,
};

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// What a command hands back to the caller: its result, or a classified
/// pipeline failure, or a plumbing error.
pub enum CommandError {
    Pipeline(FailureReport),
    Internal(anyhow::Error),
}

impl From<PipelineError> for CommandError {
    fn from(err: PipelineError) -> Self {
        CommandError::Pipeline(err.report())
    }
}

impl From<anyhow::Error> for CommandError {
    fn from(err: anyhow::Error) -> Self {
        CommandError::Internal(err)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDetails {
    pub vehicle: VehicleRecord,
    pub moves: Vec<VehicleMove>,
}

pub async fn scan_from_camera(
    state: &AppState,
    context: &NavigationContext,
) -> Result<ScanReport, CommandError> {
    let scanner = state.scanner.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log_info!("interrupt received, cancelling scan");
            scanner.cancel_scan();
        }
    });

    let candidate = state.scanner.capture_candidate().await;
    interrupt.abort();

    let candidate = candidate?;
    let draft = candidate.draft();
    Ok(state.scanner.commit(&candidate, &draft, context).await?)
}

pub async fn submit_manual_code(
    state: &AppState,
    code: &str,
    context: &NavigationContext,
) -> Result<ScanReport, CommandError> {
    Ok(state.scanner.submit_manual_code(code, context).await?)
}

pub fn decode_code(state: &AppState, code: &str) -> Result<ScanCandidate, CommandError> {
    Ok(state.scanner.preview_manual_code(code)?)
}

pub async fn show_vehicle(state: &AppState, code: &str) -> Result<VehicleDetails, CommandError> {
    let code = IdentificationCode::parse(code).map_err(PipelineError::from)?;
    let vehicle = state
        .db
        .get_vehicle_by_vin(&code)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no vehicle stored with code {code}"))?;
    let moves = state.db.get_moves_for_vehicle(&vehicle.id).await?;
    Ok(VehicleDetails { vehicle, moves })
}

pub async fn list_vehicles(
    state: &AppState,
    table: Option<StorageTable>,
) -> Result<Vec<VehicleRecord>, CommandError> {
    Ok(state.db.list_vehicles(table).await?)
}

pub fn show_settings(state: &AppState, write_defaults: bool) -> Result<ScannerSettings, CommandError> {
    let settings = state.settings.scanner()?;
    if write_defaults {
        state.settings.update_scanner(settings.clone())?;
    }
    Ok(settings)
}
