pub mod capture;
mod cli;
mod commands;
pub mod db;
pub mod reconcile;
pub mod recognition;
pub mod scanner;
pub mod settings;
pub mod utils;
pub mod vin;

#[cfg(test)]
pub(crate) mod testing;

use std::{path::Path, process::ExitCode, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use capture::{FacingMode, StillDevice, StillImageBackend};
use cli::{Cli, Command};
use commands::CommandError;
use db::Database;
use recognition::CommandRecognizer;
use scanner::ScannerController;
use settings::SettingsStore;
use vin::Decoder;

pub(crate) struct AppState {
    pub(crate) db: Database,
    pub(crate) scanner: ScannerController,
    pub(crate) settings: SettingsStore,
}

impl AppState {
    /// Open the database and settings under `data_dir` and wire the scanner.
    /// `extra_image` is offered as the first rear camera.
    fn bootstrap(data_dir: &Path, extra_image: Option<&Path>) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

        let database = Database::new(data_dir.join("vinscan.sqlite3"))?;
        let settings_store = SettingsStore::new(data_dir.join("settings.json"))?;
        let settings = settings_store.scanner()?;

        let mut camera = settings.camera.clone();
        if let Some(path) = extra_image {
            camera.devices.insert(
                0,
                StillDevice {
                    facing: FacingMode::Environment,
                    path: path.to_path_buf(),
                },
            );
        }

        let scanner = ScannerController::new(
            Arc::new(StillImageBackend::new(camera.devices.clone())),
            Arc::new(CommandRecognizer::new(
                settings.recognizer.program.clone(),
                settings.recognizer.args.clone(),
            )),
            Arc::new(database.clone()),
        )
        .with_decoder(Decoder::with_price_overrides(settings.price_overrides.clone()))
        .with_fallback_chain(camera.fallback_chain())
        .with_capabilities(camera.capabilities())
        .with_ready_timeout(Duration::from_millis(camera.ready_timeout_ms));

        Ok(Self {
            db: database,
            scanner,
            settings: settings_store,
        })
    }
}

fn emit<T: Serialize>(result: Result<T, CommandError>) -> ExitCode {
    match result {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("error: failed to serialize result: {err}");
                ExitCode::FAILURE
            }
        },
        Err(CommandError::Pipeline(report)) => {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(_) => eprintln!("error: {}", report.message),
            }
            ExitCode::from(2)
        }
        Err(CommandError::Internal(err)) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(cli: Cli) -> Result<ExitCode> {
    let extra_image = match &cli.command {
        Command::Scan { image, .. } => image.as_deref(),
        _ => None,
    };
    let state = AppState::bootstrap(&cli.data_dir, extra_image)?;

    let code = match &cli.command {
        Command::Scan { placement, .. } => {
            let context = placement.context()?;
            emit(commands::scan_from_camera(&state, &context).await)
        }
        Command::Manual { code, placement } => {
            let context = placement.context()?;
            emit(commands::submit_manual_code(&state, code, &context).await)
        }
        Command::Decode { code } => emit(commands::decode_code(&state, code)),
        Command::Show { code } => emit(commands::show_vehicle(&state, code).await),
        Command::List { table } => {
            emit(commands::list_vehicles(&state, table.map(Into::into)).await)
        }
        Command::Config { write_defaults } => {
            emit(commands::show_settings(&state, *write_defaults))
        }
    };

    Ok(code)
}

pub fn run() -> ExitCode {
    utils::init_logging();

    let cli = Cli::parse();
    log::debug!("vinscan starting with data dir {}", cli.data_dir.display());

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
