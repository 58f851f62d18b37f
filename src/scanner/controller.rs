use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard,
    },
    time::Duration,
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{Mutex, MutexGuard},
    time,
};
use tokio_util::sync::CancellationToken;

use super::error::PipelineError;
use crate::capture::{
    default_chain, CaptureBackend, CaptureConfig, CaptureSession, CaptureSurface, CapturedFrame,
    EnvironmentCapabilities,
};
use crate::reconcile::{
    NavigationContext, PlacementTarget, ReconciliationOutcome, ReconciliationResolver,
    RecordStore, VehicleDraft,
};
use crate::recognition::TextRecognizer;
use crate::vin::{extract_code, DecodedVehicle, Decoder, IdentificationCode};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CodeSource {
    Camera,
    Manual,
}

/// A validated code and its advisory decode, awaiting operator confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanCandidate {
    pub code: IdentificationCode,
    pub decoded: DecodedVehicle,
    pub source: CodeSource,
}

impl ScanCandidate {
    /// Draft seeded from the decode, for the operator to confirm or edit.
    pub fn draft(&self) -> VehicleDraft {
        VehicleDraft::from(&self.decoded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub code: IdentificationCode,
    pub decoded: DecodedVehicle,
    pub source: CodeSource,
    pub outcome: ReconciliationOutcome,
}

/// Drives one scanner: camera or manual entry in, reconciled record out.
///
/// Only the capture half of a scan is cancellable. Committing to the record
/// store runs to completion once started.
#[derive(Clone)]
pub struct ScannerController {
    backend: Arc<dyn CaptureBackend>,
    recognizer: Arc<dyn TextRecognizer>,
    resolver: ReconciliationResolver,
    decoder: Decoder,
    configs: Arc<Vec<CaptureConfig>>,
    capabilities: EnvironmentCapabilities,
    ready_timeout: Option<Duration>,
    surface: Arc<Mutex<CaptureSurface>>,
    scan_turn: Arc<Mutex<()>>,
    active_scan: Arc<StdMutex<Option<(u64, CancellationToken)>>>,
    scan_generation: Arc<AtomicU64>,
}

impl ScannerController {
    pub fn new(
        backend: Arc<dyn CaptureBackend>,
        recognizer: Arc<dyn TextRecognizer>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            backend,
            recognizer,
            resolver: ReconciliationResolver::new(store),
            decoder: Decoder::new(),
            configs: Arc::new(default_chain()),
            capabilities: EnvironmentCapabilities::default(),
            ready_timeout: None,
            surface: Arc::new(Mutex::new(CaptureSurface::new())),
            scan_turn: Arc::new(Mutex::new(())),
            active_scan: Arc::new(StdMutex::new(None)),
            scan_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_fallback_chain(mut self, configs: Vec<CaptureConfig>) -> Self {
        self.configs = Arc::new(configs);
        self
    }

    pub fn with_capabilities(mut self, capabilities: EnvironmentCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Bound negotiation plus readiness. Without one, a camera that never
    /// answers keeps the scan waiting until it is cancelled.
    pub fn with_ready_timeout(mut self, ready_timeout: Duration) -> Self {
        self.ready_timeout = Some(ready_timeout);
        self
    }

    /// Camera entry point: capture, recognize, extract, decode, then
    /// reconcile against the record store.
    pub async fn scan_from_camera(
        &self,
        context: &NavigationContext,
    ) -> Result<ScanReport, PipelineError> {
        let candidate = self.capture_candidate().await?;
        let draft = candidate.draft();
        self.commit(&candidate, &draft, context).await
    }

    /// Manual entry point. The typed code is validated before anything else
    /// runs; the camera is never touched.
    pub async fn submit_manual_code(
        &self,
        raw: &str,
        context: &NavigationContext,
    ) -> Result<ScanReport, PipelineError> {
        let candidate = self.preview_manual_code(raw)?;
        let draft = candidate.draft();
        self.commit(&candidate, &draft, context).await
    }

    pub fn preview_manual_code(&self, raw: &str) -> Result<ScanCandidate, PipelineError> {
        let code = IdentificationCode::parse(raw)?;
        Ok(ScanCandidate {
            decoded: self.decoder.decode(&code),
            code,
            source: CodeSource::Manual,
        })
    }

    /// Run the cancellable half of a camera scan. The camera is released on
    /// every exit, including when the returned future is dropped.
    pub async fn capture_candidate(&self) -> Result<ScanCandidate, PipelineError> {
        let token = CancellationToken::new();
        let generation = self.scan_generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((_, previous)) = self.scan_slot().replace((generation, token.clone())) {
            previous.cancel();
        }

        let _guard = ScanGuard {
            controller: self,
            generation,
            _turn: self.scan_turn.lock().await,
        };

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(PipelineError::Cancelled),
            result = self.recognize_candidate() => result,
        };

        match &result {
            Ok(candidate) => log_info!("camera scan read {}", candidate.code),
            Err(err) => log_warn!("camera scan failed: {err}"),
        }
        result
    }

    /// Write a confirmed candidate to the record store. Not cancellable.
    pub async fn commit(
        &self,
        candidate: &ScanCandidate,
        draft: &VehicleDraft,
        context: &NavigationContext,
    ) -> Result<ScanReport, PipelineError> {
        let target = PlacementTarget::from_context(context, Utc::now());
        let outcome = self.resolver.resolve(&candidate.code, draft, &target).await?;

        Ok(ScanReport {
            code: candidate.code.clone(),
            decoded: candidate.decoded.clone(),
            source: candidate.source,
            outcome,
        })
    }

    /// Abort an in-flight camera scan, if any.
    pub fn cancel_scan(&self) {
        if let Some((_, token)) = self.scan_slot().as_ref() {
            token.cancel();
        }
    }

    /// Cancel any scan and release the camera.
    pub async fn stop_camera(&self) {
        self.cancel_scan();
        self.surface.lock().await.stop();
    }

    pub async fn camera_session(&self) -> CaptureSession {
        self.surface.lock().await.session().clone()
    }

    async fn recognize_candidate(&self) -> Result<ScanCandidate, PipelineError> {
        let frame = self.acquire_frame().await?;

        let recognized = self
            .recognizer
            .recognize(&frame)
            .await
            .map_err(|err| PipelineError::Recognition(format!("{err:#}")))?;
        drop(frame);

        let code = extract_code(&recognized.text)?;
        Ok(ScanCandidate {
            decoded: self.decoder.decode(&code),
            code,
            source: CodeSource::Camera,
        })
    }

    /// Negotiate, wait for the stream, take one frame and release the camera
    /// before recognition starts.
    async fn acquire_frame(&self) -> Result<CapturedFrame, PipelineError> {
        let mut surface = self.surface.lock().await;

        let acquisition = async {
            let index = surface
                .start(self.backend.as_ref(), &self.configs, self.capabilities)
                .await?;
            log_info!("camera active on configuration {index}");
            while !surface.is_ready() {
                time::sleep(READY_POLL_INTERVAL).await;
            }
            Ok::<_, PipelineError>(())
        };

        let acquired = match self.ready_timeout {
            Some(limit) => match time::timeout(limit, acquisition).await {
                Ok(result) => result,
                Err(_) => Err(PipelineError::Timeout {
                    waited_ms: limit.as_millis() as u64,
                }),
            },
            None => acquisition.await,
        };
        let frame = acquired.and_then(|()| surface.capture().map_err(PipelineError::from));
        surface.stop();
        frame
    }

    /// Stop the camera once the surface lock frees up, unless a newer scan
    /// has started by then; its own `start` replaces the stream.
    fn release_surface_later(&self, generation: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            log_warn!("camera surface locked during teardown with no runtime to release it");
            return;
        };

        let surface = Arc::clone(&self.surface);
        let scan_generation = Arc::clone(&self.scan_generation);
        runtime.spawn(async move {
            let mut surface = surface.lock().await;
            if scan_generation.load(Ordering::SeqCst) == generation {
                surface.stop();
            }
        });
    }

    fn scan_slot(&self) -> StdMutexGuard<'_, Option<(u64, CancellationToken)>> {
        match self.active_scan.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Held for the lifetime of one capture; releases the camera and clears the
/// scan slot on drop.
struct ScanGuard<'a> {
    controller: &'a ScannerController,
    generation: u64,
    _turn: MutexGuard<'a, ()>,
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        match self.controller.surface.try_lock() {
            Ok(mut surface) => surface.stop(),
            Err(_) => self.controller.release_surface_later(self.generation),
        }

        let mut slot = self.controller.scan_slot();
        if matches!(slot.as_ref(), Some((generation, _)) if *generation == self.generation) {
            *slot = None;
        }
    }
}
