//! In-memory doubles for the hardware, recognition and storage seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::capture::{BackendError, CaptureBackend, CaptureConfig, CapturedFrame, RawFrame, VideoStream};
use crate::reconcile::{LocationUpdate, NewVehicleRecord, RecordStore, StoreError, StoredVehicle};
use crate::recognition::{RecognizedText, TextRecognizer};
use crate::vin::IdentificationCode;

#[derive(Debug, Clone)]
enum MockOutcome {
    Open { width: u32, height: u32 },
    Fail { name: String },
}

/// Capture backend scripted per configuration label. Labels without a
/// script fail with `NotFoundError`.
#[derive(Default)]
pub struct MockBackend {
    outcomes: HashMap<String, MockOutcome>,
    never_ready: bool,
    attempted: Mutex<Vec<String>>,
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(mut self, label: &str, width: u32, height: u32) -> Self {
        self.outcomes
            .insert(label.to_string(), MockOutcome::Open { width, height });
        self
    }

    pub fn fail(mut self, label: &str, name: &str) -> Self {
        self.outcomes.insert(
            label.to_string(),
            MockOutcome::Fail {
                name: name.to_string(),
            },
        );
        self
    }

    /// Streams open but never report a frame as available.
    pub fn not_ready(mut self) -> Self {
        self.never_ready = true;
        self
    }

    pub fn attempted(&self) -> Vec<String> {
        self.attempted
            .lock()
            .map(|labels| labels.clone())
            .unwrap_or_default()
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn release_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn live_streams(&self) -> usize {
        self.open_count() - self.release_count()
    }
}

#[async_trait]
impl CaptureBackend for MockBackend {
    async fn open(&self, config: &CaptureConfig) -> Result<Box<dyn VideoStream>, BackendError> {
        if let Ok(mut attempted) = self.attempted.lock() {
            attempted.push(config.label.clone());
        }

        match self.outcomes.get(&config.label) {
            Some(MockOutcome::Open { width, height }) => {
                self.opened.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(MockStream {
                    width: *width,
                    height: *height,
                    ready: !self.never_ready,
                    live: true,
                    released: Arc::clone(&self.released),
                }))
            }
            Some(MockOutcome::Fail { name }) => {
                Err(BackendError::new(name.clone(), format!("{} refused", config.label)))
            }
            None => Err(BackendError::new(
                "NotFoundError",
                format!("no device for {}", config.label),
            )),
        }
    }
}

struct MockStream {
    width: u32,
    height: u32,
    ready: bool,
    live: bool,
    released: Arc<AtomicUsize>,
}

impl VideoStream for MockStream {
    fn is_ready(&self) -> bool {
        self.live && self.ready
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn grab_frame(&mut self) -> Result<RawFrame> {
        if !self.live {
            return Err(anyhow!("stream released"));
        }
        Ok(RawFrame {
            width: self.width,
            height: self.height,
            rgba: vec![200; (self.width * self.height * 4) as usize],
        })
    }

    fn release(&mut self) {
        if self.live {
            self.live = false;
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for MockStream {
    fn drop(&mut self) {
        self.release();
    }
}

enum Reply {
    Text(String),
    Fail(String),
    Stall,
}

/// Recognizer that answers every frame the same way.
pub struct StaticRecognizer {
    reply: Reply,
    calls: AtomicUsize,
}

impl StaticRecognizer {
    pub fn text(text: &str) -> Self {
        Self::with(Reply::Text(text.to_string()))
    }

    pub fn failing(message: &str) -> Self {
        Self::with(Reply::Fail(message.to_string()))
    }

    /// Never answers; for exercising cancellation.
    pub fn stalled() -> Self {
        Self::with(Reply::Stall)
    }

    fn with(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextRecognizer for StaticRecognizer {
    async fn recognize(&self, _frame: &CapturedFrame) -> Result<RecognizedText> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Reply::Text(text) => Ok(RecognizedText::new(text.clone())),
            Reply::Fail(message) => Err(anyhow!("{message}")),
            Reply::Stall => std::future::pending().await,
        }
    }
}

/// Record store kept in a map, with call counters.
#[derive(Default)]
pub struct MemoryStore {
    records: tokio::sync::Mutex<Vec<(String, NewVehicleRecord)>>,
    insert_error: Option<StoreError>,
    next_id: AtomicUsize,
    find_calls: AtomicUsize,
    insert_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every insert fails with `error`.
    pub fn reject_inserts(mut self, error: StoreError) -> Self {
        self.insert_error = Some(error);
        self
    }

    /// Insert directly, bypassing counters.
    pub async fn seed(&self, record: NewVehicleRecord) -> String {
        let id = self.allocate_id();
        self.records.lock().await.push((id.clone(), record));
        id
    }

    pub async fn record(&self, id: &str) -> Option<NewVehicleRecord> {
        self.records
            .lock()
            .await
            .iter()
            .find(|(record_id, _)| record_id == id)
            .map(|(_, record)| record.clone())
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn allocate_id(&self) -> String {
        format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_by_code(&self, code: &IdentificationCode) -> Result<Option<StoredVehicle>, StoreError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .lock()
            .await
            .iter()
            .find(|(_, record)| &record.vin == code)
            .map(|(id, record)| StoredVehicle {
                id: id.clone(),
                vin: record.vin.clone(),
                storage_table: record.storage_table,
                location: record.location.clone(),
                floor: record.floor.clone(),
            }))
    }

    async fn insert(&self, record: &NewVehicleRecord) -> Result<String, StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.insert_error {
            return Err(error.clone());
        }

        let mut records = self.records.lock().await;
        if records.iter().any(|(_, existing)| existing.vin == record.vin) {
            return Err(StoreError::DuplicateCode(record.vin.to_string()));
        }
        let id = self.allocate_id();
        records.push((id.clone(), record.clone()));
        Ok(id)
    }

    async fn update_location_fields(&self, id: &str, update: &LocationUpdate) -> Result<(), StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().await;
        let (_, record) = records
            .iter_mut()
            .find(|(record_id, _)| record_id == id)
            .ok_or_else(|| StoreError::MissingRecord(id.to_string()))?;

        record.storage_table = update.storage_table;
        record.location = update.location.clone();
        record.floor = update.floor.clone();
        record.is_showroom = update.is_showroom;
        record.showroom_entered_at = update.showroom_entered_at;
        Ok(())
    }
}
