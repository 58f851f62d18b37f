//! Capture backend that serves frames from still images on disk.
//!
//! Each configured device is a facing mode plus an image path; opening a
//! configuration loads the first matching device's image and enforces the
//! configuration's minimum resolution, so the fallback chain behaves the same
//! way it does against real hardware.

use std::path::PathBuf;

use anyhow::{bail, Result};
use async_trait::async_trait;
use image::{ImageError, RgbaImage};
use serde::{Deserialize, Serialize};

use super::backend::{CaptureBackend, RawFrame, VideoStream};
use super::config::{CaptureConfig, FacingMode};
use super::error::BackendError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StillDevice {
    pub facing: FacingMode,
    pub path: PathBuf,
}

pub struct StillImageBackend {
    devices: Vec<StillDevice>,
}

impl StillImageBackend {
    pub fn new(devices: Vec<StillDevice>) -> Self {
        Self { devices }
    }
}

#[async_trait]
impl CaptureBackend for StillImageBackend {
    async fn open(&self, config: &CaptureConfig) -> Result<Box<dyn VideoStream>, BackendError> {
        let device = self
            .devices
            .iter()
            .find(|device| config.facing.accepts(device.facing))
            .ok_or_else(|| {
                BackendError::new(
                    "NotFoundError",
                    format!("no {:?} camera configured", config.facing),
                )
            })?;

        let path = device.path.clone();
        let image = tokio::task::spawn_blocking(move || image::open(&path))
            .await
            .map_err(|err| BackendError::new("AbortError", format!("image loader join failed: {err}")))?
            .map_err(|err| match err {
                ImageError::IoError(io_err) => BackendError::from_io(&io_err),
                other => BackendError::new("NotReadableError", other.to_string()),
            })?
            .to_rgba8();

        let (width, height) = image.dimensions();
        if !config.satisfied_by(width, height) {
            return Err(BackendError::new(
                "OverconstrainedError",
                format!(
                    "{}x{} does not satisfy configuration '{}'",
                    width, height, config.label
                ),
            ));
        }

        Ok(Box::new(StillStream { image: Some(image) }))
    }
}

struct StillStream {
    image: Option<RgbaImage>,
}

impl VideoStream for StillStream {
    fn is_ready(&self) -> bool {
        self.image.is_some()
    }

    fn dimensions(&self) -> (u32, u32) {
        self.image
            .as_ref()
            .map(|image| image.dimensions())
            .unwrap_or((0, 0))
    }

    fn grab_frame(&mut self) -> Result<RawFrame> {
        let Some(image) = self.image.as_ref() else {
            bail!("still image stream already released");
        };
        let (width, height) = image.dimensions();
        Ok(RawFrame {
            width,
            height,
            rgba: image.as_raw().clone(),
        })
    }

    fn release(&mut self) {
        self.image = None;
    }
}

impl Drop for StillStream {
    fn drop(&mut self) {
        self.release();
    }
}
