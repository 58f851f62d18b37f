use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, RgbaImage};
use thiserror::Error;

use super::backend::{CaptureBackend, RawFrame, VideoStream};
use super::config::{CaptureConfig, EnvironmentCapabilities};
use super::error::CaptureFailure;
use super::negotiator::negotiate;
use super::session::CaptureSession;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

pub const FRAME_MIME: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("capture stream is not ready")]
    NotReady,
    #[error("frame capture failed: {0}")]
    Frame(String),
}

/// Immutable still image produced by one capture action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    bytes: Arc<[u8]>,
    mime: &'static str,
    width: u32,
    height: u32,
}

impl CapturedFrame {
    pub fn new(bytes: Vec<u8>, mime: &'static str, width: u32, height: u32) -> Self {
        Self {
            bytes: Arc::from(bytes),
            mime,
            width,
            height,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the encoded bytes, for handing to another task.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    pub fn mime(&self) -> &'static str {
        self.mime
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Sole owner of the live stream. `start` and `stop` are the only mutators of
/// the hardware handle, and dropping the surface stops it.
pub struct CaptureSurface {
    stream: Option<Box<dyn VideoStream>>,
    active_config: Option<CaptureConfig>,
    session: CaptureSession,
}

impl CaptureSurface {
    pub fn new() -> Self {
        Self {
            stream: None,
            active_config: None,
            session: CaptureSession::new(),
        }
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn active_config(&self) -> Option<&CaptureConfig> {
        self.active_config.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.stream.as_ref().map_or(false, |stream| stream.is_ready())
    }

    /// Negotiate a new stream, stopping any current one first. Returns the
    /// index of the configuration that succeeded.
    pub async fn start(
        &mut self,
        backend: &dyn CaptureBackend,
        configs: &[CaptureConfig],
        capabilities: EnvironmentCapabilities,
    ) -> Result<usize, CaptureFailure> {
        self.stop();
        self.session.begin_negotiation();

        match negotiate(backend, configs, capabilities).await {
            Ok(negotiated) => {
                self.session.activate(negotiated.config_index);
                self.stream = Some(negotiated.stream);
                self.active_config = Some(negotiated.config);
                Ok(negotiated.config_index)
            }
            Err(failure) => {
                self.session.fail(failure.kind);
                Err(failure)
            }
        }
    }

    /// Sample the current frame at the stream's native resolution.
    pub fn capture(&mut self) -> Result<CapturedFrame, SurfaceError> {
        let stream = match self.stream.as_mut() {
            Some(stream) if stream.is_ready() => stream,
            _ => return Err(SurfaceError::NotReady),
        };

        let raw = stream
            .grab_frame()
            .map_err(|err| SurfaceError::Frame(format!("{err:#}")))?;
        if raw.width == 0 || raw.height == 0 {
            return Err(SurfaceError::NotReady);
        }

        let frame = encode_png(raw)?;
        log_debug!(
            "captured {}x{} frame ({} bytes)",
            frame.width(),
            frame.height(),
            frame.bytes().len()
        );
        Ok(frame)
    }

    /// Release the hardware. Safe to call any number of times.
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
            log_info!("camera stream released");
        }
        self.active_config = None;
        self.session.reset();
    }
}

impl Default for CaptureSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CaptureSurface {
    fn drop(&mut self) {
        self.stop();
    }
}

fn encode_png(raw: RawFrame) -> Result<CapturedFrame, SurfaceError> {
    let RawFrame {
        width,
        height,
        rgba,
    } = raw;

    let buffer = RgbaImage::from_raw(width, height, rgba).ok_or_else(|| {
        SurfaceError::Frame(format!("frame buffer does not match {width}x{height}"))
    })?;

    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(buffer)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|err| SurfaceError::Frame(err.to_string()))?;

    Ok(CapturedFrame::new(bytes, FRAME_MIME, width, height))
}
