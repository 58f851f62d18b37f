use anyhow::Result;
use async_trait::async_trait;

use super::config::CaptureConfig;
use super::error::BackendError;

/// Uncompressed RGBA8 frame sampled from a live stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// A live hardware stream. Dropping a stream must release it.
pub trait VideoStream: Send {
    /// Whether a frame can be sampled right now.
    fn is_ready(&self) -> bool;

    fn dimensions(&self) -> (u32, u32);

    fn grab_frame(&mut self) -> Result<RawFrame>;

    /// Release every underlying track. Calling it on a released stream is a no-op.
    fn release(&mut self);
}

/// Platform capture API: opens a stream for one configuration or reports a
/// named failure.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    async fn open(&self, config: &CaptureConfig) -> Result<Box<dyn VideoStream>, BackendError>;
}
