use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capture::CapturedFrame;

pub mod command;

pub use command::CommandRecognizer;

/// Text returned by the recognition service for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizedText {
    pub text: String,
    pub confidence: Option<f64>,
}

impl RecognizedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: None,
        }
    }
}

/// External text-recognition service. One call per frame, no retries.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    async fn recognize(&self, frame: &CapturedFrame) -> Result<RecognizedText>;
}
