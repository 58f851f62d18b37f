use std::process::Stdio;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::Instant;

use super::{RecognizedText, TextRecognizer};
use crate::capture::CapturedFrame;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Runs an external OCR program with the encoded frame on stdin and takes
/// whatever it prints on stdout as the recognized text.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl TextRecognizer for CommandRecognizer {
    async fn recognize(&self, frame: &CapturedFrame) -> Result<RecognizedText> {
        let started = Instant::now();

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn recognizer '{}'", self.program))?;

        let mut stdin = child
            .stdin
            .take()
            .context("recognizer stdin was not captured")?;
        let bytes = frame.shared_bytes();
        let writer = tokio::spawn(async move {
            stdin.write_all(&bytes).await?;
            stdin.shutdown().await
        });

        let output = child
            .wait_with_output()
            .await
            .context("failed to wait for recognizer")?;

        match writer.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => log_warn!("recognizer closed stdin early: {err}"),
            Err(err) => log_warn!("recognizer stdin writer failed: {err}"),
        }

        if !output.status.success() {
            bail!(
                "recognizer '{}' exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        log_info!(
            "recognizer returned {} characters in {}ms",
            text.trim().chars().count(),
            started.elapsed().as_millis()
        );

        Ok(RecognizedText::new(text))
    }
}
