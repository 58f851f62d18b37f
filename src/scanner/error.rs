use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::{CaptureErrorKind, CaptureFailure, SurfaceError};
use crate::reconcile::StoreError;
use crate::vin::{ExtractionError, ValidationError};

/// Every way a scan or manual submission can fail. Each variant leaves the
/// scanner idle and ready for another attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Capture(#[from] CaptureFailure),
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("camera did not produce a frame within {waited_ms} ms")]
    Timeout { waited_ms: u64 },
    #[error("text recognition failed: {0}")]
    Recognition(String),
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Reconciliation(#[from] StoreError),
    #[error("scan cancelled")]
    Cancelled,
}

/// Flat classification for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FailureKind {
    #[serde(rename_all = "camelCase")]
    Camera { reason: CaptureErrorKind },
    CameraNotReady,
    FrameCapture,
    Timeout,
    Recognition,
    TextTooShort,
    CodeNotFound,
    InvalidCode,
    DuplicateCode,
    MissingRecord,
    Store,
    Cancelled,
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Capture(failure) => FailureKind::Camera {
                reason: failure.kind,
            },
            PipelineError::Surface(SurfaceError::NotReady) => FailureKind::CameraNotReady,
            PipelineError::Surface(SurfaceError::Frame(_)) => FailureKind::FrameCapture,
            PipelineError::Timeout { .. } => FailureKind::Timeout,
            PipelineError::Recognition(_) => FailureKind::Recognition,
            PipelineError::Extraction(ExtractionError::TextTooShort { .. }) => {
                FailureKind::TextTooShort
            }
            PipelineError::Extraction(ExtractionError::NotFound) => FailureKind::CodeNotFound,
            PipelineError::Validation(_) => FailureKind::InvalidCode,
            PipelineError::Reconciliation(StoreError::DuplicateCode(_)) => {
                FailureKind::DuplicateCode
            }
            PipelineError::Reconciliation(StoreError::MissingRecord(_)) => {
                FailureKind::MissingRecord
            }
            PipelineError::Reconciliation(StoreError::Backend(_)) => FailureKind::Store,
            PipelineError::Cancelled => FailureKind::Cancelled,
        }
    }

    /// True when retrying cannot help until the operator changes a system
    /// setting, which today means a denied camera permission.
    pub fn requires_external_action(&self) -> bool {
        match self {
            PipelineError::Capture(failure) => failure.kind.requires_external_action(),
            _ => false,
        }
    }

    pub fn report(&self) -> FailureReport {
        FailureReport {
            failure: self.kind(),
            message: self.to_string(),
            requires_external_action: self.requires_external_action(),
        }
    }
}

/// Serializable view of a [`PipelineError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureReport {
    pub failure: FailureKind,
    pub message: String,
    pub requires_external_action: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_permission_denial_requires_external_action() {
        let denied = PipelineError::from(CaptureFailure {
            kind: CaptureErrorKind::PermissionDenied,
            attempts: 1,
            detail: None,
        });
        assert!(denied.requires_external_action());
        assert_eq!(
            denied.kind(),
            FailureKind::Camera {
                reason: CaptureErrorKind::PermissionDenied
            }
        );

        let busy = PipelineError::from(CaptureFailure {
            kind: CaptureErrorKind::Busy,
            attempts: 5,
            detail: None,
        });
        assert!(!busy.requires_external_action());
        assert!(!PipelineError::Extraction(ExtractionError::NotFound).requires_external_action());
    }

    #[test]
    fn extraction_failures_are_distinct_from_hardware_failures() {
        assert_eq!(
            PipelineError::from(ExtractionError::NotFound).kind(),
            FailureKind::CodeNotFound
        );
        assert_ne!(
            PipelineError::from(ExtractionError::NotFound).kind(),
            PipelineError::Recognition("timeout".into()).kind()
        );
    }

    #[test]
    fn report_serializes_flat() {
        let report = PipelineError::from(StoreError::DuplicateCode("X".into())).report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failure"]["kind"], "duplicateCode");
        assert_eq!(json["requiresExternalAction"], false);

        let camera = PipelineError::from(CaptureFailure {
            kind: CaptureErrorKind::NoDevice,
            attempts: 5,
            detail: None,
        })
        .report();
        let json = serde_json::to_value(&camera).unwrap();
        assert_eq!(json["failure"]["kind"], "camera");
        assert_eq!(json["failure"]["reason"], "NoDevice");
    }
}
