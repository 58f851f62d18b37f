use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification handed to the presentation layer so it can show a
/// targeted remediation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaptureErrorKind {
    PermissionDenied,
    NoDevice,
    Unsupported,
    Busy,
    SecurityRestricted,
    Unknown,
}

impl CaptureErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureErrorKind::PermissionDenied => "PermissionDenied",
            CaptureErrorKind::NoDevice => "NoDevice",
            CaptureErrorKind::Unsupported => "Unsupported",
            CaptureErrorKind::Busy => "Busy",
            CaptureErrorKind::SecurityRestricted => "SecurityRestricted",
            CaptureErrorKind::Unknown => "Unknown",
        }
    }

    /// Retrying cannot help until the operator changes browser/OS settings.
    pub fn requires_external_action(&self) -> bool {
        matches!(self, CaptureErrorKind::PermissionDenied)
    }
}

impl fmt::Display for CaptureErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw failure reported by a capture backend for one configuration, named
/// the way platform media APIs name them (`NotAllowedError`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{name}: {message}")]
pub struct BackendError {
    pub name: String,
    pub message: String,
}

impl BackendError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn from_io(err: &io::Error) -> Self {
        let name = match err.kind() {
            io::ErrorKind::PermissionDenied => "NotAllowedError",
            io::ErrorKind::NotFound => "NotFoundError",
            io::ErrorKind::WouldBlock => "NotReadableError",
            io::ErrorKind::Unsupported => "NotSupportedError",
            _ => "UnknownError",
        };
        Self::new(name, err.to_string())
    }

    pub fn classify(&self) -> CaptureErrorKind {
        match self.name.as_str() {
            "NotAllowedError" | "PermissionDeniedError" => CaptureErrorKind::PermissionDenied,
            "NotFoundError"
            | "DevicesNotFoundError"
            | "OverconstrainedError"
            | "ConstraintNotSatisfiedError" => CaptureErrorKind::NoDevice,
            "NotReadableError" | "TrackStartError" | "AbortError" => CaptureErrorKind::Busy,
            "NotSupportedError" | "TypeError" => CaptureErrorKind::Unsupported,
            "SecurityError" => CaptureErrorKind::SecurityRestricted,
            _ => CaptureErrorKind::Unknown,
        }
    }
}

/// Final result of a failed negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("camera unavailable: {kind} after {attempts} attempt(s){}", detail_suffix(.detail))]
pub struct CaptureFailure {
    pub kind: CaptureErrorKind,
    pub attempts: usize,
    pub detail: Option<String>,
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(" ({d})"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_platform_error_names() {
        let cases = [
            ("NotAllowedError", CaptureErrorKind::PermissionDenied),
            ("PermissionDeniedError", CaptureErrorKind::PermissionDenied),
            ("NotFoundError", CaptureErrorKind::NoDevice),
            ("OverconstrainedError", CaptureErrorKind::NoDevice),
            ("NotReadableError", CaptureErrorKind::Busy),
            ("TrackStartError", CaptureErrorKind::Busy),
            ("NotSupportedError", CaptureErrorKind::Unsupported),
            ("SecurityError", CaptureErrorKind::SecurityRestricted),
            ("SomethingElse", CaptureErrorKind::Unknown),
        ];
        for (name, expected) in cases {
            assert_eq!(BackendError::new(name, "x").classify(), expected, "{name}");
        }
    }

    #[test]
    fn io_errors_map_onto_platform_names() {
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert_eq!(
            BackendError::from_io(&denied).classify(),
            CaptureErrorKind::PermissionDenied
        );
        let missing = io::Error::new(io::ErrorKind::NotFound, "missing");
        assert_eq!(BackendError::from_io(&missing).classify(), CaptureErrorKind::NoDevice);
    }

    #[test]
    fn only_permission_denial_needs_external_action() {
        assert!(CaptureErrorKind::PermissionDenied.requires_external_action());
        assert!(!CaptureErrorKind::Busy.requires_external_action());
        assert!(!CaptureErrorKind::SecurityRestricted.requires_external_action());
    }

    #[test]
    fn failure_message_carries_classification() {
        let failure = CaptureFailure {
            kind: CaptureErrorKind::PermissionDenied,
            attempts: 1,
            detail: Some("NotAllowedError: denied".into()),
        };
        assert_eq!(
            failure.to_string(),
            "camera unavailable: PermissionDenied after 1 attempt(s) (NotAllowedError: denied)"
        );
    }
}
