use serde::{Deserialize, Serialize};

use super::error::CaptureErrorKind;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    #[default]
    Idle,
    Negotiating,
    Active,
    Failed,
}

/// Observable state of the one hardware stream a capture surface may own.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSession {
    pub state: SessionState,
    pub active_configuration_index: Option<usize>,
    pub error_kind: Option<CaptureErrorKind>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_negotiation(&mut self) {
        *self = Self {
            state: SessionState::Negotiating,
            active_configuration_index: None,
            error_kind: None,
        };
    }

    pub fn activate(&mut self, configuration_index: usize) {
        self.state = SessionState::Active;
        self.active_configuration_index = Some(configuration_index);
        self.error_kind = None;
    }

    pub fn fail(&mut self, kind: CaptureErrorKind) {
        self.state = SessionState::Failed;
        self.active_configuration_index = None;
        self.error_kind = Some(kind);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_transitions() {
        let mut session = CaptureSession::new();
        assert_eq!(session.state, SessionState::Idle);

        session.begin_negotiation();
        assert_eq!(session.state, SessionState::Negotiating);

        session.activate(2);
        assert!(session.is_active());
        assert_eq!(session.active_configuration_index, Some(2));

        session.reset();
        assert_eq!(session, CaptureSession::default());
    }

    #[test]
    fn failure_records_classification() {
        let mut session = CaptureSession::new();
        session.begin_negotiation();
        session.fail(CaptureErrorKind::Busy);
        assert_eq!(session.state, SessionState::Failed);
        assert_eq!(session.error_kind, Some(CaptureErrorKind::Busy));
        assert!(!session.is_active());
    }
}
