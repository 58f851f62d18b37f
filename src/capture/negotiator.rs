use super::backend::{CaptureBackend, VideoStream};
use super::config::{CaptureConfig, EnvironmentCapabilities};
use super::error::{BackendError, CaptureErrorKind, CaptureFailure};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    Trying(usize),
    Active(usize),
    Failed(CaptureErrorKind),
}

/// Fallback-chain state machine, independent of any backend so each
/// transition can be driven directly.
#[derive(Debug, Clone)]
pub struct Negotiator {
    config_count: usize,
    capabilities: EnvironmentCapabilities,
    state: NegotiationState,
    attempts: usize,
    last_error: Option<BackendError>,
}

impl Negotiator {
    pub fn new(config_count: usize, capabilities: EnvironmentCapabilities) -> Self {
        Self {
            config_count,
            capabilities,
            state: NegotiationState::Idle,
            attempts: 0,
            last_error: None,
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// `Idle → Trying(0)`, or straight to `Failed` when the environment rules
    /// out capture entirely.
    pub fn begin(&mut self) -> NegotiationState {
        if self.state != NegotiationState::Idle {
            return self.state;
        }

        self.state = if !self.capabilities.secure_context {
            NegotiationState::Failed(CaptureErrorKind::SecurityRestricted)
        } else if !self.capabilities.capture_api_present || self.config_count == 0 {
            NegotiationState::Failed(CaptureErrorKind::Unsupported)
        } else {
            NegotiationState::Trying(0)
        };
        self.state
    }

    pub fn record_success(&mut self) -> NegotiationState {
        if let NegotiationState::Trying(index) = self.state {
            self.attempts += 1;
            self.state = NegotiationState::Active(index);
        }
        self.state
    }

    /// Permission denial ends the chain immediately; anything else advances to
    /// the next configuration, failing with the last classification once the
    /// chain is exhausted.
    pub fn record_failure(&mut self, error: BackendError) -> NegotiationState {
        let NegotiationState::Trying(index) = self.state else {
            return self.state;
        };

        self.attempts += 1;
        let kind = error.classify();
        self.last_error = Some(error);

        self.state = if kind == CaptureErrorKind::PermissionDenied {
            NegotiationState::Failed(kind)
        } else if index + 1 < self.config_count {
            NegotiationState::Trying(index + 1)
        } else {
            NegotiationState::Failed(kind)
        };
        self.state
    }

    fn failure(&self, kind: CaptureErrorKind) -> CaptureFailure {
        CaptureFailure {
            kind,
            attempts: self.attempts,
            detail: self.last_error.as_ref().map(ToString::to_string),
        }
    }
}

pub struct NegotiatedStream {
    pub stream: Box<dyn VideoStream>,
    pub config_index: usize,
    pub config: CaptureConfig,
}

impl std::fmt::Debug for NegotiatedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NegotiatedStream")
            .field("config_index", &self.config_index)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Walk the configuration list against `backend` until a stream opens.
pub async fn negotiate(
    backend: &dyn CaptureBackend,
    configs: &[CaptureConfig],
    capabilities: EnvironmentCapabilities,
) -> Result<NegotiatedStream, CaptureFailure> {
    let mut negotiator = Negotiator::new(configs.len(), capabilities);
    negotiator.begin();

    while let NegotiationState::Trying(index) = negotiator.state() {
        let Some(config) = configs.get(index) else {
            break;
        };

        match backend.open(config).await {
            Ok(stream) => {
                negotiator.record_success();
                log_info!(
                    "camera negotiated with configuration {} ('{}') after {} attempt(s)",
                    index,
                    config.label,
                    negotiator.attempts()
                );
                return Ok(NegotiatedStream {
                    stream,
                    config_index: index,
                    config: config.clone(),
                });
            }
            Err(err) => {
                log_warn!(
                    "camera configuration {} ('{}') failed: {} [{}]",
                    index,
                    config.label,
                    err,
                    err.classify()
                );
                negotiator.record_failure(err);
            }
        }
    }

    let kind = match negotiator.state() {
        NegotiationState::Failed(kind) => kind,
        _ => CaptureErrorKind::Unknown,
    };
    Err(negotiator.failure(kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::config::default_chain;
    use crate::testing::MockBackend;

    #[test]
    fn state_machine_walks_the_chain() {
        let mut negotiator = Negotiator::new(3, EnvironmentCapabilities::default());
        assert_eq!(negotiator.state(), NegotiationState::Idle);
        assert_eq!(negotiator.begin(), NegotiationState::Trying(0));
        assert_eq!(
            negotiator.record_failure(BackendError::new("OverconstrainedError", "")),
            NegotiationState::Trying(1)
        );
        assert_eq!(
            negotiator.record_failure(BackendError::new("NotReadableError", "")),
            NegotiationState::Trying(2)
        );
        assert_eq!(negotiator.record_success(), NegotiationState::Active(2));
        assert_eq!(negotiator.attempts(), 3);
    }

    #[test]
    fn permission_denial_short_circuits_state_machine() {
        let mut negotiator = Negotiator::new(5, EnvironmentCapabilities::default());
        negotiator.begin();
        assert_eq!(
            negotiator.record_failure(BackendError::new("NotAllowedError", "")),
            NegotiationState::Failed(CaptureErrorKind::PermissionDenied)
        );
        // Terminal: further events do not move it.
        assert_eq!(
            negotiator.record_success(),
            NegotiationState::Failed(CaptureErrorKind::PermissionDenied)
        );
    }

    #[test]
    fn exhausted_chain_reports_last_classification() {
        let mut negotiator = Negotiator::new(2, EnvironmentCapabilities::default());
        negotiator.begin();
        negotiator.record_failure(BackendError::new("NotFoundError", ""));
        assert_eq!(
            negotiator.record_failure(BackendError::new("NotReadableError", "")),
            NegotiationState::Failed(CaptureErrorKind::Busy)
        );
    }

    #[test]
    fn environment_checks_fail_before_any_attempt() {
        let insecure = EnvironmentCapabilities {
            secure_context: false,
            capture_api_present: true,
        };
        assert_eq!(
            Negotiator::new(5, insecure).begin(),
            NegotiationState::Failed(CaptureErrorKind::SecurityRestricted)
        );

        let no_api = EnvironmentCapabilities {
            secure_context: true,
            capture_api_present: false,
        };
        assert_eq!(
            Negotiator::new(5, no_api).begin(),
            NegotiationState::Failed(CaptureErrorKind::Unsupported)
        );

        assert_eq!(
            Negotiator::new(0, EnvironmentCapabilities::default()).begin(),
            NegotiationState::Failed(CaptureErrorKind::Unsupported)
        );
    }

    #[tokio::test]
    async fn permission_denied_on_first_configuration_stops_negotiation() {
        let backend = MockBackend::new()
            .fail("rear-high", "NotAllowedError")
            .succeed("rear-low", 1280, 720);

        let failure = negotiate(&backend, &default_chain(), EnvironmentCapabilities::default())
            .await
            .unwrap_err();

        assert_eq!(failure.kind, CaptureErrorKind::PermissionDenied);
        assert_eq!(failure.attempts, 1);
        assert_eq!(backend.attempted(), vec!["rear-high".to_string()]);
    }

    #[tokio::test]
    async fn falls_back_to_first_working_configuration() {
        let backend = MockBackend::new()
            .fail("rear-high", "OverconstrainedError")
            .fail("rear-low", "NotReadableError")
            .succeed("front", 1280, 720)
            .succeed("generic", 640, 480);

        let negotiated = negotiate(&backend, &default_chain(), EnvironmentCapabilities::default())
            .await
            .unwrap();

        assert_eq!(negotiated.config_index, 2);
        assert_eq!(negotiated.config.label, "front");
        assert_eq!(backend.attempted(), vec!["rear-high", "rear-low", "front"]);
    }

    #[tokio::test]
    async fn all_configurations_failing_is_classified() {
        let backend = MockBackend::new();

        let failure = negotiate(&backend, &default_chain(), EnvironmentCapabilities::default())
            .await
            .unwrap_err();

        assert_eq!(failure.kind, CaptureErrorKind::NoDevice);
        assert_eq!(failure.attempts, 5);
        assert!(failure.detail.is_some());
    }

    #[tokio::test]
    async fn insecure_context_never_touches_hardware() {
        let backend = MockBackend::new().succeed("rear-high", 1920, 1080);
        let capabilities = EnvironmentCapabilities {
            secure_context: false,
            capture_api_present: true,
        };

        let failure = negotiate(&backend, &default_chain(), capabilities)
            .await
            .unwrap_err();

        assert_eq!(failure.kind, CaptureErrorKind::SecurityRestricted);
        assert_eq!(failure.attempts, 0);
        assert!(backend.attempted().is_empty());
    }
}
