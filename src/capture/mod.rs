//! Camera side of the pipeline: negotiating a stream across the fallback
//! chain and turning it into still frames.

pub mod backend;
pub mod config;
pub mod error;
pub mod negotiator;
pub mod session;
pub mod still;
pub mod surface;

pub use backend::{CaptureBackend, RawFrame, VideoStream};
pub use config::{default_chain, CaptureConfig, EnvironmentCapabilities, FacingMode};
pub use error::{BackendError, CaptureErrorKind, CaptureFailure};
pub use negotiator::{negotiate, NegotiationState, Negotiator};
pub use session::{CaptureSession, SessionState};
pub use still::{StillDevice, StillImageBackend};
pub use surface::{CaptureSurface, CapturedFrame, SurfaceError};
