pub mod controller;
pub mod error;

pub use controller::{CodeSource, ScanCandidate, ScanReport, ScannerController};
pub use error::{FailureKind, FailureReport, PipelineError};
