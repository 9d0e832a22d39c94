#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from addrscan for tests
pub use addrscan::{
    AddressDetector, AppConfig, BlockOutcome, Collaborators, DetectionConfig, Group, ModelPaths,
    PipelineResult, Readiness, Rectangle, RejectReason, RunError, Session, Startup, Verdict,
};
