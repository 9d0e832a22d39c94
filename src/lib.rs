pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod session;

pub use config::{AppConfig, DetectionConfig, ModelPaths};
pub use detection::AddressDetector;
pub use error::{RegionError, RunError};
pub use models::{AddressCandidate, BlockOutcome, Group, PipelineResult, Rectangle, RejectReason, Verdict};
pub use pipeline::{DebugConfig, Pipeline, PipelineContext, PipelineData, PipelineStep};
pub use session::{Collaborators, Readiness, Session, Startup};
