//! Pipeline module.
//!
//! This module provides the cleaning orchestrator and its progress plumbing.

mod builder;
pub mod progress;

pub use builder::{CleaningOutcome, Pipeline, PipelineBuilder};
pub use progress::{
    CancellationToken, CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
