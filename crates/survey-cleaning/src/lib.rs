//! Survey Data Cleaning Library
//!
//! Codebook-driven cleaning of raw tabular survey data, built with Rust and
//! Polars. Every column is cleaned according to its declared semantic type and
//! missing or malformed cells are replaced by draws from distributions fitted
//! to the column's own values.
//!
//! # Overview
//!
//! - **Converters**: total cell parsers for integers, floats, clock times and
//!   dates, and text with null tokens
//! - **Imputers**: normal draws for numeric and date/time columns, empirical
//!   frequency draws for categorical columns, empty-string fill for text
//! - **Dispatch**: one [`ColumnCleaner`] per [`SemanticType`]
//! - **Pipeline**: cleans a whole frame, aborting with the failing column's
//!   name and type on the first error
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use survey_cleaning::{io, CleaningConfig, Pipeline};
//! use rand::{SeedableRng, rngs::StdRng};
//! use std::path::Path;
//!
//! let codebook = io::read_codebook(Path::new("codebook.csv"))?;
//! let raw = io::read_raw_frame(Path::new("training_data.csv"), b',')?;
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let mut outcome = Pipeline::builder()
//!     .config(CleaningConfig::builder().seed(42).build()?)
//!     .build()?
//!     .process(&raw, &codebook, &mut rng)?;
//!
//! io::write_frame(&mut outcome.data, Path::new("cleaned.csv"), b',')?;
//! ```
//!
//! # Randomness
//!
//! Every entry point takes the random source as a parameter. Pass a seeded
//! `StdRng` for reproducible output; the same seed, codebook and input always
//! give the same cleaned frame.

pub mod cleaner;
pub mod codebook;
pub mod config;
pub mod error;
pub mod imputers;
pub mod io;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use cleaner::{ColumnCleaner, ColumnMetadata, ContinuousKind};
pub use codebook::Codebook;
pub use config::{CategoricalDraw, CleaningConfig, CleaningConfigBuilder, ConfigValidationError};
pub use error::{CleaningError, Result as CleaningResult, ResultExt};
pub use imputers::{DistributionImputer, EmpiricalDistribution, GaussianSummary, ImputedColumn};
pub use pipeline::{
    CancellationToken, CleaningOutcome, CleaningStage, ClosureProgressReporter, Pipeline,
    PipelineBuilder, ProgressReporter, ProgressUpdate,
};
pub use types::{CleaningSummary, ColumnSummary, FittedDistribution, SemanticType};
