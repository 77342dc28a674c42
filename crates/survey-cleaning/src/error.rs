//! Error types for the survey cleaning engine.
//!
//! Configuration problems (unmapped columns, unknown semantic types) are
//! raised before any column is touched. Failures while cleaning a column are
//! wrapped with the column name and declared type so a run always reports
//! which column aborted it.
//!
//! Errors are serializable as `{code, message}` for machine-readable output.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for a cleaning run.
#[derive(Error, Debug)]
pub enum CleaningError {
    /// Run was cancelled through a [`CancellationToken`](crate::pipeline::CancellationToken).
    #[error("Cleaning run cancelled")]
    Cancelled,

    /// A column in the dataset has no codebook entry.
    #[error("Column '{0}' has no codebook entry")]
    MissingCodebookEntry(String),

    /// A column named in the metadata is absent from the dataset.
    #[error("Column '{0}' not found in the dataset")]
    ColumnNotFound(String),

    /// The codebook declares a semantic type with no registered cleaner.
    #[error("Column '{column}' declares unknown semantic type '{declared}'")]
    UnknownSemanticType { column: String, declared: String },

    /// The codebook file is structurally unusable.
    #[error("Invalid codebook: {0}")]
    InvalidCodebook(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Fitting or sampling a column's distribution failed.
    #[error("Failed to impute missing values in column '{column}': {reason}")]
    ImputationFailed { column: String, reason: String },

    /// A column failed while being cleaned; aborts the whole run.
    #[error("Failed to clean column '{column}' of type '{semantic_type}': {source}")]
    ColumnFailed {
        column: String,
        semantic_type: String,
        #[source]
        source: Box<CleaningError>,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<CleaningError>,
    },
}

impl CleaningError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        CleaningError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for scripts consuming the JSON summary.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => "CANCELLED",
            Self::MissingCodebookEntry(_) => "MISSING_CODEBOOK_ENTRY",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::UnknownSemanticType { .. } => "UNKNOWN_SEMANTIC_TYPE",
            Self::InvalidCodebook(_) => "INVALID_CODEBOOK",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::ImputationFailed { .. } => "IMPUTATION_FAILED",
            Self::ColumnFailed { .. } => "COLUMN_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error represents a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Configuration errors are detected before any cleaning happens.
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::MissingCodebookEntry(_)
            | Self::UnknownSemanticType { .. }
            | Self::InvalidCodebook(_)
            | Self::InvalidConfig(_) => true,
            Self::WithContext { source, .. } => source.is_configuration_error(),
            _ => false,
        }
    }

    /// Name of the column that aborted the run, if any.
    pub fn failed_column(&self) -> Option<&str> {
        match self {
            Self::ColumnFailed { column, .. } => Some(column),
            Self::MissingCodebookEntry(column) => Some(column),
            Self::ColumnNotFound(column) => Some(column),
            Self::UnknownSemanticType { column, .. } => Some(column),
            Self::WithContext { source, .. } => source.failed_column(),
            _ => None,
        }
    }
}

impl Serialize for CleaningError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("CleaningError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for cleaning operations.
pub type Result<T> = std::result::Result<T, CleaningError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| CleaningError::Polars(e).with_context(context))
    }
}
