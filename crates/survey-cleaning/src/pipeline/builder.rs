//! Matrix cleaning orchestrator.
//!
//! This module provides the `Pipeline` struct and builder that clean every
//! column of a raw survey frame according to its codebook type.

use crate::cleaner::ColumnMetadata;
use crate::codebook::Codebook;
use crate::config::CleaningConfig;
use crate::error::{CleaningError, Result};
use crate::imputers::ImputedColumn;
use crate::pipeline::progress::{
    CancellationToken, CleaningStage, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
use crate::types::{ColumnSummary, CleaningSummary, FittedDistribution};
use polars::prelude::*;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Cleaned frame together with a summary of what was imputed.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    /// Same column names and order as the input frame.
    pub data: DataFrame,
    pub summary: CleaningSummary,
}

/// The cleaning pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use survey_cleaning::{Codebook, Pipeline, CleaningConfig};
/// use rand::{SeedableRng, rngs::StdRng};
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let outcome = Pipeline::builder()
///     .config(CleaningConfig::builder().seed(42).build()?)
///     .build()?
///     .process(&raw, &codebook, &mut rng)?;
/// ```
pub struct Pipeline {
    config: CleaningConfig,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: CancellationToken,
}

static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Clean every column of `df` using the types declared in `codebook`.
    ///
    /// All columns are bound to a cleaner before any of them is cleaned, so a
    /// configuration error never leaves work half done. The first column that
    /// fails aborts the run.
    pub fn process<R: Rng + ?Sized>(
        &self,
        df: &DataFrame,
        codebook: &Codebook,
        rng: &mut R,
    ) -> Result<CleaningOutcome> {
        let result = self.resolve(df, codebook).and_then(|metadata| {
            self.clean_frame_internal(df, &metadata, rng)
        });
        self.finish(result)
    }

    /// Clean `df` with explicitly supplied column metadata.
    ///
    /// Metadata is matched to frame columns by name. Every frame column needs
    /// exactly one entry; entries for absent columns are ignored.
    pub fn clean_frame<R: Rng + ?Sized>(
        &self,
        df: &DataFrame,
        metadata: &[ColumnMetadata],
        rng: &mut R,
    ) -> Result<CleaningOutcome> {
        let result = Self::order_metadata(df, metadata)
            .and_then(|ordered| self.clean_frame_internal(df, &ordered, rng));
        self.finish(result)
    }

    /// Clean a single named column of `df`.
    pub fn clean_column<R: Rng + ?Sized>(
        &self,
        df: &DataFrame,
        metadata: &ColumnMetadata,
        rng: &mut R,
    ) -> Result<ImputedColumn> {
        let column = df
            .column(&metadata.name)
            .map_err(|_| CleaningError::ColumnNotFound(metadata.name.clone()))?;
        self.clean_one(column.as_materialized_series(), metadata, rng)
    }

    fn finish(&self, result: Result<CleaningOutcome>) -> Result<CleaningOutcome> {
        match result {
            Ok(outcome) => {
                self.report_progress(ProgressUpdate::complete(format!(
                    "Cleaned {} columns",
                    outcome.summary.columns
                )));
                Ok(outcome)
            }
            Err(e) => {
                if e.is_cancelled() {
                    self.report_progress(ProgressUpdate::cancelled());
                } else {
                    self.report_progress(ProgressUpdate::failed(e.to_string()));
                }
                Err(e)
            }
        }
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation_token.is_cancelled() {
            return Err(CleaningError::Cancelled);
        }
        Ok(())
    }

    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    fn resolve(&self, df: &DataFrame, codebook: &Codebook) -> Result<Vec<ColumnMetadata>> {
        self.report_progress(ProgressUpdate::new(
            CleaningStage::Resolving,
            0.0,
            "Binding columns to codebook types",
        ));

        let metadata = codebook.resolve(df.get_column_names().into_iter().map(|n| n.as_str()))?;
        debug!("Resolved {} columns against codebook", metadata.len());
        Ok(metadata)
    }

    fn order_metadata(df: &DataFrame, metadata: &[ColumnMetadata]) -> Result<Vec<ColumnMetadata>> {
        let mut by_name: HashMap<&str, &ColumnMetadata> = HashMap::with_capacity(metadata.len());
        for entry in metadata {
            if by_name.insert(entry.name.as_str(), entry).is_some() {
                return Err(CleaningError::InvalidConfig(format!(
                    "column '{}' has more than one metadata entry",
                    entry.name
                )));
            }
        }

        df.get_column_names()
            .into_iter()
            .map(|name| {
                by_name
                    .get(name.as_str())
                    .map(|entry| (*entry).clone())
                    .ok_or_else(|| CleaningError::MissingCodebookEntry(name.to_string()))
            })
            .collect()
    }

    fn clean_frame_internal<R: Rng + ?Sized>(
        &self,
        df: &DataFrame,
        metadata: &[ColumnMetadata],
        rng: &mut R,
    ) -> Result<CleaningOutcome> {
        let start_time = Instant::now();
        let total = metadata.len();
        info!("Cleaning {} rows x {} columns", df.height(), total);

        let mut columns: Vec<Column> = Vec::with_capacity(total);
        let mut column_summaries = Vec::with_capacity(total);

        for (idx, entry) in metadata.iter().enumerate() {
            self.check_cancelled()?;

            let imputed = match self.clean_column(df, entry, rng) {
                Ok(imputed) => imputed,
                Err(e) => {
                    error!(
                        "There was an error processing column '{}' of type '{}': {}",
                        entry.name, entry.semantic_type, e
                    );
                    return Err(CleaningError::ColumnFailed {
                        column: entry.name.clone(),
                        semantic_type: entry.semantic_type.to_string(),
                        source: Box::new(e),
                    });
                }
            };

            self.report_progress(ProgressUpdate::for_column(
                &entry.name,
                idx + 1,
                total,
                format!("Cleaned '{}' ({} imputed)", entry.name, imputed.imputed_count),
            ));

            column_summaries.push(ColumnSummary {
                name: entry.name.clone(),
                semantic_type: entry.semantic_type,
                present_count: imputed.present_count,
                imputed_count: imputed.imputed_count,
                distribution: imputed.distribution,
            });
            columns.push(Column::from(imputed.series));
        }

        let data = DataFrame::new(columns)?;
        let summary = CleaningSummary {
            rows: data.height(),
            columns: data.width(),
            duration_ms: start_time.elapsed().as_millis() as u64,
            seed: self.config.seed,
            column_summaries,
        };

        info!(
            "Cleaning complete: {} cells imputed across {} columns",
            summary.total_imputed(),
            summary.columns
        );
        Ok(CleaningOutcome { data, summary })
    }

    fn clean_one<R: Rng + ?Sized>(
        &self,
        series: &Series,
        metadata: &ColumnMetadata,
        rng: &mut R,
    ) -> Result<ImputedColumn> {
        let imputed = metadata.cleaner.clean(series, &self.config, rng)?;

        debug!(
            "Column '{}' ({}): {} present, {} imputed",
            metadata.name, metadata.semantic_type, imputed.present_count, imputed.imputed_count
        );

        if imputed.present_count == 0 && imputed.imputed_count > 0 {
            match imputed.distribution {
                FittedDistribution::Gaussian { .. } | FittedDistribution::Empirical { .. } => {
                    warn!(
                        "Column '{}' has no parseable values; imputing a constant fallback",
                        metadata.name
                    );
                }
                FittedDistribution::EmptyString => {}
            }
        }

        Ok(imputed)
    }
}

/// Builder for [`Pipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<CleaningConfig>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
    cancellation_token: Option<CancellationToken>,
}

impl PipelineBuilder {
    pub fn config(mut self, config: CleaningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a custom progress reporter.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Report progress through a closure.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> Result<Pipeline> {
        let config = self.config.unwrap_or_default();
        config
            .validate()
            .map_err(|e| CleaningError::InvalidConfig(e.to_string()))?;

        Ok(Pipeline {
            config,
            progress_reporter: self.progress_reporter,
            cancellation_token: self.cancellation_token.unwrap_or_default(),
        })
    }
}
