//! Column cleaning dispatch.
//!
//! This module provides:
//! - Cell converters for each semantic type
//! - [`ColumnCleaner`], which routes a column to its imputation strategy
//! - [`ColumnMetadata`], binding a column name to its type and cleaner

mod converters;

pub use converters::{
    DATE_FORMATS, NULL_STRINGS, float_or_missing, int_or_missing, is_null_string,
    text_or_missing, timestamp_or_missing,
};

use crate::config::CleaningConfig;
use crate::error::{CleaningError, Result};
use crate::imputers::{DistributionImputer, ImputedColumn};
use crate::types::SemanticType;
use polars::prelude::*;
use rand::Rng;

/// Which converter a continuous column is parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuousKind {
    /// Plain floating point numbers
    Numeric,
    /// Clock times and calendar dates, as seconds
    DateOrTime,
}

impl ContinuousKind {
    fn converter(&self) -> fn(&str) -> Option<f64> {
        match self {
            Self::Numeric => float_or_missing,
            Self::DateOrTime => timestamp_or_missing,
        }
    }
}

/// Imputation strategy for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCleaner {
    /// Empirical frequency draws over integer codes
    Categorical,
    /// Normal draws over converted values
    Continuous(ContinuousKind),
    /// Null tokens replaced by the empty string
    Character,
}

impl ColumnCleaner {
    /// Cleaner registered for a semantic type.
    ///
    /// Open-ended responses share the character logic.
    pub fn for_type(semantic_type: SemanticType) -> Self {
        match semantic_type {
            SemanticType::Categorical => Self::Categorical,
            SemanticType::Numeric => Self::Continuous(ContinuousKind::Numeric),
            SemanticType::DateOrTime => Self::Continuous(ContinuousKind::DateOrTime),
            SemanticType::Character | SemanticType::OpenEndedResponse => Self::Character,
        }
    }

    /// Resolve a codebook label for `column`.
    ///
    /// Fails with [`CleaningError::UnknownSemanticType`] when the label has no
    /// registered cleaner.
    pub fn for_declared_type(column: &str, declared: &str) -> Result<(SemanticType, Self)> {
        let semantic_type = SemanticType::from_codebook(declared).ok_or_else(|| {
            CleaningError::UnknownSemanticType {
                column: column.to_string(),
                declared: declared.to_string(),
            }
        })?;
        Ok((semantic_type, Self::for_type(semantic_type)))
    }

    /// Clean one raw string column.
    pub fn clean<R: Rng + ?Sized>(
        &self,
        series: &Series,
        config: &CleaningConfig,
        rng: &mut R,
    ) -> Result<ImputedColumn> {
        match self {
            Self::Categorical => DistributionImputer::impute_categorical(
                series,
                config.fallback_category,
                config.categorical_draw,
                rng,
            ),
            Self::Continuous(kind) => {
                DistributionImputer::impute_continuous(series, kind.converter(), rng)
            }
            Self::Character => DistributionImputer::impute_character(series),
        }
    }
}

/// A dataset column bound to its declared type and cleaner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub name: String,
    pub semantic_type: SemanticType,
    pub cleaner: ColumnCleaner,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            cleaner: ColumnCleaner::for_type(semantic_type),
        }
    }
}
