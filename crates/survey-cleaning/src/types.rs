//! Core data types shared across the cleaning engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared semantic type of a survey variable.
///
/// The codebook spells these out as free-text labels; [`SemanticType::from_codebook`]
/// accepts exactly those labels and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    /// Integer-coded answer categories
    Categorical,
    /// Continuous numbers
    Numeric,
    /// Calendar dates or clock times
    DateOrTime,
    /// Free character fields, almost always empty
    Character,
    /// Free-text answers to open-ended questions
    OpenEndedResponse,
}

impl SemanticType {
    /// All semantic types, in codebook documentation order.
    pub const ALL: [SemanticType; 5] = [
        Self::Character,
        Self::Numeric,
        Self::Categorical,
        Self::OpenEndedResponse,
        Self::DateOrTime,
    ];

    /// Parse a codebook `type_var` label.
    pub fn from_codebook(label: &str) -> Option<Self> {
        match label {
            "character [almost exclusively empty strings]" => Some(Self::Character),
            "numeric" => Some(Self::Numeric),
            "categorical" => Some(Self::Categorical),
            "response to open-ended question" => Some(Self::OpenEndedResponse),
            "date or time" => Some(Self::DateOrTime),
            _ => None,
        }
    }

    /// The codebook label for this type.
    pub fn codebook_label(&self) -> &'static str {
        match self {
            Self::Character => "character [almost exclusively empty strings]",
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::OpenEndedResponse => "response to open-ended question",
            Self::DateOrTime => "date or time",
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codebook_label())
    }
}

/// Description of the distribution a column was imputed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedDistribution {
    /// Normal distribution over present values.
    Gaussian { mean: f64, std_dev: f64 },
    /// Empirical frequency table over present integer codes.
    Empirical {
        categories: usize,
        most_frequent: i64,
        degenerate: bool,
    },
    /// Missing text replaced by the empty string.
    EmptyString,
}

/// Per-column outcome of a cleaning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub semantic_type: SemanticType,
    /// Cells that converted successfully and were kept as-is.
    pub present_count: usize,
    /// Cells that were missing or unparseable and got a replacement.
    pub imputed_count: usize,
    pub distribution: FittedDistribution,
}

impl ColumnSummary {
    /// Fraction of cells that had to be imputed.
    pub fn imputed_fraction(&self) -> f64 {
        let total = self.present_count + self.imputed_count;
        if total == 0 {
            0.0
        } else {
            self.imputed_count as f64 / total as f64
        }
    }
}

/// Summary of a whole cleaning run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub rows: usize,
    pub columns: usize,
    pub duration_ms: u64,
    /// Seed the run was started with, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub column_summaries: Vec<ColumnSummary>,
}

impl CleaningSummary {
    /// Total number of imputed cells across all columns.
    pub fn total_imputed(&self) -> usize {
        self.column_summaries.iter().map(|c| c.imputed_count).sum()
    }

    /// Number of columns for each semantic type, in [`SemanticType::ALL`] order.
    pub fn columns_by_type(&self) -> Vec<(SemanticType, usize)> {
        SemanticType::ALL
            .iter()
            .map(|ty| {
                let count = self
                    .column_summaries
                    .iter()
                    .filter(|c| c.semantic_type == *ty)
                    .count();
                (*ty, count)
            })
            .collect()
    }
}
