//! Imputation module for replacing missing cells.
//!
//! Replacement values are drawn from distributions fitted to each column's
//! own present values:
//! - Normal draws for numeric and date/time columns
//! - Empirical frequency draws for categorical columns
//! - Empty-string fill for character and open-ended columns

mod distribution;

pub use distribution::{
    ConvertedColumn, DistributionImputer, EmpiricalDistribution, GaussianSummary, ImputedColumn,
};
