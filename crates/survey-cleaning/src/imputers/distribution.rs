//! Distribution-based imputation.
//!
//! Each column is converted cell by cell, the parseable cells are used to fit
//! a simple empirical distribution, and every unparseable cell receives an
//! independent draw from that distribution. Present cells are never altered.

use crate::config::CategoricalDraw;
use crate::error::{CleaningError, Result};
use crate::types::FittedDistribution;
use polars::prelude::*;
use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use rand_distr::Normal;
use std::collections::BTreeMap;

/// A column after cell-level conversion, with `None` marking missing cells.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedColumn<T> {
    values: Vec<Option<T>>,
}

impl<T: Copy> ConvertedColumn<T> {
    /// Apply `convert` to every cell. Null cells are missing.
    pub fn convert<F>(column: &StringChunked, convert: F) -> Self
    where
        F: Fn(&str) -> Option<T>,
    {
        let values = column
            .into_iter()
            .map(|cell| cell.and_then(&convert))
            .collect();
        Self { values }
    }

    pub fn from_values(values: Vec<Option<T>>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Indices of cells that failed conversion.
    pub fn missing_indices(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(idx, v)| v.is_none().then_some(idx))
            .collect()
    }

    /// Converted values of the present cells, in column order.
    pub fn present_values(&self) -> Vec<T> {
        self.values.iter().flatten().copied().collect()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    pub fn present_count(&self) -> usize {
        self.len() - self.missing_count()
    }

    /// Put `draws` into the missing cells, in index order.
    ///
    /// `draws` must yield at least [`missing_count`](Self::missing_count) items.
    pub fn fill_missing<I>(&self, draws: I) -> Vec<Option<T>>
    where
        I: IntoIterator<Item = T>,
    {
        let mut draws = draws.into_iter();
        self.values
            .iter()
            .map(|v| v.or_else(|| draws.next()))
            .collect()
    }
}

/// Mean and population standard deviation of a column's present values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianSummary {
    pub mean: f64,
    pub std_dev: f64,
}

impl GaussianSummary {
    /// Fit over `values`. An empty slice gives mean 0 and std 0, so every
    /// draw is exactly 0.
    ///
    /// Large magnitudes are first divided by a power of two, which is exact,
    /// so finite input always yields a finite mean and std.
    pub fn fit(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                mean: 0.0,
                std_dev: 0.0,
            };
        }

        let max_abs = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let scale = if max_abs > 1.0 {
            2.0_f64.powi(max_abs.log2().floor() as i32)
        } else {
            1.0
        };

        let n = values.len() as f64;
        let mean = values.iter().map(|v| v / scale).sum::<f64>() / n;
        let variance = values
            .iter()
            .map(|v| (v / scale - mean).powi(2))
            .sum::<f64>()
            / n;

        Self {
            mean: mean * scale,
            std_dev: variance.sqrt() * scale,
        }
    }

    /// Draw `count` independent values from Normal(mean, std_dev).
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
    ) -> std::result::Result<Vec<f64>, rand_distr::NormalError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let normal = Normal::new(self.mean, self.std_dev)?;
        Ok((0..count).map(|_| normal.sample(rng)).collect())
    }
}

/// Frequency table over the distinct integer codes of a column.
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalDistribution {
    /// Distinct values, ascending.
    values: Vec<i64>,
    /// Fraction of present cells holding each value.
    frequencies: Vec<f64>,
}

impl EmpiricalDistribution {
    /// Fit over `observed`. With nothing observed, the distribution is
    /// `fallback` with probability 1.
    pub fn fit(observed: &[i64], fallback: i64) -> Self {
        if observed.is_empty() {
            return Self::degenerate(fallback);
        }

        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for value in observed {
            *counts.entry(*value).or_insert(0) += 1;
        }

        let total = observed.len() as f64;
        let (values, frequencies): (Vec<i64>, Vec<f64>) = counts
            .into_iter()
            .map(|(value, count)| (value, count as f64 / total))
            .unzip();

        Self {
            values,
            frequencies,
        }
    }

    /// Single-value distribution with probability 1.
    pub fn degenerate(value: i64) -> Self {
        Self {
            values: vec![value],
            frequencies: vec![1.0],
        }
    }

    pub fn values(&self) -> &[i64] {
        &self.values
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    /// Frequency of `value`, zero if never observed.
    pub fn frequency_of(&self, value: i64) -> f64 {
        self.values
            .binary_search(&value)
            .map(|idx| self.frequencies[idx])
            .unwrap_or(0.0)
    }

    /// Most frequent value; ties go to the smallest value.
    pub fn mode(&self) -> i64 {
        let mut best = 0;
        for idx in 1..self.values.len() {
            if self.frequencies[idx] > self.frequencies[best] {
                best = idx;
            }
        }
        self.values[best]
    }

    /// Draw `count` values according to `policy`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
        policy: CategoricalDraw,
    ) -> std::result::Result<Vec<i64>, rand::distributions::WeightedError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let index = WeightedIndex::new(&self.frequencies)?;
        let draws = match policy {
            CategoricalDraw::PerCell => (0..count)
                .map(|_| self.values[index.sample(rng)])
                .collect(),
            CategoricalDraw::SharedBatch => vec![self.values[index.sample(rng)]; count],
        };
        Ok(draws)
    }
}

/// Result of imputing a single column.
#[derive(Debug, Clone)]
pub struct ImputedColumn {
    pub series: Series,
    pub present_count: usize,
    pub imputed_count: usize,
    pub distribution: FittedDistribution,
}

/// Distribution-based imputation for the three column families.
pub struct DistributionImputer;

impl DistributionImputer {
    /// Impute a continuous (numeric or date/time) column.
    ///
    /// Produces a `Float64` series with present values unchanged and missing
    /// cells drawn from a normal distribution fitted to the present values.
    pub fn impute_continuous<R, F>(series: &Series, convert: F, rng: &mut R) -> Result<ImputedColumn>
    where
        R: Rng + ?Sized,
        F: Fn(&str) -> Option<f64>,
    {
        let converted = ConvertedColumn::convert(series.str()?, convert);
        let summary = GaussianSummary::fit(&converted.present_values());

        let draws = summary
            .sample(rng, converted.missing_count())
            .map_err(|e| CleaningError::ImputationFailed {
                column: series.name().to_string(),
                reason: e.to_string(),
            })?;

        Ok(ImputedColumn {
            series: Series::new(series.name().clone(), converted.fill_missing(draws)),
            present_count: converted.present_count(),
            imputed_count: converted.missing_count(),
            distribution: FittedDistribution::Gaussian {
                mean: summary.mean,
                std_dev: summary.std_dev,
            },
        })
    }

    /// Impute an integer-coded categorical column.
    ///
    /// Produces an `Int64` series. Missing cells are drawn from the column's
    /// own empirical distribution, or get `fallback` when nothing parsed.
    pub fn impute_categorical<R: Rng + ?Sized>(
        series: &Series,
        fallback: i64,
        policy: CategoricalDraw,
        rng: &mut R,
    ) -> Result<ImputedColumn> {
        let converted = ConvertedColumn::convert(series.str()?, crate::cleaner::int_or_missing);
        let present = converted.present_values();
        let distribution = EmpiricalDistribution::fit(&present, fallback);

        let draws = distribution
            .sample(rng, converted.missing_count(), policy)
            .map_err(|e| CleaningError::ImputationFailed {
                column: series.name().to_string(),
                reason: e.to_string(),
            })?;

        Ok(ImputedColumn {
            series: Series::new(series.name().clone(), converted.fill_missing(draws)),
            present_count: converted.present_count(),
            imputed_count: converted.missing_count(),
            distribution: FittedDistribution::Empirical {
                categories: distribution.values().len(),
                most_frequent: distribution.mode(),
                degenerate: present.is_empty(),
            },
        })
    }

    /// Clean a character or open-ended text column.
    ///
    /// Null tokens and null cells become the empty string; everything else,
    /// including existing empty strings, passes through.
    pub fn impute_character(series: &Series) -> Result<ImputedColumn> {
        let column = series.str()?;
        let mut imputed_count = 0;

        let cleaned: Vec<&str> = column
            .into_iter()
            .map(|cell| match cell.and_then(crate::cleaner::text_or_missing) {
                Some(text) => text,
                None => {
                    imputed_count += 1;
                    ""
                }
            })
            .collect();

        Ok(ImputedColumn {
            series: Series::new(series.name().clone(), cleaned),
            present_count: column.len() - imputed_count,
            imputed_count,
            distribution: FittedDistribution::EmptyString,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::{float_or_missing, timestamp_or_missing};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn f64_at(series: &Series, idx: usize) -> f64 {
        series.get(idx).unwrap().try_extract::<f64>().unwrap()
    }

    fn i64_at(series: &Series, idx: usize) -> i64 {
        series.get(idx).unwrap().try_extract::<i64>().unwrap()
    }

    // ========================================================================
    // ConvertedColumn tests
    // ========================================================================

    #[test]
    fn test_converted_column_partition() {
        let series = Series::new("x".into(), &["1", "", "3", "nan"]);
        let converted = ConvertedColumn::convert(series.str().unwrap(), float_or_missing);

        assert_eq!(converted.len(), 4);
        assert_eq!(converted.missing_indices(), vec![1, 3]);
        assert_eq!(converted.present_values(), vec![1.0, 3.0]);
        assert_eq!(converted.present_count(), 2);
    }

    #[test]
    fn test_converted_column_null_cells_are_missing() {
        let series = Series::new("x".into(), &[Some("4"), None]);
        let converted = ConvertedColumn::convert(series.str().unwrap(), float_or_missing);
        assert_eq!(converted.missing_indices(), vec![1]);
    }

    #[test]
    fn test_fill_missing_in_index_order() {
        let converted = ConvertedColumn::from_values(vec![None, Some(2), None, Some(4)]);
        let filled = converted.fill_missing(vec![10, 30]);
        assert_eq!(filled, vec![Some(10), Some(2), Some(30), Some(4)]);
    }

    // ========================================================================
    // GaussianSummary tests
    // ========================================================================

    #[test]
    fn test_gaussian_fit_population_std() {
        let summary = GaussianSummary::fit(&[1.0, 3.0]);
        assert_eq!(summary.mean, 2.0);
        assert_eq!(summary.std_dev, 1.0);
    }

    #[test]
    fn test_gaussian_fit_empty_is_degenerate() {
        let summary = GaussianSummary::fit(&[]);
        assert_eq!(summary.mean, 0.0);
        assert_eq!(summary.std_dev, 0.0);

        let mut rng = StdRng::seed_from_u64(1);
        let draws = summary.sample(&mut rng, 5).unwrap();
        assert!(draws.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_gaussian_fit_extreme_values_stay_finite() {
        let same = GaussianSummary::fit(&[1e308, 1e308]);
        assert_eq!(same.mean, 1e308);
        assert_eq!(same.std_dev, 0.0);

        let spread = GaussianSummary::fit(&[1e308, -1e308]);
        assert_eq!(spread.mean, 0.0);
        assert_eq!(spread.std_dev, 1e308);
    }

    #[test]
    fn test_gaussian_sample_nothing_skips_validation() {
        let summary = GaussianSummary {
            mean: 0.0,
            std_dev: f64::NAN,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(summary.sample(&mut rng, 0).unwrap().is_empty());
    }

    #[test]
    fn test_gaussian_rejects_nan_std() {
        let summary = GaussianSummary {
            mean: 0.0,
            std_dev: f64::NAN,
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(summary.sample(&mut rng, 1).is_err());
    }

    // ========================================================================
    // EmpiricalDistribution tests
    // ========================================================================

    #[test]
    fn test_empirical_fit_frequencies_sum_to_one() {
        let dist = EmpiricalDistribution::fit(&[2, 1, 2, 2, 5], 0);
        assert_eq!(dist.values(), &[1, 2, 5]);
        assert_eq!(dist.frequency_of(2), 0.6);
        assert_eq!(dist.frequency_of(7), 0.0);
        let total: f64 = dist.frequencies().iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert_eq!(dist.mode(), 2);
    }

    #[test]
    fn test_empirical_fit_empty_uses_fallback() {
        let dist = EmpiricalDistribution::fit(&[], 0);
        assert_eq!(dist.values(), &[0]);
        assert_eq!(dist.frequencies(), &[1.0]);
    }

    #[test]
    fn test_empirical_mode_tie_takes_smallest() {
        let dist = EmpiricalDistribution::fit(&[3, 1, 3, 1], 0);
        assert_eq!(dist.mode(), 1);
    }

    #[test]
    fn test_empirical_shared_batch_repeats_one_draw() {
        let dist = EmpiricalDistribution::fit(&[1, 2, 3, 4, 5, 6, 7, 8], 0);
        let mut rng = StdRng::seed_from_u64(11);
        let draws = dist.sample(&mut rng, 6, CategoricalDraw::SharedBatch).unwrap();
        assert_eq!(draws.len(), 6);
        assert!(draws.iter().all(|v| *v == draws[0]));
    }

    #[test]
    fn test_empirical_sample_zero_count() {
        let dist = EmpiricalDistribution::fit(&[1], 0);
        let mut rng = StdRng::seed_from_u64(11);
        assert!(dist.sample(&mut rng, 0, CategoricalDraw::PerCell).unwrap().is_empty());
    }

    // ========================================================================
    // impute_continuous() tests
    // ========================================================================

    #[test]
    fn test_impute_continuous_numeric_scenario() {
        let series = Series::new("income".into(), &["1", "", "3", "nan"]);
        let mut rng = StdRng::seed_from_u64(42);

        let imputed =
            DistributionImputer::impute_continuous(&series, float_or_missing, &mut rng).unwrap();

        assert_eq!(imputed.series.dtype(), &DataType::Float64);
        assert_eq!(imputed.series.null_count(), 0);
        assert_eq!(f64_at(&imputed.series, 0), 1.0);
        assert_eq!(f64_at(&imputed.series, 2), 3.0);
        assert_eq!(imputed.present_count, 2);
        assert_eq!(imputed.imputed_count, 2);

        // Draws come from Normal(2, 1) in missing-index order.
        let normal = Normal::new(2.0, 1.0).unwrap();
        let mut replay = StdRng::seed_from_u64(42);
        assert_eq!(f64_at(&imputed.series, 1), normal.sample(&mut replay));
        assert_eq!(f64_at(&imputed.series, 3), normal.sample(&mut replay));
    }

    #[test]
    fn test_impute_continuous_all_missing_gives_zero() {
        let series = Series::new("x".into(), &["", "nan", "n/a"]);
        let mut rng = StdRng::seed_from_u64(3);

        let imputed =
            DistributionImputer::impute_continuous(&series, float_or_missing, &mut rng).unwrap();

        for idx in 0..3 {
            assert_eq!(f64_at(&imputed.series, idx), 0.0);
        }
        assert_eq!(
            imputed.distribution,
            FittedDistribution::Gaussian {
                mean: 0.0,
                std_dev: 0.0
            }
        );
    }

    #[test]
    fn test_impute_continuous_dates() {
        let series = Series::new("interview".into(), &["01.01.2020", "garbage", "03.01.2020"]);
        let mut rng = StdRng::seed_from_u64(5);

        let imputed =
            DistributionImputer::impute_continuous(&series, timestamp_or_missing, &mut rng)
                .unwrap();

        assert_eq!(f64_at(&imputed.series, 0), 1_577_836_800.0);
        assert_eq!(f64_at(&imputed.series, 2), 1_578_009_600.0);
        assert!(f64_at(&imputed.series, 1).is_finite());
    }

    #[test]
    fn test_impute_continuous_extreme_values_without_missing() {
        let series = Series::new("x".into(), &["1e308", "1e308"]);
        let mut rng = StdRng::seed_from_u64(5);

        let imputed =
            DistributionImputer::impute_continuous(&series, float_or_missing, &mut rng).unwrap();

        assert_eq!(imputed.imputed_count, 0);
        assert_eq!(f64_at(&imputed.series, 0), 1e308);
        assert_eq!(f64_at(&imputed.series, 1), 1e308);
    }

    #[test]
    fn test_impute_continuous_requires_string_column() {
        let series = Series::new("x".into(), &[1.0, 2.0]);
        let mut rng = StdRng::seed_from_u64(5);
        let result = DistributionImputer::impute_continuous(&series, float_or_missing, &mut rng);
        assert!(matches!(result, Err(CleaningError::Polars(_))));
    }

    // ========================================================================
    // impute_categorical() tests
    // ========================================================================

    #[test]
    fn test_impute_categorical_closure() {
        let series = Series::new("q1".into(), &["1", "2", "", "2", "x", "nan", "7"]);
        let mut rng = StdRng::seed_from_u64(8);

        let imputed =
            DistributionImputer::impute_categorical(&series, 0, CategoricalDraw::PerCell, &mut rng)
                .unwrap();

        assert_eq!(imputed.series.dtype(), &DataType::Int64);
        assert_eq!(imputed.series.null_count(), 0);
        assert_eq!(i64_at(&imputed.series, 0), 1);
        assert_eq!(i64_at(&imputed.series, 3), 2);
        assert_eq!(i64_at(&imputed.series, 6), 7);
        for idx in [2, 4, 5] {
            assert!([1, 2, 7].contains(&i64_at(&imputed.series, idx)));
        }
        assert_eq!(imputed.imputed_count, 3);
    }

    #[test]
    fn test_impute_categorical_all_missing_uses_fallback() {
        let series = Series::new("q2".into(), &["", "nan", "?"]);
        let mut rng = StdRng::seed_from_u64(8);

        let imputed = DistributionImputer::impute_categorical(
            &series,
            0,
            CategoricalDraw::PerCell,
            &mut rng,
        )
        .unwrap();

        for idx in 0..3 {
            assert_eq!(i64_at(&imputed.series, idx), 0);
        }
        assert!(matches!(
            imputed.distribution,
            FittedDistribution::Empirical {
                degenerate: true,
                ..
            }
        ));
    }

    #[test]
    fn test_impute_categorical_normalises_present_values() {
        let series = Series::new("q3".into(), &[" 3", "+4"]);
        let mut rng = StdRng::seed_from_u64(8);

        let imputed =
            DistributionImputer::impute_categorical(&series, 0, CategoricalDraw::PerCell, &mut rng)
                .unwrap();

        assert_eq!(i64_at(&imputed.series, 0), 3);
        assert_eq!(i64_at(&imputed.series, 1), 4);
        assert_eq!(imputed.imputed_count, 0);
    }

    // ========================================================================
    // impute_character() tests
    // ========================================================================

    #[test]
    fn test_impute_character_null_tokens_become_empty() {
        let series = Series::new("remarks".into(), &[Some("NaN"), Some(""), Some("ok"), None]);

        let imputed = DistributionImputer::impute_character(&series).unwrap();
        let cleaned: Vec<Option<&str>> = imputed.series.str().unwrap().into_iter().collect();

        assert_eq!(cleaned, vec![Some(""), Some(""), Some("ok"), Some("")]);
        assert_eq!(imputed.imputed_count, 2);
        assert_eq!(imputed.present_count, 2);
    }

    #[test]
    fn test_impute_character_idempotent() {
        let series = Series::new("remarks".into(), &["", "a b", "Nothing to add", "none"]);

        let once = DistributionImputer::impute_character(&series).unwrap();
        let twice = DistributionImputer::impute_character(&once.series).unwrap();

        assert!(once.series.equals(&series));
        assert!(twice.series.equals(&once.series));
        assert_eq!(once.imputed_count, 0);
    }
}
