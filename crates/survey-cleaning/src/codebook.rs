//! Codebook: variable name to declared semantic type.

use crate::cleaner::{ColumnCleaner, ColumnMetadata};
use crate::error::{CleaningError, Result};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Header of the codebook column holding variable names.
pub const VAR_NAME_COLUMN: &str = "var_name";
/// Header of the codebook column holding type labels.
pub const TYPE_VAR_COLUMN: &str = "type_var";

/// Declared type labels keyed by variable name.
///
/// Labels are kept as written and only resolved against the registered
/// cleaners for columns that actually appear in the dataset.
#[derive(Debug, Clone, Default)]
pub struct Codebook {
    declared: HashMap<String, String>,
}

impl Codebook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(variable, label)` pairs. Later duplicates win.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let declared = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { declared }
    }

    /// Build from a codebook frame with `var_name` and `type_var` columns.
    pub fn from_frame(df: &DataFrame) -> Result<Self> {
        let names = Self::string_column(df, VAR_NAME_COLUMN)?;
        let labels = Self::string_column(df, TYPE_VAR_COLUMN)?;

        let mut declared = HashMap::with_capacity(df.height());
        for (name, label) in names.into_iter().zip(labels.into_iter()) {
            if let (Some(name), Some(label)) = (name, label) {
                declared.insert(name.to_string(), label.to_string());
            }
        }

        debug!("Codebook holds {} variables", declared.len());
        Ok(Self { declared })
    }

    fn string_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked> {
        let column = df.column(name).map_err(|_| {
            CleaningError::InvalidCodebook(format!("missing required column '{}'", name))
        })?;
        column.as_materialized_series().str().map_err(|_| {
            CleaningError::InvalidCodebook(format!("column '{}' must contain text", name))
        })
    }

    pub fn insert(&mut self, name: impl Into<String>, label: impl Into<String>) {
        self.declared.insert(name.into(), label.into());
    }

    /// Declared label for `name`, if the codebook has one.
    pub fn declared_type(&self, name: &str) -> Option<&str> {
        self.declared.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.declared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declared.is_empty()
    }

    /// Bind every column name to its semantic type and cleaner, in order.
    ///
    /// Fails on the first column without an entry or with an unknown label.
    pub fn resolve<'a, I>(&self, columns: I) -> Result<Vec<ColumnMetadata>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        columns
            .into_iter()
            .map(|name| {
                let declared = self
                    .declared_type(name)
                    .ok_or_else(|| CleaningError::MissingCodebookEntry(name.to_string()))?;
                let (semantic_type, cleaner) = ColumnCleaner::for_declared_type(name, declared)?;
                Ok(ColumnMetadata {
                    name: name.to_string(),
                    semantic_type,
                    cleaner,
                })
            })
            .collect()
    }
}
