//! CSV input and output.
//!
//! Raw survey data is read with every cell as text and without null
//! detection: an empty field stays an empty string and the converters decide
//! what counts as missing.

use crate::codebook::Codebook;
use crate::error::{Result, ResultExt};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

/// Read a raw data file with all columns as `String` and no null sniffing.
pub fn read_raw_frame(path: &Path, separator: u8) -> Result<DataFrame> {
    info!("Reading raw data from '{}'", path.display());

    let df = string_reader(separator, false)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("Opening '{}'", path.display()))?
        .finish()
        .context(format!("Parsing '{}'", path.display()))?;

    info!("Raw data loaded: {} rows x {} columns", df.height(), df.width());
    Ok(df)
}

/// Read a codebook file with `var_name` and `type_var` columns.
pub fn read_codebook(path: &Path) -> Result<Codebook> {
    info!("Reading codebook from '{}'", path.display());

    let df = string_reader(b',', true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("Opening '{}'", path.display()))?
        .finish()
        .context(format!("Parsing '{}'", path.display()))?;

    Codebook::from_frame(&df)
}

/// Write `df` as CSV with a header row, creating parent directories.
pub fn write_frame(df: &mut DataFrame, path: &Path, separator: u8) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(separator)
        .with_quote_char(b'"')
        .finish(df)
        .context(format!("Writing '{}'", path.display()))?;

    info!("Cleaned data written to '{}'", path.display());
    Ok(())
}

fn string_reader(separator: u8, missing_is_null: bool) -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(separator)
                .with_quote_char(Some(b'"'))
                .with_encoding(CsvEncoding::LossyUtf8)
                .with_missing_is_null(missing_is_null),
        )
}
