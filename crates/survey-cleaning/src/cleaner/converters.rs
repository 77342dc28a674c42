//! Cell-level converters.
//!
//! Every converter is total: any input string maps either to a typed value or
//! to `None`, which the imputers treat as a missing cell.

use chrono::NaiveDate;

/// Date layouts tried in order for non-clock values. The first match wins.
pub const DATE_FORMATS: [&str; 3] = ["%d.%m.%Y", "%d-%m-%Y", "%d/%m/%Y"];

/// Field separator of each entry in [`DATE_FORMATS`].
const DATE_SEPARATORS: [char; 3] = ['.', '-', '/'];

/// Literal tokens that mean "no value" in text columns.
pub const NULL_STRINGS: [&str; 6] = ["nan", "NAN", "NaN", "null", "Null", "NULL"];

/// Seed of the clock-time fold. Multiplied through, it adds a constant bias of
/// one unit on the leading segment.
const CLOCK_FOLD_SEED: f64 = 1.0 / 60.0;

/// Parse a base-10 integer, ignoring surrounding whitespace.
pub fn int_or_missing(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

/// Parse a finite floating point number, ignoring surrounding whitespace.
///
/// `NaN` and infinities count as missing.
pub fn float_or_missing(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
}

/// Convert a clock time or calendar date to seconds.
///
/// Values containing `:` are read as `H:M:S` clock times (anything after the
/// first two characters of a segment is ignored, as are segments past the
/// third). Everything else is tried against [`DATE_FORMATS`] and converted to
/// epoch seconds at midnight UTC. Dates need a one or two digit day and month
/// and an exactly four digit year.
pub fn timestamp_or_missing(value: &str) -> Option<f64> {
    let value = value.trim();

    if value.contains(':') {
        return clock_seconds(value);
    }

    DATE_FORMATS
        .iter()
        .zip(DATE_SEPARATORS)
        .filter(|(_, separator)| has_date_shape(value, *separator))
        .find_map(|(format, _)| NaiveDate::parse_from_str(value, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp() as f64)
}

/// Return the text unless it is one of the [`NULL_STRINGS`].
pub fn text_or_missing(value: &str) -> Option<&str> {
    if is_null_string(value) {
        None
    } else {
        Some(value)
    }
}

/// Check whether a cell is exactly one of the recognized null tokens.
#[inline]
pub fn is_null_string(value: &str) -> bool {
    NULL_STRINGS.contains(&value)
}

/// `day<sep>month<sep>year` with digit-only fields; chrono's `%Y` alone would
/// also take signed and short years.
fn has_date_shape(value: &str, separator: char) -> bool {
    let all_digits = |field: &str| field.bytes().all(|b| b.is_ascii_digit());

    let mut fields = value.split(separator);
    match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(day), Some(month), Some(year), None) => {
            (1..=2).contains(&day.len())
                && (1..=2).contains(&month.len())
                && year.len() == 4
                && all_digits(day)
                && all_digits(month)
                && all_digits(year)
        }
        _ => false,
    }
}

fn clock_seconds(value: &str) -> Option<f64> {
    value
        .split(':')
        .take(3)
        .try_fold(CLOCK_FOLD_SEED, |acc, segment| {
            let leading: String = segment.chars().take(2).collect();
            let part = leading.trim().parse::<i64>().ok()?;
            Some(acc * 60.0 + part as f64)
        })
}
