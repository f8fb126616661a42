use chrono::{Duration, NaiveDateTime};

use crate::error::{ComtradeError, Result};
use crate::types::Header;

/// Layout that every timestamp line is rejoined into before parsing
pub const TIMESTAMP_LAYOUT: &str = "%d/%m/%YT%H:%M:%S%.f";

/// Parses the fields of one timestamp line
///
/// Accepts the standard two-field form `dd/mm/yyyy,hh:mm:ss.ssssss` and the
/// six-field form `dd,mm,yyyy,hh,mm,ss.ssssss`; both are rejoined into
/// [`TIMESTAMP_LAYOUT`]. Returns `None` on any other shape.
pub fn parse_timestamp(fields: &[&str]) -> Option<NaiveDateTime> {
    if fields.iter().any(|f| f.is_empty()) {
        return None;
    }
    let joined = match fields {
        [date, time] => format!("{}T{}", date, time),
        [day, month, year, hour, minute, second] => {
            format!("{}/{}/{}T{}:{}:{}", day, month, year, hour, minute, second)
        }
        _ => return None,
    };
    NaiveDateTime::parse_from_str(&joined, TIMESTAMP_LAYOUT).ok()
}

/// Formats a timestamp as a two-field header line
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%d/%m/%Y,%H:%M:%S%.6f").to_string()
}

/// 第一个采样率，必须为有限正数
fn usable_rate(header: &Header) -> Result<f64> {
    header
        .sampling_rate()
        .filter(|r| r.is_finite() && *r > 0.0)
        .ok_or(ComtradeError::MissingSampleRate)
}

/// Offset of a sample from the start time, rounded to the microsecond
pub fn sample_offset(rate: f64, sample_index: usize) -> Duration {
    let micros = (sample_index as f64 * 1_000_000.0 / rate).round() as i64;
    Duration::microseconds(micros)
}

/// Calendar time of a sample: `start_time + sample_index / rate`
///
/// Only the first sampling-rate entry is used. `sample_index` is expected in
/// `0..sample_count`; the index itself is not range-checked.
///
/// # Errors
///
/// * `ComtradeError::MissingSampleRate` - no sampling rate, or a non-positive one
/// * `ComtradeError::TimestampOverflow` - the result is outside chrono's range
///
/// # Examples
///
/// ```rust
/// use comtrade::{timestamp_at, Header};
///
/// let header = Header::parse(comtrade::doctest_utils::sample_cfg().as_bytes())?;
/// let t0 = timestamp_at(&header, 0)?;
/// let t1 = timestamp_at(&header, 1)?;
/// assert_eq!(t0, header.start_time);
/// assert_eq!((t1 - t0).num_microseconds(), Some(1_000));
/// # Ok::<(), comtrade::ComtradeError>(())
/// ```
pub fn timestamp_at(header: &Header, sample_index: usize) -> Result<NaiveDateTime> {
    let rate = usable_rate(header)?;
    header
        .start_time
        .checked_add_signed(sample_offset(rate, sample_index))
        .ok_or(ComtradeError::TimestampOverflow)
}

/// Time axis for every sample of the first sampling entry
pub fn timestamps(header: &Header) -> Result<Vec<NaiveDateTime>> {
    let rate = usable_rate(header)?;
    let count = header.sample_count().unwrap_or(0);
    (0..count)
        .map(|i| {
            header
                .start_time
                .checked_add_signed(sample_offset(rate, i))
                .ok_or(ComtradeError::TimestampOverflow)
        })
        .collect()
}
