use std::str::FromStr;

use crate::error::{ComtradeError, Result};

/// 严格解析数值字段，失败时报告行号与字段号（均从1开始）
pub fn parse_field<T: FromStr>(fields: &[&str], line: usize, field: usize) -> Result<T> {
    let raw = fields.get(field).copied().unwrap_or("");
    raw.parse::<T>().map_err(|_| invalid_number(raw, line, field))
}

/// Like [`parse_field`] but rejects `inf` and `NaN`
pub fn parse_float(fields: &[&str], line: usize, field: usize) -> Result<f64> {
    let value: f64 = parse_field(fields, line, field)?;
    if !value.is_finite() {
        return Err(invalid_number(fields[field], line, field));
    }
    Ok(value)
}

/// Trailing optional column: absent or blank yields `None`, never a default
pub fn parse_optional<T: FromStr>(fields: &[&str], line: usize, field: usize) -> Result<Option<T>> {
    match fields.get(field) {
        Some(raw) if !raw.is_empty() => parse_field(fields, line, field).map(Some),
        _ => Ok(None),
    }
}

pub fn parse_optional_float(fields: &[&str], line: usize, field: usize) -> Result<Option<f64>> {
    match fields.get(field) {
        Some(raw) if !raw.is_empty() => parse_float(fields, line, field).map(Some),
        _ => Ok(None),
    }
}

/// Parses a channel-count marker such as `"4A"` or `" 2d "`
pub fn parse_count_marker(raw: &str, marker: char, line: usize, field: usize) -> Result<usize> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_suffix(marker.to_ascii_uppercase())
        .or_else(|| trimmed.strip_suffix(marker.to_ascii_lowercase()))
        .ok_or_else(|| ComtradeError::InvalidSection {
            line,
            reason: format!("channel count {:?} lacks the '{}' marker", raw, marker),
        })?;
    digits
        .trim()
        .parse::<usize>()
        .map_err(|_| invalid_number(raw, line, field))
}

/// 将通道名中的空格替换为下划线
pub fn normalize_name(s: &str) -> String {
    s.trim().replace(' ', "_")
}

fn invalid_number(raw: &str, line: usize, field: usize) -> ComtradeError {
    ComtradeError::InvalidNumber {
        line,
        field: field + 1,
        value: raw.to_string(),
    }
}
