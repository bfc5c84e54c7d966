//! Input validation for tool arguments.
//!
//! Every function here is pure and reports a contract violation as
//! [`ToolError::Validation`]. Callers only ever need the message text.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;

use super::error::{ToolError, ToolResult};

/// Wire format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

static DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern is valid"));

/// Validate a `YYYY-MM-DD` date string and return it unchanged.
pub fn validate_date(value: &str, name: &str) -> ToolResult<String> {
    parse_date(value, name)?;
    Ok(value.to_string())
}

fn parse_date(value: &str, name: &str) -> ToolResult<NaiveDate> {
    if !DATE_PATTERN.is_match(value) {
        return Err(ToolError::validation(format!(
            "Invalid date format for {name}: {value}. Use YYYY-MM-DD"
        )));
    }

    let date = NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| ToolError::validation(format!("Invalid date for {name}: {value}. {e}")))?;

    // Years start at 1.
    if date.year() < 1 {
        return Err(ToolError::validation(format!(
            "Invalid date for {name}: {value}. year is out of range"
        )));
    }
    Ok(date)
}

/// Validate both ends of a date range and that `start <= end`.
pub fn validate_date_range(start: &str, end: &str) -> ToolResult<(String, String)> {
    let start_date = parse_date(start, "start_date")?;
    let end_date = parse_date(end, "end_date")?;

    if start_date > end_date {
        return Err(ToolError::validation(format!(
            "start_date ({start}) must be less than or equal to end_date ({end})"
        )));
    }

    Ok((start.to_string(), end.to_string()))
}

/// Resolve an optional date argument, defaulting to today's local date.
///
/// Absent and blank values both mean "today".
pub fn resolve_date(value: Option<&str>, name: &str) -> ToolResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => validate_date(v, name),
        _ => Ok(today()),
    }
}

/// Today's local date in `YYYY-MM-DD` form.
pub fn today() -> String {
    Local::now().date_naive().format(DATE_FORMAT).to_string()
}

/// Validate that a number is positive (or non-negative when `allow_zero`).
pub fn validate_positive_number(value: f64, name: &str, allow_zero: bool) -> ToolResult<f64> {
    if !value.is_finite() {
        return Err(ToolError::validation(format!(
            "{name} must be a number, got {value}"
        )));
    }

    if allow_zero && value < 0.0 {
        return Err(ToolError::validation(format!(
            "{name} must be greater than or equal to 0, got {value}"
        )));
    }

    if !allow_zero && value <= 0.0 {
        return Err(ToolError::validation(format!(
            "{name} must be greater than 0, got {value}"
        )));
    }

    Ok(value)
}

/// Integer counterpart of [`validate_positive_number`] for counts and offsets.
pub fn validate_count(value: i64, name: &str, allow_zero: bool) -> ToolResult<i64> {
    if allow_zero && value < 0 {
        return Err(ToolError::validation(format!(
            "{name} must be greater than or equal to 0, got {value}"
        )));
    }

    if !allow_zero && value <= 0 {
        return Err(ToolError::validation(format!(
            "{name} must be greater than 0, got {value}"
        )));
    }

    Ok(value)
}

/// Validate that an identifier is a positive integer.
pub fn validate_id(value: i64, name: &str) -> ToolResult<i64> {
    if value <= 0 {
        return Err(ToolError::validation(format!(
            "{name} must be a positive integer, got {value}"
        )));
    }

    Ok(value)
}

/// Trim a string argument and reject it if nothing is left.
pub fn sanitize_string(value: &str, name: &str) -> ToolResult<String> {
    let sanitized = value.trim();
    if sanitized.is_empty() {
        return Err(ToolError::validation(format!("{name} cannot be empty")));
    }

    Ok(sanitized.to_string())
}

/// Sanitize a string and require it to be one of `allowed`.
pub fn validate_choice(value: &str, name: &str, allowed: &[&str]) -> ToolResult<String> {
    let value = sanitize_string(value, name)?;
    if !allowed.contains(&value.as_str()) {
        let options = allowed
            .iter()
            .map(|o| format!("'{o}'"))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(ToolError::validation(format!(
            "{name} must be one of {options}, got '{value}'"
        )));
    }

    Ok(value)
}
