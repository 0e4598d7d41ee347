//! Date and datetime parsing and rendering.
//!
//! Parsing tries a list of formats in order: the user-supplied format first,
//! then the stock forms. A successful parse yields seconds since the Unix
//! epoch, interpreted as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%b-%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 1] = ["%Y-%m-%d"];

pub fn parse_datetime(s: &str, user_format: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    let user = (!user_format.is_empty()).then_some(user_format);
    for fmt in user.into_iter().chain(DATETIME_FORMATS) {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp());
        }
    }
    None
}

pub fn parse_date(s: &str, user_format: &str) -> Option<i64> {
    if s.is_empty() {
        return None;
    }
    let user = (!user_format.is_empty()).then_some(user_format);
    for fmt in user.into_iter().chain(DATE_FORMATS) {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc().timestamp());
        }
    }
    None
}

pub fn format_date(epoch: i64) -> String {
    render(epoch, "%Y-%m-%d")
}

pub fn format_datetime(epoch: i64) -> String {
    render(epoch, "%Y-%m-%d %H:%M:%S")
}

/// `T`-separated form used in JSON output.
pub fn format_datetime_iso(epoch: i64) -> String {
    render(epoch, "%Y-%m-%dT%H:%M:%S")
}

fn render(epoch: i64, fmt: &str) -> String {
    match DateTime::from_timestamp(epoch, 0) {
        Some(dt) => dt.format(fmt).to_string(),
        None => String::new(),
    }
}
