//! Presentation strings shared by the screens.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

/// Formats a stored date as `Oct 17th 2026`. Accepts RFC 3339 timestamps,
/// naive date-times and plain `YYYY-MM-DD` dates; anything else yields `None`.
#[must_use]
pub fn date_label(raw: &str) -> Option<String> {
    let date = parse_date(raw.trim())?;
    Some(format!(
        "{} {}{} {}",
        date.format("%b"),
        date.day(),
        ordinal_suffix(date.day()),
        date.year()
    ))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// The part of an address before the first `-`, e.g. the street name of
/// `"Rua Augusta - Consolação"`.
#[must_use]
pub fn street_label(address: &str) -> &str {
    address.split('-').next().unwrap_or(address).trim()
}

/// Up to two uppercase initials of a talker's name.
#[must_use]
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .take(2)
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

#[must_use]
pub fn distance_label(radius: u32) -> String {
    format!("{radius} km")
}
