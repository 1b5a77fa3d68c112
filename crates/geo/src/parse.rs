//! Coordinate extraction from free text.
//!
//! Supports:
//! - Signed decimal pairs: `"19.6400, -155.9969"`, `"57.05;-135.33"`
//! - Hemisphere suffixes: `"21.31 N, 157.86 W"`, `"33.9°S 151.2°E"`
//!
//! Decimal pairs must carry a fractional part on both numbers so that
//! itinerary text such as `"Pier 3, 45 min"` is not mistaken for a position.

use crate::{Coordinate, GeoError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

static SIGNED_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\w.])(?P<lat>[-+]?\d{1,3}\.\d+)\s*[,;/]\s*(?P<lng>[-+]?\d{1,3}\.\d+)(?:$|[^\w.])")
        .expect("valid signed pair regex")
});

static HEMISPHERE_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?P<lat>\d{1,3}(?:\.\d+)?)\s*°?\s*(?P<ns>[NS])\b[\s,;]*(?P<lng>\d{1,3}(?:\.\d+)?)\s*°?\s*(?P<ew>[EW])\b",
    )
    .expect("valid hemisphere pair regex")
});

/// A coordinate pair found inside a larger string.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundCoordinates {
    /// The parsed, range-checked coordinate
    pub coordinate: Coordinate,
    /// Byte range of the pair within the input
    pub span: Range<usize>,
}

impl FoundCoordinates {
    /// The input with the coordinate pair removed and whitespace tidied.
    pub fn remainder(&self, text: &str) -> String {
        let mut rest = String::with_capacity(text.len());
        rest.push_str(&text[..self.span.start]);
        rest.push(' ');
        rest.push_str(&text[self.span.end..]);

        rest.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '(' | ')' | '@' | '-' | ':'))
            .to_string()
    }
}

/// Locate the first coordinate pair in `text`.
///
/// Returns `GeoError::Parse` when no pair is present and
/// `GeoError::InvalidCoordinate` when a pair is present but out of range.
pub fn parse_coordinates(text: &str) -> Result<FoundCoordinates> {
    if let Some(caps) = SIGNED_PAIR.captures(text) {
        let (lat_m, lng_m) = (&caps["lat"], &caps["lng"]);
        let lat = parse_number(lat_m)?;
        let lng = parse_number(lng_m)?;
        let span = group_span(&caps, "lat", "lng");
        return Coordinate::validated(lat, lng).map(|coordinate| FoundCoordinates { coordinate, span });
    }

    if let Some(caps) = HEMISPHERE_PAIR.captures(text) {
        let mut lat = parse_number(&caps["lat"])?;
        let mut lng = parse_number(&caps["lng"])?;
        if caps["ns"].eq_ignore_ascii_case("s") {
            lat = -lat;
        }
        if caps["ew"].eq_ignore_ascii_case("w") {
            lng = -lng;
        }
        let span = group_span(&caps, "lat", "ew");
        return Coordinate::validated(lat, lng).map(|coordinate| FoundCoordinates { coordinate, span });
    }

    Err(GeoError::Parse(text.to_string()))
}

/// Like [`parse_coordinates`] but discards the reason for failure.
pub fn find_coordinates(text: &str) -> Option<FoundCoordinates> {
    parse_coordinates(text).ok()
}

fn parse_number(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|_| GeoError::Parse(s.to_string()))
}

fn group_span(caps: &regex::Captures<'_>, first: &str, last: &str) -> Range<usize> {
    let start = caps.name(first).map_or(0, |m| m.start());
    let end = caps.name(last).map_or(start, |m| m.end());
    start..end
}
