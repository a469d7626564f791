//! Retention cutoff and `Date:` header handling
//!
//! Header dates are read with one fixed layout: the four tokens after
//! the weekday (`01 Jan 2024 12:00:00`). The weekday and whatever
//! follows the time, usually the zone offset, are ignored, so the
//! result is compared as-is against the local wall clock.

use crate::error::{Error, Result};
use crate::retention::Ttl;
use chrono::NaiveDateTime;

const HEADER_DATE_FORMAT: &str = "%d %b %Y %H:%M:%S";

/// Oldest timestamp still kept for a folder with the given `ttl`.
#[must_use]
pub fn compute_cutoff(ttl: &Ttl, now: NaiveDateTime) -> NaiveDateTime {
    now.checked_sub_signed(ttl.to_duration())
        .unwrap_or(NaiveDateTime::MIN)
}

/// Parse a raw `Date:` header value.
///
/// `Mon, 01 Jan 2024 12:00:00 +0000` parses to `2024-01-01 12:00:00`.
///
/// # Errors
///
/// Returns [`Error::DateParse`] if the tokens after the weekday do not
/// match `day month year time`.
pub fn parse_header_date(raw: &str) -> Result<NaiveDateTime> {
    let fields: Vec<&str> = raw.split_whitespace().skip(1).take(4).collect();
    let date = fields.join(" ");
    NaiveDateTime::parse_from_str(&date, HEADER_DATE_FORMAT)
        .map_err(|e| Error::DateParse(format!("'{raw}': {e}")))
}

/// A message is expired when it is strictly older than the cutoff.
#[must_use]
pub fn is_expired(date: NaiveDateTime, cutoff: NaiveDateTime) -> bool {
    date < cutoff
}
