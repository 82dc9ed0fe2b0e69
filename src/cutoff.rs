//! Cutoff-date handling for backtesting queries.
//!
//! A cutoff date makes a query answer as if it ran at the end of that day:
//! the server receives `created_before=<date>T23:59:59` and list results are
//! trimmed client-side to records dated on or before the same instant.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{Error, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const END_OF_DAY: NaiveTime = match NaiveTime::from_hms_opt(23, 59, 59) {
    Some(t) => t,
    None => panic!("23:59:59 is a valid time"),
};

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|e| Error::config(format!("invalid date '{}', expected YYYY-MM-DD: {}", s, e)))
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Picks the effective cutoff for one call.
///
/// A harness override (`CUTOFF_DATE`) beats the per-call value so a backtest
/// can never look ahead; with neither set the cutoff is today.
pub fn resolve(override_date: Option<NaiveDate>, requested: Option<NaiveDate>) -> NaiveDate {
    override_date.or(requested).unwrap_or_else(today)
}

pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(END_OF_DAY)
}

/// Value sent as `created_before` for a cutoff date.
pub fn created_before_param(date: NaiveDate) -> String {
    end_of_day(date).format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Records that can be placed on the timeline for cutoff filtering.
pub trait Dated {
    /// Instant the record became visible, `None` when the API gave no date.
    fn visible_since(&self) -> Option<&DateTime<Utc>>;
}

/// Undated records are kept. Timestamps are compared in UTC, so an offset
/// timestamp counts by the UTC day it falls on.
pub fn is_visible<T: Dated>(item: &T, cutoff: NaiveDate) -> bool {
    match item.visible_since() {
        Some(ts) => ts.naive_utc() <= end_of_day(cutoff),
        None => true,
    }
}

pub fn retain_visible<T: Dated>(items: Vec<T>, cutoff: NaiveDate) -> Vec<T> {
    let before = items.len();
    let kept: Vec<T> = items.into_iter().filter(|i| is_visible(i, cutoff)).collect();
    if kept.len() != before {
        log::debug!(
            "cutoff {} dropped {} of {} records",
            cutoff.format(DATE_FORMAT),
            before - kept.len(),
            before
        );
    }
    kept
}
