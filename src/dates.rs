//! Date-string handling for the climatology and warnings endpoints.
//!
//! AEMET expects timestamps as `AAAA-MM-DDTHH:MM:SSUTC`. Callers may pass either that
//! form or a plain `AAAA-MM-DD` date, which is widened to the start or end of the day.
//! Long ranges are split into windows because the service caps the span of a request.

use crate::constants::*;
use crate::errors::{AppError, AppResult};
use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

const FULL_DATE_PATTERN: &str = r"^[0-9]{4}-[0-9]{2}-[0-9]{2}T[0-9]{2}:[0-9]{2}:[0-9]{2}UTC$";
const SIMPLE_DATE_PATTERN: &str = r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$";
const FULL_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SUTC";

static FULL_DATE_REGEX: OnceLock<Regex> = OnceLock::new();
static SIMPLE_DATE_REGEX: OnceLock<Regex> = OnceLock::new();

/// Which end of a range a date string belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Start,
    End,
}

/// A closed range of calendar days sent as one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Start of the window as `AAAA-MM-DDT00:00:00UTC`.
    pub fn start_param(&self) -> String {
        format!("{}T00:00:00UTC", self.start.format("%Y-%m-%d"))
    }

    /// End of the window as `AAAA-MM-DDT23:59:59UTC`.
    pub fn end_param(&self) -> String {
        format!("{}T23:59:59UTC", self.end.format("%Y-%m-%d"))
    }
}

/// Completes a date string to the full AEMET timestamp form.
///
/// Full timestamps are returned unchanged; plain dates get `T00:00:00UTC` for a
/// [`RangeBound::Start`] and `T23:59:59UTC` for a [`RangeBound::End`].
///
/// # Errors
///
/// Returns `InvalidInput` if the string matches neither form.
pub fn complete_date(date: &str, bound: RangeBound) -> AppResult<String> {
    let full = FULL_DATE_REGEX.get_or_init(|| {
        Regex::new(FULL_DATE_PATTERN).expect("FULL_DATE_PATTERN is a valid regex pattern")
    });
    let simple = SIMPLE_DATE_REGEX.get_or_init(|| {
        Regex::new(SIMPLE_DATE_PATTERN).expect("SIMPLE_DATE_PATTERN is a valid regex pattern")
    });

    let date = date.trim();
    if full.is_match(date) {
        Ok(date.to_string())
    } else if simple.is_match(date) {
        Ok(match bound {
            RangeBound::Start => format!("{date}T00:00:00UTC"),
            RangeBound::End => format!("{date}T23:59:59UTC"),
        })
    } else {
        Err(AppError::InvalidInput(format!(
            "Date '{date}' must be in 'AAAA-MM-DD' or 'AAAA-MM-DDTHH:MM:SSUTC' format"
        )))
    }
}

/// Parses a date string in either accepted form.
///
/// # Errors
///
/// Returns `InvalidInput` for malformed strings and impossible dates such as
/// `2023-02-30`.
pub fn parse_date(date: &str, bound: RangeBound) -> AppResult<NaiveDateTime> {
    let full = complete_date(date, bound)?;
    NaiveDateTime::parse_from_str(&full, FULL_DATE_FORMAT)
        .map_err(|e| AppError::InvalidInput(format!("Invalid date '{date}': {e}")))
}

/// Parses a start and end date and checks their order.
pub fn parse_range(start: &str, end: &str) -> AppResult<(NaiveDate, NaiveDate)> {
    let start_dt = parse_date(start, RangeBound::Start)?;
    let end_dt = parse_date(end, RangeBound::End)?;
    if start_dt > end_dt {
        return Err(AppError::InvalidInput(format!(
            "Start date '{start}' is after end date '{end}'"
        )));
    }
    Ok((start_dt.date(), end_dt.date()))
}

/// Splits `[start, end]` into consecutive windows.
///
/// Each window ends at `step(window_start)` or at `end`, whichever comes first, and the
/// next window starts the day after.
fn split_range<F>(start: NaiveDate, end: NaiveDate, step: F) -> Vec<DateWindow>
where
    F: Fn(NaiveDate) -> Option<NaiveDate>,
{
    let mut windows = Vec::new();
    let mut current = start;
    while current <= end {
        let window_end = step(current).map_or(end, |next| next.min(end));
        windows.push(DateWindow {
            start: current,
            end: window_end,
        });
        match window_end.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    windows
}

/// Windows for daily climatology: five months and 29 days each.
pub fn daily_climatology_windows(start: NaiveDate, end: NaiveDate) -> Vec<DateWindow> {
    split_range(start, end, |d| {
        d.checked_add_months(Months::new(DAILY_WINDOW_MONTHS))?
            .checked_add_signed(Duration::days(DAILY_WINDOW_EXTRA_DAYS))
    })
}

/// Windows for the warnings archive: two calendar days each.
pub fn warnings_windows(start: NaiveDate, end: NaiveDate) -> Vec<DateWindow> {
    split_range(start, end, |d| {
        d.checked_add_signed(Duration::days(WARNINGS_WINDOW_DAYS))
    })
}

/// Splits an inclusive year range into chunks of at most three years.
///
/// # Errors
///
/// Returns `InvalidInput` if `start_year > end_year`.
pub fn year_windows(start_year: i32, end_year: i32) -> AppResult<Vec<(i32, i32)>> {
    if start_year > end_year {
        return Err(AppError::InvalidInput(format!(
            "Start year {start_year} is after end year {end_year}"
        )));
    }
    let mut windows = Vec::new();
    let mut current = start_year;
    while current <= end_year {
        let chunk_end = current
            .saturating_add(MONTHLY_WINDOW_YEARS - 1)
            .min(end_year);
        windows.push((current, chunk_end));
        if chunk_end == i32::MAX {
            break;
        }
        current = chunk_end + 1;
    }
    Ok(windows)
}
