//! Date and age arithmetic.
//!
//! Every function takes its reference date as an argument; nothing in this
//! module reads the system clock.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

/// Earliest legal working age, used to bound plausible careers.
pub const MINIMUM_WORKING_AGE: u32 = 16;

const MAXIMUM_APPLICANT_AGE: u32 = 100;
const RETIREMENT_HORIZON_YEARS: u32 = 30;
const DAYS_PER_YEAR: i32 = 365;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("reference date {end} precedes {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

/// Parses an ISO `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, DateError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| DateError::InvalidDate(s.to_string()))
}

/// Age in full years at `as_of`.
///
/// The birthday counts from its anniversary; someone born on 29 February
/// turns a year older on 1 March in common years.
pub fn age(
    birth: NaiveDate,
    as_of: NaiveDate,
) -> Result<u32, DateError> {
    as_of
        .years_since(birth)
        .ok_or(DateError::EndBeforeStart { start: birth, end: as_of })
}

/// Calendar month difference, ignoring the day of month. Negative when
/// `end` precedes `start`.
pub fn months_between(
    start: NaiveDate,
    end: NaiveDate,
) -> i32 {
    (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32
}

/// Full months elapsed from `start` to `end`.
///
/// Unlike [`months_between`], a month only counts once its day of month has
/// been reached, which makes this the right measure for ages expressed in
/// years and months.
pub fn elapsed_months(
    start: NaiveDate,
    end: NaiveDate,
) -> Result<u32, DateError> {
    if end < start {
        return Err(DateError::EndBeforeStart { start, end });
    }

    let mut months = months_between(start, end);
    if end.day() < start.day() {
        months -= 1;
    }
    Ok(months.max(0) as u32)
}

/// Accepted birth dates for an applicant on `today`: between 100 and 16
/// years ago, both inclusive.
pub fn birth_date_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (
        years_before(today, MAXIMUM_APPLICANT_AGE),
        years_before(today, MINIMUM_WORKING_AGE),
    )
}

/// Accepted desired retirement dates on `today`: from today up to 30 years
/// ahead, both inclusive.
pub fn retirement_date_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let latest = today
        .checked_add_months(Months::new(RETIREMENT_HORIZON_YEARS * 12))
        .unwrap_or(NaiveDate::MAX);
    (today, latest)
}

fn years_before(
    date: NaiveDate,
    years: u32,
) -> NaiveDate {
    date.checked_sub_months(Months::new(years * 12))
        .unwrap_or(NaiveDate::MIN)
}

/// Contribution days expressed in years, at full precision.
pub fn days_to_years(days: i32) -> Decimal {
    Decimal::from(days) / Decimal::from(DAYS_PER_YEAR)
}

/// Years expressed in contribution days, rounded to whole days.
pub fn years_to_days(years: Decimal) -> Option<i32> {
    (years * Decimal::from(DAYS_PER_YEAR)).round().to_i32()
}

/// Whole contributed months for a number of contribution days.
///
/// Negative totals count as no contribution.
pub fn contributed_months(days: i32) -> u32 {
    if days <= 0 {
        return 0;
    }
    (i64::from(days) * 12 / i64::from(DAYS_PER_YEAR)) as u32
}

/// Spanish rendering of a span of months, e.g. "66 años y 10 meses".
pub fn format_years_months(months: u32) -> String {
    let years = months / 12;
    let rest = months % 12;
    match rest {
        0 => format!("{years} años"),
        1 => format!("{years} años y 1 mes"),
        _ => format!("{years} años y {rest} meses"),
    }
}
