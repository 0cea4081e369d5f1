//! Calendar helpers shared by expenses, savings goals and analytics.
//!
//! Most queries in the app are keyed by a calendar month, so [YearMonth] is the
//! workhorse here. The free functions parse dates from request parameters and
//! compute ISO week boundaries for weekly spending trends.

use std::fmt::Display;

use serde::Serialize;
use time::{Date, Duration, Month, Weekday, macros::format_description};

use crate::Error;

/// The number of months in a trailing window when none is requested.
pub const DEFAULT_WINDOW_MONTHS: u32 = 6;

/// The longest trailing window that may be requested.
pub const MAX_WINDOW_MONTHS: u32 = 120;

/// English month names indexed by `month - 1`.
const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar month in a specific year.
///
/// Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    /// The calendar year, e.g. 2024.
    pub year: i32,
    /// The month number, 1 for January through 12 for December.
    pub month: u8,
}

impl YearMonth {
    /// Create a month, checking that `month` is between 1 and 12.
    ///
    /// # Errors
    /// Returns [Error::Validation] if `month` is out of range.
    pub fn new(year: i32, month: u8) -> Result<Self, Error> {
        if !(1..=12).contains(&month) {
            return Err(Error::Validation(format!(
                "month must be between 1 and 12, got {month}"
            )));
        }

        Ok(Self { year, month })
    }

    /// The month that `date` falls in.
    pub fn from_date(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month() as u8,
        }
    }

    /// The month before this one, wrapping to December of the previous year.
    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// Step back `count` months.
    pub fn months_before(self, count: u32) -> Self {
        (0..count).fold(self, |month, _| month.previous())
    }

    /// The first day of the month.
    pub fn first_day(self) -> Date {
        // `month` is validated on construction so both conversions are infallible.
        let month = Month::try_from(self.month).unwrap_or(Month::January);
        Date::from_calendar_date(self.year, month, 1).unwrap_or(Date::MIN)
    }

    /// The last day of the month.
    pub fn last_day(self) -> Date {
        let first_day = self.first_day();
        first_day
            .replace_day(first_day.month().length(self.year))
            .unwrap_or(first_day)
    }

    /// The number of days in the month.
    pub fn days(self) -> u8 {
        self.first_day().month().length(self.year)
    }

    /// The English name of the month, e.g. "January".
    pub fn name(self) -> &'static str {
        month_name(self.month)
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// The English name for a month number (1-12).
///
/// Out of range numbers are clamped into range.
pub fn month_name(month: u8) -> &'static str {
    MONTH_NAMES[usize::from(month.clamp(1, 12)) - 1]
}

/// The `months` months ending with `last`, oldest first.
///
/// `months` defaults to [DEFAULT_WINDOW_MONTHS].
///
/// # Errors
/// Returns [Error::Validation] if `months` is zero or above [MAX_WINDOW_MONTHS].
pub fn trailing_months(last: YearMonth, months: Option<u32>) -> Result<Vec<YearMonth>, Error> {
    let months = months.unwrap_or(DEFAULT_WINDOW_MONTHS);

    if !(1..=MAX_WINDOW_MONTHS).contains(&months) {
        return Err(Error::Validation(format!(
            "months must be between 1 and {MAX_WINDOW_MONTHS}, got {months}"
        )));
    }

    Ok((0..months).rev().map(|count| last.months_before(count)).collect())
}

/// Parse a date request parameter.
///
/// Accepts "YYYY-MM-DD" and full timestamps such as "2024-05-01T10:30:00Z",
/// in which case only the date part is used. `field` names the parameter in
/// the error message.
///
/// # Errors
/// Returns [Error::Validation] if the string is not a valid date.
pub fn parse_date(raw: &str, field: &str) -> Result<Date, Error> {
    let raw = raw.trim();
    let date_part = match raw.split_once('T') {
        Some((date_part, _)) => date_part,
        None => raw,
    };

    Date::parse(date_part, format_description!("[year]-[month]-[day]")).map_err(|_| {
        Error::Validation(format!(
            "{field} must be a date formatted as YYYY-MM-DD, got \"{raw}\""
        ))
    })
}

/// Parse an optional date request parameter, treating empty strings as absent.
///
/// # Errors
/// Returns [Error::Validation] if a non-empty string is not a valid date.
pub fn parse_optional_date(raw: Option<&str>, field: &str) -> Result<Option<Date>, Error> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => parse_date(raw, field).map(Some),
        _ => Ok(None),
    }
}

/// The Monday and Sunday bounding ISO week `week` of ISO year `year`.
pub fn iso_week_bounds(year: i32, week: u8) -> Option<(Date, Date)> {
    let start = Date::from_iso_week_date(year, week, Weekday::Monday).ok()?;
    let end = start.checked_add(Duration::days(6))?;

    Some((start, end))
}

#[cfg(test)]
mod year_month_tests {
    use time::macros::date;

    use crate::{
        Error,
        period::{YearMonth, month_name, trailing_months},
    };

    #[test]
    fn new_rejects_month_out_of_range() {
        assert!(matches!(YearMonth::new(2024, 0), Err(Error::Validation(_))));
        assert!(matches!(YearMonth::new(2024, 13), Err(Error::Validation(_))));
        assert!(YearMonth::new(2024, 12).is_ok());
    }

    #[test]
    fn previous_wraps_january_to_december() {
        let january = YearMonth::new(2024, 1).unwrap();

        assert_eq!(january.previous(), YearMonth::new(2023, 12).unwrap());
    }

    #[test]
    fn months_before_crosses_year_boundary() {
        let march = YearMonth::new(2024, 3).unwrap();

        assert_eq!(march.months_before(5), YearMonth::new(2023, 10).unwrap());
        assert_eq!(march.months_before(0), march);
    }

    #[test]
    fn bounds_and_length_handle_leap_years() {
        let february = YearMonth::new(2024, 2).unwrap();

        assert_eq!(february.first_day(), date!(2024 - 02 - 01));
        assert_eq!(february.last_day(), date!(2024 - 02 - 29));
        assert_eq!(february.days(), 29);
        assert_eq!(YearMonth::new(2023, 2).unwrap().days(), 28);
    }

    #[test]
    fn ordering_is_chronological() {
        let december = YearMonth::new(2023, 12).unwrap();
        let january = YearMonth::new(2024, 1).unwrap();

        assert!(december < january);
    }

    #[test]
    fn trailing_months_end_with_last_month() {
        let february = YearMonth::new(2024, 2).unwrap();

        let got = trailing_months(february, Some(3)).unwrap();

        assert_eq!(
            got,
            vec![
                YearMonth::new(2023, 12).unwrap(),
                YearMonth::new(2024, 1).unwrap(),
                february,
            ]
        );
        assert_eq!(trailing_months(february, None).unwrap().len(), 6);
    }

    #[test]
    fn trailing_months_rejects_empty_window() {
        let february = YearMonth::new(2024, 2).unwrap();

        assert!(matches!(
            trailing_months(february, Some(0)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            trailing_months(february, Some(10_000)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn displays_zero_padded_month() {
        assert_eq!(YearMonth::new(2024, 5).unwrap().to_string(), "2024-05");
    }

    #[test]
    fn month_names() {
        assert_eq!(month_name(1), "January");
        assert_eq!(month_name(12), "December");
        assert_eq!(YearMonth::new(2024, 7).unwrap().name(), "July");
    }
}

#[cfg(test)]
mod parse_date_tests {
    use time::macros::date;

    use crate::{
        Error,
        period::{iso_week_bounds, parse_date, parse_optional_date},
    };

    #[test]
    fn parses_plain_date() {
        assert_eq!(parse_date("2024-05-17", "date"), Ok(date!(2024 - 05 - 17)));
    }

    #[test]
    fn parses_date_part_of_timestamp() {
        assert_eq!(
            parse_date("2024-05-17T23:59:59.000Z", "date"),
            Ok(date!(2024 - 05 - 17))
        );
    }

    #[test]
    fn rejects_garbage() {
        let result = parse_date("last tuesday", "startDate");

        match result {
            Err(Error::Validation(message)) => assert!(message.contains("startDate")),
            other => panic!("want validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_optional_date_is_none() {
        assert_eq!(parse_optional_date(Some(""), "endDate"), Ok(None));
        assert_eq!(parse_optional_date(None, "endDate"), Ok(None));
    }

    #[test]
    fn iso_week_starts_on_monday() {
        // 2024-01-01 is a Monday and starts ISO week 1 of 2024.
        assert_eq!(
            iso_week_bounds(2024, 1),
            Some((date!(2024 - 01 - 01), date!(2024 - 01 - 07)))
        );
        // ISO week 1 of 2020 starts in the previous calendar year.
        assert_eq!(
            iso_week_bounds(2020, 1),
            Some((date!(2019 - 12 - 30), date!(2020 - 01 - 05)))
        );
        assert_eq!(iso_week_bounds(2024, 60), None);
    }
}
