//! Month calendar layout.

use chrono::{Datelike, Duration, NaiveDate};

/// Number of cells in a month view: six Monday-first weeks.
pub const GRID_CELLS: usize = 42;

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

pub const WEEKDAY_HEADERS: [&str; 7] = ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"];

/// English name of a 1-based month; empty for out-of-range input.
pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|i| MONTH_NAMES.get(i as usize))
        .copied()
        .unwrap_or("")
}

/// Move `delta` whole months from (`year`, `month`).
///
/// `None` when the result falls outside the dates chrono can represent.
pub fn shift_month(year: i32, month: u32, delta: i32) -> Option<(i32, u32)> {
    let index = i64::from(year) * 12 + i64::from(month) - 1 + i64::from(delta);
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).map(|_| (year, month))
}

/// One day cell of the month view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    /// False for the leading and trailing days borrowed from adjacent months.
    pub in_month: bool,
}

/// The 42 cells of the month view, starting on the Monday on or before the
/// first of the month. Returns `None` for an invalid month.
pub fn month_grid(year: i32, month: u32) -> Option<Vec<CalendarCell>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let leading = i64::from(first.weekday().num_days_from_monday());
    let start = first - Duration::days(leading);
    Some(
        (0..GRID_CELLS as i64)
            .map(|offset| {
                let date = start + Duration::days(offset);
                CalendarCell {
                    date,
                    in_month: date.month() == month && date.year() == year,
                }
            })
            .collect(),
    )
}

/// Parse a `YYYY-MM` month argument.
pub fn parse_month(s: &str) -> Option<(i32, u32)> {
    let (year, month) = s.trim().split_once('-')?;
    let year = year.parse().ok()?;
    let month = month.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1).map(|_| (year, month))
}
