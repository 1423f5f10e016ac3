//! Calendar arithmetic shared by every scheduler.
//!
//! All month stepping goes through [`add_months`] so the end-of-month rule
//! is applied in exactly one place. Jan 31 plus one month is Feb 28 (29 in
//! leap years), never an invalid date and never a drift into March.

use chrono::{Months, NaiveDate};

/// Adds whole calendar months, clamping the day to the target month's end.
///
/// Saturates at [`NaiveDate::MAX`] on overflow, which is far outside any
/// projection horizon.
#[must_use]
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// January 1 of the given year.
#[must_use]
pub fn year_start(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// December 31 of the given year, the date terminal zeroing sales land on.
#[must_use]
pub fn year_end(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn clamps_to_end_of_short_months() {
        assert_eq!(add_months(date(2023, 1, 31), 1), date(2023, 2, 28));
        assert_eq!(add_months(date(2024, 1, 31), 1), date(2024, 2, 29));
        assert_eq!(add_months(date(2023, 8, 31), 3), date(2023, 11, 30));
    }

    #[test]
    fn steps_across_year_boundaries() {
        assert_eq!(add_months(date(2022, 11, 15), 3), date(2023, 2, 15));
        assert_eq!(add_months(date(2022, 6, 1), 12), date(2023, 6, 1));
        assert_eq!(add_months(date(2022, 6, 1), 0), date(2022, 6, 1));
    }

    #[test]
    fn clamped_day_stays_clamped_per_step() {
        // Stepping one month at a time from Jan 31 lands on month ends,
        // not on the 31st again.
        let mut d = date(2023, 1, 31);
        d = add_months(d, 1);
        assert_eq!(d, date(2023, 2, 28));
        d = add_months(d, 1);
        assert_eq!(d, date(2023, 3, 28));
    }

    #[test]
    fn year_bounds() {
        assert_eq!(year_start(2025), date(2025, 1, 1));
        assert_eq!(year_end(2025), date(2025, 12, 31));
    }
}
