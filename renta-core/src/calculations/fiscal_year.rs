use chrono::{Datelike, NaiveDate};

/// Fiscal year a calculation made on `date` belongs to.
///
/// The annual return for a year is filed early the following year, so
/// calculations made in January or February are for the previous year.
///
/// ```
/// use chrono::NaiveDate;
/// use renta_core::calculations::fiscal_year_for;
///
/// let february = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();
/// let march = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
///
/// assert_eq!(fiscal_year_for(february), 2024);
/// assert_eq!(fiscal_year_for(march), 2025);
/// ```
pub fn fiscal_year_for(date: NaiveDate) -> i32 {
    if date.month() <= 2 {
        date.year() - 1
    } else {
        date.year()
    }
}
