/// Common utility functions.
use crate::{field::FieldValueType, CronError, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

/// Converts string of decimal digits into unsigned number.
pub(crate) fn parse_digital_value(input: &str) -> Option<FieldValueType> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        None
    } else {
        input.parse::<FieldValueType>().ok()
    }
}

/// Converts string with mnemonic value representation into unsigned number.
pub(crate) fn parse_string_value(input: &str, values: &[(&str, FieldValueType)]) -> Option<FieldValueType> {
    if input.is_empty() {
        None
    } else {
        values
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(input))
            .map(|(_, value)| *value)
    }
}

/// Returns day of week number, 0 is Sunday.
#[inline]
pub(crate) fn weekday_number(date: &impl Datelike) -> FieldValueType {
    date.weekday().num_days_from_sunday() as FieldValueType
}

/// Returns the last day of specified month.
///
/// Walks forward from the 28th until the month changes.
pub(crate) fn last_day_of_month(year: i32, month: u32) -> u32 {
    if month == 0 || month > 12 {
        panic!("Invalid month: {month}");
    }

    let Some(mut date) = NaiveDate::from_ymd_opt(year, month, 28) else {
        panic!("Invalid date: {year:04}-{month:02}-28");
    };

    while let Some(next) = date.succ_opt() {
        if next.month() != month {
            break;
        }
        date = next;
    }

    date.day()
}

/// Returns midnight of the first day, starting from `from` (inclusively), which falls on the `weekday`.
pub(crate) fn next_weekday_on_or_after(weekday: FieldValueType, from: &NaiveDateTime) -> Result<NaiveDateTime> {
    let mut date = from.date();

    for _ in 0..7 {
        if weekday_number(&date) == weekday {
            return Ok(date.and_time(NaiveTime::MIN));
        }
        date = date.succ_opt().ok_or(CronError::WeekdaySearchExhausted(weekday))?;
    }

    Err(CronError::WeekdaySearchExhausted(weekday))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::time::Duration;

    const MONTHS: &[(&str, FieldValueType)] = &[("jan", 1), ("feb", 2), ("mar", 3)];

    fn datetime(input: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn parse_digital_value_valid() {
        assert_eq!(parse_digital_value("5"), Some(5));
        assert_eq!(parse_digital_value("0"), Some(0));
        assert_eq!(parse_digital_value("08"), Some(8));
        assert_eq!(parse_digital_value("65535"), Some(65535));
    }

    #[test]
    fn parse_digital_value_invalid_input() {
        assert_eq!(parse_digital_value("abc"), None);
        assert_eq!(parse_digital_value(""), None);
        assert_eq!(parse_digital_value("-1"), None);
        assert_eq!(parse_digital_value("+1"), None);
        assert_eq!(parse_digital_value("1.5"), None);
        assert_eq!(parse_digital_value(" 1"), None);
        assert_eq!(parse_digital_value("65536"), None);
    }

    #[test]
    fn parse_string_value_regular() {
        assert_eq!(parse_string_value("jan", MONTHS), Some(1));
        assert_eq!(parse_string_value("FEB", MONTHS), Some(2));
        assert_eq!(parse_string_value("mAr", MONTHS), Some(3));

        assert_eq!(parse_string_value("", MONTHS), None);
        assert_eq!(parse_string_value("dec", MONTHS), None);
        assert_eq!(parse_string_value("janu", MONTHS), None);
        assert_eq!(parse_string_value("ja", MONTHS), None);
        assert_eq!(parse_string_value(" jan", MONTHS), None);
    }

    #[test]
    fn parse_string_value_empty_array() {
        assert_eq!(parse_string_value("test", &[]), None);
    }

    #[rstest]
    #[case(2023, 1, 31)]
    #[case(2023, 3, 31)]
    #[case(2023, 5, 31)]
    #[case(2023, 7, 31)]
    #[case(2023, 8, 31)]
    #[case(2023, 10, 31)]
    #[case(2023, 12, 31)]
    #[case(2023, 4, 30)]
    #[case(2023, 6, 30)]
    #[case(2023, 9, 30)]
    #[case(2023, 11, 30)]
    // February in non-leap year
    #[case(2023, 2, 28)]
    // February in leap years
    #[case(2024, 2, 29)]
    #[case(2020, 2, 29)]
    #[case(2000, 2, 29)]
    // Century years aren't leap unless divisible by 400
    #[case(1900, 2, 28)]
    #[case(2100, 2, 28)]
    #[timeout(Duration::from_secs(1))]
    fn test_last_day_of_month(#[case] y: i32, #[case] m: u32, #[case] expected: u32) {
        assert_eq!(last_day_of_month(y, m), expected, "{y:04}-{m:02} has {expected} days");
    }

    #[rstest]
    #[case(2023, 0)]
    #[case(2023, 13)]
    #[should_panic(expected = "Invalid month")]
    fn test_last_day_of_month_invalid(#[case] y: i32, #[case] m: u32) {
        last_day_of_month(y, m);
    }

    #[rstest]
    #[case(2023, 12, 25, 1)] // Monday
    #[case(2024, 1, 1, 1)] // Monday
    #[case(2025, 1, 1, 3)] // Wednesday
    #[case(2024, 2, 29, 4)] // Thursday (leap year)
    #[case(2023, 1, 1, 0)] // Sunday
    #[case(2000, 1, 1, 6)] // Saturday
    #[case(1900, 1, 1, 1)] // Monday
    fn test_weekday_number(#[case] y: i32, #[case] m: u32, #[case] d: u32, #[case] expected: FieldValueType) {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(weekday_number(&date), expected, "date {date}");
    }

    #[rstest]
    // 2024-01-01 is Monday
    #[case(1, "2024-01-01 10:15", "2024-01-01 00:00")]
    #[case(2, "2024-01-01 10:15", "2024-01-02 00:00")]
    #[case(6, "2024-01-01 00:00", "2024-01-06 00:00")]
    #[case(0, "2024-01-01 23:59", "2024-01-07 00:00")]
    // Crossing month and year boundaries
    #[case(4, "2024-01-31 12:00", "2024-02-01 00:00")]
    #[case(3, "2024-12-30 12:00", "2025-01-01 00:00")]
    #[case(5, "2024-02-28 08:30", "2024-03-01 00:00")]
    fn test_next_weekday_on_or_after(
        #[case] weekday: FieldValueType,
        #[case] from: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(
            next_weekday_on_or_after(weekday, &datetime(from)).unwrap(),
            datetime(expected),
            "weekday = {weekday}, from = {from}"
        );
    }

    #[test]
    fn test_next_weekday_on_or_after_exhausted() {
        assert_eq!(
            next_weekday_on_or_after(7, &datetime("2024-01-01 00:00")),
            Err(CronError::WeekdaySearchExhausted(7))
        );
    }
}
