/// Forward search of the next matching wall-clock time.
use crate::{
    field::{FieldValueType, NextValue},
    schedule::Schedule,
    utils, CronError, Result,
};
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use log::{debug, trace};

/// Upper bound of restarts within a single pass.
const MAX_RESTARTS: usize = 100_000;

/// Classification of the restricted day-related fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SearchMode {
    /// Day of week is `*`, days are driven by day of month.
    WeekdayOpen,
    /// Only day of week is restricted.
    WeekdayOnly,
    /// Day of week and month are restricted, day of month is `*`.
    WeekdayAndMonth,
    /// Both day of month and day of week are restricted, any of them matches.
    AllLimited,
}

impl SearchMode {
    pub(crate) fn of(schedule: &Schedule) -> Self {
        match (
            schedule.days_of_week().is_wide_open(),
            schedule.days_of_month().is_wide_open(),
            schedule.months().is_wide_open(),
        ) {
            (true, _, _) => Self::WeekdayOpen,
            (false, false, _) => Self::AllLimited,
            (false, true, true) => Self::WeekdayOnly,
            (false, true, false) => Self::WeekdayAndMonth,
        }
    }

    /// Day rules to search with, one pass per rule.
    fn passes(self) -> &'static [DayRule] {
        match self {
            Self::WeekdayOpen => &[DayRule::DayOfMonth],
            Self::WeekdayOnly | Self::WeekdayAndMonth => &[DayRule::DayOfWeek],
            Self::AllLimited => &[DayRule::DayOfMonth, DayRule::DayOfWeek],
        }
    }
}

/// Which day field a pass enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayRule {
    DayOfMonth,
    DayOfWeek,
}

/// Search stages, from the coarsest unit to the finest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Month,
    Weekday,
    DayOfMonth,
    Hour,
    Minute,
}

impl Stage {
    const ORDER: [Stage; 5] = [Stage::Month, Stage::Weekday, Stage::DayOfMonth, Stage::Hour, Stage::Minute];
}

/// Returns the earliest time, starting from `start` (inclusively), which matches the schedule.
///
/// Fails if nothing matches before the end of the `limit` year.
pub(crate) fn next_match(schedule: &Schedule, start: NaiveDateTime, limit: i32) -> Result<NaiveDateTime> {
    let mode = SearchMode::of(schedule);
    trace!("search '{schedule}' from {start}, mode = {mode:?}");

    let mut found: Option<NaiveDateTime> = None;
    let mut failure = None;

    for rule in mode.passes() {
        let pass = Pass {
            schedule,
            rule: *rule,
            limit,
        };
        match pass.run(start) {
            Ok(next) => found = Some(found.map_or(next, |prev| prev.min(next))),
            Err(e) => {
                debug!("'{schedule}': {rule:?} pass from {start} failed: {e}");
                failure = Some(e);
            }
        }
    }

    match (found, failure) {
        (Some(next), _) => Ok(next),
        (None, Some(e)) => Err(e),
        (None, None) => Err(CronError::SearchRangeExceeded { limit }),
    }
}

/// Single search attempt which enforces one of the day fields.
struct Pass<'a> {
    schedule: &'a Schedule,
    rule: DayRule,
    limit: i32,
}

impl Pass<'_> {
    fn run(&self, start: NaiveDateTime) -> Result<NaiveDateTime> {
        let mut current = start;

        for _ in 0..MAX_RESTARTS {
            if current.year() > self.limit {
                return Err(CronError::SearchRangeExceeded { limit: self.limit });
            }

            // Any jump invalidates finer fields, so the next round starts over from the month.
            match self.advance(&current)? {
                Some(next) => current = next,
                None => return Ok(current),
            }
        }

        Err(CronError::SearchRangeExceeded { limit: self.limit })
    }

    /// Returns the time to restart from, or `None` if `current` matches.
    fn advance(&self, current: &NaiveDateTime) -> Result<Option<NaiveDateTime>> {
        for stage in Stage::ORDER {
            let next = match stage {
                Stage::Month => self.advance_month(current)?,
                Stage::Weekday => self.advance_weekday(current)?,
                Stage::DayOfMonth => self.advance_dom(current)?,
                Stage::Hour => self.advance_hour(current)?,
                Stage::Minute => self.advance_minute(current)?,
            };
            if next.is_some() {
                return Ok(next);
            }
        }

        Ok(None)
    }

    fn advance_month(&self, current: &NaiveDateTime) -> Result<Option<NaiveDateTime>> {
        let months = self.schedule.months();
        if months.is_wide_open() {
            return Ok(None);
        }

        match months.next_from(current.month() as FieldValueType) {
            NextValue::Current => Ok(None),
            NextValue::Ahead(month) => self.start_of_month(current.year(), month as u32).map(Some),
            NextValue::Wrapped(month) => self.start_of_month(current.year() + 1, month as u32).map(Some),
        }
    }

    fn advance_weekday(&self, current: &NaiveDateTime) -> Result<Option<NaiveDateTime>> {
        let days_of_week = self.schedule.days_of_week();
        if self.rule != DayRule::DayOfWeek || days_of_week.is_wide_open() {
            return Ok(None);
        }

        let mut nearest: Option<NaiveDateTime> = None;
        for weekday in days_of_week.values() {
            let candidate = utils::next_weekday_on_or_after(weekday, current)?;
            nearest = Some(nearest.map_or(candidate, |prev| prev.min(candidate)));
        }
        let Some(nearest) = nearest else {
            return Ok(None);
        };

        if nearest.date() == current.date() {
            Ok(None)
        } else if nearest.month() != current.month() {
            // Overshot the month: it has to be checked against the months pattern first.
            self.start_of_next_month(current).map(Some)
        } else {
            Ok(Some(nearest))
        }
    }

    fn advance_dom(&self, current: &NaiveDateTime) -> Result<Option<NaiveDateTime>> {
        let days_of_month = self.schedule.days_of_month();
        if self.rule != DayRule::DayOfMonth || days_of_month.is_wide_open() {
            return Ok(None);
        }

        let last_day = utils::last_day_of_month(current.year(), current.month());
        match days_of_month.next_from(current.day() as FieldValueType) {
            NextValue::Current => Ok(None),
            NextValue::Ahead(day) if (day as u32) <= last_day => {
                let date = self.date(current.year(), current.month(), day as u32)?;
                Ok(Some(date.and_time(NaiveTime::MIN)))
            }
            NextValue::Ahead(_) | NextValue::Wrapped(_) => self.start_of_next_month(current).map(Some),
        }
    }

    fn advance_hour(&self, current: &NaiveDateTime) -> Result<Option<NaiveDateTime>> {
        let hours = self.schedule.hours();
        if hours.is_wide_open() {
            return Ok(None);
        }

        match hours.next_from(current.hour() as FieldValueType) {
            NextValue::Current => Ok(None),
            NextValue::Ahead(hour) => Ok(Some(self.at(current.date(), hour as u32, 0)?)),
            NextValue::Wrapped(_) => {
                let tomorrow = current.date().succ_opt().ok_or_else(|| self.exceeded())?;
                Ok(Some(tomorrow.and_time(NaiveTime::MIN)))
            }
        }
    }

    fn advance_minute(&self, current: &NaiveDateTime) -> Result<Option<NaiveDateTime>> {
        let minutes = self.schedule.minutes();
        if minutes.is_wide_open() {
            return Ok(None);
        }

        match minutes.next_from(current.minute() as FieldValueType) {
            NextValue::Current => Ok(None),
            NextValue::Ahead(minute) => Ok(Some(self.at(current.date(), current.hour(), minute as u32)?)),
            NextValue::Wrapped(_) => {
                let hour_start = self.at(current.date(), current.hour(), 0)?;
                let next_hour = hour_start
                    .checked_add_signed(TimeDelta::hours(1))
                    .ok_or_else(|| self.exceeded())?;
                Ok(Some(next_hour))
            }
        }
    }

    fn start_of_next_month(&self, current: &NaiveDateTime) -> Result<NaiveDateTime> {
        if current.month() == 12 {
            self.start_of_month(current.year() + 1, 1)
        } else {
            self.start_of_month(current.year(), current.month() + 1)
        }
    }

    fn start_of_month(&self, year: i32, month: u32) -> Result<NaiveDateTime> {
        Ok(self.date(year, month, 1)?.and_time(NaiveTime::MIN))
    }

    fn at(&self, date: NaiveDate, hour: u32, minute: u32) -> Result<NaiveDateTime> {
        date.and_hms_opt(hour, minute, 0).ok_or_else(|| self.exceeded())
    }

    fn date(&self, year: i32, month: u32, day: u32) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| self.exceeded())
    }

    fn exceeded(&self) -> CronError {
        CronError::SearchRangeExceeded { limit: self.limit }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn datetime(input: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M").unwrap()
    }

    #[rstest]
    #[case("* * * * *", SearchMode::WeekdayOpen)]
    #[case("0 0 1 * *", SearchMode::WeekdayOpen)]
    #[case("0 0 1 6 *", SearchMode::WeekdayOpen)]
    #[case("0 0 * * 0-6", SearchMode::WeekdayOpen)]
    #[case("0 0 * * mon", SearchMode::WeekdayOnly)]
    #[case("0 0 * jan mon", SearchMode::WeekdayAndMonth)]
    #[case("0 0 1 * mon", SearchMode::AllLimited)]
    #[case("0 0 1 jan mon", SearchMode::AllLimited)]
    fn test_search_mode(#[case] pattern: &str, #[case] expected: SearchMode) {
        let schedule = Schedule::new(pattern).unwrap();
        assert_eq!(SearchMode::of(&schedule), expected, "pattern = {pattern}");
    }

    #[rstest]
    // Day of month pass ignores day of week and vice versa.
    #[case("0 0 13 * fri", DayRule::DayOfMonth, "2024-01-01 00:00", "2024-01-13 00:00")]
    #[case("0 0 13 * fri", DayRule::DayOfWeek, "2024-01-01 00:00", "2024-01-05 00:00")]
    #[case("0 0 1 * sun", DayRule::DayOfMonth, "2024-01-02 00:00", "2024-02-01 00:00")]
    #[case("0 0 1 * sun", DayRule::DayOfWeek, "2024-01-02 00:00", "2024-01-07 00:00")]
    fn test_single_pass(
        #[case] pattern: &str,
        #[case] rule: DayRule,
        #[case] start: &str,
        #[case] expected: &str,
    ) {
        let schedule = Schedule::new(pattern).unwrap();
        let start = datetime(start);
        let pass = Pass {
            schedule: &schedule,
            rule,
            limit: start.year() + 1,
        };
        assert_eq!(pass.run(start), Ok(datetime(expected)), "pattern = {pattern}, rule = {rule:?}");
    }

    #[test]
    fn test_dual_pass_takes_earliest() {
        let schedule = Schedule::new("0 0 13 * fri").unwrap();
        assert_eq!(
            next_match(&schedule, datetime("2024-01-06 00:00"), 2025),
            Ok(datetime("2024-01-12 00:00"))
        );
        assert_eq!(
            next_match(&schedule, datetime("2024-01-12 00:01"), 2025),
            Ok(datetime("2024-01-13 00:00"))
        );
    }

    #[rstest]
    #[case("0 0 30 2 *", "2024-01-01 00:00")]
    #[case("0 0 31 4,6,9,11 *", "2024-01-01 00:00")]
    #[case("0 0 29 2 *", "2025-03-01 00:00")]
    fn test_search_range_exceeded(#[case] pattern: &str, #[case] start: &str) {
        let schedule = Schedule::new(pattern).unwrap();
        let start = datetime(start);
        let limit = start.year() + 1;
        assert_eq!(
            next_match(&schedule, start, limit),
            Err(CronError::SearchRangeExceeded { limit })
        );
    }

    #[test]
    fn test_impossible_day_of_month_with_weekday() {
        // February never has the 31st, but its Mondays are still reachable.
        let schedule = Schedule::new("0 0 31 2 mon").unwrap();
        assert_eq!(
            next_match(&schedule, datetime("2024-03-01 00:00"), 2025),
            Ok(datetime("2025-02-03 00:00"))
        );
    }
}
