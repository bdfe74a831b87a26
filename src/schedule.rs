use crate::{
    field::{ExpandedField, FieldKind, FieldValueType},
    search, utils, CronError, Result,
};
use chrono::{DateTime, Datelike, LocalResult, NaiveDateTime, TimeDelta, TimeZone, Timelike};
use log::{debug, warn};
use std::{fmt::Display, str::FromStr};

/// Parsed crontab schedule: five expanded fields and the source pattern.
///
/// For the schedule format and usage examples, please refer to the [crate documentation](crate).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String"))]
#[cfg_attr(feature = "serde", serde(into = "String"))]
pub struct Schedule {
    source: String,
    minute: ExpandedField,
    hour: ExpandedField,
    dom: ExpandedField,
    month: ExpandedField,
    dow: ExpandedField,
}

impl Schedule {
    /// Parses and validates provided `pattern` and constructs [`Schedule`] instance.
    ///
    /// Alternative way to construct [`Schedule`] is to use one of `try_from` or `from_str` methods.
    ///
    /// Returns [`CronError`] if the pattern is empty, has other than five fields, or any field is invalid.
    /// Nothing is constructed partially.
    pub fn new(pattern: impl Into<String>) -> Result<Self> {
        let source = pattern.into();
        let elements: Vec<&str> = source.split_whitespace().collect();

        if elements.is_empty() {
            return Err(CronError::EmptyInput);
        }
        if elements.len() != 5 {
            return Err(CronError::FieldCount(elements.len()));
        }

        let minute = ExpandedField::parse(FieldKind::Minute, elements[0])?;
        let hour = ExpandedField::parse(FieldKind::Hour, elements[1])?;
        let dom = ExpandedField::parse(FieldKind::DayOfMonth, elements[2])?;
        let month = ExpandedField::parse(FieldKind::Month, elements[3])?;
        let dow = ExpandedField::parse(FieldKind::DayOfWeek, elements[4])?;

        Ok(Self {
            source,
            minute,
            hour,
            dom,
            month,
            dow,
        })
    }

    /// Expanded minutes.
    #[inline]
    pub fn minutes(&self) -> &ExpandedField {
        &self.minute
    }

    /// Expanded hours.
    #[inline]
    pub fn hours(&self) -> &ExpandedField {
        &self.hour
    }

    /// Expanded days of month.
    #[inline]
    pub fn days_of_month(&self) -> &ExpandedField {
        &self.dom
    }

    /// Expanded months.
    #[inline]
    pub fn months(&self) -> &ExpandedField {
        &self.month
    }

    /// Expanded days of week, 0 is Sunday.
    #[inline]
    pub fn days_of_week(&self) -> &ExpandedField {
        &self.dow
    }

    /// All expanded fields in the schedule order: minute, hour, day of month, month, day of week.
    pub fn fields(&self) -> [&ExpandedField; 5] {
        [&self.minute, &self.hour, &self.dom, &self.month, &self.dow]
    }

    /// Returns `true` if the schedule fires at the minute of the provided instant.
    ///
    /// Seconds are ignored, all fields are checked against the local time of the instant.
    /// If both day of month and day of week are restricted, matching any of them is enough.
    /// If only one of them is restricted, that one alone decides, so `0 9 * * mon` fires on Mondays only,
    /// the same way [`next_time`](Schedule::next_time) finds it.
    pub fn is_now<Tz: TimeZone>(&self, current: &DateTime<Tz>) -> bool {
        self.matches(&current.naive_local())
    }

    pub(crate) fn matches(&self, current: &NaiveDateTime) -> bool {
        if !self.minute.contains(current.minute() as FieldValueType)
            || !self.hour.contains(current.hour() as FieldValueType)
            || !self.month.contains(current.month() as FieldValueType)
        {
            return false;
        }

        let dom = self.dom.contains(current.day() as FieldValueType);
        if self.dow.is_wide_open() {
            return dom;
        }

        let dow = self.dow.contains(utils::weekday_number(current));
        if self.dom.is_wide_open() {
            dow
        } else {
            dom || dow
        }
    }

    /// Returns time of the next schedule's event, starting from the minute of `current` (inclusively).
    ///
    /// The search is limited to the end of the year following the `current` one,
    /// returns `None` (and logs the reason) if there is no event within this range.
    pub fn next_time<Tz: TimeZone>(&self, current: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        match self.find_next(current) {
            Ok(next) => Some(next),
            Err(e) => {
                warn!("unable to find the next time of '{self}' after {}: {e}", current.naive_local());
                None
            }
        }
    }

    /// The same as [`next_time`](Schedule::next_time), but returns the reason of the failure.
    ///
    /// Local times which don't exist in the time zone of `current` (DST gap) are skipped.
    /// If a local time occurs twice (clocks set back), the earliest instance which isn't before
    /// the minute of `current` is returned.
    pub fn find_next<Tz: TimeZone>(&self, current: &DateTime<Tz>) -> Result<DateTime<Tz>> {
        let tz = current.timezone();
        let limit = current.naive_local().year() + 1;
        let floor = current
            .clone()
            .checked_sub_signed(TimeDelta::seconds(current.second() as i64))
            .and_then(|floor| floor.checked_sub_signed(TimeDelta::nanoseconds(current.nanosecond() as i64)))
            .unwrap_or_else(|| current.clone());
        let mut start = truncate_to_minute(current.naive_local());

        // Every iteration moves `start` forward, so the year guard of the search ends the loop.
        loop {
            let next = search::next_match(self, start, limit)?;
            match tz.from_local_datetime(&next) {
                LocalResult::Single(next) => return Ok(next),
                LocalResult::Ambiguous(earliest, latest) => {
                    if earliest >= floor {
                        return Ok(earliest);
                    }
                    if latest >= floor {
                        return Ok(latest);
                    }
                    debug!(
                        "'{self}': both instances of local time {next} are before {}, skipping it",
                        floor.naive_local()
                    );
                }
                LocalResult::None => debug!("'{self}': local time {next} doesn't exist, skipping it"),
            }
            start = next + TimeDelta::minutes(1);
        }
    }

    /// Returns iterator of events starting from `current` (inclusively).
    #[inline]
    pub fn iter<Tz: TimeZone>(&self, current: &DateTime<Tz>) -> impl Iterator<Item = DateTime<Tz>> {
        ScheduleIterator {
            schedule: self.clone(),
            next: self.next_time(current),
        }
    }

    /// Consumes [`Schedule`] and returns iterator of events starting from `current` (inclusively).
    #[inline]
    pub fn into_iter<Tz: TimeZone>(self, current: &DateTime<Tz>) -> impl Iterator<Item = DateTime<Tz>> {
        let next = self.next_time(current);
        ScheduleIterator { schedule: self, next }
    }
}

fn truncate_to_minute(value: NaiveDateTime) -> NaiveDateTime {
    value
        .with_second(0)
        .and_then(|value| value.with_nanosecond(0))
        .unwrap_or(value)
}

/// Contains iterator state.
#[derive(Debug, Clone)]
struct ScheduleIterator<Tz: TimeZone> {
    schedule: Schedule,
    next: Option<DateTime<Tz>>,
}

impl<Tz: TimeZone> Iterator for ScheduleIterator<Tz> {
    type Item = DateTime<Tz>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        self.next = self
            .schedule
            .next_time(&current.clone().checked_add_signed(TimeDelta::minutes(1))?);
        Some(current)
    }
}

impl From<Schedule> for String {
    fn from(value: Schedule) -> Self {
        value.source
    }
}

impl From<&Schedule> for String {
    fn from(value: &Schedule) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Schedule {
    type Error = CronError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&String> for Schedule {
    type Error = CronError;

    fn try_from(value: &String) -> Result<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Schedule {
    type Error = CronError;

    fn try_from(value: &str) -> Result<Self> {
        Self::new(value)
    }
}

impl FromStr for Schedule {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}
