//! Crontab expressions evaluator.
#![deny(unsafe_code, warnings, missing_docs)]

//! This crate is intended to:
//! - parse classic five-field crontab schedules into sets of matching values;
//! - check whether a schedule fires at the particular minute;
//! - find the next time when a schedule fires, without minute-by-minute iteration.
//!
//! _This is not a cron jobs scheduler or runner._
//!
//! ## Cron schedule format
//!
//! Schedule consists of five whitespace-separated fields:
//!
//! | Field        | Allowed values  | Allowed special characters |
//! |--------------|-----------------|----------------------------|
//! | Minutes      | 0-59            | * , - /                    |
//! | Hours        | 0-23            | * , - /                    |
//! | Day of Month | 1-31            | * , - /                    |
//! | Month        | 1-12 or JAN-DEC | * , - /                    |
//! | Day of Week  | 0-6 or SUN-SAT  | * , - /                    |
//!
//! Patterns meanings:
//! - `*` - each possible value, i.e. `0,1,2,...,59` for minutes;
//! - `,` - list of values or patterns, i.e. `1,7,12`, `SUN,FRI`;
//! - `-` - range of values, i.e. `0-15`, `JAN-MAR`; ranges should be ascending, `NOV-FEB` is an error;
//! - `/` - step: the first value of the range and each next value divisible by the step, i.e. `*/15`, `10-30/5`.
//!   A single value with a step, like `10/20`, means the range from this value up to the field's maximum.
//!
//! Names are case-insensitive. `60` minutes, `24` hours and `7` as a day of week are treated as `0`.
//!
//! If both day of month and day of week are restricted (not `*`), the schedule fires when _any_ of them matches,
//! i.e. `30 8 1,15 * FRI` fires at 08:30 on the 1st and 15th day of each month and on each Friday.
//!
//! The next time is searched up to the end of the year following the starting one, so schedules which never
//! fire (`0 0 30 2 *`) or fire too rarely (`0 0 29 2 *` in the middle of the leap years cycle) have no next time.
//!
//! All fields are evaluated against the local (wall-clock) time of the provided instant.
//!
//! ## How to use
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use cron_next::{Result, Schedule};
//!
//! fn next() -> Result<()> {
//!     let schedule = Schedule::new("30 8 * * mon-fri")?;
//!     let now = Utc.with_ymd_and_hms(2024, 1, 6, 12, 0, 0).unwrap();
//!
//!     assert!(!schedule.is_now(&now));
//!     let next = schedule.next_time(&now).unwrap();
//!     assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 8, 8, 30, 0).unwrap());
//!
//!     // The next 5 events
//!     schedule.iter(&now).take(5).for_each(|t| println!("next: {t}"));
//!
//!     Ok(())
//! }
//! # next().unwrap();
//! ```
//!
//! There are shortcut functions which take a schedule string as is: [`parse`], [`is_valid`], [`is_now`],
//! [`next_time`] and [`next_timestamp`].
//!
//! Failures of the next time search are reported via the [log](https://crates.io/crates/log) facade.
//!
//! # Feature flags
//! * `serde`: adds [`Serialize`](https://docs.rs/serde/latest/serde/trait.Serialize.html) and [`Deserialize`](https://docs.rs/serde/latest/serde/trait.Deserialize.html) trait implementation for [`Schedule`].

/// Crate specific Error implementation.
pub mod error;
/// Schedule fields metadata and expansion.
pub mod field;
/// Cron schedule parser and next event finder.
pub mod schedule;
mod search;
mod utils;

use chrono::{DateTime, Local, TimeZone};
use log::{debug, warn};

// Re-export of public entities.
pub use error::CronError;
pub use field::{ExpandedField, FieldKind};
pub use schedule::Schedule;

/// Convenient alias for `Result`.
pub type Result<T, E = CronError> = std::result::Result<T, E>;

/// Parses the schedule into five expanded fields.
#[inline]
pub fn parse(pattern: &str) -> Result<Schedule> {
    Schedule::new(pattern)
}

/// Returns `true` if the schedule is valid.
#[inline]
pub fn is_valid(pattern: &str) -> bool {
    Schedule::new(pattern).is_ok()
}

/// Returns `true` if the schedule fires at the minute of `current`.
///
/// Invalid schedule never fires.
pub fn is_now<Tz: TimeZone>(pattern: &str, current: &DateTime<Tz>) -> bool {
    match Schedule::new(pattern) {
        Ok(schedule) => schedule.is_now(current),
        Err(e) => {
            debug!("invalid schedule '{pattern}': {e}");
            false
        }
    }
}

/// Returns time of the next schedule's event starting from `current` (inclusively).
///
/// Returns `None` if the schedule is invalid or there is no event within the search range.
pub fn next_time<Tz: TimeZone>(pattern: &str, current: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    match Schedule::new(pattern) {
        Ok(schedule) => schedule.next_time(current),
        Err(e) => {
            warn!("invalid schedule '{pattern}': {e}");
            None
        }
    }
}

/// Returns UNIX timestamp of the next schedule's event in the local time zone,
/// starting from `timestamp` (inclusively), or from now if `timestamp` is `None`.
pub fn next_timestamp(pattern: &str, timestamp: Option<i64>) -> Option<i64> {
    let current = match timestamp {
        Some(timestamp) => Local.timestamp_opt(timestamp, 0).earliest()?,
        None => Local::now(),
    };

    next_time(pattern, &current).map(|next| next.timestamp())
}
