use crate::{utils, CronError, Result};
use std::{collections::BTreeSet, fmt::Display, ops::RangeInclusive};

/// Type of a single field value.
pub type FieldValueType = u16;

/// Static metadata of a schedule field: bounds, wrap-around literals and mnemonic names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// The lowest valid value (inclusive).
    pub low: FieldValueType,
    /// The highest valid value (inclusive).
    pub high: FieldValueType,
    /// Out-of-range literals and the values they are normalized to.
    pub wraps: &'static [(FieldValueType, FieldValueType)],
    /// Case-insensitive names accepted in place of numbers.
    pub aliases: &'static [(&'static str, FieldValueType)],
}

impl FieldSpec {
    /// Number of values in the field's range.
    #[inline]
    pub fn size(&self) -> usize {
        (self.high - self.low + 1) as usize
    }

    /// Applies the wrap map to the value.
    fn normalize(&self, value: FieldValueType) -> FieldValueType {
        self.wraps
            .iter()
            .find(|(from, _)| *from == value)
            .map_or(value, |(_, to)| *to)
    }

    fn bounds(&self) -> RangeInclusive<FieldValueType> {
        self.low..=self.high
    }
}

const MONTH_NAMES: &[(&str, FieldValueType)] = &[
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

const DAY_OF_WEEK_NAMES: &[(&str, FieldValueType)] = &[
    ("sun", 0),
    ("mon", 1),
    ("tue", 2),
    ("wed", 3),
    ("thu", 4),
    ("fri", 5),
    ("sat", 6),
];

/// Metadata of all five fields, in the schedule order.
pub static FIELD_SPECS: [FieldSpec; 5] = [
    FieldSpec {
        low: 0,
        high: 59,
        wraps: &[(60, 0)],
        aliases: &[],
    },
    FieldSpec {
        low: 0,
        high: 23,
        wraps: &[(24, 0)],
        aliases: &[],
    },
    FieldSpec {
        low: 1,
        high: 31,
        wraps: &[],
        aliases: &[],
    },
    FieldSpec {
        low: 1,
        high: 12,
        wraps: &[],
        aliases: MONTH_NAMES,
    },
    FieldSpec {
        low: 0,
        high: 6,
        wraps: &[(7, 0)],
        aliases: DAY_OF_WEEK_NAMES,
    },
];

/// Schedule field, the discriminant is the field's position in the schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    /// Minutes, 0-59.
    Minute = 0,
    /// Hours, 0-23.
    Hour = 1,
    /// Day of month, 1-31.
    DayOfMonth = 2,
    /// Month, 1-12 or JAN-DEC.
    Month = 3,
    /// Day of week, 0-6 or SUN-SAT.
    DayOfWeek = 4,
}

impl FieldKind {
    /// All fields in the schedule order.
    pub const ALL: [FieldKind; 5] = [
        FieldKind::Minute,
        FieldKind::Hour,
        FieldKind::DayOfMonth,
        FieldKind::Month,
        FieldKind::DayOfWeek,
    ];

    /// Returns static metadata of the field.
    #[inline]
    pub fn spec(self) -> &'static FieldSpec {
        &FIELD_SPECS[self as usize]
    }

    /// Converts a single token (number or name) into a raw, not yet normalized, value.
    fn parse_value(self, token: &str, item: &str) -> Result<FieldValueType> {
        utils::parse_digital_value(token)
            .or_else(|| utils::parse_string_value(token, self.spec().aliases))
            .ok_or_else(|| CronError::InvalidCharacter {
                field: self,
                input: item.to_owned(),
            })
    }

    fn parse_step(self, token: &str, item: &str) -> Result<FieldValueType> {
        match utils::parse_digital_value(token) {
            Some(step) if step > 0 => Ok(step),
            _ => Err(CronError::InvalidStep {
                field: self,
                input: item.to_owned(),
            }),
        }
    }

    /// Expands a single comma-separated item into raw values.
    fn expand_item(self, item: &str) -> Result<Vec<FieldValueType>> {
        let spec = self.spec();
        let (base, step) = match item.split_once('/') {
            Some((base, step)) => (base, Some(self.parse_step(step, item)?)),
            None => (item, None),
        };

        let (start, end) = if base == "*" {
            (spec.low, spec.high)
        } else if let Some((start, end)) = base.split_once('-') {
            (self.parse_value(start, item)?, self.parse_value(end, item)?)
        } else {
            let value = self.parse_value(base, item)?;
            if step.is_none() {
                return Ok(vec![value]);
            }
            (value, value.max(spec.high))
        };

        if start > end {
            return Err(CronError::InvalidRange {
                field: self,
                input: item.to_owned(),
            });
        }

        let values = match step {
            Some(step) => (start..=end)
                .filter(|value| *value == start || value % step == 0)
                .collect(),
            None => (start..=end).collect(),
        };

        Ok(values)
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldKind::Minute => "minute",
            FieldKind::Hour => "hour",
            FieldKind::DayOfMonth => "day of month",
            FieldKind::Month => "month",
            FieldKind::DayOfWeek => "day of week",
        };
        write!(f, "{name}")
    }
}

/// Result of looking for the next value of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NextValue {
    /// The current value is valid.
    Current,
    /// The nearest valid value is greater than the current one.
    Ahead(FieldValueType),
    /// There is no valid value up to the field's maximum, the smallest one is returned.
    Wrapped(FieldValueType),
}

/// Sorted set of values the field matches.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExpandedField {
    kind: FieldKind,
    values: BTreeSet<FieldValueType>,
}

impl ExpandedField {
    /// Expands raw field pattern into the set of valid values.
    ///
    /// The pattern is a comma-separated list of items, each item is `*`, a number, a name (for months and days of week)
    /// or a range `a-b`, optionally followed by `/step`. Literals from the field's wrap map are normalized
    /// (`60` minutes, `24` hours and `7` as a day of week become `0`), other values outside the field's bounds are dropped.
    pub fn parse(kind: FieldKind, input: &str) -> Result<Self> {
        let spec = kind.spec();
        let mut values = BTreeSet::new();

        for item in input.split(',') {
            let expanded = kind.expand_item(item)?;
            values.extend(
                expanded
                    .into_iter()
                    .map(|value| spec.normalize(value))
                    .filter(|value| spec.bounds().contains(value)),
            );
        }

        if values.is_empty() {
            return Err(CronError::EmptyExpansion {
                field: kind,
                input: input.to_owned(),
            });
        }

        Ok(Self { kind, values })
    }

    /// Field this set belongs to.
    #[inline]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Iterator over the values in ascending order.
    pub fn values(&self) -> impl Iterator<Item = FieldValueType> + '_ {
        self.values.iter().copied()
    }

    /// Number of values in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`, an expanded field has at least one value.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns `true` if the value belongs to the set.
    #[inline]
    pub fn contains(&self, value: FieldValueType) -> bool {
        self.values.contains(&value)
    }

    /// Returns `true` if the set covers the whole field's range, i.e. it's the same as `*`.
    #[inline]
    pub fn is_wide_open(&self) -> bool {
        self.values.len() >= self.kind.spec().size()
    }

    /// The smallest value in the set.
    pub(crate) fn first(&self) -> FieldValueType {
        self.values.first().copied().unwrap_or(self.kind.spec().low)
    }

    /// Finds the smallest value which is greater or equal to the `current`.
    pub(crate) fn next_from(&self, current: FieldValueType) -> NextValue {
        match self.values.range(current..).next() {
            Some(value) if *value == current => NextValue::Current,
            Some(value) => NextValue::Ahead(*value),
            None => NextValue::Wrapped(self.first()),
        }
    }
}

impl Display for ExpandedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values = self.values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
        write!(f, "{}", values)
    }
}
