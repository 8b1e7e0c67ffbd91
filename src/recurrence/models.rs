//! Recurrence rule data models

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::errors::{RecurrenceError, RecurrenceResult};

/// Calendar conventions injected into every date computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarContext {
    /// Weekday that carries ordinal 1
    pub first_weekday: Weekday,
}

impl Default for CalendarContext {
    fn default() -> Self {
        Self {
            first_weekday: Weekday::Sun,
        }
    }
}

impl CalendarContext {
    pub fn new(first_weekday: Weekday) -> Self {
        Self { first_weekday }
    }

    /// Ordinal (1-7) of a weekday relative to the first weekday
    pub fn ordinal_of(&self, weekday: Weekday) -> u8 {
        let offset = (weekday.num_days_from_monday() + 7
            - self.first_weekday.num_days_from_monday())
            % 7;
        offset as u8 + 1
    }

    /// Ordinal (1-7) of a date's weekday
    pub fn weekday_ordinal(&self, date: NaiveDate) -> u8 {
        self.ordinal_of(date.weekday())
    }

    /// Weekday carrying the given ordinal; `None` outside 1-7
    pub fn weekday_for(&self, ordinal: u8) -> Option<Weekday> {
        if !(1..=7).contains(&ordinal) {
            return None;
        }
        let mut weekday = self.first_weekday;
        for _ in 1..ordinal {
            weekday = weekday.succ();
        }
        Some(weekday)
    }
}

/// How often a care task repeats
///
/// Weekly and monthly rules honour `interval` when wrapping into the next
/// period: "every 2 weeks on Mon, Wed" skips one week after Wednesday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RecurrenceRule {
    /// Every `interval` days
    Daily { interval: u32 },
    /// On the given weekday ordinals (1-7)
    #[serde(rename_all = "camelCase")]
    Weekly {
        interval: u32,
        days_of_week: BTreeSet<u8>,
    },
    /// On the given days of the month (1-31)
    #[serde(rename_all = "camelCase")]
    Monthly {
        interval: u32,
        days_of_month: BTreeSet<u8>,
    },
}

impl RecurrenceRule {
    /// Build a validated daily rule
    pub fn daily(interval: u32) -> RecurrenceResult<Self> {
        let rule = Self::Daily { interval };
        rule.validate()?;
        Ok(rule)
    }

    /// Build a validated weekly rule
    pub fn weekly(interval: u32, days: impl IntoIterator<Item = u8>) -> RecurrenceResult<Self> {
        let rule = Self::Weekly {
            interval,
            days_of_week: days.into_iter().collect(),
        };
        rule.validate()?;
        Ok(rule)
    }

    /// Build a validated monthly rule
    pub fn monthly(interval: u32, days: impl IntoIterator<Item = u8>) -> RecurrenceResult<Self> {
        let rule = Self::Monthly {
            interval,
            days_of_month: days.into_iter().collect(),
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn interval(&self) -> u32 {
        match self {
            Self::Daily { interval }
            | Self::Weekly { interval, .. }
            | Self::Monthly { interval, .. } => *interval,
        }
    }

    /// Storage name of the rule's frequency
    pub fn frequency_name(&self) -> &'static str {
        match self {
            Self::Daily { .. } => "daily",
            Self::Weekly { .. } => "weekly",
            Self::Monthly { .. } => "monthly",
        }
    }

    /// Check the rule invariants: interval >= 1, non-empty in-range day sets
    pub fn validate(&self) -> RecurrenceResult<()> {
        if self.interval() == 0 {
            return Err(RecurrenceError::InvalidInterval(0));
        }
        match self {
            Self::Daily { .. } => Ok(()),
            Self::Weekly { days_of_week, .. } => {
                if days_of_week.is_empty() {
                    return Err(RecurrenceError::EmptyDays("weekly"));
                }
                match days_of_week.iter().find(|d| !(1..=7).contains(*d)) {
                    Some(day) => Err(RecurrenceError::WeekdayOutOfRange(*day as i64)),
                    None => Ok(()),
                }
            }
            Self::Monthly { days_of_month, .. } => {
                if days_of_month.is_empty() {
                    return Err(RecurrenceError::EmptyDays("monthly"));
                }
                match days_of_month.iter().find(|d| !(1..=31).contains(*d)) {
                    Some(day) => Err(RecurrenceError::DayOfMonthOutOfRange(*day as i64)),
                    None => Ok(()),
                }
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Fill an unconfigured (empty) day set: `{1}` for weekly rules, the
    /// start date's day for monthly rules. A zero interval becomes 1.
    pub fn with_defaults(mut self, start: NaiveDate) -> Self {
        match &mut self {
            Self::Daily { interval } => {
                *interval = (*interval).max(1);
            }
            Self::Weekly {
                interval,
                days_of_week,
            } => {
                *interval = (*interval).max(1);
                if days_of_week.is_empty() {
                    days_of_week.insert(1);
                }
            }
            Self::Monthly {
                interval,
                days_of_month,
            } => {
                *interval = (*interval).max(1);
                if days_of_month.is_empty() {
                    days_of_month.insert(start.day() as u8);
                }
            }
        }
        self
    }
}

impl fmt::Display for RecurrenceRule {
    /// Compact form accepted by `FromStr`: `daily:3`, `weekly:1:2,4,6`, `monthly:1:1,15`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |days: &BTreeSet<u8>| {
            days.iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(",")
        };
        match self {
            Self::Daily { interval } => write!(f, "daily:{}", interval),
            Self::Weekly {
                interval,
                days_of_week,
            } => write!(f, "weekly:{}:{}", interval, join(days_of_week)),
            Self::Monthly {
                interval,
                days_of_month,
            } => write!(f, "monthly:{}:{}", interval, join(days_of_month)),
        }
    }
}

impl FromStr for RecurrenceRule {
    type Err = RecurrenceError;

    /// Parse the compact form. Interval and day list may be left out
    /// (`weekly`, `monthly:2`, `weekly:1:`); an empty day list is kept
    /// unconfigured for `with_defaults` to fill.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let syntax_error = || RecurrenceError::InvalidSyntax(s.to_string());
        let mut parts = s.trim().split(':');
        let frequency = parts.next().unwrap_or_default().trim();

        let interval = match parts.next() {
            Some(raw) => {
                let value: i64 = raw.trim().parse().map_err(|_| syntax_error())?;
                u32::try_from(value)
                    .ok()
                    .filter(|v| *v >= 1)
                    .ok_or(RecurrenceError::InvalidInterval(value))?
            }
            None => 1,
        };
        let days: Vec<u8> = match parts.next() {
            Some(raw) => raw
                .split(',')
                .filter(|d| !d.trim().is_empty())
                .map(|d| d.trim().parse::<u8>().map_err(|_| syntax_error()))
                .collect::<RecurrenceResult<_>>()?,
            None => Vec::new(),
        };
        if parts.next().is_some() {
            return Err(syntax_error());
        }

        let rule = match frequency.to_ascii_lowercase().as_str() {
            "daily" if days.is_empty() => Self::Daily { interval },
            "daily" => return Err(syntax_error()),
            "weekly" => Self::Weekly {
                interval,
                days_of_week: days.into_iter().collect(),
            },
            "monthly" => Self::Monthly {
                interval,
                days_of_month: days.into_iter().collect(),
            },
            _ => return Err(RecurrenceError::UnknownFrequency(frequency.to_string())),
        };

        match rule.validate() {
            Ok(()) | Err(RecurrenceError::EmptyDays(_)) => Ok(rule),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_follow_first_weekday() {
        let sunday_first = CalendarContext::default();
        assert_eq!(sunday_first.ordinal_of(Weekday::Sun), 1);
        assert_eq!(sunday_first.ordinal_of(Weekday::Sat), 7);

        let monday_first = CalendarContext::new(Weekday::Mon);
        assert_eq!(monday_first.ordinal_of(Weekday::Mon), 1);
        assert_eq!(monday_first.ordinal_of(Weekday::Sun), 7);
        assert_eq!(monday_first.weekday_for(6), Some(Weekday::Sat));
        assert_eq!(monday_first.weekday_for(0), None);
        assert_eq!(monday_first.weekday_for(8), None);
    }

    #[test]
    fn test_validated_constructors() {
        assert!(RecurrenceRule::daily(1).is_ok());
        assert_eq!(
            RecurrenceRule::daily(0),
            Err(RecurrenceError::InvalidInterval(0))
        );
        assert_eq!(
            RecurrenceRule::weekly(1, []),
            Err(RecurrenceError::EmptyDays("weekly"))
        );
        assert_eq!(
            RecurrenceRule::weekly(1, [2, 8]),
            Err(RecurrenceError::WeekdayOutOfRange(8))
        );
        assert_eq!(
            RecurrenceRule::monthly(1, [0, 15]),
            Err(RecurrenceError::DayOfMonthOutOfRange(0))
        );
    }

    #[test]
    fn test_with_defaults_fills_empty_sets() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();

        let weekly = RecurrenceRule::Weekly {
            interval: 1,
            days_of_week: BTreeSet::new(),
        }
        .with_defaults(start);
        assert_eq!(weekly, RecurrenceRule::weekly(1, [1]).unwrap());

        let monthly = RecurrenceRule::Monthly {
            interval: 0,
            days_of_month: BTreeSet::new(),
        }
        .with_defaults(start);
        assert_eq!(monthly, RecurrenceRule::monthly(1, [17]).unwrap());
    }

    #[test]
    fn test_unordered_input_is_sorted() {
        let rule = RecurrenceRule::weekly(1, [6, 2, 4]).unwrap();
        match rule {
            RecurrenceRule::Weekly { days_of_week, .. } => {
                assert_eq!(days_of_week.into_iter().collect::<Vec<_>>(), vec![2, 4, 6]);
            }
            _ => panic!("expected weekly rule"),
        }
    }

    #[test]
    fn test_parse_compact_syntax() {
        assert_eq!(
            "daily:3".parse::<RecurrenceRule>(),
            RecurrenceRule::daily(3)
        );
        assert_eq!("daily".parse::<RecurrenceRule>(), RecurrenceRule::daily(1));
        assert_eq!(
            "weekly:1:2,4,6".parse::<RecurrenceRule>(),
            RecurrenceRule::weekly(1, [2, 4, 6])
        );
        assert_eq!(
            "Monthly:2:1, 15".parse::<RecurrenceRule>(),
            RecurrenceRule::monthly(2, [1, 15])
        );
        assert_eq!(
            "yearly:1".parse::<RecurrenceRule>(),
            Err(RecurrenceError::UnknownFrequency("yearly".to_string()))
        );
        assert!(matches!(
            "weekly:x:1".parse::<RecurrenceRule>(),
            Err(RecurrenceError::InvalidSyntax(_))
        ));
        assert_eq!(
            "daily:0".parse::<RecurrenceRule>(),
            Err(RecurrenceError::InvalidInterval(0))
        );
        assert_eq!(
            "weekly:1:9".parse::<RecurrenceRule>(),
            Err(RecurrenceError::WeekdayOutOfRange(9))
        );
        assert!(matches!(
            "daily:1:3".parse::<RecurrenceRule>(),
            Err(RecurrenceError::InvalidSyntax(_))
        ));
    }

    #[test]
    fn test_parse_without_days_leaves_set_for_defaults() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();

        let weekly: RecurrenceRule = "weekly:1:".parse().unwrap();
        assert!(!weekly.is_valid());
        assert_eq!(weekly.with_defaults(start), RecurrenceRule::weekly(1, [1]).unwrap());

        let monthly: RecurrenceRule = "monthly:2".parse().unwrap();
        assert_eq!(monthly.with_defaults(start), RecurrenceRule::monthly(2, [17]).unwrap());
    }

    #[test]
    fn test_display_matches_parse() {
        let rule = RecurrenceRule::monthly(1, [15, 1]).unwrap();
        assert_eq!(rule.to_string(), "monthly:1:1,15");
        assert_eq!(rule.to_string().parse::<RecurrenceRule>(), Ok(rule));
    }
}
