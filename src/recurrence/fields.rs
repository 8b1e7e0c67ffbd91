//! Flat storage representation of a recurrence rule
//!
//! Persistence keeps a rule as primitive columns: a frequency string, an
//! integer interval and two integer lists. This is the only place those
//! columns are interpreted; everything else works with [`RecurrenceRule`].

use serde::{Deserialize, Serialize};

use super::errors::{RecurrenceError, RecurrenceResult};
use super::models::RecurrenceRule;

fn default_interval() -> i64 {
    1
}

/// Primitive columns for an optional recurrence rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceFields {
    /// "daily", "weekly" or "monthly"; `None` means no recurrence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    #[serde(default = "default_interval")]
    pub interval: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_month: Vec<i64>,
}

impl Default for RecurrenceFields {
    fn default() -> Self {
        Self {
            frequency: None,
            interval: default_interval(),
            days_of_week: Vec::new(),
            days_of_month: Vec::new(),
        }
    }
}

impl RecurrenceFields {
    /// Flatten an optional rule
    pub fn from_rule(rule: Option<&RecurrenceRule>) -> Self {
        rule.map(Self::from).unwrap_or_default()
    }

    /// Rebuild the optional rule these columns describe
    pub fn into_rule(self) -> RecurrenceResult<Option<RecurrenceRule>> {
        if self.frequency.is_none() {
            return Ok(None);
        }
        RecurrenceRule::try_from(self).map(Some)
    }
}

impl From<&RecurrenceRule> for RecurrenceFields {
    fn from(rule: &RecurrenceRule) -> Self {
        let widen = |days: &std::collections::BTreeSet<u8>| -> Vec<i64> {
            days.iter().map(|d| *d as i64).collect()
        };
        let (days_of_week, days_of_month) = match rule {
            RecurrenceRule::Daily { .. } => (Vec::new(), Vec::new()),
            RecurrenceRule::Weekly { days_of_week, .. } => (widen(days_of_week), Vec::new()),
            RecurrenceRule::Monthly { days_of_month, .. } => (Vec::new(), widen(days_of_month)),
        };
        Self {
            frequency: Some(rule.frequency_name().to_string()),
            interval: rule.interval() as i64,
            days_of_week,
            days_of_month,
        }
    }
}

impl TryFrom<RecurrenceFields> for RecurrenceRule {
    type Error = RecurrenceError;

    fn try_from(fields: RecurrenceFields) -> Result<Self, Self::Error> {
        let frequency = fields
            .frequency
            .as_deref()
            .map(|f| f.trim().to_ascii_lowercase())
            .unwrap_or_default();
        let interval = u32::try_from(fields.interval)
            .ok()
            .filter(|i| *i >= 1)
            .ok_or(RecurrenceError::InvalidInterval(fields.interval))?;

        match frequency.as_str() {
            "daily" => RecurrenceRule::daily(interval),
            "weekly" => {
                let days = narrow(&fields.days_of_week, 7, RecurrenceError::WeekdayOutOfRange)?;
                RecurrenceRule::weekly(interval, days)
            }
            "monthly" => {
                let days =
                    narrow(&fields.days_of_month, 31, RecurrenceError::DayOfMonthOutOfRange)?;
                RecurrenceRule::monthly(interval, days)
            }
            _ => Err(RecurrenceError::UnknownFrequency(
                fields.frequency.unwrap_or_default(),
            )),
        }
    }
}

/// Convert stored integers to day values, rejecting anything outside 1..=max
fn narrow(
    values: &[i64],
    max: i64,
    out_of_range: fn(i64) -> RecurrenceError,
) -> RecurrenceResult<Vec<u8>> {
    values
        .iter()
        .map(|v| {
            if (1..=max).contains(v) {
                Ok(*v as u8)
            } else {
                Err(out_of_range(*v))
            }
        })
        .collect()
}
