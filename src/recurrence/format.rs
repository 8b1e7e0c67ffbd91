//! Human-readable text for rules and due dates

use chrono::{NaiveDateTime, Weekday};

use super::algorithm::start_of_day;
use super::models::{CalendarContext, RecurrenceRule};

fn short_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Short weekday names in ordinal order (index 0 is ordinal 1)
pub fn weekday_symbols(calendar: &CalendarContext) -> [&'static str; 7] {
    let mut symbols = [""; 7];
    for (ordinal, symbol) in (1u8..=7).zip(symbols.iter_mut()) {
        if let Some(weekday) = calendar.weekday_for(ordinal) {
            *symbol = short_name(weekday);
        }
    }
    symbols
}

/// "1st", "2nd", "3rd", "11th", "22nd"
pub fn ordinal_suffix(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

/// "a", "a and b", "a, b and c"
fn join_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

fn every(interval: u32, unit: &str) -> String {
    if interval == 1 {
        format!("Every {}", unit)
    } else {
        format!("Every {} {}s", interval, unit)
    }
}

impl RecurrenceRule {
    /// Display text such as "Every 2 weeks on Tue and Thu"
    pub fn describe(&self, calendar: &CalendarContext) -> String {
        match self {
            Self::Daily { interval } => every(*interval, "day"),
            Self::Weekly {
                interval,
                days_of_week,
            } => {
                let symbols = weekday_symbols(calendar);
                let days: Vec<String> = days_of_week
                    .iter()
                    .filter(|d| (1..=7).contains(*d))
                    .map(|d| symbols[(*d - 1) as usize].to_string())
                    .collect();
                format!("{} on {}", every(*interval, "week"), join_list(&days))
            }
            Self::Monthly {
                interval,
                days_of_month,
            } => {
                let days: Vec<String> = days_of_month
                    .iter()
                    .map(|d| ordinal_suffix(*d as u32))
                    .collect();
                format!("{} on the {}", every(*interval, "month"), join_list(&days))
            }
        }
    }
}

/// Due date relative to today: "Today", "Tomorrow", "In 3 days", "2 days ago"
pub fn relative_due_text(due: NaiveDateTime, now: NaiveDateTime) -> String {
    let days = (start_of_day(due) - start_of_day(now)).num_days();
    match days {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        d if d > 1 => format!("In {} days", d),
        d => format!("{} days ago", -d),
    }
}

/// Lateness text for a task overdue by `days`
pub fn late_text(days: i64) -> String {
    if days == 1 {
        "1 day late".to_string()
    } else {
        format!("{} days late", days)
    }
}
