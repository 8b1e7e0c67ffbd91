use anyhow::{Context, Result};

use greenhouse_lib::recurrence::{relative_due_text, RecurrenceRule};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, rule: &str, count: usize, format: &OutputFormat) -> Result<()> {
    let rule = rule
        .parse::<RecurrenceRule>()
        .with_context(|| format!("Invalid repeat rule '{}'", rule))?
        .with_defaults(app.now.date());
    let calendar = app.settings.calendar();

    // Today counts when it matches, like a new task's first due date
    let dates: Vec<_> = rule.occurrences_from(app.now, &calendar).take(count).collect();

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "rule": rule.to_string(),
                "description": rule.describe(&calendar),
                "occurrences": dates.iter()
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", rule.describe(&calendar));
            if dates.is_empty() {
                println!("  (no upcoming dates)");
            }
            for date in &dates {
                println!("  {}  {:<3}  {}",
                    date.format("%Y-%m-%d"),
                    date.format("%a"),
                    relative_due_text(*date, app.now));
            }
        }
    }

    Ok(())
}
