use anyhow::{Context, Result};
use chrono::Weekday;

use greenhouse_lib::recurrence::weekday_symbols;

use crate::app::App;
use crate::OutputFormat;

pub fn run(
    mut app: App,
    first_weekday: Option<&str>,
    up_next_days: Option<u32>,
    format: &OutputFormat,
) -> Result<()> {
    let changed = first_weekday.is_some() || up_next_days.is_some();

    if let Some(text) = first_weekday {
        app.settings.first_weekday = text
            .trim()
            .parse::<Weekday>()
            .map_err(|_| anyhow::anyhow!("Invalid weekday '{}'", text))?;
    }
    if let Some(days) = up_next_days {
        app.settings.up_next_days = days;
    }
    if changed {
        app.settings.save(&app.config_path)
            .with_context(|| format!("Failed to write {}", app.config_path.display()))?;
    }

    let calendar = app.settings.calendar();
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "path": app.config_path.display().to_string(),
                "firstWeekday": app.settings.first_weekday,
                "upNextDays": app.settings.up_next_days,
                "dataDir": app.storage.data_dir().display().to_string(),
                "weekdayOrdinals": weekday_symbols(&calendar),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if changed {
                println!("Saved {}", app.config_path.display());
            }
            println!("First weekday: {}", app.settings.first_weekday);
            println!("Up Next days:  {}", app.settings.up_next_days);
            println!("Data dir:      {}", app.storage.data_dir().display());
            let ordinals = weekday_symbols(&calendar)
                .iter()
                .enumerate()
                .map(|(index, symbol)| format!("{}={}", index + 1, symbol))
                .collect::<Vec<_>>()
                .join(" ");
            println!("Weekday ordinals: {}", ordinals);
        }
    }

    Ok(())
}
