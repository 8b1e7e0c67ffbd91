use anyhow::{Context, Result};

use greenhouse_lib::care::up_next;

use crate::app::{short_id, App};
use crate::commands::task::{status_text, task_json};
use crate::OutputFormat;

pub fn run(app: &App, days: Option<u32>, format: &OutputFormat) -> Result<()> {
    let horizon = days.unwrap_or(app.settings.up_next_days);
    let plants = app.storage.list_plants().context("Failed to list plants")?;
    let tasks = app.storage.refresh_all(app.now).context("Failed to refresh care tasks")?;
    let groups = up_next(&tasks, app.now, horizon);

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = groups.iter().map(|group| {
                serde_json::json!({
                    "section": group.section,
                    "title": group.section.title(),
                    "tasks": group.tasks.iter()
                        .map(|t| task_json(app, &plants, t))
                        .collect::<Vec<_>>(),
                })
            }).collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if groups.is_empty() {
                println!("Nothing to do in the next {} days.", horizon);
                return Ok(());
            }

            for (index, group) in groups.iter().enumerate() {
                if index > 0 {
                    println!();
                }
                println!("{} ({})", group.section.title(), group.tasks.len());
                println!("{}", "\u{2500}".repeat(40));
                for task in &group.tasks {
                    println!("  {}  {:<20} {:<12} {}",
                        short_id(task),
                        app.plant_name(&plants, task),
                        task.kind.display_name(),
                        status_text(task, app.now));
                }
            }
        }
    }

    Ok(())
}
