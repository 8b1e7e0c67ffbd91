use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use greenhouse_lib::care::{CareKind, CareTask, CreateTaskRequest, MarkStatus, Plant};
use greenhouse_lib::recurrence::{late_text, relative_due_text, RecurrenceRule};

use crate::app::{parse_datetime, short_id, App};
use crate::commands::plant::truncate;
use crate::OutputFormat;

fn format_time(at: Option<NaiveDateTime>) -> Option<String> {
    at.map(|t| t.format("%Y-%m-%dT%H:%M:%S").to_string())
}

pub fn task_json(app: &App, plants: &[Plant], task: &CareTask) -> serde_json::Value {
    let calendar = &task.schedule.calendar;
    serde_json::json!({
        "id": task.id.to_string(),
        "plantId": task.plant_id.to_string(),
        "plant": app.plant_name(plants, task),
        "kind": task.kind.display_name(),
        "rule": task.schedule.recurrence_rule.as_ref().map(|r| r.to_string()),
        "repeats": task.schedule.recurrence_rule.as_ref().map(|r| r.describe(calendar)),
        "startDate": format_time(Some(task.schedule.start_date)),
        "dueDate": format_time(task.due_date),
        "lastCompleted": format_time(task.last_completed),
        "status": task.status,
        "daysLate": task.days_late,
        "notes": task.notes,
    })
}

/// Status column text: "late (3 days late)", "done", "due Tomorrow"
pub fn status_text(task: &CareTask, now: NaiveDateTime) -> String {
    match task.status {
        MarkStatus::Late => format!("late ({})", late_text(task.days_late)),
        MarkStatus::Done => "done".to_string(),
        MarkStatus::Due => match task.due_date {
            Some(due) => format!("due {}", relative_due_text(due, now)),
            None => "finished".to_string(),
        },
    }
}

fn repeat_text(task: &CareTask) -> String {
    task.schedule
        .recurrence_rule
        .as_ref()
        .map(|r| r.describe(&task.schedule.calendar))
        .unwrap_or_else(|| "Once".to_string())
}

pub fn run_add(
    app: &App,
    plant: &str,
    kind: &str,
    every: Option<&str>,
    start: Option<&str>,
    notes: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let plant = app.find_plant(plant)?;
    let kind: CareKind = kind.parse()?;
    let rule = every
        .map(|text| {
            text.parse::<RecurrenceRule>()
                .with_context(|| format!("Invalid repeat rule '{}'", text))
        })
        .transpose()?;
    let start_date = start.map(parse_datetime).transpose()?;

    let task = app.storage.create_task(CreateTaskRequest {
        plant_id: plant.id,
        kind,
        rule,
        start_date,
        notes,
    }, app.now).context("Failed to create care task")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&task_json(app, std::slice::from_ref(&plant), &task))?);
        }
        OutputFormat::Plain => {
            println!("Added {} for \"{}\"", task.kind, plant.name);
            println!("  Repeats: {}", repeat_text(&task));
            if let Some(due) = task.due_date {
                println!("  Due: {} ({})", due.format("%Y-%m-%d"), relative_due_text(due, app.now));
            }
            println!("  ID: {}", short_id(&task));
        }
    }

    Ok(())
}

pub fn run_list(app: &App, plant: Option<&str>, format: &OutputFormat) -> Result<()> {
    let plants = app.storage.list_plants().context("Failed to list plants")?;
    let mut tasks = match plant {
        Some(name) => {
            let plant = app.find_plant(name)?;
            app.storage.tasks_for_plant(plant.id, app.now)
                .context("Failed to list care tasks")?
        }
        None => app.list_tasks()?,
    };
    tasks.sort_by(|a, b| {
        app.plant_name(&plants, a).to_lowercase()
            .cmp(&app.plant_name(&plants, b).to_lowercase())
            .then_with(|| a.due_date.cmp(&b.due_date))
    });

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = tasks.iter()
                .map(|t| task_json(app, &plants, t))
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if tasks.is_empty() {
                println!("No care tasks{}.", if plant.is_some() { " for this plant" } else { "" });
                return Ok(());
            }

            let id_width = 8;
            let plant_width = 20;
            let kind_width = 12;
            let repeat_width = 32;

            println!("{:<iw$} {:<pw$} {:<kw$} {:<rw$} {}",
                "ID", "Plant", "Kind", "Repeats", "Status",
                iw = id_width, pw = plant_width, kw = kind_width, rw = repeat_width);
            println!("{} {} {} {} {}",
                "\u{2500}".repeat(id_width),
                "\u{2500}".repeat(plant_width),
                "\u{2500}".repeat(kind_width),
                "\u{2500}".repeat(repeat_width),
                "\u{2500}".repeat(16));

            for task in &tasks {
                println!("{:<iw$} {:<pw$} {:<kw$} {:<rw$} {}",
                    short_id(task),
                    truncate(&app.plant_name(&plants, task), plant_width),
                    truncate(task.kind.display_name(), kind_width),
                    truncate(&repeat_text(task), repeat_width),
                    status_text(task, app.now),
                    iw = id_width, pw = plant_width, kw = kind_width, rw = repeat_width);
            }

            println!("\n{} tasks total", tasks.len());
        }
    }

    Ok(())
}

fn print_task_change(app: &App, verb: &str, task: &CareTask, format: &OutputFormat) -> Result<()> {
    let plants = app.storage.list_plants().context("Failed to list plants")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&task_json(app, &plants, task))?);
        }
        OutputFormat::Plain => {
            println!("{} {} for \"{}\"", verb, task.kind, app.plant_name(&plants, task));
            match task.due_date {
                Some(due) => println!("  Next due: {} ({})",
                    due.format("%Y-%m-%d"), relative_due_text(due, app.now)),
                None => println!("  No further care scheduled"),
            }
        }
    }

    Ok(())
}

pub fn run_edit(
    app: &App,
    id_prefix: &str,
    every: Option<&str>,
    once: bool,
    notes: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let mut task = app.find_task(id_prefix)?;

    if let Some(text) = every {
        let rule = text
            .parse::<RecurrenceRule>()
            .with_context(|| format!("Invalid repeat rule '{}'", text))?;
        task.enable_reminders(rule, app.now);
    } else if once {
        task.disable_reminders(app.now);
    }
    if notes.is_some() {
        task.notes = notes;
    }

    let task = app.storage.save_task(task, app.now)
        .context("Failed to save care task")?;
    print_task_change(app, "Updated", &task, format)
}

pub fn run_done(app: &App, id_prefix: &str, format: &OutputFormat) -> Result<()> {
    let task = app.find_task(id_prefix)?;
    let task = app.storage.complete_task(task.id, app.now)
        .context("Failed to complete care task")?;
    print_task_change(app, "Completed", &task, format)
}

pub fn run_undo(app: &App, id_prefix: &str, format: &OutputFormat) -> Result<()> {
    let task = app.find_task(id_prefix)?;
    if task.completions.is_empty() {
        anyhow::bail!("{} task {} has never been completed", task.kind, short_id(&task));
    }
    let task = app.storage.undo_task(task.id, app.now)
        .context("Failed to undo completion")?;
    print_task_change(app, "Reopened", &task, format)
}

pub fn run_remove(app: &App, id_prefix: &str, format: &OutputFormat) -> Result<()> {
    let task = app.find_task(id_prefix)?;
    app.storage.delete_task(task.id).context("Failed to delete care task")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "id": task.id.to_string(),
                "removed": true,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Removed {} task {}", task.kind, short_id(&task));
        }
    }

    Ok(())
}
