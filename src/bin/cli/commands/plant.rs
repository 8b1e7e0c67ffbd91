use anyhow::{Context, Result};

use greenhouse_lib::care::{CreatePlantRequest, Plant, UpdatePlantRequest};

use crate::app::App;
use crate::OutputFormat;

fn plant_json(plant: &Plant, task_count: usize) -> serde_json::Value {
    serde_json::json!({
        "id": plant.id.to_string(),
        "name": plant.name,
        "species": plant.species,
        "location": plant.location,
        "notes": plant.notes,
        "taskCount": task_count,
        "createdAt": plant.created_at.to_rfc3339(),
    })
}

pub fn run_add(
    app: &App,
    name: String,
    species: Option<String>,
    location: Option<String>,
    notes: Option<String>,
    format: &OutputFormat,
) -> Result<()> {
    let plant = app.storage.create_plant(CreatePlantRequest {
        name,
        species,
        location,
        notes,
    }).context("Failed to create plant")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&plant_json(&plant, 0))?);
        }
        OutputFormat::Plain => {
            println!("Added plant \"{}\"", plant.name);
            if let Some(species) = &plant.species {
                println!("  Species: {}", species);
            }
            if let Some(location) = &plant.location {
                println!("  Location: {}", location);
            }
            println!("  ID: {}", plant.id);
        }
    }

    Ok(())
}

pub fn run_edit(
    app: &App,
    plant: &str,
    updates: UpdatePlantRequest,
    format: &OutputFormat,
) -> Result<()> {
    let plant = app.find_plant(plant)?;
    let updated = app.storage.update_plant(plant.id, updates)
        .context("Failed to update plant")?;
    let task_count = app.storage.tasks_for_plant(updated.id, app.now)?.len();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&plant_json(&updated, task_count))?);
        }
        OutputFormat::Plain => {
            println!("Updated plant \"{}\"", updated.name);
        }
    }

    Ok(())
}

pub fn run_list(app: &App, format: &OutputFormat) -> Result<()> {
    let mut plants = app.storage.list_plants().context("Failed to list plants")?;
    plants.sort_by_key(|p| p.name.to_lowercase());
    let tasks = app.list_tasks()?;
    let count_for = |plant: &Plant| tasks.iter().filter(|t| t.plant_id == plant.id).count();

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = plants.iter()
                .map(|p| plant_json(p, count_for(p)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if plants.is_empty() {
                println!("No plants yet. Add one with `greenhouse-cli plant add <name>`.");
                return Ok(());
            }

            let name_width = plants.iter().map(|p| p.name.len()).max().unwrap_or(4).min(30).max(4);
            let species_width = 24;
            let location_width = 20;

            println!("{:<nw$} {:<sw$} {:<lw$} {}",
                "Name", "Species", "Location", "Tasks",
                nw = name_width, sw = species_width, lw = location_width);
            println!("{} {} {} {}",
                "\u{2500}".repeat(name_width),
                "\u{2500}".repeat(species_width),
                "\u{2500}".repeat(location_width),
                "\u{2500}".repeat(5));

            for plant in &plants {
                println!("{:<nw$} {:<sw$} {:<lw$} {}",
                    truncate(&plant.name, name_width),
                    truncate(plant.species.as_deref().unwrap_or("-"), species_width),
                    truncate(plant.location.as_deref().unwrap_or("-"), location_width),
                    count_for(plant),
                    nw = name_width, sw = species_width, lw = location_width);
            }

            println!("\n{} plants total", plants.len());
        }
    }

    Ok(())
}

pub fn run_remove(app: &App, plant: &str, format: &OutputFormat) -> Result<()> {
    let plant = app.find_plant(plant)?;
    let task_count = app.storage.tasks_for_plant(plant.id, app.now)?.len();
    app.storage.delete_plant(plant.id).context("Failed to delete plant")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "id": plant.id.to_string(),
                "name": plant.name,
                "removedTasks": task_count,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Removed plant \"{}\" and {} care tasks", plant.name, task_count);
        }
    }

    Ok(())
}

/// Truncate to `width` characters, marking the cut with "..."
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
