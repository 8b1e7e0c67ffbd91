use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

use greenhouse_lib::care::{CareTask, GardenStorage, Plant};
use greenhouse_lib::config::{Settings, CONFIG_FILE};

/// Shared application state for CLI commands
pub struct App {
    pub storage: GardenStorage,
    pub settings: Settings,
    /// Where `settings` is read from and saved to
    pub config_path: PathBuf,
    /// Clock for every computation in this run
    pub now: NaiveDateTime,
}

impl App {
    /// Initialize from the given or default data directory
    pub fn new(data_dir: Option<PathBuf>, now: Option<NaiveDateTime>) -> Result<Self> {
        let base_dir = match data_dir {
            Some(dir) => dir,
            None => GardenStorage::default_data_dir().context("Failed to get data directory")?,
        };

        let config_path = base_dir.join(CONFIG_FILE);
        let settings = Settings::load(&config_path)
            .context("Failed to load settings")?;
        let data_dir = settings.data_dir.clone().unwrap_or(base_dir);

        let storage = GardenStorage::new(data_dir, settings.calendar())
            .context("Failed to initialize garden storage")?;

        Ok(Self {
            storage,
            settings,
            config_path,
            now: now.unwrap_or_else(|| Local::now().naive_local()),
        })
    }

    /// Find a plant by name (case-insensitive prefix match)
    pub fn find_plant(&self, name: &str) -> Result<Plant> {
        let plants = self.storage.list_plants().context("Failed to list plants")?;

        let name_lower = name.to_lowercase();

        // Exact match first
        if let Some(plant) = plants.iter().find(|p| p.name.to_lowercase() == name_lower) {
            return Ok(plant.clone());
        }

        // Prefix match
        let matches: Vec<&Plant> = plants.iter()
            .filter(|p| p.name.to_lowercase().starts_with(&name_lower))
            .collect();

        match matches.len() {
            0 => bail!("No plant matching '{}'. Available plants:\n{}", name,
                plants.iter().map(|p| format!("  - {}", p.name)).collect::<Vec<_>>().join("\n")),
            1 => Ok(matches[0].clone()),
            _ => bail!("Ambiguous plant name '{}'. Matches:\n{}", name,
                matches.iter().map(|p| format!("  - {}", p.name)).collect::<Vec<_>>().join("\n")),
        }
    }

    /// Find a care task by ID prefix
    pub fn find_task(&self, id_prefix: &str) -> Result<CareTask> {
        let tasks = self.list_tasks()?;
        let prefix = id_prefix.to_lowercase();

        let matches: Vec<&CareTask> = tasks.iter()
            .filter(|t| t.id.to_string().starts_with(&prefix))
            .collect();

        match matches.len() {
            0 => bail!("No care task with ID starting with '{}'", id_prefix),
            1 => Ok(matches[0].clone()),
            _ => bail!("Ambiguous task ID '{}' matches {} tasks", id_prefix, matches.len()),
        }
    }

    /// List all care tasks as of `now`
    pub fn list_tasks(&self) -> Result<Vec<CareTask>> {
        self.storage.list_tasks(self.now).context("Failed to list care tasks")
    }

    /// Plant name for display, falling back to the ID
    pub fn plant_name(&self, plants: &[Plant], task: &CareTask) -> String {
        plants.iter()
            .find(|p| p.id == task.plant_id)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| task.plant_id.to_string())
    }
}

/// Parse RFC 3339, `YYYY-MM-DDTHH:MM`, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD`
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt);
        }
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'", value))?;
    Ok(date.and_time(chrono::NaiveTime::MIN))
}

/// Short task ID for display
pub fn short_id(task: &CareTask) -> String {
    task.id.to_string()[..8].to_string()
}
