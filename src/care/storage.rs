//! Garden storage implementation
//!
//! Directory structure:
//! ```text
//! {data_dir}/
//! ├── plants.json   # Array of all plants
//! └── tasks.json    # Array of care tasks with flattened recurrence columns
//! ```
//!
//! Derived task state is recomputed on every load and before every save.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::models::*;
use crate::recurrence::{CalendarContext, RecurrenceError, RecurrenceFields};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid stored recurrence: {0}")]
    Recurrence(#[from] RecurrenceError),

    #[error("Plant not found: {0}")]
    PlantNotFound(Uuid),

    #[error("Care task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Stored form of a care task: the schedule as primitive columns
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskRecord {
    id: Uuid,
    plant_id: Uuid,
    kind: CareKind,
    start_date: NaiveDateTime,
    #[serde(flatten)]
    recurrence: RecurrenceFields,
    first_weekday: Weekday,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(default)]
    completions: Vec<NaiveDateTime>,
    /// Kept so a stuck rule can fall back to the last known due date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDateTime>,
    created_at: NaiveDateTime,
}

impl From<&CareTask> for TaskRecord {
    fn from(task: &CareTask) -> Self {
        Self {
            id: task.id,
            plant_id: task.plant_id,
            kind: task.kind.clone(),
            start_date: task.schedule.start_date,
            recurrence: RecurrenceFields::from_rule(task.schedule.recurrence_rule.as_ref()),
            first_weekday: task.schedule.calendar.first_weekday,
            notes: task.notes.clone(),
            completions: task.completions.clone(),
            due_date: task.due_date,
            created_at: task.created_at,
        }
    }
}

impl TaskRecord {
    fn into_task(self, now: NaiveDateTime) -> Result<CareTask> {
        let schedule = CareSchedule::new(
            self.start_date,
            self.recurrence.into_rule()?,
            CalendarContext::new(self.first_weekday),
        );
        let mut task = CareTask {
            id: self.id,
            plant_id: self.plant_id,
            kind: self.kind,
            schedule,
            notes: self.notes,
            completions: self.completions,
            last_completed: None,
            due_date: self.due_date,
            status: MarkStatus::Due,
            days_late: 0,
            created_at: self.created_at,
        };
        task.refresh(now);
        Ok(task)
    }
}

/// JSON file storage for plants and their care tasks
pub struct GardenStorage {
    data_dir: PathBuf,
    calendar: CalendarContext,
}

impl GardenStorage {
    /// Create a storage rooted at `data_dir`; new tasks use `calendar`
    pub fn new(data_dir: PathBuf, calendar: CalendarContext) -> Result<Self> {
        fs::create_dir_all(&data_dir)?;
        Ok(Self { data_dir, calendar })
    }

    /// Platform data directory for the app
    pub fn default_data_dir() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join("greenhouse"))
            .ok_or(StorageError::DataDirNotFound)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn plants_file(&self) -> PathBuf {
        self.data_dir.join("plants.json")
    }

    fn tasks_file(&self) -> PathBuf {
        self.data_dir.join("tasks.json")
    }

    // ===== Plant Operations =====

    /// List all plants
    pub fn list_plants(&self) -> Result<Vec<Plant>> {
        let path = self.plants_file();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path)?;
        let plants: Vec<Plant> = serde_json::from_str(&content)?;
        Ok(plants)
    }

    /// Get a plant by ID
    pub fn get_plant(&self, id: Uuid) -> Result<Plant> {
        self.list_plants()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(StorageError::PlantNotFound(id))
    }

    /// Register a new plant
    pub fn create_plant(&self, request: CreatePlantRequest) -> Result<Plant> {
        let mut plant = Plant::new(request.name);
        if let Some(species) = request.species {
            plant = plant.with_species(species);
        }
        if let Some(location) = request.location {
            plant = plant.with_location(location);
        }
        plant.notes = request.notes;

        let mut plants = self.list_plants()?;
        plants.push(plant.clone());
        self.save_plants(&plants)?;

        log::info!("Created plant '{}' ({})", plant.name, plant.id);
        Ok(plant)
    }

    /// Update an existing plant
    pub fn update_plant(&self, id: Uuid, updates: UpdatePlantRequest) -> Result<Plant> {
        let mut plants = self.list_plants()?;
        let plant = plants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StorageError::PlantNotFound(id))?;

        if let Some(name) = updates.name {
            plant.name = name;
        }
        if let Some(species) = updates.species {
            plant.species = Some(species);
        }
        if let Some(location) = updates.location {
            plant.location = Some(location);
        }
        if let Some(notes) = updates.notes {
            plant.notes = Some(notes);
        }
        plant.updated_at = Utc::now();

        let updated = plant.clone();
        self.save_plants(&plants)?;
        Ok(updated)
    }

    /// Delete a plant and all of its care tasks
    pub fn delete_plant(&self, id: Uuid) -> Result<()> {
        let mut plants = self.list_plants()?;
        let len_before = plants.len();
        plants.retain(|p| p.id != id);

        if plants.len() == len_before {
            return Err(StorageError::PlantNotFound(id));
        }
        self.save_plants(&plants)?;

        let mut records = self.load_records()?;
        let tasks_before = records.len();
        records.retain(|r| r.plant_id != id);
        if records.len() != tasks_before {
            self.save_records(&records)?;
        }

        log::info!(
            "Deleted plant {} and {} care tasks",
            id,
            tasks_before - records.len()
        );
        Ok(())
    }

    fn save_plants(&self, plants: &[Plant]) -> Result<()> {
        let json = serde_json::to_string_pretty(plants)?;
        fs::write(self.plants_file(), json)?;
        Ok(())
    }

    // ===== Care Task Operations =====

    fn load_records(&self) -> Result<Vec<TaskRecord>> {
        let path = self.tasks_file();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path)?;
        let records: Vec<TaskRecord> = serde_json::from_str(&content)?;
        Ok(records)
    }

    fn save_records(&self, records: &[TaskRecord]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;
        fs::write(self.tasks_file(), json)?;
        Ok(())
    }

    /// List all care tasks with state derived for `now`
    pub fn list_tasks(&self, now: NaiveDateTime) -> Result<Vec<CareTask>> {
        self.load_records()?
            .into_iter()
            .map(|record| record.into_task(now))
            .collect()
    }

    /// Care tasks of one plant
    pub fn tasks_for_plant(&self, plant_id: Uuid, now: NaiveDateTime) -> Result<Vec<CareTask>> {
        Ok(self
            .list_tasks(now)?
            .into_iter()
            .filter(|t| t.plant_id == plant_id)
            .collect())
    }

    /// Get a care task by ID
    pub fn get_task(&self, id: Uuid, now: NaiveDateTime) -> Result<CareTask> {
        self.load_records()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(StorageError::TaskNotFound(id))?
            .into_task(now)
    }

    /// Assign a new care task to an existing plant
    pub fn create_task(&self, request: CreateTaskRequest, now: NaiveDateTime) -> Result<CareTask> {
        let plant = self.get_plant(request.plant_id)?;

        let start_date = request.start_date.unwrap_or(now);
        let rule = request
            .rule
            .map(|rule| rule.with_defaults(start_date.date()));
        let schedule = CareSchedule::new(start_date, rule, self.calendar);
        let mut task = CareTask::new(plant.id, request.kind, schedule, now);
        task.notes = request.notes;

        let mut records = self.load_records()?;
        records.push(TaskRecord::from(&task));
        self.save_records(&records)?;

        log::info!("Created {} task {} for plant '{}'", task.kind, task.id, plant.name);
        Ok(task)
    }

    /// Persist a task, recomputing its derived state first
    pub fn save_task(&self, mut task: CareTask, now: NaiveDateTime) -> Result<CareTask> {
        task.refresh(now);

        let mut records = self.load_records()?;
        let record = TaskRecord::from(&task);
        match records.iter_mut().find(|r| r.id == task.id) {
            Some(existing) => *existing = record,
            None => {
                self.get_plant(task.plant_id)?;
                records.push(record);
            }
        }
        self.save_records(&records)?;
        Ok(task)
    }

    /// Delete a care task
    pub fn delete_task(&self, id: Uuid) -> Result<()> {
        let mut records = self.load_records()?;
        let len_before = records.len();
        records.retain(|r| r.id != id);

        if records.len() == len_before {
            return Err(StorageError::TaskNotFound(id));
        }
        self.save_records(&records)
    }

    /// Mark a task complete at `now`
    pub fn complete_task(&self, id: Uuid, now: NaiveDateTime) -> Result<CareTask> {
        let mut task = self.get_task(id, now)?;
        task.mark_complete(now);
        self.save_task(task, now)
    }

    /// Undo the most recent completion of a task
    pub fn undo_task(&self, id: Uuid, now: NaiveDateTime) -> Result<CareTask> {
        let mut task = self.get_task(id, now)?;
        if !task.undo_completion(now) {
            log::warn!("Care task {} has no completion to undo", id);
        }
        self.save_task(task, now)
    }

    /// Recompute and persist every task's derived state
    pub fn refresh_all(&self, now: NaiveDateTime) -> Result<Vec<CareTask>> {
        let tasks = self.list_tasks(now)?;
        let records: Vec<TaskRecord> = tasks.iter().map(TaskRecord::from).collect();
        self.save_records(&records)?;
        log::debug!("Refreshed {} care tasks", tasks.len());
        Ok(tasks)
    }
}
