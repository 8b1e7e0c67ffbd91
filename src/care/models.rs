//! Plant and care task data models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::recurrence::{CalendarContext, RecurrenceRule};

/// A plant the user looks after
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plant {
    /// Unique identifier
    pub id: Uuid,
    /// Display name ("Kitchen basil")
    pub name: String,
    /// Botanical or common species name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    /// Where the plant lives ("Living room window")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// When the plant was registered
    pub created_at: DateTime<Utc>,
    /// When the plant was last edited
    pub updated_at: DateTime<Utc>,
}

impl Plant {
    /// Create a new plant with just a name
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            species: None,
            location: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder method to add a species
    pub fn with_species(mut self, species: String) -> Self {
        self.species = Some(species);
        self
    }

    /// Builder method to add a location
    pub fn with_location(mut self, location: String) -> Self {
        self.location = Some(location);
        self
    }
}

/// Kind of care action
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CareKind {
    Watering,
    Fertilizing,
    Misting,
    Repotting,
    Pruning,
    Rotating,
    Custom(String),
}

impl CareKind {
    pub fn display_name(&self) -> &str {
        match self {
            Self::Watering => "Watering",
            Self::Fertilizing => "Fertilizing",
            Self::Misting => "Misting",
            Self::Repotting => "Repotting",
            Self::Pruning => "Pruning",
            Self::Rotating => "Rotating",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for CareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for CareKind {
    type Err = std::convert::Infallible;

    /// Known kinds match case-insensitively ("water" and "watering" both work);
    /// anything else becomes a custom kind.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_lowercase().as_str() {
            "water" | "watering" => Self::Watering,
            "fertilize" | "fertilizing" | "feed" => Self::Fertilizing,
            "mist" | "misting" => Self::Misting,
            "repot" | "repotting" => Self::Repotting,
            "prune" | "pruning" => Self::Pruning,
            "rotate" | "rotating" => Self::Rotating,
            _ => Self::Custom(s.trim().to_string()),
        };
        Ok(kind)
    }
}

/// Actionability of a care task relative to now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum MarkStatus {
    /// Waiting to be done (on time, or unscheduled)
    #[default]
    Due,
    /// A scheduled occurrence before today was missed
    Late,
    /// Completed today
    Done,
}

impl fmt::Display for MarkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Due => "due",
            Self::Late => "late",
            Self::Done => "done",
        })
    }
}

/// When a care task repeats. A `None` rule is a one-off task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareSchedule {
    pub start_date: NaiveDateTime,
    pub recurrence_rule: Option<RecurrenceRule>,
    pub calendar: CalendarContext,
}

/// A care action assigned to a plant.
///
/// `last_completed`, `due_date`, `status` and `days_late` are derived; call
/// [`CareTask::refresh`] after changing the schedule or completion history.
#[derive(Debug, Clone, PartialEq)]
pub struct CareTask {
    pub id: Uuid,
    pub plant_id: Uuid,
    pub kind: CareKind,
    pub schedule: CareSchedule,
    pub notes: Option<String>,
    /// Completion timestamps, oldest first
    pub completions: Vec<NaiveDateTime>,
    pub last_completed: Option<NaiveDateTime>,
    pub due_date: Option<NaiveDateTime>,
    pub status: MarkStatus,
    pub days_late: i64,
    pub created_at: NaiveDateTime,
}

impl CareTask {
    /// Whether reminders are on, i.e. the task repeats
    pub fn reminders_enabled(&self) -> bool {
        self.schedule.recurrence_rule.is_some()
    }
}

/// Request to register a plant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlantRequest {
    pub name: String,
    pub species: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Request to edit a plant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlantRequest {
    pub name: Option<String>,
    pub species: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Request to assign a care task to a plant
#[derive(Debug, Clone)]
pub struct CreateTaskRequest {
    pub plant_id: Uuid,
    pub kind: CareKind,
    /// `None` creates a one-off task
    pub rule: Option<RecurrenceRule>,
    /// Defaults to now
    pub start_date: Option<NaiveDateTime>,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_care_kind_parsing() {
        assert_eq!("water".parse::<CareKind>().unwrap(), CareKind::Watering);
        assert_eq!("Fertilizing".parse::<CareKind>().unwrap(), CareKind::Fertilizing);
        assert_eq!(
            "Wipe leaves".parse::<CareKind>().unwrap(),
            CareKind::Custom("Wipe leaves".to_string())
        );
        assert_eq!(CareKind::Custom("Wipe leaves".to_string()).to_string(), "Wipe leaves");
    }

    #[test]
    fn test_plant_builder() {
        let plant = Plant::new("Fern".to_string())
            .with_species("Nephrolepis exaltata".to_string())
            .with_location("Bathroom".to_string());

        assert_eq!(plant.name, "Fern");
        assert_eq!(plant.species.as_deref(), Some("Nephrolepis exaltata"));
        assert_eq!(plant.location.as_deref(), Some("Bathroom"));
        assert_eq!(plant.created_at, plant.updated_at);
    }

    #[test]
    fn test_plant_serializes_camel_case() {
        let plant = Plant::new("Fern".to_string());
        let json = serde_json::to_value(&plant).unwrap();

        assert!(json.get("createdAt").is_some());
        assert!(json.get("species").is_none());
    }

    #[test]
    fn test_mark_status_serialization() {
        assert_eq!(serde_json::to_string(&MarkStatus::Late).unwrap(), "\"late\"");
        assert_eq!(MarkStatus::default(), MarkStatus::Due);
    }
}
