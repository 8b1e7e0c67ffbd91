//! Plant care tracking
//!
//! This module provides:
//! - Plant and care task models
//! - Due date derivation and Due/Late/Done classification
//! - The "Up Next" worklist
//! - JSON file storage

pub mod models;
pub mod schedule;
pub mod storage;
pub mod worklist;

pub use models::*;
pub use schedule::mark_status;
pub use storage::{GardenStorage, StorageError};
pub use worklist::{section_for, up_next, WorklistGroup, WorklistSection};
