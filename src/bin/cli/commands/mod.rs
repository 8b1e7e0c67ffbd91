pub mod config;
pub mod plant;
pub mod preview;
pub mod task;
pub mod up_next;
