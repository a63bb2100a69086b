//! Batch scoring of a dataset with per-project process isolation

pub mod collect;
pub mod orchestrator;
pub mod task;

#[cfg(test)]
pub mod tests;

pub use collect::{SCORES_FILE, ScoreTable, collect_scores, write_scores};
pub use orchestrator::{
    BatchReport, COMPLETION_MARKER, Launcher, Orchestrator, ProjectEntry, list_projects,
};
pub use task::{IsolatedTask, TaskError};
