use crate::task::{Task, TaskId};
use crate::task_validation;
use serde_json::Error as SerdeJsonError;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum PersistenceError {
    Serialization(SerdeJsonError),
    Io(io::Error),
    #[cfg(feature = "sqlite")]
    Sqlite(rusqlite::Error),
    Csv(csv::Error),
    InvalidData(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Serialization(err) => write!(f, "serialization error: {err}"),
            PersistenceError::Io(err) => write!(f, "io error: {err}"),
            #[cfg(feature = "sqlite")]
            PersistenceError::Sqlite(err) => write!(f, "sqlite error: {err}"),
            PersistenceError::Csv(err) => write!(f, "csv error: {err}"),
            PersistenceError::InvalidData(msg) => write!(f, "invalid data: {msg}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<SerdeJsonError> for PersistenceError {
    fn from(value: SerdeJsonError) -> Self {
        Self::Serialization(value)
    }
}

impl From<io::Error> for PersistenceError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<csv::Error> for PersistenceError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Source of task records for scheduling requests.
pub trait TaskStore {
    fn find_task(&self, id: &TaskId) -> PersistenceResult<Option<Task>>;

    fn list_tasks(&self) -> PersistenceResult<Vec<Task>>;

    /// Inserts or replaces a task. Returns `true` when an existing record was replaced.
    fn upsert_task(&mut self, task: Task) -> PersistenceResult<bool>;

    fn delete_task(&mut self, id: &TaskId) -> PersistenceResult<bool>;

    /// Tasks found among `ids`, in requested order. Missing ids are skipped.
    fn get_tasks(&self, ids: &[TaskId]) -> PersistenceResult<Vec<Task>> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(task) = self.find_task(id)? {
                found.push(task);
            }
        }
        Ok(found)
    }
}

pub fn validate_tasks(tasks: &[Task]) -> PersistenceResult<()> {
    task_validation::validate_task_collection(tasks)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub fn validate_task(task: &Task) -> PersistenceResult<()> {
    task_validation::validate_task(task)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

pub mod file;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    load_event_from_json, load_tasks_from_json, save_schedule_to_csv, save_tasks_to_json,
    write_schedule_csv,
};
pub use memory::InMemoryTaskStore;
