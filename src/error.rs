//! Error taxonomy for scheduling requests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persistence::PersistenceError;
use crate::task::TaskId;
use crate::task_validation::TaskValidationError;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("no tasks selected for scheduling")]
    EmptyTaskSet,

    #[error("an anchor date is required")]
    MissingAnchor,

    #[error("invalid anchor date '{0}'")]
    InvalidAnchor(String),

    #[error("tasks not found: {}", join_ids(.0, ", "))]
    UnknownTasks(Vec<TaskId>),

    #[error("duplicate task id {0}")]
    DuplicateTask(TaskId),

    #[error("task {task} depends on {dependency}, which is not part of the requested tasks")]
    DanglingDependency { task: TaskId, dependency: TaskId },

    #[error("invalid task: {0}")]
    InvalidTask(String),

    #[error("task {0} falls outside the representable time range")]
    TimeOutOfRange(TaskId),

    #[error("circular dependency detected: {}", join_ids(.path, " -> "))]
    Cycle { path: Vec<TaskId> },

    #[error(transparent)]
    Store(#[from] PersistenceError),
}

/// Coarse classification used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Cycle,
    Data,
}

/// JSON body reported to callers for a failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<TaskId>>,
}

impl ScheduleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScheduleError::Cycle { .. } => ErrorKind::Cycle,
            ScheduleError::Store(_) => ErrorKind::Data,
            _ => ErrorKind::Input,
        }
    }

    pub fn cycle_path(&self) -> Option<&[TaskId]> {
        match self {
            ScheduleError::Cycle { path } => Some(path),
            _ => None,
        }
    }

    pub fn payload(&self) -> ErrorPayload {
        let error = match self {
            ScheduleError::Cycle { .. } => "circular dependency",
            ScheduleError::UnknownTasks(_) => "not_found",
            ScheduleError::Store(_) => "store_error",
            _ => "invalid_request",
        };
        ErrorPayload {
            error: error.to_string(),
            message: self.to_string(),
            path: self.cycle_path().map(<[TaskId]>::to_vec),
        }
    }
}

impl From<TaskValidationError> for ScheduleError {
    fn from(value: TaskValidationError) -> Self {
        ScheduleError::InvalidTask(value.to_string())
    }
}

fn join_ids(ids: &[TaskId], separator: &str) -> String {
    ids.iter()
        .map(TaskId::as_str)
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_payload_carries_path() {
        let err = ScheduleError::Cycle {
            path: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.kind(), ErrorKind::Cycle);
        assert_eq!(err.to_string(), "circular dependency detected: A -> B -> A");

        let payload = err.payload();
        assert_eq!(payload.error, "circular dependency");
        assert_eq!(payload.path.map(|p| p.len()), Some(3));
    }

    #[test]
    fn input_errors_have_no_path() {
        let payload = ScheduleError::MissingAnchor.payload();
        assert_eq!(payload.error, "invalid_request");
        assert!(payload.path.is_none());
    }
}
