use crate::task::Task;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone)]
pub struct TaskValidationError {
    message: String,
}

impl TaskValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TaskValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskValidationError {}

pub fn validate_task(task: &Task) -> Result<(), TaskValidationError> {
    if task.id.as_str().trim().is_empty() {
        return Err(TaskValidationError::new("task id must not be empty"));
    }

    if task.description.trim().is_empty() {
        return Err(TaskValidationError::new(format!(
            "task {} requires a non-empty description",
            task.id
        )));
    }

    if !task.duration.is_finite() || task.duration <= 0.0 {
        return Err(TaskValidationError::new(format!(
            "task {} has invalid duration {} (must be a positive number of hours)",
            task.id, task.duration
        )));
    }

    let offset = task.timing.offset;
    if !offset.is_finite() || offset < 0.0 {
        return Err(TaskValidationError::new(format!(
            "task {} has invalid timing offset {} (must be >= 0)",
            task.id, offset
        )));
    }

    if !task.is_global && task.user_id.as_deref().is_none_or(|u| u.trim().is_empty()) {
        return Err(TaskValidationError::new(format!(
            "private task {} requires an owner userId",
            task.id
        )));
    }

    Ok(())
}

pub fn validate_task_collection(tasks: &[Task]) -> Result<(), TaskValidationError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(&task.id) {
            return Err(TaskValidationError::new(format!(
                "duplicate task id {}",
                task.id
            )));
        }
        validate_task(task)?;
    }
    Ok(())
}
