use super::{PersistenceResult, TaskStore, validate_task, validate_tasks};
use crate::task::{Task, TaskId};

/// Task store kept in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Vec<Task>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> PersistenceResult<Self> {
        validate_tasks(&tasks)?;
        Ok(Self { tasks })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|task| &task.id == id)
    }
}

impl TaskStore for InMemoryTaskStore {
    fn find_task(&self, id: &TaskId) -> PersistenceResult<Option<Task>> {
        Ok(self.position(id).map(|idx| self.tasks[idx].clone()))
    }

    fn list_tasks(&self) -> PersistenceResult<Vec<Task>> {
        Ok(self.tasks.clone())
    }

    fn upsert_task(&mut self, task: Task) -> PersistenceResult<bool> {
        validate_task(&task)?;
        match self.position(&task.id) {
            Some(idx) => {
                self.tasks[idx] = task;
                Ok(true)
            }
            None => {
                self.tasks.push(task);
                Ok(false)
            }
        }
    }

    fn delete_task(&mut self, id: &TaskId) -> PersistenceResult<bool> {
        match self.position(id) {
            Some(idx) => {
                self.tasks.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
