use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ScheduleError;
use crate::persistence::TaskStore;
use crate::request::{ScheduleRequest, Viewer};
use crate::schedule::{Schedule, Scheduler};
use crate::task::{Task, TaskId};
use crate::task_validation;

/// A task assigned to an event, with optional per-event overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTask {
    pub task: TaskId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<TaskId>>,
}

impl EventTask {
    pub fn new(task: impl Into<TaskId>) -> Self {
        Self {
            task: task.into(),
            duration: None,
            dependencies: None,
        }
    }

    pub fn apply(&self, mut task: Task) -> Task {
        if let Some(duration) = self.duration {
            task.duration = duration;
        }
        if let Some(ref dependencies) = self.dependencies {
            task.dependencies = dependencies.clone();
        }
        task
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Anchor for every task without a fixed start.
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub tasks: Vec<EventTask>,
}

impl Event {
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|t| t.task.clone()).collect()
    }

    /// Fetches the event's tasks and applies the per-event overrides.
    pub fn resolve_tasks<S>(&self, store: &S, viewer: Viewer<'_>) -> Result<Vec<Task>, ScheduleError>
    where
        S: TaskStore + ?Sized,
    {
        let request = ScheduleRequest::new(self.task_ids(), Some(self.date.into()));
        let resolved = request.resolve(store, viewer)?;
        let tasks = resolved
            .tasks
            .into_iter()
            .map(|task| match self.tasks.iter().find(|a| a.task == task.id) {
                Some(assignment) => assignment.apply(task),
                None => task,
            })
            .collect();
        Ok(tasks)
    }

    pub fn schedule<S>(
        &self,
        store: &S,
        viewer: Viewer<'_>,
        scheduler: &Scheduler,
    ) -> Result<Schedule, ScheduleError>
    where
        S: TaskStore + ?Sized,
    {
        let tasks = self.resolve_tasks(store, viewer)?;
        task_validation::validate_task_collection(&tasks)?;
        scheduler.compute(&tasks, self.date)
    }
}

/// Schedules every event independently and in parallel. Results keep input order.
pub fn schedule_events<S>(
    store: &S,
    events: &[Event],
    scheduler: &Scheduler,
) -> Vec<Result<Schedule, ScheduleError>>
where
    S: TaskStore + Sync + ?Sized,
{
    info!(events = events.len(), "scheduling events");
    events
        .par_iter()
        .map(|event| event.schedule(store, Viewer::Trusted, scheduler))
        .collect()
}
