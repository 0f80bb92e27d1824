use crate::calculations::ForwardPass;
use crate::error::ScheduleError;
use crate::graph::DependencyGraph;
use crate::task::{MILLIS_PER_HOUR, Task, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// What to do with dependency ids that are not part of the requested tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanglingDependencyPolicy {
    /// Treat the dependency as already satisfied.
    #[default]
    Ignore,
    /// Fail the request with [`ScheduleError::DanglingDependency`].
    Reject,
}

impl FromStr for DanglingDependencyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(DanglingDependencyPolicy::Ignore),
            "reject" => Ok(DanglingDependencyPolicy::Reject),
            other => Err(format!("unknown dangling dependency policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchedulerOptions {
    #[serde(default)]
    pub dangling_dependencies: DanglingDependencyPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    pub task_id: TaskId,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Duration in hours, as given on the task.
    pub duration: f64,
    pub dependencies: Vec<TaskId>,
    pub is_fixed_start: bool,
}

/// A computed timeline, ordered by start time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    schedule: Vec<ScheduledTask>,
    earliest_start: DateTime<Utc>,
    latest_end: DateTime<Utc>,
    total_duration_hours: i64,
}

impl Schedule {
    /// Sorts `scheduled` by start time (stable) and derives the aggregates.
    ///
    /// Returns `None` for an empty list.
    pub(crate) fn from_scheduled(mut scheduled: Vec<ScheduledTask>) -> Option<Self> {
        scheduled.sort_by_key(|task| task.start_time);

        let earliest_start = scheduled.iter().map(|t| t.start_time).min()?;
        let latest_end = scheduled.iter().map(|t| t.end_time).max()?;
        let span_ms = (latest_end - earliest_start).num_milliseconds().max(0) as u64;
        let total_duration_hours = span_ms.div_ceil(MILLIS_PER_HOUR as u64) as i64;

        Some(Self {
            schedule: scheduled,
            earliest_start,
            latest_end,
            total_duration_hours,
        })
    }

    pub fn tasks(&self) -> &[ScheduledTask] {
        &self.schedule
    }

    pub fn into_tasks(self) -> Vec<ScheduledTask> {
        self.schedule
    }

    pub fn get(&self, task_id: &str) -> Option<&ScheduledTask> {
        self.schedule
            .iter()
            .find(|task| task.task_id.as_str() == task_id)
    }

    pub fn len(&self) -> usize {
        self.schedule.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schedule.is_empty()
    }

    pub fn earliest_start(&self) -> DateTime<Utc> {
        self.earliest_start
    }

    pub fn latest_end(&self) -> DateTime<Utc> {
        self.latest_end
    }

    pub fn total_duration_hours(&self) -> i64 {
        self.total_duration_hours
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("tasks={}", self.schedule.len()));
        parts.push(format!("start={}", self.earliest_start.to_rfc3339()));
        parts.push(format!("end={}", self.latest_end.to_rfc3339()));
        parts.push(format!("hours={}", self.total_duration_hours));
        let fixed = self.schedule.iter().filter(|t| t.is_fixed_start).count();
        if fixed > 0 {
            parts.push(format!("fixed={fixed}"));
        }
        parts.join(", ")
    }
}

/// The scheduling engine. Holds options only; every call is independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler {
    options: SchedulerOptions,
}

impl Scheduler {
    pub fn new(options: SchedulerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> SchedulerOptions {
        self.options
    }

    /// Computes a dependency-respecting timeline for `tasks` anchored at `anchor`.
    ///
    /// Fails atomically on an empty input, duplicate ids, a cycle, or (under
    /// [`DanglingDependencyPolicy::Reject`]) a dependency outside `tasks`.
    pub fn compute(
        &self,
        tasks: &[Task],
        anchor: DateTime<Utc>,
    ) -> Result<Schedule, ScheduleError> {
        if tasks.is_empty() {
            return Err(ScheduleError::EmptyTaskSet);
        }

        let dag = DependencyGraph::build(tasks)?;
        if let Some(dangling) = dag.dangling().first() {
            if self.options.dangling_dependencies == DanglingDependencyPolicy::Reject {
                warn!(task = %dangling.task, dependency = %dangling.dependency, "rejecting dangling dependency");
                return Err(ScheduleError::DanglingDependency {
                    task: dangling.task.clone(),
                    dependency: dangling.dependency.clone(),
                });
            }
            debug!(count = dag.dangling().len(), "ignoring dependencies outside working set");
        }

        let order = dag.execution_order()?;
        let scheduled = ForwardPass::new(&dag).execute(&order, anchor)?;
        let schedule = Schedule::from_scheduled(scheduled).ok_or(ScheduleError::EmptyTaskSet)?;

        info!(
            tasks = schedule.len(),
            hours = schedule.total_duration_hours(),
            "schedule computed"
        );
        Ok(schedule)
    }
}

/// Computes a schedule with default options.
pub fn compute_schedule(tasks: &[Task], anchor: DateTime<Utc>) -> Result<Schedule, ScheduleError> {
    Scheduler::default().compute(tasks, anchor)
}
