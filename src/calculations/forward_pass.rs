use crate::error::ScheduleError;
use crate::graph::DependencyGraph;
use crate::schedule::ScheduledTask;
use chrono::{DateTime, TimeDelta, Utc};
use petgraph::graph::NodeIndex;

/// Assigns concrete start/end times along a dependency-first order.
pub struct ForwardPass<'a> {
    dag: &'a DependencyGraph<'a>,
}

impl<'a> ForwardPass<'a> {
    pub fn new(dag: &'a DependencyGraph<'a>) -> Self {
        Self { dag }
    }

    /// Walks `order` (dependencies first) and emits one entry per task, in that order.
    pub fn execute(
        &self,
        order: &[NodeIndex],
        anchor: DateTime<Utc>,
    ) -> Result<Vec<ScheduledTask>, ScheduleError> {
        let mut end_times: Vec<Option<DateTime<Utc>>> = vec![None; self.dag.node_count()];
        let mut scheduled = Vec::with_capacity(order.len());

        for &node_ix in order {
            let task = self.dag.task(node_ix);

            let start_time = match task.start_date {
                Some(fixed) => fixed,
                None => {
                    // Early start is max of all dependency finishes
                    let base = self
                        .dag
                        .dependencies_of(node_ix)
                        .into_iter()
                        .filter_map(|dep| end_times[dep.index()])
                        .max()
                        .unwrap_or(anchor);
                    shift(base, task.timing.offset_millis())
                        .ok_or_else(|| ScheduleError::TimeOutOfRange(task.id.clone()))?
                }
            };

            let end_time = shift(start_time, task.duration_millis())
                .ok_or_else(|| ScheduleError::TimeOutOfRange(task.id.clone()))?;
            end_times[node_ix.index()] = Some(end_time);

            scheduled.push(ScheduledTask {
                task_id: task.id.clone(),
                description: task.description.clone(),
                start_time,
                end_time,
                duration: task.duration,
                dependencies: task.dependencies.clone(),
                is_fixed_start: task.start_date.is_some(),
            });
        }

        Ok(scheduled)
    }
}

fn shift(time: DateTime<Utc>, millis: i64) -> Option<DateTime<Utc>> {
    time.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}
