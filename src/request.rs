//! Caller-side contract: turn a `{ taskIds, eventDate }` request into
//! validated scheduler input.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use crate::error::ScheduleError;
use crate::persistence::TaskStore;
use crate::schedule::{Schedule, Scheduler};
use crate::task::{Task, TaskId, TaskScope};
use crate::task_validation;

/// Anchor date as sent by callers: an ISO-8601 string or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnchorInput {
    Millis(i64),
    Text(String),
}

impl AnchorInput {
    pub fn parse(&self) -> Result<DateTime<Utc>, ScheduleError> {
        match self {
            AnchorInput::Millis(ms) => DateTime::from_timestamp_millis(*ms)
                .ok_or_else(|| ScheduleError::InvalidAnchor(ms.to_string())),
            AnchorInput::Text(text) => parse_anchor(text),
        }
    }
}

impl From<DateTime<Utc>> for AnchorInput {
    fn from(value: DateTime<Utc>) -> Self {
        AnchorInput::Text(value.to_rfc3339())
    }
}

/// Parses RFC 3339, a naive `YYYY-MM-DDTHH:MM[:SS]` (taken as UTC), a bare
/// date (midnight UTC) or an integer of epoch milliseconds.
pub fn parse_anchor(input: &str) -> Result<DateTime<Utc>, ScheduleError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(ScheduleError::MissingAnchor);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    if let Ok(ms) = text.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp_millis(ms) {
            return Ok(dt);
        }
    }
    Err(ScheduleError::InvalidAnchor(text.to_string()))
}

/// Who is asking; decides which private tasks are selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer<'a> {
    /// Local callers (CLI, batch jobs) see every task.
    Trusted,
    User(&'a str),
    Anonymous,
}

impl Viewer<'_> {
    pub fn can_see(&self, task: &Task) -> bool {
        match (self, task.scope()) {
            (Viewer::Trusted, _) | (_, TaskScope::Global) => true,
            (Viewer::User(user), TaskScope::Private { owner }) => owner == Some(*user),
            (Viewer::Anonymous, TaskScope::Private { .. }) => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[serde(default)]
    pub task_ids: Vec<TaskId>,
    #[serde(default)]
    pub event_date: Option<AnchorInput>,
}

/// Tasks and anchor ready for [`Scheduler::compute`].
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub tasks: Vec<Task>,
    pub anchor: DateTime<Utc>,
}

impl ScheduleRequest {
    pub fn new<I, T>(task_ids: I, event_date: Option<AnchorInput>) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TaskId>,
    {
        Self {
            task_ids: task_ids.into_iter().map(Into::into).collect(),
            event_date,
        }
    }

    /// Requested ids with repeats removed, first occurrence kept.
    pub fn unique_ids(&self) -> Vec<TaskId> {
        let mut seen = HashSet::with_capacity(self.task_ids.len());
        self.task_ids
            .iter()
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect()
    }

    /// Checks the request shape, fetches the tasks and filters them by scope.
    ///
    /// Every requested id must resolve to a task visible to `viewer`.
    pub fn resolve<S>(&self, store: &S, viewer: Viewer<'_>) -> Result<ResolvedRequest, ScheduleError>
    where
        S: TaskStore + ?Sized,
    {
        if self.task_ids.is_empty() {
            return Err(ScheduleError::EmptyTaskSet);
        }
        let anchor = self
            .event_date
            .as_ref()
            .ok_or(ScheduleError::MissingAnchor)?
            .parse()?;

        let ids = self.unique_ids();
        let tasks: Vec<Task> = store
            .get_tasks(&ids)?
            .into_iter()
            .filter(|task| viewer.can_see(task))
            .collect();

        let found: HashSet<&TaskId> = tasks.iter().map(|task| &task.id).collect();
        let missing: Vec<TaskId> = ids
            .iter()
            .filter(|id| !found.contains(id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(ScheduleError::UnknownTasks(missing));
        }

        debug!(tasks = tasks.len(), %anchor, "resolved schedule request");
        Ok(ResolvedRequest { tasks, anchor })
    }

    /// Resolves, validates and computes in one step.
    pub fn execute<S>(
        &self,
        store: &S,
        viewer: Viewer<'_>,
        scheduler: &Scheduler,
    ) -> Result<Schedule, ScheduleError>
    where
        S: TaskStore + ?Sized,
    {
        let resolved = self.resolve(store, viewer)?;
        task_validation::validate_task_collection(&resolved.tasks)?;
        scheduler.compute(&resolved.tasks, resolved.anchor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_supported_anchor_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        assert_eq!(parse_anchor("2024-01-01T09:00:00Z").unwrap(), expected);
        assert_eq!(parse_anchor("2024-01-01T10:00:00+01:00").unwrap(), expected);
        assert_eq!(parse_anchor("2024-01-01T09:00:00").unwrap(), expected);
        assert_eq!(parse_anchor("2024-01-01T09:00").unwrap(), expected);
        assert_eq!(
            parse_anchor(&expected.timestamp_millis().to_string()).unwrap(),
            expected
        );
        assert_eq!(
            parse_anchor("2024-01-01").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_garbage_anchor() {
        assert!(matches!(
            parse_anchor("next tuesday"),
            Err(ScheduleError::InvalidAnchor(_))
        ));
        assert!(matches!(parse_anchor("  "), Err(ScheduleError::MissingAnchor)));
    }

    #[test]
    fn request_deserializes_millis_or_text() {
        let req: ScheduleRequest =
            serde_json::from_str(r#"{ "taskIds": ["a"], "eventDate": 1704099600000 }"#).unwrap();
        assert_eq!(req.event_date, Some(AnchorInput::Millis(1_704_099_600_000)));

        let req: ScheduleRequest =
            serde_json::from_str(r#"{ "taskIds": ["a"], "eventDate": "2024-01-01T09:00:00Z" }"#)
                .unwrap();
        assert!(matches!(req.event_date, Some(AnchorInput::Text(_))));
    }

    #[test]
    fn viewer_scoping() {
        let global = Task::new("g", "global", 1.0);
        let mine = Task::new("p", "private", 1.0).private_to("u1");

        assert!(Viewer::Anonymous.can_see(&global));
        assert!(!Viewer::Anonymous.can_see(&mine));
        assert!(Viewer::User("u1").can_see(&mine));
        assert!(!Viewer::User("u2").can_see(&mine));
        assert!(Viewer::Trusted.can_see(&mine));
    }
}
