use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// Opaque task identifier as handed out by the task store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// How a task's start relates to its dependency-derived base time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    Before,
    #[default]
    After,
    Start,
    End,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Before => "before",
            Relation::After => "after",
            Relation::Start => "start",
            Relation::End => "end",
        }
    }

    /// Multiplier applied to the converted offset.
    ///
    /// Only `before` flips the sign. `start` and `end` are accepted for
    /// compatibility with stored records and shift forward like `after`.
    pub fn offset_sign(&self) -> i64 {
        match self {
            Relation::Before => -1,
            Relation::After => 1,
            Relation::Start | Relation::End => 1,
        }
    }
}

impl FromStr for Relation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(Relation::Before),
            "after" => Ok(Relation::After),
            "start" => Ok(Relation::Start),
            "end" => Ok(Relation::End),
            other => Err(format!("unknown timing relation '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetUnit {
    Seconds,
    #[default]
    Minutes,
    Hours,
    Days,
}

impl OffsetUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetUnit::Seconds => "seconds",
            OffsetUnit::Minutes => "minutes",
            OffsetUnit::Hours => "hours",
            OffsetUnit::Days => "days",
        }
    }

    pub fn millis(&self) -> i64 {
        match self {
            OffsetUnit::Seconds => MILLIS_PER_SECOND,
            OffsetUnit::Minutes => MILLIS_PER_MINUTE,
            OffsetUnit::Hours => MILLIS_PER_HOUR,
            OffsetUnit::Days => MILLIS_PER_DAY,
        }
    }
}

impl FromStr for OffsetUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seconds" => Ok(OffsetUnit::Seconds),
            "minutes" => Ok(OffsetUnit::Minutes),
            "hours" => Ok(OffsetUnit::Hours),
            "days" => Ok(OffsetUnit::Days),
            other => Err(format!("unknown offset unit '{other}'")),
        }
    }
}

/// Timing rule `{ relation, offset, unit }` attached to every task.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimingRule {
    #[serde(default)]
    pub relation: Relation,
    /// Non-negative magnitude; the sign comes from `relation`.
    #[serde(default)]
    pub offset: f64,
    #[serde(default)]
    pub unit: OffsetUnit,
}

impl TimingRule {
    pub fn new(relation: Relation, offset: f64, unit: OffsetUnit) -> Self {
        Self {
            relation,
            offset,
            unit,
        }
    }

    pub fn after(offset: f64, unit: OffsetUnit) -> Self {
        Self::new(Relation::After, offset, unit)
    }

    pub fn before(offset: f64, unit: OffsetUnit) -> Self {
        Self::new(Relation::Before, offset, unit)
    }

    /// Signed offset in milliseconds, rounded to the nearest millisecond.
    pub fn offset_millis(&self) -> i64 {
        let magnitude = (self.offset * self.unit.millis() as f64).round() as i64;
        magnitude * self.relation.offset_sign()
    }
}

/// Who may select a task for scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskScope<'a> {
    Global,
    Private { owner: Option<&'a str> },
}

/// A schedulable task record as supplied by the task store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(alias = "_id")]
    pub id: TaskId,
    pub description: String,
    /// Duration in hours.
    pub duration: f64,
    #[serde(default)]
    pub dependencies: Vec<TaskId>,
    #[serde(default)]
    pub timing: TimingRule,
    /// Fixed start; when present, dependencies do not move this task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_global: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<TaskId>, description: impl Into<String>, duration: f64) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            duration,
            dependencies: Vec::new(),
            timing: TimingRule::default(),
            start_date: None,
            is_global: true,
            user_id: None,
        }
    }

    pub fn with_dependencies<I, T>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TaskId>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timing(mut self, timing: TimingRule) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_start_date(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn private_to(mut self, owner: impl Into<String>) -> Self {
        self.is_global = false;
        self.user_id = Some(owner.into());
        self
    }

    pub fn scope(&self) -> TaskScope<'_> {
        if self.is_global {
            TaskScope::Global
        } else {
            TaskScope::Private {
                owner: self.user_id.as_deref(),
            }
        }
    }

    /// Duration converted from hours to whole milliseconds.
    pub fn duration_millis(&self) -> i64 {
        (self.duration * MILLIS_PER_HOUR as f64).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_millis_follows_unit_and_relation() {
        assert_eq!(
            TimingRule::after(30.0, OffsetUnit::Minutes).offset_millis(),
            30 * MILLIS_PER_MINUTE
        );
        assert_eq!(
            TimingRule::before(2.0, OffsetUnit::Hours).offset_millis(),
            -2 * MILLIS_PER_HOUR
        );
        assert_eq!(
            TimingRule::after(1.5, OffsetUnit::Seconds).offset_millis(),
            1_500
        );
        assert_eq!(
            TimingRule::new(Relation::Start, 10.0, OffsetUnit::Days).offset_millis(),
            10 * MILLIS_PER_DAY
        );
        assert_eq!(
            TimingRule::new(Relation::End, 5.0, OffsetUnit::Minutes).offset_millis(),
            5 * MILLIS_PER_MINUTE
        );
    }

    #[test]
    fn task_deserializes_original_record_shape() {
        let json = r#"{
            "_id": "65a1",
            "description": "Set up stage",
            "duration": 1.5,
            "dependencies": ["65a0"],
            "timing": { "relation": "before", "offset": 15 },
            "isGlobal": false,
            "userId": "u1"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.id, TaskId::new("65a1"));
        assert_eq!(task.timing.unit, OffsetUnit::Minutes);
        assert_eq!(task.timing.relation, Relation::Before);
        assert_eq!(task.scope(), TaskScope::Private { owner: Some("u1") });
        assert_eq!(task.duration_millis(), 90 * MILLIS_PER_MINUTE);
    }
}
