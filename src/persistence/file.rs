use super::{PersistenceError, PersistenceResult};
use crate::event::Event;
use crate::schedule::{Schedule, ScheduledTask};
use crate::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct TaskCatalog {
    tasks: Vec<Task>,
}

/// Accepts either `{ "tasks": [...] }` or a bare array of tasks.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Catalog(TaskCatalog),
    Bare(Vec<Task>),
}

impl CatalogFile {
    fn into_tasks(self) -> Vec<Task> {
        match self {
            CatalogFile::Catalog(catalog) => catalog.tasks,
            CatalogFile::Bare(tasks) => tasks,
        }
    }
}

pub fn save_tasks_to_json<P: AsRef<Path>>(tasks: &[Task], path: P) -> PersistenceResult<()> {
    super::validate_tasks(tasks)?;
    let catalog = TaskCatalog {
        tasks: tasks.to_vec(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &catalog)?;
    Ok(())
}

pub fn load_tasks_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Task>> {
    let file = File::open(path)?;
    let catalog: CatalogFile = serde_json::from_reader(file)?;
    let tasks = catalog.into_tasks();
    super::validate_tasks(&tasks)?;
    Ok(tasks)
}

pub fn load_event_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Event> {
    let file = File::open(path)?;
    let event: Event = serde_json::from_reader(file)?;
    if event.tasks.is_empty() {
        return Err(PersistenceError::InvalidData(format!(
            "event '{}' has no tasks assigned",
            event.title
        )));
    }
    Ok(event)
}

#[derive(Serialize)]
struct ScheduleCsvRecord {
    task_id: String,
    description: String,
    start_time: String,
    end_time: String,
    duration_hours: f64,
    dependencies: String,
    is_fixed_start: bool,
}

impl From<&ScheduledTask> for ScheduleCsvRecord {
    fn from(task: &ScheduledTask) -> Self {
        Self {
            task_id: task.task_id.to_string(),
            description: task.description.clone(),
            start_time: task.start_time.to_rfc3339(),
            end_time: task.end_time.to_rfc3339(),
            duration_hours: task.duration,
            dependencies: join_ids(&task.dependencies),
            is_fixed_start: task.is_fixed_start,
        }
    }
}

/// Writes one CSV row per scheduled task, in schedule order.
pub fn write_schedule_csv<W: Write>(schedule: &Schedule, writer: W) -> PersistenceResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for task in schedule.tasks() {
        writer.serialize(ScheduleCsvRecord::from(task))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_schedule_to_csv<P: AsRef<Path>>(
    schedule: &Schedule,
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    write_schedule_csv(schedule, file)
}

fn join_ids(values: &[TaskId]) -> String {
    values
        .iter()
        .map(TaskId::as_str)
        .collect::<Vec<_>>()
        .join(";")
}
