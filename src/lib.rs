pub mod calculations;
pub mod config;
pub mod error;
pub mod event;
pub mod graph;
#[cfg(feature = "http_api")]
pub mod http_api;
pub mod logging;
pub mod persistence;
pub mod request;
pub mod schedule;
pub mod task;
pub mod task_validation;

pub use config::{AppConfig, ConfigError};
pub use error::{ErrorKind, ErrorPayload, ScheduleError};
pub use event::{Event, EventTask, schedule_events};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteTaskStore;
pub use persistence::{
    InMemoryTaskStore, PersistenceError, TaskStore, load_event_from_json, load_tasks_from_json,
    save_schedule_to_csv, save_tasks_to_json, validate_tasks, write_schedule_csv,
};
pub use request::{AnchorInput, ScheduleRequest, Viewer, parse_anchor};
pub use schedule::{
    DanglingDependencyPolicy, Schedule, ScheduledTask, Scheduler, SchedulerOptions,
    compute_schedule,
};
pub use task::{OffsetUnit, Relation, Task, TaskId, TaskScope, TimingRule};
