use std::path::{Path, PathBuf};

use event_schedule::persistence::{InMemoryTaskStore, PersistenceResult, load_tasks_from_json};
use event_schedule::{AppConfig, Scheduler, Task, http_api, logging};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("EVENT_SCHEDULE_CONFIG").ok())
        .map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref())?;
    logging::init_logging(config.logging.level.as_deref())?;

    let tasks = if let Some(ref catalog) = config.store.catalog {
        load_tasks_from_json(catalog)?
    } else if let Some(ref sqlite) = config.store.sqlite {
        load_from_sqlite(sqlite)?
    } else {
        Vec::new()
    };
    info!(tasks = tasks.len(), "task catalogue loaded");

    let store = InMemoryTaskStore::from_tasks(tasks)?;
    let scheduler = Scheduler::new(config.scheduler);
    let state = http_api::AppState::new(store, scheduler);
    http_api::serve(config.socket_addr()?, state).await?;
    Ok(())
}

#[cfg(feature = "sqlite")]
fn load_from_sqlite(path: &Path) -> PersistenceResult<Vec<Task>> {
    use event_schedule::persistence::TaskStore;

    event_schedule::SqliteTaskStore::new(path)?.list_tasks()
}

// `AppConfig::validate` already refuses a sqlite path in this build.
#[cfg(not(feature = "sqlite"))]
fn load_from_sqlite(_path: &Path) -> PersistenceResult<Vec<Task>> {
    Err(event_schedule::PersistenceError::InvalidData(
        "sqlite support not compiled in".into(),
    ))
}
