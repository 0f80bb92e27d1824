use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::{ErrorKind, ScheduleError};
use crate::persistence::{InMemoryTaskStore, PersistenceError, TaskStore};
use crate::request::{ScheduleRequest, Viewer};
use crate::schedule::{Schedule, Scheduler};
use crate::task::{Task, TaskId};

/// Header carrying the caller's user id; selects which private tasks are visible.
pub const USER_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<InMemoryTaskStore>>,
    scheduler: Scheduler,
}

impl AppState {
    pub fn new(store: InMemoryTaskStore, scheduler: Scheduler) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            scheduler,
        }
    }

    pub fn with_shared(store: Arc<RwLock<InMemoryTaskStore>>, scheduler: Scheduler) -> Self {
        Self { store, scheduler }
    }

    fn store(&self) -> Arc<RwLock<InMemoryTaskStore>> {
        self.store.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
    Schedule(ScheduleError),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<PersistenceError> for ApiError {
    fn from(value: PersistenceError) -> Self {
        match value {
            PersistenceError::InvalidData(message) => ApiError::Invalid(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        ApiError::Schedule(value)
    }
}

fn schedule_status(err: &ScheduleError) -> StatusCode {
    match (err.kind(), err) {
        (_, ScheduleError::UnknownTasks(_)) => StatusCode::NOT_FOUND,
        (ErrorKind::Input | ErrorKind::Cycle, _) => StatusCode::BAD_REQUEST,
        (ErrorKind::Data, _) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
            ApiError::Schedule(err) => {
                let status = schedule_status(&err);
                warn!(status = status.as_u16(), error = %err, "schedule request rejected");
                return (status, Json(err.payload())).into_response();
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/calculate-schedule", post(calculate_schedule))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "event-schedule HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Caller identity from [`USER_HEADER`]; anonymous when absent or blank.
fn viewer_from(headers: &HeaderMap) -> Viewer<'_> {
    let user = headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    match user {
        Some(user) => Viewer::User(user),
        None => Viewer::Anonymous,
    }
}

fn owner_mismatch() -> ApiError {
    ApiError::invalid("private tasks can only be written by their owner")
}

async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Task>>, ApiError> {
    let viewer = viewer_from(&headers);
    let store = state.store();
    let tasks = {
        let guard = store.read();
        guard.list_tasks()?
    };
    Ok(Json(
        tasks.into_iter().filter(|task| viewer.can_see(task)).collect(),
    ))
}

async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Task>, ApiError> {
    let viewer = viewer_from(&headers);
    let store = state.store();
    let result = {
        let guard = store.read();
        guard.find_task(&TaskId::new(task_id.clone()))?
    };
    match result {
        Some(task) if viewer.can_see(&task) => Ok(Json(task)),
        _ => Err(ApiError::not_found(format!("task {task_id} not found"))),
    }
}

async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(task): Json<Task>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    if !viewer_from(&headers).can_see(&task) {
        return Err(owner_mismatch());
    }
    let store = state.store();
    {
        let mut guard = store.write();
        if guard.find_task(&task.id)?.is_some() {
            return Err(ApiError::Conflict(format!("task {} already exists", task.id)));
        }
        guard.upsert_task(task.clone())?;
    }
    Ok((StatusCode::CREATED, Json(task)))
}

async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
    Json(task): Json<Task>,
) -> Result<Json<Task>, ApiError> {
    if task.id.as_str() != task_id {
        return Err(ApiError::invalid(
            "task id in payload does not match path parameter",
        ));
    }
    let viewer = viewer_from(&headers);
    let store = state.store();
    {
        let mut guard = store.write();
        match guard.find_task(&task.id)? {
            Some(existing) if viewer.can_see(&existing) => {}
            _ => return Err(ApiError::not_found(format!("task {task_id} not found"))),
        }
        if !viewer.can_see(&task) {
            return Err(owner_mismatch());
        }
        guard.upsert_task(task.clone())?;
    }
    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let viewer = viewer_from(&headers);
    let id = TaskId::new(task_id.clone());
    let store = state.store();
    let removed = {
        let mut guard = store.write();
        match guard.find_task(&id)? {
            Some(existing) if viewer.can_see(&existing) => guard.delete_task(&id)?,
            _ => false,
        }
    };
    if !removed {
        return Err(ApiError::not_found(format!("task {task_id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn calculate_schedule(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ScheduleRequest>,
) -> Result<Json<Schedule>, ApiError> {
    let viewer = viewer_from(&headers);
    let store = state.store();
    let schedule = {
        let guard = store.read();
        request.execute(&*guard, viewer, &state.scheduler)?
    };
    Ok(Json(schedule))
}
