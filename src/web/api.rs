//! JSON API under `/tasks`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use log::info;
use serde::{Deserialize, Deserializer};

use super::{now, ApiError, AppState};
use crate::error::TaskError;
use crate::model::{Reminder, Status, Task};
use crate::ops::{self, TaskFields, TaskPatch};
use crate::output::TaskDetail;
use crate::reminders::{reminder_times, Preset};
use crate::validate::parse_timestamp_field;

/// Distinguish an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn nullable<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskCreate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub remind_at: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub remind_presets: Vec<String>,
    #[serde(default)]
    pub custom_remind_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_at: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub remind_at: Option<Option<String>>,
    #[serde(default)]
    pub remind_presets: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub custom_remind_at: Option<Option<String>>,
}

/// A rejected body (bad syntax, wrong types, missing content type) answers
/// with the usual `{"detail"}` 400.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => Err(TaskError::invalid(rejection.body_text()).into()),
    }
}

fn detail_json(task: &Task, reminders: &[Reminder]) -> Result<Json<serde_json::Value>, ApiError> {
    let detail = TaskDetail { task, reminders };
    Ok(Json(serde_json::to_value(&detail)?))
}

pub async fn create_task(
    State(state): State<AppState>,
    body: Result<Json<TaskCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let body = json_body(body)?;
    let now = now();
    let due_at = parse_timestamp_field("due_at", body.due_at.as_deref())?;
    let remind_at = parse_timestamp_field("remind_at", body.remind_at.as_deref())?;
    parse_timestamp_field("custom_remind_at", body.custom_remind_at.as_deref())?;
    let presets = Preset::parse_all(&body.remind_presets)?;
    let reminders = reminder_times(due_at, &presets, body.custom_remind_at.as_deref(), now);

    let fields = TaskFields {
        title: body.title,
        description: body.description,
        status: body.status,
        due_at,
        remind_at,
    };
    let (task, reminders) = state
        .transact(move |conn| {
            let id = ops::create_task(conn, &fields, &reminders, now)?;
            Ok((ops::get_task(conn, id)?, ops::list_reminders(conn, id)?))
        })
        .await?;

    info!(
        "Created task {} via API with {} reminder(s)",
        task.id,
        reminders.len()
    );
    Ok((StatusCode::CREATED, detail_json(&task, &reminders)?))
}

pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<Vec<Task>>, ApiError> {
    let tasks = state.transact(|conn| ops::list_tasks(conn)).await?;
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (task, reminders) = state
        .transact(move |conn| Ok((ops::get_task(conn, id)?, ops::list_reminders(conn, id)?)))
        .await?;
    detail_json(&task, &reminders)
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<TaskUpdate>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let body = json_body(body)?;
    let now = now();
    let due_at = match &body.due_at {
        Some(raw) => Some(parse_timestamp_field("due_at", raw.as_deref())?),
        None => None,
    };
    let remind_at = match &body.remind_at {
        Some(raw) => Some(parse_timestamp_field("remind_at", raw.as_deref())?),
        None => None,
    };
    let custom = body.custom_remind_at.clone().flatten();
    parse_timestamp_field("custom_remind_at", custom.as_deref())?;
    let replace_reminders = body.remind_presets.is_some() || body.custom_remind_at.is_some();
    let presets = Preset::parse_all(body.remind_presets.as_deref().unwrap_or_default())?;

    let patch = TaskPatch {
        title: body.title,
        description: body.description,
        status: body.status,
        due_at,
        remind_at,
    };
    let (task, reminders) = state
        .transact(move |conn| {
            let reminders = if replace_reminders {
                let current = ops::get_task(conn, id)?;
                let due = patch.due_at.unwrap_or(current.due_at);
                Some(reminder_times(due, &presets, custom.as_deref(), now))
            } else {
                None
            };
            let task = ops::patch_task(conn, id, patch, reminders.as_ref(), now)?;
            Ok((task, ops::list_reminders(conn, id)?))
        })
        .await?;

    info!("Updated task {id} via API");
    detail_json(&task, &reminders)
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.transact(move |conn| ops::delete_task(conn, id)).await?;
    info!("Deleted task {id} via API");
    Ok(StatusCode::NO_CONTENT)
}
