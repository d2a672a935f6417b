//! HTML form handlers under `/web/tasks`. Every mutation answers with a
//! 303 redirect back to the board.

use axum::extract::{Path, State};
use axum::response::{Html, Redirect};
use axum::Form;
use log::info;

use super::{now, render, AppState, PageError};
use crate::board;
use crate::model::Status;
use crate::ops::{self, TaskFields};
use crate::reminders::{reminder_times, Preset};
use crate::validate::parse_timestamp;

const BOARD: &str = "/web/tasks";

/// Fields posted by the create and edit forms. Repeated keys are why this
/// is built from raw pairs rather than deserialized directly.
#[derive(Debug, Default, PartialEq)]
struct TaskForm {
    title: String,
    description: String,
    due_at: String,
    remind_presets: Vec<String>,
    custom_remind_at: String,
    status: String,
}

impl TaskForm {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = TaskForm::default();
        for (key, value) in pairs {
            match key.as_str() {
                "title" => form.title = value,
                "description" => form.description = value,
                "due_at" => form.due_at = value,
                "remind_presets[]" | "remind_presets" => form.remind_presets.push(value),
                "custom_remind_at" => form.custom_remind_at = value,
                "status" => form.status = value,
                _ => {}
            }
        }
        form
    }

    fn description(&self) -> Option<String> {
        let d = self.description.trim();
        (!d.is_empty()).then(|| d.to_string())
    }

    /// Malformed or empty timestamps on the form are treated as absent.
    fn fields(&self, status: Status) -> TaskFields {
        TaskFields {
            title: self.title.trim().to_string(),
            description: self.description(),
            status,
            due_at: parse_timestamp(&self.due_at),
            remind_at: None,
        }
    }
}

pub async fn board_page(State(state): State<AppState>) -> Result<Html<String>, PageError> {
    let now = now();
    let board = state.transact(move |conn| board::load(conn, now)).await?;
    Ok(Html(render::board_page(&state.config().app_name, &board, now)))
}

pub async fn create_task(
    State(state): State<AppState>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, PageError> {
    let now = now();
    let form = TaskForm::from_pairs(pairs);
    let presets = Preset::parse_all(&form.remind_presets)?;
    let fields = form.fields(Status::Pending);
    let custom = Some(form.custom_remind_at.as_str());
    let reminders = reminder_times(fields.due_at, &presets, custom, now);
    let count = reminders.len();

    let id = state
        .transact(move |conn| ops::create_task(conn, &fields, &reminders, now))
        .await?;
    info!("Created task {id} with {count} reminder(s)");
    Ok(Redirect::to(BOARD))
}

pub async fn start_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect, PageError> {
    let now = now();
    state.transact(move |conn| ops::start_task(conn, id, now)).await?;
    info!("Started task {id}");
    Ok(Redirect::to(BOARD))
}

pub async fn done_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect, PageError> {
    let now = now();
    let flagged = state.transact(move |conn| ops::mark_done(conn, id, now)).await?;
    info!("Finished task {id}; {flagged} pending reminder(s) marked sent");
    Ok(Redirect::to(BOARD))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Redirect, PageError> {
    state.transact(move |conn| ops::delete_task(conn, id)).await?;
    info!("Deleted task {id}");
    Ok(Redirect::to(BOARD))
}

pub async fn edit_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, PageError> {
    let (task, reminders) = state
        .transact(move |conn| Ok((ops::get_task(conn, id)?, ops::list_reminders(conn, id)?)))
        .await?;
    Ok(Html(render::edit_page(
        &state.config().app_name,
        &task,
        &reminders,
    )))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Redirect, PageError> {
    let now = now();
    let form = TaskForm::from_pairs(pairs);
    let presets = Preset::parse_all(&form.remind_presets)?;
    // An unrecognised status keeps whatever the task has now.
    let status = Status::parse(&form.status).ok();

    let count = state
        .transact(move |conn| {
            let current = ops::get_task(conn, id)?;
            let fields = form.fields(status.unwrap_or(current.status));
            let custom = Some(form.custom_remind_at.as_str());
            let reminders = reminder_times(fields.due_at, &presets, custom, now);
            ops::update_task(conn, id, &fields, &reminders, now)?;
            Ok(reminders.len())
        })
        .await?;
    info!("Edited task {id}; {count} reminder(s) scheduled");
    Ok(Redirect::to(BOARD))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn collects_repeated_presets() {
        let form = TaskForm::from_pairs(pairs(&[
            ("title", "Pay rent"),
            ("remind_presets[]", "3d"),
            ("remind_presets[]", "1h"),
            ("custom_remind_at", ""),
            ("unknown", "ignored"),
        ]));
        assert_eq!(form.title, "Pay rent");
        assert_eq!(form.remind_presets, vec!["3d", "1h"]);
        assert!(form.custom_remind_at.is_empty());
    }

    #[test]
    fn blank_description_is_absent() {
        let form = TaskForm::from_pairs(pairs(&[("title", "t"), ("description", "   ")]));
        assert_eq!(form.fields(Status::Pending).description, None);
    }

    #[test]
    fn malformed_due_is_absent() {
        let form = TaskForm::from_pairs(pairs(&[("title", "t"), ("due_at", "whenever")]));
        let fields = form.fields(Status::Pending);
        assert_eq!(fields.due_at, None);
        assert_eq!(fields.remind_at, None);
    }
}
