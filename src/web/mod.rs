//! HTTP surface: the JSON API under `/tasks` and the HTML board under
//! `/web/tasks`, sharing one SQLite connection.

mod api;
mod error;
mod forms;
mod render;

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::extract::State;
use axum::response::{IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDateTime, Utc};
use log::info;
use rusqlite::{Connection, TransactionBehavior};
use tokio::net::TcpListener;

use crate::config::Config;
use crate::db;

pub use error::{status_for, ApiError, PageError};

#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(conn: Connection, config: Config) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `f` inside one database transaction on a blocking thread.
    ///
    /// Commits when `f` returns `Ok`. On `Err` (or a panic) the transaction
    /// is dropped, which rolls it back.
    pub async fn transact<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || -> Result<T> {
            // A panic mid-request already rolled its transaction back, so a
            // poisoned lock still guards a usable connection.
            let mut conn = conn.lock().unwrap_or_else(|e| e.into_inner());
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let value = f(&tx)?;
            tx.commit()?;
            Ok(value)
        })
        .await
        .context("database task failed")?
    }
}

/// Current time as naive UTC, the representation stored in the database.
pub fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/tasks", get(api::list_tasks).post(api::create_task))
        .route(
            "/tasks/{id}",
            get(api::get_task)
                .patch(api::update_task)
                .delete(api::delete_task),
        )
        .route("/web/tasks", get(forms::board_page))
        .route("/web/tasks/create", post(forms::create_task))
        .route("/web/tasks/{id}/start", post(forms::start_task))
        .route("/web/tasks/{id}/done", post(forms::done_task))
        .route("/web/tasks/{id}/delete", post(forms::delete_task))
        .route(
            "/web/tasks/{id}/edit",
            get(forms::edit_page).post(forms::update_task),
        )
        .with_state(state)
}

async fn index() -> Redirect {
    Redirect::temporary("/web/tasks")
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "app": state.config.app_name,
    }))
}

/// Open the database, then serve until Ctrl-C.
pub async fn serve(config: Config) -> Result<()> {
    let db_path = config.db_path()?;
    crate::config::ensure_db_dir(&db_path)?;
    let conn = db::open(&db_path)?;
    db::init(&conn)?;

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    let local_addr = listener.local_addr()?;

    if config.telegram_configured() {
        info!("Telegram token configured; reminder delivery is not wired up");
    }
    info!(
        "{} listening on http://{local_addr} (env={:?}, db={db_path})",
        config.app_name, config.app_env
    );

    let app = router(AppState::new(conn, config));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; run until the process is killed.
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{self, TaskFields};
    use std::collections::BTreeSet;

    fn state() -> AppState {
        let conn = db::open_memory().unwrap();
        AppState::new(conn, Config::with_db(":memory:"))
    }

    fn fields(title: &str) -> TaskFields {
        TaskFields {
            title: title.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn transact_commits_on_ok() {
        let state = state();
        let id = state
            .transact(|conn| ops::create_task(conn, &fields("kept"), &BTreeSet::new(), now()))
            .await
            .unwrap();
        let task = state.transact(move |conn| ops::get_task(conn, id)).await.unwrap();
        assert_eq!(task.title, "kept");
    }

    #[tokio::test]
    async fn transact_rolls_back_on_err() {
        let state = state();
        let result: Result<()> = state
            .transact(|conn| {
                ops::create_task(conn, &fields("lost"), &BTreeSet::new(), now())?;
                anyhow::bail!("boom")
            })
            .await;
        assert!(result.is_err());
        let tasks = state.transact(|conn| ops::list_tasks(conn)).await.unwrap();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn transact_survives_a_panic() {
        let state = state();
        let result: Result<()> = state.transact(|_| panic!("handler bug")).await;
        assert!(result.is_err());
        let tasks = state.transact(|conn| ops::list_tasks(conn)).await.unwrap();
        assert!(tasks.is_empty());
    }
}
