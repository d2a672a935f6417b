use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension};

use crate::error::{conflict_on_unique, TaskError};
use crate::model::{Reminder, Status, Task};
use crate::validate::{check_due_in_future, check_remind_before_due, validate_title};

/// Task fields as submitted on create or on a full edit.
#[derive(Debug, Clone, Default)]
pub struct TaskFields {
    pub title: String,
    pub description: Option<String>,
    pub status: Status,
    pub due_at: Option<NaiveDateTime>,
    pub remind_at: Option<NaiveDateTime>,
}

/// Partial update. `None` leaves a field alone; for nullable fields
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<Status>,
    pub due_at: Option<Option<NaiveDateTime>>,
    pub remind_at: Option<Option<NaiveDateTime>>,
}

impl TaskPatch {
    fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(due_at) = self.due_at {
            task.due_at = due_at;
        }
        if let Some(remind_at) = self.remind_at {
            task.remind_at = remind_at;
        }
    }
}

const TASK_COLUMNS: &str =
    "id, title, description, status, due_at, remind_at, created_at, updated_at";

const INSERT_TASK: &str = "
INSERT INTO tasks (title, description, status, due_at, remind_at, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
";

const UPDATE_TASK: &str = "
UPDATE tasks
SET title = ?1, description = ?2, status = ?3, due_at = ?4, remind_at = ?5, updated_at = ?6
WHERE id = ?7
";

const SET_STATUS: &str = "
UPDATE tasks
SET status = ?1, updated_at = ?2
WHERE id = ?3
";

const INSERT_REMINDER: &str = "
INSERT INTO task_reminders (task_id, remind_at, created_at)
VALUES (?1, ?2, ?3)
";

const MARK_REMINDERS_SENT: &str = "
UPDATE task_reminders
SET is_sent = 1
WHERE task_id = ?1 AND is_sent = 0
";

const LATEST_UNSENT_REMINDER: &str = "
SELECT MAX(remind_at)
FROM task_reminders
WHERE task_id = ?1 AND is_sent = 0
";

const NEXT_REMINDERS: &str = "
SELECT task_id, MIN(remind_at)
FROM task_reminders
WHERE is_sent = 0 AND remind_at > ?1
GROUP BY task_id
";

fn read_task_row(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        due_at: row.get(4)?,
        remind_at: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn read_reminder_row(row: &rusqlite::Row) -> rusqlite::Result<Reminder> {
    Ok(Reminder {
        id: row.get(0)?,
        task_id: row.get(1)?,
        remind_at: row.get(2)?,
        is_sent: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn require_task(conn: &Connection, id: i64) -> Result<()> {
    let exists: Option<i64> = conn
        .query_row("SELECT id FROM tasks WHERE id = ?1", [id], |row| row.get(0))
        .optional()?;
    if exists.is_none() {
        return Err(TaskError::NotFound(id).into());
    }
    Ok(())
}

/// Every stored field of a task must satisfy these, whichever path wrote it.
fn check_fields(
    title: &str,
    due_at: Option<NaiveDateTime>,
    remind_at: Option<NaiveDateTime>,
) -> Result<()> {
    validate_title(title)?;
    check_remind_before_due("remind_at", remind_at, due_at)?;
    Ok(())
}

fn check_reminders(reminders: &BTreeSet<NaiveDateTime>, due_at: Option<NaiveDateTime>) -> Result<()> {
    // The set is ordered, so only the latest entry can violate the bound.
    check_remind_before_due("custom_remind_at", reminders.last().copied(), due_at)
}

pub fn create_task(
    conn: &Connection,
    fields: &TaskFields,
    reminders: &BTreeSet<NaiveDateTime>,
    now: NaiveDateTime,
) -> Result<i64> {
    check_fields(&fields.title, fields.due_at, fields.remind_at)?;
    check_due_in_future(fields.due_at, now)?;
    check_reminders(reminders, fields.due_at)?;

    conn.execute(
        INSERT_TASK,
        rusqlite::params![
            fields.title,
            fields.description,
            fields.status,
            fields.due_at,
            fields.remind_at,
            now
        ],
    )
    .map_err(conflict_on_unique)?;
    let id = conn.last_insert_rowid();

    for at in reminders {
        add_reminder(conn, id, *at, now)?;
    }
    if fields.status == Status::Done {
        mark_reminders_sent(conn, id)?;
    }
    Ok(id)
}

pub fn get_task(conn: &Connection, id: i64) -> Result<Task> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            [id],
            read_task_row,
        )
        .optional()?;
    task.ok_or_else(|| TaskError::NotFound(id).into())
}

/// All tasks, most recently created first.
pub fn list_tasks(conn: &Connection) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC, id DESC"
    ))?;
    let tasks = stmt
        .query_map([], read_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

/// Overwrite every field of a task and replace its reminder set.
pub fn update_task(
    conn: &Connection,
    id: i64,
    fields: &TaskFields,
    reminders: &BTreeSet<NaiveDateTime>,
    now: NaiveDateTime,
) -> Result<()> {
    require_task(conn, id)?;
    check_fields(&fields.title, fields.due_at, fields.remind_at)?;
    check_reminders(reminders, fields.due_at)?;

    conn.execute(
        UPDATE_TASK,
        rusqlite::params![
            fields.title,
            fields.description,
            fields.status,
            fields.due_at,
            fields.remind_at,
            now,
            id
        ],
    )?;
    replace_reminders(conn, id, reminders, now)?;
    if fields.status == Status::Done {
        mark_reminders_sent(conn, id)?;
    }
    Ok(())
}

/// Update only the fields present in `patch`. The reminder set is replaced
/// when `reminders` is given and left alone otherwise.
pub fn patch_task(
    conn: &Connection,
    id: i64,
    patch: TaskPatch,
    reminders: Option<&BTreeSet<NaiveDateTime>>,
    now: NaiveDateTime,
) -> Result<Task> {
    let mut task = get_task(conn, id)?;
    patch.apply(&mut task);
    check_fields(&task.title, task.due_at, task.remind_at)?;
    match reminders {
        Some(reminders) => check_reminders(reminders, task.due_at)?,
        None => {
            // The kept set must still fit before a moved due date.
            let latest: Option<NaiveDateTime> =
                conn.query_row(LATEST_UNSENT_REMINDER, [id], |row| row.get(0))?;
            check_remind_before_due("reminders", latest, task.due_at)?;
        }
    }

    conn.execute(
        UPDATE_TASK,
        rusqlite::params![
            task.title,
            task.description,
            task.status,
            task.due_at,
            task.remind_at,
            now,
            id
        ],
    )?;
    if let Some(reminders) = reminders {
        replace_reminders(conn, id, reminders, now)?;
    }
    if task.status == Status::Done {
        mark_reminders_sent(conn, id)?;
    }
    task.updated_at = now;
    Ok(task)
}

pub fn start_task(conn: &Connection, id: i64, now: NaiveDateTime) -> Result<()> {
    require_task(conn, id)?;
    conn.execute(SET_STATUS, rusqlite::params![Status::InProgress, now, id])?;
    Ok(())
}

/// Mark a task done and flag its pending reminders as sent. Reminders are
/// kept as a record of what was scheduled. Returns how many were flagged.
pub fn mark_done(conn: &Connection, id: i64, now: NaiveDateTime) -> Result<usize> {
    require_task(conn, id)?;
    conn.execute(SET_STATUS, rusqlite::params![Status::Done, now, id])?;
    mark_reminders_sent(conn, id)
}

/// Delete a task regardless of its status; its reminders go with it.
pub fn delete_task(conn: &Connection, id: i64) -> Result<()> {
    require_task(conn, id)?;
    conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
    Ok(())
}

pub fn add_reminder(
    conn: &Connection,
    task_id: i64,
    at: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<i64> {
    conn.execute(INSERT_REMINDER, rusqlite::params![task_id, at, now])
        .map_err(conflict_on_unique)?;
    Ok(conn.last_insert_rowid())
}

/// Drop every reminder of a task and insert `reminders` in their place.
pub fn replace_reminders(
    conn: &Connection,
    task_id: i64,
    reminders: &BTreeSet<NaiveDateTime>,
    now: NaiveDateTime,
) -> Result<usize> {
    conn.execute("DELETE FROM task_reminders WHERE task_id = ?1", [task_id])?;
    for at in reminders {
        add_reminder(conn, task_id, *at, now)?;
    }
    Ok(reminders.len())
}

fn mark_reminders_sent(conn: &Connection, task_id: i64) -> Result<usize> {
    Ok(conn.execute(MARK_REMINDERS_SENT, [task_id])?)
}

pub fn list_reminders(conn: &Connection, task_id: i64) -> Result<Vec<Reminder>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, task_id, remind_at, is_sent, created_at FROM task_reminders
         WHERE task_id = ?1 ORDER BY remind_at",
    )?;
    let reminders = stmt
        .query_map([task_id], read_reminder_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(reminders)
}

/// Earliest unsent reminder after `now`, per task. Tasks without one are
/// absent from the map.
pub fn next_reminders(conn: &Connection, now: NaiveDateTime) -> Result<HashMap<i64, NaiveDateTime>> {
    let mut stmt = conn.prepare_cached(NEXT_REMINDERS)?;
    let rows = stmt.query_map([now], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, NaiveDateTime>(1)?))
    })?;
    let mut map = HashMap::new();
    for row in rows {
        let (task_id, at) = row?;
        map.insert(task_id, at);
    }
    Ok(map)
}
