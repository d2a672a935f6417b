//! Grouping of tasks into the three status columns shown on the board.

use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Serialize;

use crate::model::{Status, Task};
use crate::ops;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardEntry {
    #[serde(flatten)]
    pub task: Task,
    /// Earliest unsent reminder still ahead, for display only.
    pub next_reminder: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Board {
    pub pending: Vec<BoardEntry>,
    pub in_progress: Vec<BoardEntry>,
    pub done: Vec<BoardEntry>,
}

/// Tasks with a due date come first, soonest first; the rest follow in
/// creation order.
fn sort_key(entry: &BoardEntry) -> (bool, NaiveDateTime, i64) {
    let task = &entry.task;
    (task.due_at.is_none(), task.due_at.unwrap_or(task.created_at), task.id)
}

impl Board {
    pub fn build(tasks: Vec<Task>, next_reminders: &HashMap<i64, NaiveDateTime>) -> Self {
        let mut board = Board::default();
        for task in tasks {
            let entry = BoardEntry {
                next_reminder: next_reminders.get(&task.id).copied(),
                task,
            };
            match entry.task.status {
                Status::Pending => board.pending.push(entry),
                Status::InProgress => board.in_progress.push(entry),
                Status::Done => board.done.push(entry),
            }
        }
        board.pending.sort_by_key(sort_key);
        board.in_progress.sort_by_key(sort_key);
        board.done.sort_by_key(sort_key);
        board
    }

    pub fn column(&self, status: Status) -> &[BoardEntry] {
        match status {
            Status::Pending => &self.pending,
            Status::InProgress => &self.in_progress,
            Status::Done => &self.done,
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len() + self.in_progress.len() + self.done.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn load(conn: &Connection, now: NaiveDateTime) -> Result<Board> {
    let tasks = ops::list_tasks(conn)?;
    let next = ops::next_reminders(conn, now)?;
    Ok(Board::build(tasks, &next))
}
