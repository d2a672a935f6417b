use chrono::NaiveDateTime;
use serde::Serialize;

use crate::board::{Board, BoardEntry};
use crate::model::{Reminder, Status, Task};

/// A task together with its reminder set, as returned by the JSON API.
#[derive(Serialize)]
pub struct TaskDetail<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    pub reminders: &'a [Reminder],
}

/// Minute-precision timestamp for people to read.
pub fn display_time(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn format_entry(out: &mut String, entry: &BoardEntry, now: NaiveDateTime) {
    let task = &entry.task;
    out.push_str(&format!("  {} #{} {}", task.status.icon(), task.id, task.title));
    if let Some(due) = task.due_at {
        out.push_str(&format!("  due {}", display_time(due)));
        if task.is_overdue(now) {
            out.push_str(" (overdue)");
        }
    }
    if let Some(next) = entry.next_reminder {
        out.push_str(&format!("  next reminder {}", display_time(next)));
    }
    out.push('\n');
    if let Some(desc) = task.description.as_deref().filter(|d| !d.is_empty()) {
        out.push_str(&format!("      {desc}\n"));
    }
}

pub fn format_board(board: &Board, now: NaiveDateTime) -> String {
    let mut out = String::new();
    for (i, status) in Status::ALL.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let column = board.column(status);
        out.push_str(&format!("{} ({})\n", status.label(), column.len()));
        for entry in column {
            format_entry(&mut out, entry, now);
        }
    }
    out
}
