//! HTML pages for the board. Plain string building; every piece of user
//! text goes through `escape`.

use axum::http::StatusCode;
use chrono::NaiveDateTime;

use crate::board::{Board, BoardEntry};
use crate::model::{Reminder, Status, Task};
use crate::output::display_time;
use crate::reminders::Preset;

const STYLE: &str = "
body { font-family: sans-serif; margin: 2rem; background: #f6f6f4; }
.columns { display: flex; gap: 1.5rem; align-items: flex-start; }
.column { flex: 1; }
.card { background: #fff; border-radius: 6px; padding: .75rem; margin-bottom: .75rem; box-shadow: 0 1px 2px #0002; }
.card.overdue { border-left: 4px solid #c0392b; }
.meta { color: #666; font-size: .85rem; }
.actions form { display: inline; }
form.task label { display: block; margin: .4rem 0; }
";

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Value for an `<input type="datetime-local">`.
fn input_time(at: Option<NaiveDateTime>) -> String {
    at.map(|t| t.format("%Y-%m-%dT%H:%M").to_string())
        .unwrap_or_default()
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        escape(title)
    )
}

fn action_button(task_id: i64, action: &str, label: &str) -> String {
    format!(
        "<form method=\"post\" action=\"/web/tasks/{task_id}/{action}\"><button type=\"submit\">{label}</button></form>\n"
    )
}

fn preset_checkboxes(checked: &[Preset]) -> String {
    let mut out = String::new();
    for preset in Preset::ALL {
        let mark = if checked.contains(&preset) { " checked" } else { "" };
        out.push_str(&format!(
            "<label><input type=\"checkbox\" name=\"remind_presets[]\" value=\"{}\"{mark}> {}</label>\n",
            preset.token(),
            preset.label()
        ));
    }
    out
}

fn task_card(entry: &BoardEntry, now: NaiveDateTime) -> String {
    let task = &entry.task;
    let class = if task.is_overdue(now) { "card overdue" } else { "card" };
    let mut out = format!("<div class=\"{class}\">\n<strong>{}</strong>\n", escape(&task.title));
    if let Some(desc) = task.description.as_deref().filter(|d| !d.is_empty()) {
        out.push_str(&format!("<p>{}</p>\n", escape(desc)));
    }
    if let Some(due) = task.due_at {
        out.push_str(&format!("<div class=\"meta\">Due {}</div>\n", display_time(due)));
    }
    if let Some(next) = entry.next_reminder {
        out.push_str(&format!(
            "<div class=\"meta\">Next reminder {}</div>\n",
            display_time(next)
        ));
    }
    out.push_str("<div class=\"actions\">\n");
    match task.status {
        Status::Pending => out.push_str(&action_button(task.id, "start", "Start")),
        Status::InProgress => out.push_str(&action_button(task.id, "done", "Done")),
        Status::Done => {}
    }
    out.push_str(&format!(
        "<a href=\"/web/tasks/{}/edit\">Edit</a>\n",
        task.id
    ));
    out.push_str(&action_button(task.id, "delete", "Delete"));
    out.push_str("</div>\n</div>\n");
    out
}

pub fn board_page(app_name: &str, board: &Board, now: NaiveDateTime) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape(app_name));

    body.push_str("<form class=\"task\" method=\"post\" action=\"/web/tasks/create\">\n");
    body.push_str("<label>Title <input name=\"title\" required maxlength=\"255\"></label>\n");
    body.push_str("<label>Description <textarea name=\"description\"></textarea></label>\n");
    body.push_str("<label>Due <input type=\"datetime-local\" name=\"due_at\"></label>\n");
    body.push_str(&preset_checkboxes(&[]));
    body.push_str(
        "<label>Custom reminder <input type=\"datetime-local\" name=\"custom_remind_at\"></label>\n",
    );
    body.push_str("<button type=\"submit\">Add task</button>\n</form>\n");

    body.push_str("<div class=\"columns\">\n");
    for status in Status::ALL {
        let column = board.column(status);
        body.push_str(&format!(
            "<div class=\"column\" id=\"{}\">\n<h2>{} ({})</h2>\n",
            status.as_str(),
            status.label(),
            column.len()
        ));
        for entry in column {
            body.push_str(&task_card(entry, now));
        }
        body.push_str("</div>\n");
    }
    body.push_str("</div>\n");

    page(app_name, &body)
}

/// Split an existing reminder set back into the presets that produced it
/// and at most one custom time, for pre-filling the edit form.
fn split_reminders(
    due: Option<NaiveDateTime>,
    reminders: &[Reminder],
) -> (Vec<Preset>, Option<NaiveDateTime>) {
    let mut presets = Vec::new();
    let mut custom = None;
    for reminder in reminders {
        let preset = due.and_then(|due| {
            Preset::ALL
                .into_iter()
                .find(|p| due.checked_sub_signed(p.offset()) == Some(reminder.remind_at))
        });
        match preset {
            Some(p) => presets.push(p),
            None => {
                custom.get_or_insert(reminder.remind_at);
            }
        }
    }
    (presets, custom)
}

pub fn edit_page(app_name: &str, task: &Task, reminders: &[Reminder]) -> String {
    let (presets, custom) = split_reminders(task.due_at, reminders);

    let mut body = format!("<h1>Edit task #{}</h1>\n", task.id);
    body.push_str(&format!(
        "<form class=\"task\" method=\"post\" action=\"/web/tasks/{}/edit\">\n",
        task.id
    ));
    body.push_str(&format!(
        "<label>Title <input name=\"title\" required maxlength=\"255\" value=\"{}\"></label>\n",
        escape(&task.title)
    ));
    body.push_str(&format!(
        "<label>Description <textarea name=\"description\">{}</textarea></label>\n",
        escape(task.description.as_deref().unwrap_or(""))
    ));
    body.push_str(&format!(
        "<label>Due <input type=\"datetime-local\" name=\"due_at\" value=\"{}\"></label>\n",
        input_time(task.due_at)
    ));
    body.push_str("<label>Status <select name=\"status\">\n");
    for status in Status::ALL {
        let selected = if status == task.status { " selected" } else { "" };
        body.push_str(&format!(
            "<option value=\"{}\"{selected}>{}</option>\n",
            status.as_str(),
            status.label()
        ));
    }
    body.push_str("</select></label>\n");
    body.push_str(&preset_checkboxes(&presets));
    body.push_str(&format!(
        "<label>Custom reminder <input type=\"datetime-local\" name=\"custom_remind_at\" value=\"{}\"></label>\n",
        input_time(custom)
    ));
    body.push_str("<button type=\"submit\">Save</button>\n</form>\n");
    body.push_str("<p><a href=\"/web/tasks\">Back to board</a></p>\n");

    page(&format!("{app_name}: {}", task.title), &body)
}

pub fn error_page(status: StatusCode, detail: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n<p><a href=\"/web/tasks\">Back to board</a></p>\n",
        status,
        escape(detail)
    );
    page(&status.to_string(), &body)
}
