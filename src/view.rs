// Terminal formatting for tasks and notices

use crate::filter::Filter;
use crate::store::Counts;
use crate::task::Task;
use chrono::{DateTime, Local, TimeZone, Utc};
use colored::Colorize;
use std::fmt::Display;

/// "Mar 1, 2024, 09:30 AM"
pub fn format_timestamp<Tz: TimeZone>(ts: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    ts.format("%b %-d, %Y, %I:%M %p").to_string()
}

pub fn format_local(ts: &DateTime<Utc>) -> String {
    format_timestamp(&ts.with_timezone(&Local))
}

pub fn summary_line(counts: Counts) -> String {
    format!(
        "Total Tasks: {} | Pending: {} | Completed: {}",
        counts.total, counts.pending, counts.completed
    )
}

/// One task, with timestamps rendered by `fmt_ts`
pub fn render_task_with(task: &Task, fmt_ts: impl Fn(&DateTime<Utc>) -> String) -> String {
    let (mark, badge) = if task.completed {
        ("[x]".green(), "Completed".green())
    } else {
        ("[ ]".normal(), "Pending".yellow())
    };
    let text = if task.completed {
        task.text.strikethrough().dimmed()
    } else {
        task.text.normal()
    };

    let mut line = format!("{} {} {}", mark, task.id.to_string().dimmed(), text);
    line.push_str(&format!("\n      Created: {}", fmt_ts(&task.created_at)));
    if let Some(completed_at) = &task.completed_at {
        line.push_str(&format!("  Completed: {}", fmt_ts(completed_at)));
    }
    line.push_str(&format!("  {}", badge));
    line
}

pub fn render_task(task: &Task) -> String {
    render_task_with(task, format_local)
}

/// Text shown when a filter matches nothing
pub fn empty_message(filter: Filter) -> &'static str {
    match filter {
        Filter::All => "No tasks yet. Add one to get started!",
        Filter::Pending => "No pending tasks.",
        Filter::Completed => "No completed tasks.",
    }
}

pub fn success(message: &str) -> String {
    format!("{} {}", "✓".green().bold(), message.green())
}

pub fn error(message: &str) -> String {
    format!("{} {}", "✗".red().bold(), message.red())
}

pub fn warning(message: &str) -> String {
    format!("{} {}", "!".yellow().bold(), message.yellow())
}
