use std::io::{self, IsTerminal, Write};

use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::composer::Composer;
use crate::config::Config;
use crate::datetime::DEADLINE_FORMAT;
use crate::task::Priority;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.color()? && io::stdout().is_terminal();
        Ok(Self { color })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Draws the task list, marking the row being edited and the row that
    /// was picked up for a drag, followed by the composer drafts.
    #[tracing::instrument(skip(self, out, app, today))]
    pub fn print_app<W: Write>(&self, out: &mut W, app: &App, today: NaiveDate) -> anyhow::Result<()> {
        let tasks = app.store().tasks();
        if tasks.is_empty() {
            writeln!(out, "No tasks.")?;
        } else {
            let headers = vec![
                "#".to_string(),
                "Done".to_string(),
                "Priority".to_string(),
                "Due".to_string(),
                "Text".to_string(),
            ];

            let editing = app.edit().position();
            let picked = app.reorder().source();
            let mut rows = Vec::with_capacity(tasks.len());

            for (position, task) in tasks.iter().enumerate() {
                let marker = if picked == Some(position) { "*" } else { "" };
                let pos = self.paint(&format!("{position}{marker}"), "33");

                let done = if task.completed { "x" } else { "" }.to_string();

                let priority = match task.priority {
                    Priority::High => self.paint(task.priority.as_str(), "31"),
                    Priority::Medium => self.paint(task.priority.as_str(), "33"),
                    Priority::Low => self.paint(task.priority.as_str(), "32"),
                };

                let due = match task.deadline {
                    Some(date) if date < today && !task.completed => {
                        self.paint(&date.format(DEADLINE_FORMAT).to_string(), "31")
                    }
                    Some(date) => date.format(DEADLINE_FORMAT).to_string(),
                    None => String::new(),
                };

                let text = match (editing, app.edit().scratch()) {
                    (Some(at), Some(scratch)) if at == position => {
                        format!("[editing] {scratch}_")
                    }
                    _ if task.completed => self.paint(&task.text, "9"),
                    _ => task.text.clone(),
                };

                rows.push(vec![pos, done, priority, due, text]);
            }

            write_table(&mut *out, headers, rows)?;
        }

        if let Some(line) = draft_line(app.composer()) {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    pub fn print_config<W: Write>(&self, out: &mut W, cfg: &Config) -> anyhow::Result<()> {
        let mut entries: Vec<_> = cfg.iter().collect();
        entries.sort();
        for (key, value) in entries {
            writeln!(out, "{key} = {value}")?;
        }
        for file in &cfg.loaded_files {
            writeln!(out, "# loaded {}", file.display())?;
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn draft_line(composer: &Composer) -> Option<String> {
    if composer == &Composer::default() {
        return None;
    }
    let mut line = format!("draft: {:?} {}", composer.text, composer.priority);
    if let Some(deadline) = composer.deadline {
        line.push_str(&format!(" due {}", deadline.format(DEADLINE_FORMAT)));
    }
    Some(line)
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
