use std::io::{BufRead, Write};

use anyhow::{Context, anyhow};
use chrono::NaiveDate;
use tracing::{debug, error, info, instrument};

use crate::app::{App, Event};
use crate::config::Config;
use crate::datetime::parse_deadline;
use crate::render::Renderer;
use crate::reorder::DragMsg;

/// What a single command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Apply(Vec<Event>),
    List,
    Show,
    Help,
    Quit,
    Nothing,
}

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "text", "priority", "deadline", "add", "toggle", "delete", "edit", "type", "enter", "blur",
        "escape", "pick", "over", "drop", "release", "list", "show", "help", "quit",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

/// Parses one command line. `today` anchors relative deadlines.
#[instrument(skip(today))]
pub fn parse_line(line: &str, today: NaiveDate) -> anyhow::Result<Action> {
    let line = line.trim();
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    if head.is_empty() {
        return Ok(Action::Nothing);
    }

    let lowered = head.to_ascii_lowercase();
    let known = known_command_names();
    let command = expand_command_abbrev(&lowered, &known)
        .ok_or_else(|| anyhow!("unknown or ambiguous command: {head} (try `help`)"))?;
    debug!(token = %head, command, "resolved command token");

    let action = match command {
        "text" => Action::Apply(vec![Event::DraftText(rest.to_string())]),
        "priority" => Action::Apply(vec![Event::DraftPriority(rest.parse()?)]),
        "deadline" => {
            let deadline = match rest.to_ascii_lowercase().as_str() {
                "" | "none" => None,
                _ => Some(parse_deadline(rest, today)?),
            };
            Action::Apply(vec![Event::DraftDeadline(deadline)])
        }
        "add" if rest.is_empty() => Action::Apply(vec![Event::Submit]),
        "add" => Action::Apply(vec![Event::DraftText(rest.to_string()), Event::Submit]),
        "toggle" => Action::Apply(vec![Event::Toggle(position(command, rest)?)]),
        "delete" => Action::Apply(vec![Event::Delete(position(command, rest)?)]),
        "edit" => Action::Apply(vec![Event::StartEdit(position(command, rest)?)]),
        "type" => Action::Apply(vec![Event::EditText(rest.to_string())]),
        "enter" => Action::Apply(vec![Event::CommitEdit]),
        "blur" => Action::Apply(vec![Event::Blur]),
        "escape" => Action::Apply(vec![Event::CancelEdit]),
        "pick" => Action::Apply(vec![Event::Drag(DragMsg::PickUp(position(command, rest)?))]),
        "over" => Action::Apply(vec![Event::Drag(DragMsg::DragOver(position(command, rest)?))]),
        "drop" => Action::Apply(vec![Event::Drag(DragMsg::Drop(position(command, rest)?))]),
        "release" => Action::Apply(vec![Event::Drag(DragMsg::Release)]),
        "list" => Action::List,
        "show" => Action::Show,
        "help" => Action::Help,
        "quit" => Action::Quit,
        other => return Err(anyhow!("unhandled command: {other}")),
    };
    Ok(action)
}

fn position(command: &str, arg: &str) -> anyhow::Result<usize> {
    if arg.is_empty() {
        return Err(anyhow!("{command} requires a task number"));
    }
    arg.parse::<usize>()
        .with_context(|| format!("{command}: not a task number: {arg}"))
}

/// Drives an [`App`] from command lines.
pub struct Session<'a, W: Write> {
    pub app: App,
    cfg: &'a Config,
    renderer: Renderer,
    out: W,
    today: NaiveDate,
}

impl<'a, W: Write> Session<'a, W> {
    pub fn new(app: App, cfg: &'a Config, renderer: Renderer, out: W, today: NaiveDate) -> Self {
        Self {
            app,
            cfg,
            renderer,
            out,
            today,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs one command line. Returns `false` once the user asked to quit.
    ///
    /// Input mistakes and failed saves are reported on the output and the
    /// session carries on.
    #[instrument(skip(self))]
    pub fn run_line(&mut self, line: &str) -> anyhow::Result<bool> {
        let action = match parse_line(line, self.today) {
            Ok(action) => action,
            Err(err) => {
                writeln!(self.out, "error: {err:#}")?;
                return Ok(true);
            }
        };

        match action {
            Action::Apply(events) => {
                for event in events {
                    if let Err(err) = self.app.handle(event) {
                        error!(error = %format!("{err:#}"), "failed to save task list");
                        writeln!(self.out, "error: {err:#}")?;
                    }
                }
                self.renderer.print_app(&mut self.out, &self.app, self.today)?;
            }
            Action::List => self.renderer.print_app(&mut self.out, &self.app, self.today)?,
            Action::Show => self.renderer.print_config(&mut self.out, self.cfg)?,
            Action::Help => print_help(&mut self.out)?,
            Action::Quit => return Ok(false),
            Action::Nothing => {}
        }
        Ok(true)
    }

    /// Reads command lines until EOF or `quit`. An open edit is committed on
    /// the way out, as leaving the editor would.
    #[instrument(skip(self, input))]
    pub fn run_loop<R: BufRead>(&mut self, input: R, prompt: bool) -> anyhow::Result<()> {
        self.renderer.print_app(&mut self.out, &self.app, self.today)?;
        let mut lines = input.lines();
        loop {
            if prompt {
                write!(self.out, "> ")?;
                self.out.flush()?;
            }
            let Some(line) = lines.next() else {
                break;
            };
            let line = line.context("failed reading command input")?;
            if !self.run_line(&line)? {
                break;
            }
        }
        self.finish()
    }

    pub fn finish(&mut self) -> anyhow::Result<()> {
        if self.app.edit().is_editing() {
            info!("committing open edit before exit");
            self.app.handle(Event::Blur)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

fn print_help<W: Write>(out: &mut W) -> anyhow::Result<()> {
    writeln!(
        out,
        "\
composer:  text <words> | priority <low|medium|high> | deadline <date|none> | add [words]
tasks:     toggle <n> | delete <n> | edit <n>
editing:   type <words> | enter | blur | escape
reorder:   pick <n> | over <n> | drop <n> | release
other:     list | show | help | quit

Task numbers start at 0. Dates: YYYY-MM-DD, today, tomorrow, +Nd.
Commands may be abbreviated to any unique prefix."
    )?;
    Ok(())
}
