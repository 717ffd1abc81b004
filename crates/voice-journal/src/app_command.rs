use crate::{AppError, AppResult};

use voice_journal_core::TodoFilter;

use std::str::FromStr;

/// A line typed at the journal prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Begin a recording.
    Record,
    /// End the recording and save it.
    Stop,
    /// Play journal entry `entry` (1-based).
    Play {
        /// 1-based position in the journal.
        entry: usize,
    },
    /// Stop the current playback.
    Halt,
    /// Print the journal.
    List,
    /// Checklist command.
    Todo(TodoCommand),
    /// Print the current mode and counts.
    Status,
    /// Print the command reference.
    Help,
    /// Tear down and exit.
    Quit,
}

/// Checklist subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoCommand {
    /// Add an item.
    Add {
        /// Item title as typed.
        title: String,
    },
    /// Flip item `item` (1-based).
    Toggle {
        /// 1-based position in the full list.
        item: usize,
    },
    /// Delete item `item` (1-based).
    Remove {
        /// 1-based position in the full list.
        item: usize,
    },
    /// Print the checklist.
    List {
        /// Explicit filter, or the configured default.
        filter: Option<TodoFilter>,
    },
}

pub(crate) const HELP: &str = "\
Commands:
  record                 start a journal recording
  stop                   stop and save the recording
  play <n>               play journal entry n
  halt                   stop playback
  list                   show journal entries
  todo add <title>       add a checklist item
  todo toggle <n>        check or uncheck item n
  todo rm <n>            remove item n
  todo list [filter]     show items (all | completed | pending)
  status                 show what the journal is doing
  help                   show this text
  quit                   stop everything and exit";

#[track_caller]
fn parse_position(raw: Option<&str>, what: &str) -> AppResult<usize> {
    let raw = raw.ok_or_else(|| AppError::invalid_command(format!("missing {} number", what)))?;
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::invalid_command(format!(
            "'{}' is not a valid {} number",
            raw, what
        ))),
    }
}

#[track_caller]
fn expect_end<'a>(mut rest: impl Iterator<Item = &'a str>, command: &str) -> AppResult<()> {
    match rest.next() {
        None => Ok(()),
        Some(extra) => Err(AppError::invalid_command(format!(
            "unexpected '{}' after {}",
            extra, command
        ))),
    }
}

impl FromStr for AppCommand {
    type Err = AppError;

    #[track_caller]
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Err(AppError::invalid_command("empty line"));
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "record" => AppCommand::Record,
            "stop" => AppCommand::Stop,
            "play" => {
                let entry = parse_position(words.next(), "entry")?;
                AppCommand::Play { entry }
            }
            "halt" => AppCommand::Halt,
            "list" | "ls" => AppCommand::List,
            "status" => AppCommand::Status,
            "help" | "?" => AppCommand::Help,
            "quit" | "exit" => AppCommand::Quit,
            "todo" => {
                let rest = line.get(head.len()..).unwrap_or_default();
                return parse_todo(rest).map(AppCommand::Todo);
            }
            other => {
                return Err(AppError::invalid_command(format!(
                    "unknown command '{}'",
                    other
                )));
            }
        };

        expect_end(words, head)?;
        Ok(command)
    }
}

#[track_caller]
fn parse_todo(rest: &str) -> AppResult<TodoCommand> {
    let rest = rest.trim_start();
    let mut words = rest.split_whitespace();
    let Some(sub) = words.next() else {
        return Ok(TodoCommand::List { filter: None });
    };

    match sub.to_ascii_lowercase().as_str() {
        "add" => {
            // Keep the title's inner spacing as typed.
            let title = rest.get(sub.len()..).unwrap_or_default().trim().to_string();
            Ok(TodoCommand::Add { title })
        }
        "toggle" | "done" => {
            let item = parse_position(words.next(), "item")?;
            expect_end(words, "todo toggle")?;
            Ok(TodoCommand::Toggle { item })
        }
        "rm" | "remove" => {
            let item = parse_position(words.next(), "item")?;
            expect_end(words, "todo rm")?;
            Ok(TodoCommand::Remove { item })
        }
        "list" | "ls" => {
            let filter = words
                .next()
                .map(TodoFilter::from_str)
                .transpose()
                .map_err(AppError::invalid_command)?;
            expect_end(words, "todo list")?;
            Ok(TodoCommand::List { filter })
        }
        other => Err(AppError::invalid_command(format!(
            "unknown todo command '{}'",
            other
        ))),
    }
}
