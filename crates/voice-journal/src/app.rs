use crate::{
    AppCommand, AppResult, TodoCommand,
    app_command::HELP,
    config::Config,
    notification::{describe, notification_for},
};

use voice_journal_core::{
    DeviceEvents, ErrorKind, PlaybackProgress, RecordProgress, SessionManager, SessionMode,
    SessionUpdate, TodoFilter, TodoStore,
};

use std::{
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use chrono::Local;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::error::RecvError,
};
use tracing::{debug, error, info, instrument, warn};

const LEVEL_METER_WIDTH: usize = 20;

/// Whether the prompt loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Main application state.
///
/// Owns the session manager, drains its device events and renders what the
/// user typed and what the session reported.
pub struct App {
    pub(crate) manager: Arc<SessionManager>,
    pub(crate) events: DeviceEvents,
    pub(crate) todos: TodoStore,
    pub(crate) config: Config,
}

impl App {
    /// Run the prompt loop until `quit`, end of input or Ctrl-C, then tear
    /// the session down.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Voice Journal starting");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut updates = self.manager.subscribe();

        println!("Voice Journal. Type `help` for commands.");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if self.handle_line(&line).await == Flow::Quit {
                                info!("Quit requested");
                                break;
                            }
                        }
                        Ok(None) => {
                            info!("End of input, shutting down");
                            break;
                        }
                        Err(e) => {
                            error!(error = ?e, "Failed to read from stdin");
                            break;
                        }
                    }
                }

                Some(event) = self.events.recv() => {
                    self.manager.handle_event(event).await;
                }

                update = updates.recv() => {
                    match update {
                        Ok(update) => self.render_update(update),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Session updates lagged");
                        }
                        Err(RecvError::Closed) => {
                            info!("Session update channel closed");
                            break;
                        }
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, shutting down");
                    break;
                }
            }
        }

        self.manager.shutdown().await;
        println!();
        println!("Goodbye.");
        info!("Voice Journal shut down successfully");

        Ok(())
    }

    /// Parse and run one prompt line. Errors are shown, never propagated.
    #[instrument(skip(self))]
    async fn handle_line(&mut self, line: &str) -> Flow {
        if line.trim().is_empty() {
            return Flow::Continue;
        }

        let outcome = match line.parse::<AppCommand>() {
            Ok(command) => self.execute(command).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(flow) => flow,
            Err(e) => {
                debug!(error = ?e, "Command failed");
                println!("{}", describe(&e));
                Flow::Continue
            }
        }
    }

    async fn execute(&mut self, command: AppCommand) -> AppResult<Flow> {
        match command {
            AppCommand::Record => {
                self.manager.begin_recording().await?;
                println!("Recording. Type `stop` to save.");
            }
            AppCommand::Stop => {
                if self.manager.mode() != SessionMode::Recording {
                    println!("Nothing is recording.");
                    return Ok(Flow::Continue);
                }
                match self.manager.end_recording().await? {
                    Some(_) => println!("Saved Journal #{}.", self.manager.catalog().len()),
                    None => println!("Recording stopped; nothing was saved."),
                }
            }
            AppCommand::Play { entry } => {
                let Some(recording) = self.manager.catalog().get(entry - 1) else {
                    println!("{}", notification_for(ErrorKind::NotFound));
                    return Ok(Flow::Continue);
                };
                self.manager.begin_playback(recording.id).await?;
                println!("Playing Journal #{}. Type `halt` to stop.", entry);
            }
            AppCommand::Halt => {
                if self.manager.mode() != SessionMode::Playing {
                    println!("Nothing is playing.");
                    return Ok(Flow::Continue);
                }
                self.manager.end_playback().await?;
                println!("Playback stopped.");
            }
            AppCommand::List => self.print_journal(),
            AppCommand::Todo(todo) => self.execute_todo(todo)?,
            AppCommand::Status => self.print_status(),
            AppCommand::Help => println!("{}", HELP),
            AppCommand::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn execute_todo(&mut self, command: TodoCommand) -> AppResult<()> {
        match command {
            TodoCommand::Add { title } => {
                let todo = self.todos.add(&title)?;
                println!("Added: {}", todo.title);
            }
            TodoCommand::Toggle { item } => {
                let Some(id) = self.todo_id_at(item) else {
                    println!("{}", notification_for(ErrorKind::TodoNotFound));
                    return Ok(());
                };
                let completed = self.todos.toggle(id)?;
                println!(
                    "Item {} marked {}.",
                    item,
                    if completed { "done" } else { "open" }
                );
            }
            TodoCommand::Remove { item } => {
                let Some(id) = self.todo_id_at(item) else {
                    println!("{}", notification_for(ErrorKind::TodoNotFound));
                    return Ok(());
                };
                let removed = self.todos.remove(id)?;
                println!("Removed: {}", removed.title);
            }
            TodoCommand::List { filter } => {
                let filter = filter.unwrap_or(self.config.behaviour.default_todo_filter);
                self.print_todos(filter);
            }
        }
        Ok(())
    }

    /// Items are numbered by their position in the unfiltered list.
    fn todo_id_at(&self, item: usize) -> Option<voice_journal_core::TodoId> {
        self.todos
            .list_filtered(TodoFilter::All)
            .get(item - 1)
            .map(|todo| todo.id)
    }

    fn print_journal(&self) {
        let entries = self.manager.catalog().list();
        if entries.is_empty() {
            println!("The journal is empty. Type `record` to add an entry.");
            return;
        }

        let playing = self.manager.current_recording_id();
        for (index, recording) in entries.iter().enumerate() {
            let marker = if playing == Some(recording.id) { '>' } else { ' ' };
            println!(
                "{} Journal #{}  {}",
                marker,
                index + 1,
                recording
                    .created_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
            );
        }
    }

    fn print_todos(&self, filter: TodoFilter) {
        let all = self.todos.list_filtered(TodoFilter::All);
        let mut shown = 0;
        for (index, todo) in all.iter().enumerate() {
            if !filter.matches(todo) {
                continue;
            }
            let check = if todo.completed { 'x' } else { ' ' };
            println!("  {}. [{}] {}", index + 1, check, todo.title);
            shown += 1;
        }
        if shown == 0 {
            println!("No {} checklist items.", filter);
        }
    }

    fn print_status(&self) {
        let snapshot = self.manager.snapshot();
        let status = match snapshot.recording_id_if_playing {
            Some(id) => {
                let entry = self
                    .manager
                    .catalog()
                    .list()
                    .iter()
                    .position(|r| r.id == id)
                    .map(|i| format!(" Journal #{}", i + 1))
                    .unwrap_or_default();
                format!("{}{}", snapshot.mode, entry)
            }
            None => snapshot.mode.to_string(),
        };
        println!(
            "{} | {} journal entries | {} of {} checklist items open",
            status,
            self.manager.catalog().len(),
            self.todos.list_filtered(TodoFilter::Pending).len(),
            self.todos.len()
        );
    }

    fn render_update(&self, update: SessionUpdate) {
        match update {
            SessionUpdate::RecordProgress(progress) if self.config.behaviour.show_progress => {
                render_progress(&record_progress_line(progress));
            }
            SessionUpdate::PlaybackProgress { progress, .. } if self.config.behaviour.show_progress => {
                render_progress(&playback_progress_line(progress));
            }
            SessionUpdate::PlaybackFinished { recording_id } => {
                debug!(recording_id = %recording_id, "Playback finished");
                println!();
                println!("Playback finished.");
            }
            other => debug!(update = ?other, "Session update"),
        }
    }
}

fn render_progress(line: &str) {
    let mut stdout = io::stdout().lock();
    // Progress overwrites itself in place.
    let _ = write!(stdout, "\r\x1b[K{}", line);
    let _ = stdout.flush();
}

fn format_clock(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub(crate) fn record_progress_line(progress: RecordProgress) -> String {
    let level = progress.peak_level.clamp(0.0, 1.0);
    let filled = (level * LEVEL_METER_WIDTH as f32).round() as usize;
    format!(
        "REC {} [{}{}]",
        format_clock(progress.elapsed),
        "#".repeat(filled),
        "-".repeat(LEVEL_METER_WIDTH - filled)
    )
}

pub(crate) fn playback_progress_line(progress: PlaybackProgress) -> String {
    format!(
        "PLAY {} / {}",
        format_clock(progress.position),
        format_clock(progress.duration)
    )
}
