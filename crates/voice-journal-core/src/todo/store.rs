use crate::{CoreResult, JournalError, Todo, TodoFilter, TodoId};

use std::panic::Location;

use chrono::Utc;
use error_location::ErrorLocation;
use tracing::{debug, instrument};

/// In-memory checklist. Shares nothing with the audio session.
#[derive(Debug, Default)]
pub struct TodoStore {
    todos: Vec<Todo>,
}

impl TodoStore {
    /// Empty checklist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an open item with the trimmed `title`.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn add(&mut self, title: &str) -> CoreResult<&Todo> {
        let title = title.trim();
        if title.is_empty() {
            return Err(JournalError::EmptyTodoTitle {
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let index = self.todos.len();
        self.todos.push(Todo {
            id: TodoId::new(),
            title: title.to_string(),
            completed: false,
            created_at: Utc::now(),
        });

        let todo = &self.todos[index];
        debug!(todo_id = %todo.id, "Todo added");
        Ok(todo)
    }

    /// Flip the completed flag; returns the new value.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn toggle(&mut self, id: TodoId) -> CoreResult<bool> {
        let location = Location::caller();
        let todo = self
            .todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(JournalError::TodoNotFound {
                id,
                location: ErrorLocation::from(location),
            })?;

        todo.completed = !todo.completed;
        Ok(todo.completed)
    }

    /// Delete an item, returning it.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn remove(&mut self, id: TodoId) -> CoreResult<Todo> {
        let location = Location::caller();
        let index = self
            .todos
            .iter()
            .position(|t| t.id == id)
            .ok_or(JournalError::TodoNotFound {
                id,
                location: ErrorLocation::from(location),
            })?;

        Ok(self.todos.remove(index))
    }

    /// Items passing `filter`, in insertion order.
    pub fn list_filtered(&self, filter: TodoFilter) -> Vec<&Todo> {
        self.todos.iter().filter(|t| filter.matches(t)).collect()
    }

    /// Number of items regardless of state.
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    /// Whether the checklist is empty.
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }
}
