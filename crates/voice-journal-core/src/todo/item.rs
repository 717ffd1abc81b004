use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identifier of a checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TodoId(Uuid);

impl TodoId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A checklist item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    /// Unique identity.
    pub id: TodoId,
    /// Trimmed, non-empty title.
    pub title: String,
    /// Whether the item is checked off.
    pub completed: bool,
    /// When the item was added.
    pub created_at: DateTime<Utc>,
}

/// Which items [`TodoStore::list_filtered`](crate::TodoStore::list_filtered) returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TodoFilter {
    /// Every item.
    #[default]
    All,
    /// Checked-off items.
    Completed,
    /// Items still open.
    Pending,
}

impl TodoFilter {
    /// Whether `todo` passes this filter.
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            TodoFilter::All => true,
            TodoFilter::Completed => todo.completed,
            TodoFilter::Pending => !todo.completed,
        }
    }
}

impl fmt::Display for TodoFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TodoFilter::All => write!(f, "all"),
            TodoFilter::Completed => write!(f, "completed"),
            TodoFilter::Pending => write!(f, "pending"),
        }
    }
}

impl FromStr for TodoFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TodoFilter::All),
            "completed" | "done" => Ok(TodoFilter::Completed),
            "pending" | "open" => Ok(TodoFilter::Pending),
            other => Err(format!("unknown todo filter: {}", other)),
        }
    }
}
