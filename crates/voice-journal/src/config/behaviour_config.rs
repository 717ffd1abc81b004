use crate::config::default_show_progress;

use voice_journal_core::TodoFilter;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Application behaviour configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Filter used by `todo list` when none is given.
    #[serde(
        default,
        serialize_with = "serialize_filter",
        deserialize_with = "deserialize_filter"
    )]
    pub default_todo_filter: TodoFilter,
    /// Whether record/playback progress ticks are printed.
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            default_todo_filter: TodoFilter::default(),
            show_progress: default_show_progress(),
        }
    }
}

fn serialize_filter<S: Serializer>(filter: &TodoFilter, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(filter)
}

fn deserialize_filter<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TodoFilter, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
