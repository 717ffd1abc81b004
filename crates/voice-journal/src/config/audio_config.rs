use crate::config::default_metering_interval_ms;

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// Audio device configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Advisory progress tick interval, set before every recording.
    #[serde(default = "default_metering_interval_ms")]
    pub metering_interval_ms: u64,
    /// Where clips are written (None = `<data dir>/recordings`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recordings_dir: Option<PathBuf>,
    /// Input device name (None = default device).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_device: Option<String>,
    /// Output device name (None = default device).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
}

impl AudioConfig {
    /// Metering interval as a [`Duration`].
    pub fn metering_interval(&self) -> Duration {
        Duration::from_millis(self.metering_interval_ms)
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            metering_interval_ms: default_metering_interval_ms(),
            recordings_dir: None,
            input_device: None,
            output_device: None,
        }
    }
}
