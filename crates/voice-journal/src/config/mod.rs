mod audio_config;
mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod logging_config;

pub(crate) use {
    audio_config::AudioConfig, behaviour_config::BehaviourConfig, config::Config,
    logging_config::LoggingConfig,
};

pub(crate) const DEFAULT_METERING_INTERVAL_MS: u64 = 200;
pub(crate) const DEFAULT_SHOW_PROGRESS: bool = true;
pub(crate) const DEFAULT_LOG_FILTER: &str = "voice_journal=info,voice_journal_core=info";

pub(crate) fn default_metering_interval_ms() -> u64 {
    DEFAULT_METERING_INTERVAL_MS
}

pub(crate) fn default_show_progress() -> bool {
    DEFAULT_SHOW_PROGRESS
}

pub(crate) fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}
