//! Voice Journal: record, replay and check off spoken notes from the terminal.

mod app;
mod app_command;
mod config;
mod error;
mod notification;

pub(crate) use {
    app::App,
    app_command::{AppCommand, TodoCommand},
    error::{AppError, Result as AppResult},
};

use crate::config::{Config, DEFAULT_LOG_FILTER};

use voice_journal_core::{
    CpalDevice, CpalDeviceSettings, CpalPermissionGate, RecordingCatalog, SessionManager,
    TodoStore,
};

use std::{sync::Arc, time::Duration};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(250);

/// `RUST_LOG` wins; otherwise the configured filter, falling back to the
/// built-in default when that does not parse.
fn init_tracing(configured: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(configured.unwrap_or(DEFAULT_LOG_FILTER))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Application entry point.
fn main() {
    let config = Config::load();
    init_tracing(config.as_ref().ok().map(|c| c.logging.filter.as_str()));

    let config = match config {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let recordings_dir = match config.recordings_dir() {
        Ok(dir) => dir,
        Err(e) => {
            error!("Failed to resolve recordings directory: {:?}", e);
            std::process::exit(1);
        }
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    info!(recordings_dir = ?recordings_dir, "Using recordings directory");

    runtime.block_on(async {
        let device = Arc::new(CpalDevice::new(CpalDeviceSettings {
            recordings_dir,
            input_device: config.audio.input_device.clone(),
            output_device: config.audio.output_device.clone(),
        }));
        let permission = Arc::new(CpalPermissionGate::new(config.audio.input_device.clone()));
        let catalog = Arc::new(RecordingCatalog::new());

        let (manager, events) = SessionManager::new(
            device,
            permission,
            catalog,
            config.audio.metering_interval(),
        );

        let app = App {
            manager: Arc::new(manager),
            events,
            todos: TodoStore::new(),
            config,
        };

        if let Err(e) = app.run().await {
            error!(error = ?e, "App error");
        }
    });

    // The stdin reader may still be parked on a blocking read.
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
}
