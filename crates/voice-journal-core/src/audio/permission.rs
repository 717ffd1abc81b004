use crate::audio::capture::select_input_device;

use async_trait::async_trait;
use cpal::traits::DeviceTrait;
use tracing::{info, instrument, warn};

/// Asks the host for microphone access.
///
/// Never fails: any underlying error collapses to `false`. Every call
/// re-prompts; caching a denial is the host's policy, not ours.
#[async_trait]
pub trait PermissionGate: Send + Sync {
    /// Returns whether microphone access is granted.
    async fn request_microphone_access(&self) -> bool;
}

/// Gate for hosts without a permission model.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGranted;

#[async_trait]
impl PermissionGate for AlwaysGranted {
    async fn request_microphone_access(&self) -> bool {
        true
    }
}

/// Gate that probes the input device through cpal.
///
/// Opening the device configuration is what triggers the OS microphone
/// prompt on hosts that have one, so a probe that succeeds means access.
#[derive(Debug, Clone, Default)]
pub struct CpalPermissionGate {
    input_device: Option<String>,
}

impl CpalPermissionGate {
    /// Probe the named input device, or the default one when `None`.
    pub fn new(input_device: Option<String>) -> Self {
        Self { input_device }
    }
}

#[async_trait]
impl PermissionGate for CpalPermissionGate {
    #[instrument(skip(self))]
    async fn request_microphone_access(&self) -> bool {
        let name = self.input_device.clone();

        let probe = tokio::task::spawn_blocking(move || {
            let device = select_input_device(name.as_deref())?;
            device
                .default_input_config()
                .map(|_| ())
                .map_err(|e| crate::DeviceError::new(format!("Failed to get config: {}", e)))
        })
        .await;

        match probe {
            Ok(Ok(())) => {
                info!("Microphone access granted");
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Microphone access unavailable");
                false
            }
            Err(e) => {
                warn!(error = ?e, "Microphone probe task failed");
                false
            }
        }
    }
}
