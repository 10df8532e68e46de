use crate::error::DeviceError;
use std::sync::Arc;
use tracing::{info, warn};

use super::platform::{AudioDevice, MediaPlatform};

/// Maintains the authoritative list of audio input devices and the current
/// selection.
///
/// Labels are only populated after a permission grant, so the first refresh
/// requests a throwaway grant and releases it immediately. Hot-plug events
/// re-enumerate and re-validate the selection; a selected device that
/// disappeared falls back to the first available one.
pub struct DeviceManager {
    platform: Arc<dyn MediaPlatform>,
    devices: Vec<AudioDevice>,
    selected: Option<String>,
    labels_unlocked: bool,
}

impl DeviceManager {
    pub fn new(platform: Arc<dyn MediaPlatform>) -> Self {
        Self {
            platform,
            devices: Vec::new(),
            selected: None,
            labels_unlocked: false,
        }
    }

    /// Re-enumerate devices and re-validate the current selection.
    ///
    /// Returns the refreshed list. Called on mount and on every hot-plug
    /// notification.
    pub async fn refresh(&mut self) -> Result<&[AudioDevice], DeviceError> {
        if !self.labels_unlocked {
            // Throwaway grant to unlock device labels; released immediately
            // by the platform.
            match self.platform.unlock_labels().await {
                Ok(()) => self.labels_unlocked = true,
                Err(e) => warn!("Could not unlock device labels: {}", e),
            }
        }

        self.devices = self.platform.enumerate_inputs().await?;
        info!("Enumerated {} audio input device(s)", self.devices.len());

        self.revalidate_selection();
        Ok(&self.devices)
    }

    /// Drop a vanished selection back to the first available device
    fn revalidate_selection(&mut self) {
        let still_present = self
            .selected
            .as_deref()
            .map(|id| self.devices.iter().any(|d| d.id == id))
            .unwrap_or(false);

        if !still_present {
            let fallback = self.devices.first().map(|d| d.id.clone());
            if let (Some(old), Some(new)) = (self.selected.as_deref(), fallback.as_deref()) {
                warn!("Selected device {} is gone; falling back to {}", old, new);
            }
            self.selected = fallback;
        }
    }

    /// Explicitly switch to a device, validating it against the current list
    pub fn switch_microphone(&mut self, device_id: &str) -> Result<(), DeviceError> {
        if !self.devices.iter().any(|d| d.id == device_id) {
            return Err(DeviceError::NotFound(device_id.to_string()));
        }
        info!("Switching microphone to {}", device_id);
        self.selected = Some(device_id.to_string());
        Ok(())
    }

    /// Currently selected device id, if any device is available
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// First enumerated device id, used by the automatic fallback path
    pub fn first_available(&self) -> Option<&str> {
        self.devices.first().map(|d| d.id.as_str())
    }

    /// Last enumerated device list
    pub fn devices(&self) -> &[AudioDevice] {
        &self.devices
    }
}
