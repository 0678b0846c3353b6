//! Capture availability checks.
//!
//! Desktop hosts show no consent prompt to cpal clients; a microphone the
//! user has blocked shows up as a default device whose config cannot be read.

use cpal::traits::{DeviceTrait, HostTrait};

use crate::devices;
use crate::error::CpalError;

/// Check if microphone access is available.
///
/// Returns `Err(NoDevice)` when there is no input device at all and
/// `Ok(false)` when one exists but cannot be opened.
pub fn check_microphone_permission() -> Result<bool, CpalError> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or(CpalError::NoDevice("input"))?;

    match device.default_input_config() {
        Ok(_) => Ok(true),
        Err(cpal::DefaultStreamConfigError::DeviceNotAvailable) => Err(CpalError::NoDevice("input")),
        Err(e) => {
            log::warn!("Microphone config unavailable, treating as denied: {}", e);
            Ok(false)
        }
    }
}

/// Whether system audio can be captured on this host.
pub fn check_system_audio_permission() -> bool {
    if cfg!(target_os = "windows") {
        // WASAPI loopback is unrestricted
        return cpal::default_host().default_output_device().is_some();
    }
    devices::find_monitor_input().is_some()
}
