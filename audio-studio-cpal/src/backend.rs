use async_trait::async_trait;

use audio_studio_core::models::audio_models::AudioDevice;
use audio_studio_core::models::error::StudioError;
use audio_studio_core::traits::capture_backend::{CaptureBackend, LiveStream};

use crate::devices;
use crate::permissions;
use crate::stream::{CpalCaptureStream, DeviceSelector};

/// `CaptureBackend` for the default cpal host.
///
/// Streams are only opened when the router starts them; a request merely
/// checks that the endpoint exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }

    /// Endpoint used for system audio, or None when the host has no loopback.
    pub fn loopback_selector() -> Option<DeviceSelector> {
        if cfg!(target_os = "windows") {
            return permissions::check_system_audio_permission().then_some(DeviceSelector::DefaultOutput);
        }
        devices::find_monitor_input().map(DeviceSelector::Named)
    }
}

#[async_trait]
impl CaptureBackend for CpalBackend {
    async fn request_microphone(&self) -> Result<Box<dyn LiveStream>, StudioError> {
        if !permissions::check_microphone_permission()? {
            return Err(StudioError::PermissionDenied);
        }
        Ok(Box::new(CpalCaptureStream::new(DeviceSelector::DefaultInput)))
    }

    async fn request_display_capture(&self) -> Result<Box<dyn LiveStream>, StudioError> {
        match Self::loopback_selector() {
            Some(selector) => Ok(Box::new(CpalCaptureStream::new(selector))),
            None => {
                log::warn!("No loopback endpoint on this host; capture has no audio track");
                Ok(Box::new(CpalCaptureStream::without_audio()))
            }
        }
    }

    fn available_devices(&self) -> Vec<AudioDevice> {
        devices::list_devices().unwrap_or_else(|e| {
            log::warn!("Device enumeration failed: {}", e);
            Vec::new()
        })
    }
}
