//! Host device enumeration.
//!
//! cpal exposes no loopback endpoints on most hosts. PulseAudio and PipeWire
//! publish each sink's "monitor" as an input device, which is what system
//! audio capture uses outside Windows.

use cpal::traits::{DeviceTrait, HostTrait};

use audio_studio_core::models::audio_models::{AudioDevice, DeviceKind};

use crate::error::CpalError;

/// Whether an input device name denotes a sink monitor.
pub fn is_monitor_name(name: &str) -> bool {
    name.to_ascii_lowercase().contains("monitor")
}

/// List input and output devices of the default host.
pub fn list_devices() -> Result<Vec<AudioDevice>, CpalError> {
    let host = cpal::default_host();
    let default_input = host.default_input_device().and_then(|d| d.name().ok());
    let default_output = host.default_output_device().and_then(|d| d.name().ok());

    let mut devices = Vec::new();
    for device in host.input_devices()? {
        let Ok(name) = device.name() else { continue };
        let kind = if is_monitor_name(&name) {
            DeviceKind::Loopback
        } else {
            DeviceKind::Microphone
        };
        devices.push(AudioDevice {
            id: format!("input:{}", name),
            is_default: default_input.as_deref() == Some(name.as_str()),
            name,
            kind,
        });
    }
    for device in host.output_devices()? {
        let Ok(name) = device.name() else { continue };
        devices.push(AudioDevice {
            id: format!("output:{}", name),
            is_default: default_output.as_deref() == Some(name.as_str()),
            name,
            kind: DeviceKind::Output,
        });
    }
    Ok(devices)
}

/// Name of the first monitor input, if the host publishes one.
pub fn find_monitor_input() -> Option<String> {
    let host = cpal::default_host();
    let devices = host.input_devices().ok()?;
    devices
        .filter_map(|d| d.name().ok())
        .find(|name| is_monitor_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monitor_names() {
        assert!(is_monitor_name("Monitor of Built-in Audio Analog Stereo"));
        assert!(is_monitor_name("alsa_output.pci.analog-stereo.monitor"));
        assert!(!is_monitor_name("USB Microphone"));
    }
}
