//! Capture streams on a dedicated thread.
//!
//! `cpal::Stream` is not `Send` on every host, so each capture owns a thread
//! that builds, plays, and finally drops its stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use audio_studio_core::models::error::StudioError;
use audio_studio_core::traits::capture_backend::{AudioBufferCallback, LiveStream};

use crate::error::CpalError;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Which endpoint a capture stream opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    DefaultInput,
    /// Loopback on the default render endpoint (WASAPI only).
    DefaultOutput,
    Named(String),
}

impl DeviceSelector {
    fn resolve(&self, host: &cpal::Host) -> Result<cpal::Device, CpalError> {
        match self {
            Self::DefaultInput => host.default_input_device().ok_or(CpalError::NoDevice("input")),
            Self::DefaultOutput => host.default_output_device().ok_or(CpalError::NoDevice("output")),
            Self::Named(name) => host
                .input_devices()?
                .find(|d| d.name().is_ok_and(|n| &n == name))
                .ok_or(CpalError::NoDevice("named input")),
        }
    }

    fn label(&self) -> String {
        match self {
            Self::DefaultInput => "default input".into(),
            Self::DefaultOutput => "default output (loopback)".into(),
            Self::Named(name) => name.clone(),
        }
    }
}

/// A `LiveStream` backed by a cpal input stream.
pub struct CpalCaptureStream {
    selector: Option<DeviceSelector>,
    running: Arc<AtomicBool>,
    capture_handle: Option<thread::JoinHandle<()>>,
}

impl CpalCaptureStream {
    pub fn new(selector: DeviceSelector) -> Self {
        Self {
            selector: Some(selector),
            running: Arc::new(AtomicBool::new(false)),
            capture_handle: None,
        }
    }

    /// A granted capture that carries no audio track.
    pub fn without_audio() -> Self {
        Self {
            selector: None,
            running: Arc::new(AtomicBool::new(false)),
            capture_handle: None,
        }
    }
}

impl LiveStream for CpalCaptureStream {
    fn audio_track_count(&self) -> usize {
        usize::from(self.selector.is_some())
    }

    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), StudioError> {
        let Some(selector) = self.selector.clone() else {
            return Err(StudioError::NoAudioTrack);
        };
        if self.running.load(Ordering::SeqCst) {
            return Err(StudioError::ConfigurationFailed("capture already running".into()));
        }

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);

        let handle = thread::Builder::new()
            .name("cpal-capture".into())
            .spawn(move || {
                let stream = match build_capture_stream(&selector, callback) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        running.store(false, Ordering::SeqCst);
                        return;
                    }
                };
                while running.load(Ordering::SeqCst) {
                    thread::sleep(POLL_INTERVAL);
                }
                drop(stream);
            })
            .map_err(|e| StudioError::Unknown(format!("failed to spawn capture thread: {}", e)))?;

        let ready = ready_rx
            .recv()
            .map_err(|_| CpalError::Thread("capture thread exited before starting".into()));
        match ready {
            Ok(Ok(())) => {
                self.capture_handle = Some(handle);
                Ok(())
            }
            Ok(Err(e)) | Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = handle.join();
                Err(e.into())
            }
        }
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.capture_handle.take() {
            let _ = handle.join();
        }
    }

    fn is_live(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn label(&self) -> String {
        self.selector
            .as_ref()
            .map_or_else(|| "no audio".into(), DeviceSelector::label)
    }
}

impl Drop for CpalCaptureStream {
    fn drop(&mut self) {
        self.stop();
    }
}

fn build_capture_stream(
    selector: &DeviceSelector,
    callback: AudioBufferCallback,
) -> Result<cpal::Stream, CpalError> {
    let host = cpal::default_host();
    let device = selector.resolve(&host)?;
    let config = match selector {
        DeviceSelector::DefaultOutput => device.default_output_config()?,
        _ => device.default_input_config()?,
    };
    log::info!(
        "Opening {} ({}): {:?}",
        selector.label(),
        device.name().unwrap_or_else(|_| "Unknown".into()),
        config
    );

    let sample_rate = config.sample_rate().0;
    let channels = config.channels();
    let err_fn = |err: cpal::StreamError| log::error!("Capture stream error: {}", err);

    let stream = match config.sample_format() {
        cpal::SampleFormat::F32 => device.build_input_stream(
            &config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                callback(data, sample_rate, channels);
            },
            err_fn,
            None,
        )?,
        cpal::SampleFormat::I16 => {
            let mut converted = Vec::new();
            device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    converted.clear();
                    converted.extend(data.iter().map(|&s| s as f32 / 32768.0));
                    callback(&converted, sample_rate, channels);
                },
                err_fn,
                None,
            )?
        }
        format => return Err(CpalError::UnsupportedFormat(format!("{:?}", format))),
    };
    stream.play()?;
    Ok(stream)
}
