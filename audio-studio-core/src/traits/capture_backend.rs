use std::sync::Arc;

use async_trait::async_trait;

use crate::models::audio_models::AudioDevice;
use crate::models::error::StudioError;

/// Callback invoked when an audio block is available.
///
/// Parameters:
/// - `samples`: Interleaved f32 samples.
/// - `sample_rate`: The actual sample rate of the delivered audio.
/// - `channels`: Number of interleaved channels.
pub type AudioBufferCallback = Arc<dyn Fn(&[f32], u32, u16) + Send + Sync + 'static>;

/// A granted capture stream (microphone or display/system capture).
///
/// Owned by the source router once accepted; stopped on every transition
/// away from it.
pub trait LiveStream: Send {
    /// Number of audio tracks carried by the stream. Display capture may
    /// grant a stream with zero audio tracks.
    fn audio_track_count(&self) -> usize;

    /// Start delivering audio blocks via `callback`.
    ///
    /// The callback may fire on a dedicated audio thread; keep it minimal.
    fn start(&mut self, callback: AudioBufferCallback) -> Result<(), StudioError>;

    /// Stop every track and release the underlying hardware. Idempotent.
    fn stop(&mut self);

    /// Whether the stream is still able to deliver audio.
    fn is_live(&self) -> bool;

    /// Human-readable label of the backing device.
    fn label(&self) -> String;
}

/// Platform capability grants for live capture.
///
/// Both requests may suspend on a user permission prompt and must be
/// treated as fallible.
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// Request an exclusive microphone stream.
    async fn request_microphone(&self) -> Result<Box<dyn LiveStream>, StudioError>;

    /// Request a display/system audio capture stream.
    async fn request_display_capture(&self) -> Result<Box<dyn LiveStream>, StudioError>;

    /// Devices this backend can capture from.
    fn available_devices(&self) -> Vec<AudioDevice> {
        Vec::new()
    }
}
