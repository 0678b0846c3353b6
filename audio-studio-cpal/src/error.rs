use thiserror::Error;

use audio_studio_core::models::error::StudioError;

/// Errors raised while talking to the host audio API.
#[derive(Debug, Error)]
pub enum CpalError {
    #[error("no {0} device available")]
    NoDevice(&'static str),

    #[error("failed to read device config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build stream: {0}")]
    Build(#[from] cpal::BuildStreamError),

    #[error("failed to start stream: {0}")]
    Play(#[from] cpal::PlayStreamError),

    #[error("failed to enumerate devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    #[error("audio thread failed: {0}")]
    Thread(String),
}

impl From<CpalError> for StudioError {
    fn from(err: CpalError) -> Self {
        match err {
            CpalError::NoDevice(_)
            | CpalError::Build(cpal::BuildStreamError::DeviceNotAvailable)
            | CpalError::Config(cpal::DefaultStreamConfigError::DeviceNotAvailable)
            | CpalError::Play(cpal::PlayStreamError::DeviceNotAvailable) => StudioError::DeviceNotAvailable,
            CpalError::Thread(msg) => StudioError::Unknown(msg),
            other => StudioError::ConfigurationFailed(other.to_string()),
        }
    }
}
