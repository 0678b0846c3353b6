use thiserror::Error;

/// Errors surfaced by the studio core.
///
/// The `Display` text of each variant is suitable for showing to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StudioError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available")]
    DeviceNotAvailable,

    #[error("the captured stream has no audio track")]
    NoAudioTrack,

    #[error("the audio source has already ended")]
    SourceEnded,

    #[error("media element is already tapped")]
    AlreadyTapped,

    #[error("superseded by a later source change")]
    Superseded,

    #[error("processing context is closed")]
    ContextClosed,

    #[error("invalid audio signal: {0}")]
    InvalidSignal(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("decode failed: {0}")]
    DecodeFailed(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl StudioError {
    /// Whether this error means a capture capability was not granted.
    ///
    /// A granted loopback stream without audio counts as denied.
    pub fn is_capability_denied(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied | Self::DeviceNotAvailable | Self::NoAudioTrack
        )
    }
}
