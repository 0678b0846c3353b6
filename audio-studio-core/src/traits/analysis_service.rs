use async_trait::async_trait;

use crate::models::error::StudioError;

/// Payload sent to the remote analysis service.
#[derive(Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub audio: Vec<u8>,
    pub mime_type: String,
    /// Short label describing what the audio is (e.g. "combined mix").
    pub context: String,
    /// Credential from `StudioConfig::analysis_api_key`.
    pub api_key: String,
}

impl std::fmt::Debug for AnalysisRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisRequest")
            .field("audio_len", &self.audio.len())
            .field("mime_type", &self.mime_type)
            .field("context", &self.context)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Opaque remote service returning a free-text report about audio.
///
/// Implementors must be `Send + Sync` so they can be shared across tasks.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<String, StudioError>;
}
