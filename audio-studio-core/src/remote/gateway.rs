use std::fmt;
use std::time::Duration;

use crate::models::config::StudioConfig;
use crate::traits::analysis_service::{AnalysisRequest, AnalysisService};

/// Outcome shown to the user. Never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisReport {
    /// Free-text report from the service.
    Text(String),
    /// No credential is configured; nothing was sent.
    Placeholder(String),
    /// The service could not be reached or answered with an error.
    Failed(String),
}

impl AnalysisReport {
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) | Self::Placeholder(text) | Self::Failed(text) => text,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Wraps an [`AnalysisService`] so callers always get a report.
///
/// Without a credential the call is short-circuited: after the configured
/// pacing delay a labeled placeholder is returned and the service is never
/// contacted. Service errors become a "failed to connect" report.
pub struct AnalysisGateway<S: AnalysisService> {
    service: S,
    api_key: Option<String>,
    placeholder_delay: Duration,
}

impl<S: AnalysisService> AnalysisGateway<S> {
    pub fn new(service: S, config: &StudioConfig) -> Self {
        Self {
            service,
            api_key: config
                .analysis_api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            placeholder_delay: Duration::from_millis(config.analysis_placeholder_delay_ms),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn inner(&self) -> &S {
        &self.service
    }

    pub async fn analyze(&self, audio: Vec<u8>, mime_type: &str, context: &str) -> AnalysisReport {
        let Some(api_key) = self.api_key.clone() else {
            tokio::time::sleep(self.placeholder_delay).await;
            return AnalysisReport::Placeholder(format!(
                "[Placeholder] No analysis API key is configured, so this {} was not analyzed. \
                 Set `analysis_api_key` to enable remote analysis.",
                context
            ));
        };

        let request = AnalysisRequest {
            audio,
            mime_type: mime_type.to_string(),
            context: context.to_string(),
            api_key,
        };
        match self.service.analyze(&request).await {
            Ok(text) => AnalysisReport::Text(text),
            Err(err) => {
                log::warn!("Remote analysis failed ({} bytes, {}): {}", request.audio.len(), mime_type, err);
                AnalysisReport::Failed(format!("Failed to connect to the analysis service: {}", err))
            }
        }
    }
}
