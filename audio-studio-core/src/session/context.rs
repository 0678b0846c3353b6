use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, MutexGuard};

use crate::models::config::StudioConfig;
use crate::models::error::StudioError;
use crate::models::source::SourceKind;
use crate::models::state::ContextState;
use crate::processing::analyzer::FrequencyAnalyzer;
use crate::processing::bands::LogBands;
use crate::processing::tap::SignalTap;
use crate::traits::audio_sink::AudioSink;

/// Shared analysis pipeline for one application instance.
///
/// Constructed once at startup and handed to the router and the display loop.
/// The analyzer and its transform are created lazily on first use and never
/// rebuilt; configuration is fixed for the lifetime of the context.
pub struct AnalysisContext {
    config: StudioConfig,
    state: Mutex<ContextState>,
    analyzer: OnceLock<Mutex<FrequencyAnalyzer>>,
    bands: OnceLock<LogBands>,
    output: Option<Arc<dyn AudioSink>>,
}

impl AnalysisContext {
    pub fn new(config: StudioConfig) -> Result<Self, StudioError> {
        config.validate().map_err(StudioError::ConfigurationFailed)?;
        Ok(Self {
            config,
            state: Mutex::new(ContextState::Suspended),
            analyzer: OnceLock::new(),
            bands: OnceLock::new(),
            output: None,
        })
    }

    /// Attach the audible output that element sources are routed to.
    pub fn with_output(mut self, sink: Arc<dyn AudioSink>) -> Self {
        self.output = Some(sink);
        self
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    pub fn state(&self) -> ContextState {
        *self.state.lock()
    }

    /// Resume processing. Fails once the context is closed.
    pub fn resume(&self) -> Result<(), StudioError> {
        let mut state = self.state.lock();
        match *state {
            ContextState::Closed => Err(StudioError::ContextClosed),
            ContextState::Running => Ok(()),
            ContextState::Suspended => {
                log::debug!("Analysis context resumed");
                *state = ContextState::Running;
                Ok(())
            }
        }
    }

    pub fn suspend(&self) {
        let mut state = self.state.lock();
        if *state == ContextState::Running {
            *state = ContextState::Suspended;
        }
    }

    /// Close the context for good and detach whatever the analyzer observes.
    pub fn close(&self) {
        *self.state.lock() = ContextState::Closed;
        if let Some(analyzer) = self.analyzer.get() {
            analyzer.lock().detach();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state() == ContextState::Closed
    }

    /// The shared analyzer. Holding the guard blocks router transitions, so
    /// callers poll and release it within one display frame.
    pub fn analyzer(&self) -> MutexGuard<'_, FrequencyAnalyzer> {
        self.analyzer
            .get_or_init(|| Mutex::new(FrequencyAnalyzer::from_validated(&self.config)))
            .lock()
    }

    /// Display banding for `display_bars` bars over the analyzer's bins.
    pub fn bands(&self) -> &LogBands {
        self.bands
            .get_or_init(|| LogBands::for_bins(self.config.display_bars, self.config.bin_count()))
    }

    pub fn output(&self) -> Option<&Arc<dyn AudioSink>> {
        self.output.as_ref()
    }

    /// A tap whose window matches the analyzer's transform size.
    pub fn new_tap(&self, kind: SourceKind) -> SignalTap {
        SignalTap::new(kind, self.config.transform_size)
    }
}

impl std::fmt::Debug for AnalysisContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisContext")
            .field("state", &self.state())
            .field("transform_size", &self.config.transform_size)
            .field("has_output", &self.output.is_some())
            .finish()
    }
}
