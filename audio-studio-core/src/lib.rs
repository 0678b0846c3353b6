//! # audio-studio-core
//!
//! Platform-agnostic audio routing and analysis core.
//!
//! Provides live source routing with feedback-safe output rules, spectral
//! analysis for visualization, offline mixing, WAV encoding, and decoding of
//! uploaded files. Host audio backends (see `audio-studio-cpal`) implement the
//! `CaptureBackend` and `AudioSink` traits and plug into the generic
//! `SourceRouter`.
//!
//! ## Architecture
//!
//! ```text
//! audio-studio-core (this crate)
//! ├── traits/       ← CaptureBackend, LiveStream, MediaElement, AudioSink, RouterDelegate, AnalysisService
//! ├── models/       ← StudioError, StudioConfig, AudioSignal, SourceKind, RouterState, ExportFormat
//! ├── processing/   ← SignalTap, FrequencyAnalyzer, LogBands, OfflineMixer, WAV encoding
//! ├── session/      ← AnalysisContext, SourceRouter, PlaybackElement
//! ├── storage/      ← decoding, export to disk
//! └── remote/       ← AnalysisGateway
//! ```
//!
//! ## Data flow
//!
//! ```text
//! [mic / display stream / element] → [SignalTap] → [FrequencyAnalyzer] → SpectrumFrame → LogBands
//!                                          └──→ [AudioSink] (elements only)
//!
//! [file] → decode → AudioSignal ─┐
//! [file] → decode → AudioSignal ─┴→ OfflineMixer → wav_format::encode → export
//! ```

pub mod models;
pub mod processing;
pub mod remote;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{AudioDevice, DeviceKind, RouterDiagnostics};
pub use models::config::StudioConfig;
pub use models::error::StudioError;
pub use models::export::{ExportFormat, ExportMetadata};
pub use models::signal::AudioSignal;
pub use models::source::{ElementId, SourceKind, SourcePolicy};
pub use models::state::{ContextState, RouterState};
pub use processing::analyzer::{FrequencyAnalyzer, SpectrumFrame};
pub use processing::bands::LogBands;
pub use processing::offline_mixer::{mix, mix_tracks, OfflineMixer};
pub use processing::ring_buffer::RingBuffer;
pub use processing::tap::SignalTap;
pub use processing::wav_format::{encode, EncodedContainer, WavHeader};
pub use remote::{AnalysisGateway, AnalysisReport};
pub use session::context::AnalysisContext;
pub use session::playback::PlaybackElement;
pub use session::router::SourceRouter;
pub use storage::decode::{decode_bytes, decode_file};
pub use storage::export::{export, write_export};
pub use traits::analysis_service::{AnalysisRequest, AnalysisService};
pub use traits::audio_sink::AudioSink;
pub use traits::capture_backend::{AudioBufferCallback, CaptureBackend, LiveStream};
pub use traits::media_element::MediaElement;
pub use traits::router_delegate::RouterDelegate;
