//! # audio-studio-cpal
//!
//! Host audio backend for audio-studio, built on cpal.
//!
//! Provides:
//! - `CpalBackend`: `CaptureBackend` for the microphone and system audio
//! - `CpalCaptureStream`: capture stream running on a dedicated thread
//! - `CpalOutput`: `AudioSink` playing through the default output device
//! - `devices`: device enumeration
//! - `permissions`: capture availability checks
//!
//! System audio uses WASAPI loopback on Windows and a PulseAudio/PipeWire
//! monitor source elsewhere. Hosts without either grant a stream with no
//! audio track, which the router rejects.
//!
//! ## Build Requirements
//! Enable the `cpal` feature. On Linux the ALSA development headers must be
//! installed.
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use audio_studio_core::{AnalysisContext, SourceRouter, StudioConfig};
//! use audio_studio_cpal::{CpalBackend, CpalOutput};
//!
//! let output = Arc::new(CpalOutput::open_default()?);
//! let context = Arc::new(AnalysisContext::new(StudioConfig::default())?.with_output(output));
//! let router = SourceRouter::new(context.clone(), CpalBackend::new());
//! router.connect_microphone().await?;
//! let frame = context.analyzer().poll().clone();
//! ```

#[cfg(feature = "cpal")]
pub mod backend;
#[cfg(feature = "cpal")]
pub mod devices;
#[cfg(feature = "cpal")]
pub mod error;
#[cfg(feature = "cpal")]
pub mod output;
#[cfg(feature = "cpal")]
pub mod permissions;
#[cfg(feature = "cpal")]
pub mod stream;

#[cfg(feature = "cpal")]
pub use backend::CpalBackend;
#[cfg(feature = "cpal")]
pub use error::CpalError;
#[cfg(feature = "cpal")]
pub use output::CpalOutput;
#[cfg(feature = "cpal")]
pub use stream::{CpalCaptureStream, DeviceSelector};
