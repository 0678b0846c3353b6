//! Boundary to the remote audio-analysis collaborator.
//!
//! The core never interprets the collaborator's output; it only guarantees
//! that callers always receive a displayable report.

pub mod gateway;

pub use gateway::{AnalysisGateway, AnalysisReport};
