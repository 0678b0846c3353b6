use serde::{Deserialize, Serialize};

/// Which capture path a device belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Microphone,
    Loopback,
    Output,
}

/// An audio device reported by a capture backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDevice {
    pub id: String,
    pub name: String,
    pub kind: DeviceKind,
    pub is_default: bool,
}

/// Counters for debugging source routing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterDiagnostics {
    /// Successful connects, including same-element no-ops.
    pub connects: u64,
    /// Disconnects that actually released a source.
    pub releases: u64,
    /// Connects that failed and left the router unchanged.
    pub rejected: u64,
    /// Acquisitions that resolved after being superseded and were stopped.
    pub orphaned: u64,
}
