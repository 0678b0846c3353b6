use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of live input the router can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Microphone,
    SystemLoopback,
    MediaElement,
}

/// Routing rules for a source kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePolicy {
    /// Whether the source is also routed to audible output.
    ///
    /// Capture sources are never routed to output: a microphone would feed
    /// back, and loopback audio is already audible in its own application.
    pub connects_to_output: bool,

    /// Whether the router owns (and must stop) the underlying stream.
    pub owns_stream: bool,
}

impl SourceKind {
    pub const fn policy(self) -> SourcePolicy {
        match self {
            Self::Microphone | Self::SystemLoopback => SourcePolicy {
                connects_to_output: false,
                owns_stream: true,
            },
            Self::MediaElement => SourcePolicy {
                connects_to_output: true,
                owns_stream: false,
            },
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Microphone => "microphone",
            Self::SystemLoopback => "system audio",
            Self::MediaElement => "media element",
        };
        f.write_str(name)
    }
}

/// Identity of a media element, stable across reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub uuid::Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_sources_never_reach_output() {
        assert!(!SourceKind::Microphone.policy().connects_to_output);
        assert!(!SourceKind::SystemLoopback.policy().connects_to_output);
        assert!(SourceKind::MediaElement.policy().connects_to_output);
    }

    #[test]
    fn only_capture_streams_are_owned() {
        assert!(SourceKind::Microphone.policy().owns_stream);
        assert!(SourceKind::SystemLoopback.policy().owns_stream);
        assert!(!SourceKind::MediaElement.policy().owns_stream);
    }

    #[test]
    fn element_ids_are_unique() {
        assert_ne!(ElementId::new(), ElementId::new());
    }
}
