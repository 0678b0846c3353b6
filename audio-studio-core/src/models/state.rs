use super::source::SourceKind;

/// Source router state machine.
///
/// ```text
///            connect_microphone ─→ MicrophoneActive
/// Idle ─┬──  connect_system_audio ─→ SystemLoopbackActive
///       └──  connect_element ─→ ElementActive
/// any ── disconnect ─→ Idle
/// ```
///
/// Every connect releases the previous source before attaching the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Idle,
    MicrophoneActive,
    SystemLoopbackActive,
    ElementActive,
}

impl RouterState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn active_kind(&self) -> Option<SourceKind> {
        match self {
            Self::Idle => None,
            Self::MicrophoneActive => Some(SourceKind::Microphone),
            Self::SystemLoopbackActive => Some(SourceKind::SystemLoopback),
            Self::ElementActive => Some(SourceKind::MediaElement),
        }
    }
}

impl From<Option<SourceKind>> for RouterState {
    fn from(kind: Option<SourceKind>) -> Self {
        match kind {
            None => Self::Idle,
            Some(SourceKind::Microphone) => Self::MicrophoneActive,
            Some(SourceKind::SystemLoopback) => Self::SystemLoopbackActive,
            Some(SourceKind::MediaElement) => Self::ElementActive,
        }
    }
}

/// Lifecycle of the shared processing context.
///
/// ```text
/// Suspended ⇄ Running
///     └──────────┴─→ Closed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    Suspended,
    Running,
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_kind_round_trip() {
        for kind in [
            SourceKind::Microphone,
            SourceKind::SystemLoopback,
            SourceKind::MediaElement,
        ] {
            assert_eq!(RouterState::from(Some(kind)).active_kind(), Some(kind));
        }
        assert!(RouterState::from(None).is_idle());
    }
}
