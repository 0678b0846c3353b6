use crate::models::error::StudioError;
use crate::models::source::ElementId;

use super::capture_backend::AudioBufferCallback;

/// An app-owned playback element whose audio can be tapped.
///
/// Like a platform media element, it accepts a single tap for its whole
/// lifetime: once tapped, its audio only flows through that tap.
pub trait MediaElement: Send + Sync {
    fn id(&self) -> ElementId;

    /// Route the element's rendered audio into `callback`.
    ///
    /// Returns `StudioError::AlreadyTapped` if a tap was installed before.
    fn connect_tap(&self, callback: AudioBufferCallback) -> Result<(), StudioError>;

    /// Whether the element has been closed and can no longer render.
    fn is_closed(&self) -> bool;
}
