use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{AudioDevice, RouterDiagnostics};
use crate::models::error::StudioError;
use crate::models::source::{ElementId, SourceKind};
use crate::models::state::RouterState;
use crate::processing::analyzer::FrequencyAnalyzer;
use crate::processing::tap::SignalTap;
use crate::session::context::AnalysisContext;
use crate::traits::capture_backend::{CaptureBackend, LiveStream};
use crate::traits::media_element::MediaElement;
use crate::traits::router_delegate::RouterDelegate;

/// A capture stream owned by the router, feeding its own tap.
struct CapturedStream {
    stream: Box<dyn LiveStream>,
    tap: SignalTap,
}

/// A media element tapped through a cached, reusable tap.
struct TappedElement {
    element: Arc<dyn MediaElement>,
    tap: SignalTap,
}

/// The router's single active input.
enum LiveSource {
    None,
    Microphone(CapturedStream),
    SystemLoopback(CapturedStream),
    MediaElement(TappedElement),
}

impl LiveSource {
    fn kind(&self) -> Option<SourceKind> {
        match self {
            Self::None => None,
            Self::Microphone(_) => Some(SourceKind::Microphone),
            Self::SystemLoopback(_) => Some(SourceKind::SystemLoopback),
            Self::MediaElement(_) => Some(SourceKind::MediaElement),
        }
    }

    fn tap(&self) -> Option<&SignalTap> {
        match self {
            Self::None => None,
            Self::Microphone(captured) | Self::SystemLoopback(captured) => Some(&captured.tap),
            Self::MediaElement(tapped) => Some(&tapped.tap),
        }
    }

    /// Detach from the analyzer and output, then stop whatever the router owns.
    ///
    /// Element taps stay live: the element keeps feeding them and a later
    /// reconnect reuses them.
    fn release(self, analyzer: &mut FrequencyAnalyzer) {
        let Some(policy) = self.kind().map(SourceKind::policy) else {
            return;
        };
        let (tap, stream) = match self {
            Self::None => return,
            Self::Microphone(captured) | Self::SystemLoopback(captured) => {
                (captured.tap, Some(captured.stream))
            }
            Self::MediaElement(tapped) => (tapped.tap, None),
        };

        if analyzer.attached_tap().is_some_and(|t| t.same_tap(&tap)) {
            analyzer.detach();
        }
        tap.unroute_output();
        if policy.owns_stream {
            if let Some(mut stream) = stream {
                stream.stop();
            }
            tap.terminate();
        }
    }
}

/// A tap kept for reconnecting an element after switching away from it.
struct CachedTap {
    element: Arc<dyn MediaElement>,
    tap: SignalTap,
}

struct RouterInner {
    active: LiveSource,
    /// Bumped by `disconnect()`; acquisitions started under an older
    /// generation are orphaned when they resolve.
    generation: u64,
    element_taps: HashMap<ElementId, CachedTap>,
    diagnostics: RouterDiagnostics,
}

impl RouterInner {
    /// Drop and terminate cached taps of closed elements, except the active one.
    fn evict_closed_elements(&mut self) -> usize {
        let active = match &self.active {
            LiveSource::MediaElement(tapped) => Some(tapped.element.id()),
            _ => None,
        };
        let before = self.element_taps.len();
        self.element_taps.retain(|id, cached| {
            if Some(*id) == active || !cached.element.is_closed() {
                return true;
            }
            cached.tap.terminate();
            false
        });
        before - self.element_taps.len()
    }
}

/// Holds at most one live input and connects it to the shared analyzer.
///
/// ```text
/// [CaptureBackend] ── mic / display stream ──→ [SignalTap] ──→ [FrequencyAnalyzer]
/// [MediaElement]   ── element tap ───────────→ [SignalTap] ──→ [FrequencyAnalyzer]
///                                                   └──→ [AudioSink] (elements only)
/// ```
///
/// Every successful connect releases the previous source before the new one
/// is attached. A failed connect leaves the router exactly as it was.
pub struct SourceRouter<B: CaptureBackend> {
    context: Arc<AnalysisContext>,
    backend: B,
    inner: Mutex<RouterInner>,
    delegate: Option<Arc<dyn RouterDelegate>>,
}

impl<B: CaptureBackend> SourceRouter<B> {
    pub fn new(context: Arc<AnalysisContext>, backend: B) -> Self {
        Self {
            context,
            backend,
            inner: Mutex::new(RouterInner {
                active: LiveSource::None,
                generation: 0,
                element_taps: HashMap::new(),
                diagnostics: RouterDiagnostics::default(),
            }),
            delegate: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn RouterDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn context(&self) -> &Arc<AnalysisContext> {
        &self.context
    }

    pub fn state(&self) -> RouterState {
        RouterState::from(self.inner.lock().active.kind())
    }

    pub fn active_kind(&self) -> Option<SourceKind> {
        self.inner.lock().active.kind()
    }

    /// Tap of the active source, if any.
    pub fn active_tap(&self) -> Option<SignalTap> {
        self.inner.lock().active.tap().cloned()
    }

    pub fn diagnostics(&self) -> RouterDiagnostics {
        self.inner.lock().diagnostics
    }

    /// Number of elements whose taps are kept for reconnecting.
    pub fn cached_element_count(&self) -> usize {
        self.inner.lock().element_taps.len()
    }

    pub fn available_devices(&self) -> Vec<AudioDevice> {
        self.backend.available_devices()
    }

    /// Capture the microphone. Never routed to audible output.
    pub async fn connect_microphone(&self) -> Result<(), StudioError> {
        self.connect_capture(SourceKind::Microphone).await
    }

    /// Capture system/display audio. The granted stream must carry an audio
    /// track; a silent grant is stopped and rejected.
    pub async fn connect_system_audio(&self) -> Result<(), StudioError> {
        self.connect_capture(SourceKind::SystemLoopback).await
    }

    /// Tap an already playing media element and route it to output.
    ///
    /// Reconnecting the active element is a no-op.
    pub fn connect_element(&self, element: Arc<dyn MediaElement>) -> Result<(), StudioError> {
        let kind = SourceKind::MediaElement;
        if let Err(error) = self.context.resume() {
            return Err(self.fail(kind, error));
        }
        if element.is_closed() {
            return Err(self.fail(kind, StudioError::SourceEnded));
        }

        let outcome = {
            let mut inner = self.inner.lock();
            self.attach_element(&mut inner, element)
        };
        match outcome {
            Ok(Some(state)) => {
                self.notify_state(state);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(error) => Err(self.fail(kind, error)),
        }
    }

    /// Release the active source, if any, and return to `Idle`.
    ///
    /// Idempotent. Any acquisition still pending resolves as orphaned.
    pub fn disconnect(&self) {
        let released = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            let previous = std::mem::replace(&mut inner.active, LiveSource::None);
            let kind = previous.kind();
            if kind.is_some() {
                previous.release(&mut self.context.analyzer());
                inner.diagnostics.releases += 1;
            }
            inner.evict_closed_elements();
            kind
        };

        if let Some(kind) = released {
            log::info!("Disconnected {}", kind);
            self.notify_state(RouterState::Idle);
        }
    }

    async fn connect_capture(&self, kind: SourceKind) -> Result<(), StudioError> {
        if let Err(error) = self.context.resume() {
            return Err(self.fail(kind, error));
        }
        let generation = self.inner.lock().generation;

        let acquired = match kind {
            SourceKind::Microphone => self.backend.request_microphone().await,
            _ => self.backend.request_display_capture().await,
        };
        let mut stream = match acquired {
            Ok(stream) => stream,
            Err(error) => return Err(self.fail(kind, error)),
        };

        if kind == SourceKind::SystemLoopback && stream.audio_track_count() == 0 {
            stream.stop();
            return Err(self.fail(kind, StudioError::NoAudioTrack));
        }

        let outcome = {
            let mut inner = self.inner.lock();
            if inner.generation != generation {
                stream.stop();
                inner.diagnostics.orphaned += 1;
                Err(StudioError::Superseded)
            } else {
                self.attach_stream(&mut inner, kind, stream)
            }
        };

        match outcome {
            Ok(state) => {
                self.notify_state(state);
                Ok(())
            }
            Err(StudioError::Superseded) => {
                log::warn!("Stopped {} stream granted after disconnect", kind);
                Err(StudioError::Superseded)
            }
            Err(error) => Err(self.fail(kind, error)),
        }
    }

    fn attach_stream(
        &self,
        inner: &mut RouterInner,
        kind: SourceKind,
        mut stream: Box<dyn LiveStream>,
    ) -> Result<RouterState, StudioError> {
        if self.context.is_closed() {
            stream.stop();
            return Err(StudioError::ContextClosed);
        }

        let tap = self.context.new_tap(kind);
        if let Err(error) = stream.start(tap.callback()) {
            stream.stop();
            tap.terminate();
            return Err(error);
        }
        if !stream.is_live() {
            stream.stop();
            tap.terminate();
            return Err(StudioError::SourceEnded);
        }
        log::info!("Capturing {} from {}", kind, stream.label());

        let captured = CapturedStream { stream, tap };
        let source = match kind {
            SourceKind::Microphone => LiveSource::Microphone(captured),
            _ => LiveSource::SystemLoopback(captured),
        };
        Ok(self.install(inner, source))
    }

    fn attach_element(
        &self,
        inner: &mut RouterInner,
        element: Arc<dyn MediaElement>,
    ) -> Result<Option<RouterState>, StudioError> {
        let id = element.id();
        if let LiveSource::MediaElement(active) = &inner.active {
            if active.element.id() == id {
                inner.diagnostics.connects += 1;
                return Ok(None);
            }
        }

        let tap = match inner.element_taps.get(&id).map(|cached| cached.tap.clone()) {
            Some(tap) => tap,
            None => {
                let tap = self.context.new_tap(SourceKind::MediaElement);
                match element.connect_tap(tap.callback()) {
                    Ok(()) => {}
                    Err(StudioError::AlreadyTapped) => {
                        log::debug!("Element {:?} was already tapped; reusing its connection", id);
                    }
                    Err(error) => return Err(error),
                }
                inner.element_taps.insert(
                    id,
                    CachedTap {
                        element: Arc::clone(&element),
                        tap: tap.clone(),
                    },
                );
                tap
            }
        };

        let source = LiveSource::MediaElement(TappedElement { element, tap });
        Ok(Some(self.install(inner, source)))
    }

    /// Swap `source` in as the active input. Lock order: router, then analyzer.
    fn install(&self, inner: &mut RouterInner, source: LiveSource) -> RouterState {
        let kind = source.kind();
        let mut analyzer = self.context.analyzer();

        let previous = std::mem::replace(&mut inner.active, LiveSource::None);
        previous.release(&mut analyzer);

        if let (Some(kind), Some(tap)) = (kind, source.tap()) {
            analyzer.attach(tap.clone());
            if kind.policy().connects_to_output {
                if let Some(sink) = self.context.output() {
                    tap.route_to_output(Arc::clone(sink));
                }
            }
        }

        inner.active = source;
        inner.diagnostics.connects += 1;
        let evicted = inner.evict_closed_elements();
        if evicted > 0 {
            log::debug!("Dropped taps of {} closed elements", evicted);
        }
        RouterState::from(kind)
    }

    fn fail(&self, kind: SourceKind, error: StudioError) -> StudioError {
        self.inner.lock().diagnostics.rejected += 1;
        log::warn!("Failed to connect {}: {}", kind, error);
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(&error);
        }
        error
    }

    fn notify_state(&self, state: RouterState) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(state);
        }
    }
}

impl<B: CaptureBackend> Drop for SourceRouter<B> {
    fn drop(&mut self) {
        let previous = std::mem::replace(&mut self.inner.get_mut().active, LiveSource::None);
        previous.release(&mut self.context.analyzer());
    }
}
