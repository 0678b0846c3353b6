use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::source::SourceKind;
use crate::processing::ring_buffer::RingBuffer;
use crate::traits::audio_sink::AudioSink;
use crate::traits::capture_backend::AudioBufferCallback;

struct TapInner {
    id: uuid::Uuid,
    kind: SourceKind,
    live: AtomicBool,
    sample_rate: AtomicU32,
    blocks: AtomicU64,
    window: Mutex<RingBuffer>,
    output: Mutex<Option<Arc<dyn AudioSink>>>,
}

/// Passive tap on a live source.
///
/// The source's audio callback feeds the tap; the tap keeps a mono window of
/// the newest samples for the analyzer and, when routed, forwards each block
/// unchanged to audible output. Clones share the same tap.
#[derive(Clone)]
pub struct SignalTap {
    inner: Arc<TapInner>,
}

impl SignalTap {
    pub fn new(kind: SourceKind, window_size: usize) -> Self {
        Self {
            inner: Arc::new(TapInner {
                id: uuid::Uuid::new_v4(),
                kind,
                live: AtomicBool::new(true),
                sample_rate: AtomicU32::new(0),
                blocks: AtomicU64::new(0),
                window: Mutex::new(RingBuffer::new(window_size)),
                output: Mutex::new(None),
            }),
        }
    }

    pub fn id(&self) -> uuid::Uuid {
        self.inner.id
    }

    pub fn kind(&self) -> SourceKind {
        self.inner.kind
    }

    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::SeqCst)
    }

    /// Sample rate of the last delivered block, if any.
    pub fn sample_rate(&self) -> Option<u32> {
        match self.inner.sample_rate.load(Ordering::Relaxed) {
            0 => None,
            rate => Some(rate),
        }
    }

    pub fn blocks_received(&self) -> u64 {
        self.inner.blocks.load(Ordering::Relaxed)
    }

    /// Whether both handles refer to the same tap.
    pub fn same_tap(&self, other: &SignalTap) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Deliver an interleaved block. Ignored once terminated.
    pub fn feed(&self, samples: &[f32], sample_rate: u32, channels: u16) {
        if !self.is_live() || channels == 0 || sample_rate == 0 {
            return;
        }
        self.inner.sample_rate.store(sample_rate, Ordering::Relaxed);
        self.inner.blocks.fetch_add(1, Ordering::Relaxed);
        self.inner
            .window
            .lock()
            .write_downmixed(samples, channels as usize);

        if let Some(ref sink) = *self.inner.output.lock() {
            sink.write(samples, sample_rate, channels);
        }
    }

    /// A callback suitable for `LiveStream::start` and `MediaElement::connect_tap`.
    pub fn callback(&self) -> AudioBufferCallback {
        let tap = self.clone();
        Arc::new(move |samples: &[f32], sample_rate: u32, channels: u16| {
            tap.feed(samples, sample_rate, channels);
        })
    }

    /// Copy the newest mono samples into `out`, zero-padded at the front.
    pub fn copy_latest(&self, out: &mut [f32]) {
        self.inner.window.lock().copy_latest(out);
    }

    pub fn is_routed_to_output(&self) -> bool {
        self.inner.output.lock().is_some()
    }

    pub(crate) fn route_to_output(&self, sink: Arc<dyn AudioSink>) {
        *self.inner.output.lock() = Some(sink);
    }

    pub(crate) fn unroute_output(&self) {
        *self.inner.output.lock() = None;
    }

    /// Permanently stop the tap: no further audio is accepted or forwarded.
    pub fn terminate(&self) {
        self.inner.live.store(false, Ordering::SeqCst);
        self.unroute_output();
        self.inner.window.lock().reset();
    }
}

impl std::fmt::Debug for SignalTap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalTap")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("live", &self.is_live())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        blocks: Mutex<Vec<Vec<f32>>>,
    }

    impl AudioSink for RecordingSink {
        fn write(&self, samples: &[f32], _sample_rate: u32, _channels: u16) {
            self.blocks.lock().push(samples.to_vec());
        }
    }

    #[test]
    fn feed_fills_mono_window() {
        let tap = SignalTap::new(SourceKind::Microphone, 4);
        tap.feed(&[0.5, 0.5, -0.5, -0.5], 48000, 2);

        let mut out = [1.0; 2];
        tap.copy_latest(&mut out);
        assert_eq!(out, [0.5, -0.5]);
        assert_eq!(tap.sample_rate(), Some(48000));
        assert_eq!(tap.blocks_received(), 1);
    }

    #[test]
    fn output_only_when_routed() {
        let sink = Arc::new(RecordingSink::default());
        let tap = SignalTap::new(SourceKind::MediaElement, 8);

        tap.feed(&[0.1], 44100, 1);
        assert!(sink.blocks.lock().is_empty());

        tap.route_to_output(sink.clone());
        tap.feed(&[0.2, 0.3], 44100, 1);
        tap.unroute_output();
        tap.feed(&[0.4], 44100, 1);

        assert_eq!(*sink.blocks.lock(), vec![vec![0.2, 0.3]]);
    }

    #[test]
    fn terminated_tap_ignores_audio() {
        let sink = Arc::new(RecordingSink::default());
        let tap = SignalTap::new(SourceKind::SystemLoopback, 4);
        tap.route_to_output(sink.clone());
        tap.terminate();

        tap.feed(&[1.0, 1.0], 48000, 1);
        assert!(!tap.is_live());
        assert!(!tap.is_routed_to_output());
        assert!(sink.blocks.lock().is_empty());
        assert_eq!(tap.sample_rate(), None);
    }

    #[test]
    fn callback_feeds_the_same_tap() {
        let tap = SignalTap::new(SourceKind::Microphone, 4);
        let callback = tap.callback();
        callback(&[0.25], 16000, 1);

        let mut out = [0.0; 1];
        tap.copy_latest(&mut out);
        assert_eq!(out, [0.25]);
        assert!(tap.same_tap(&tap.clone()));
        assert!(!tap.same_tap(&SignalTap::new(SourceKind::Microphone, 4)));
    }
}
