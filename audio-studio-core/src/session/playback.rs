use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::StudioError;
use crate::models::signal::AudioSignal;
use crate::models::source::ElementId;
use crate::traits::capture_backend::AudioBufferCallback;
use crate::traits::media_element::MediaElement;

/// In-process media element playing a decoded signal.
///
/// The host drives playback by calling `render` from its audio or display
/// loop; each call delivers the next interleaved block to the tap, if one is
/// connected. Like a platform media element it accepts exactly one tap.
pub struct PlaybackElement {
    id: ElementId,
    signal: AudioSignal,
    cursor: Mutex<usize>,
    tap: Mutex<Option<AudioBufferCallback>>,
    closed: AtomicBool,
}

impl PlaybackElement {
    pub fn new(signal: AudioSignal) -> Arc<Self> {
        Arc::new(Self {
            id: ElementId::new(),
            signal,
            cursor: Mutex::new(0),
            tap: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    pub fn signal(&self) -> &AudioSignal {
        &self.signal
    }

    /// Play up to `frames` frames. Returns the number of frames delivered;
    /// zero once the end is reached or the element is closed.
    pub fn render(&self, frames: usize) -> usize {
        if self.is_closed() {
            return 0;
        }
        let (start, end) = {
            let mut cursor = self.cursor.lock();
            let start = *cursor;
            let end = start.saturating_add(frames).min(self.signal.frame_count());
            *cursor = end;
            (start, end)
        };
        if start >= end {
            return 0;
        }

        let channels = self.signal.channel_count() as usize;
        let mut block = Vec::with_capacity((end - start) * channels);
        for frame in start..end {
            for channel in self.signal.channels() {
                block.push(channel[frame]);
            }
        }

        let tap = self.tap.lock().clone();
        if let Some(tap) = tap {
            tap(&block, self.signal.sample_rate(), self.signal.channel_count());
        }
        end - start
    }

    pub fn position_secs(&self) -> f64 {
        *self.cursor.lock() as f64 / self.signal.sample_rate() as f64
    }

    pub fn is_finished(&self) -> bool {
        *self.cursor.lock() >= self.signal.frame_count()
    }

    pub fn rewind(&self) {
        *self.cursor.lock() = 0;
    }

    /// Stop playback for good. The router refuses closed elements.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

impl MediaElement for PlaybackElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn connect_tap(&self, callback: AudioBufferCallback) -> Result<(), StudioError> {
        let mut tap = self.tap.lock();
        if tap.is_some() {
            return Err(StudioError::AlreadyTapped);
        }
        *tap = Some(callback);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for PlaybackElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackElement")
            .field("id", &self.id)
            .field("frames", &self.signal.frame_count())
            .field("position_secs", &self.position_secs())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo() -> AudioSignal {
        AudioSignal::from_channels(
            1000,
            vec![vec![0.1, 0.2, 0.3, 0.4, 0.5], vec![-0.1, -0.2, -0.3, -0.4, -0.5]],
        )
        .unwrap()
    }

    fn recording_tap() -> (AudioBufferCallback, Arc<Mutex<Vec<(Vec<f32>, u32, u16)>>>) {
        let blocks = Arc::new(Mutex::new(Vec::new()));
        let sink = blocks.clone();
        let callback: AudioBufferCallback = Arc::new(move |samples: &[f32], rate: u32, channels: u16| {
            sink.lock().push((samples.to_vec(), rate, channels));
        });
        (callback, blocks)
    }

    #[test]
    fn renders_interleaved_blocks_until_end() {
        let element = PlaybackElement::new(stereo());
        let (callback, blocks) = recording_tap();
        element.connect_tap(callback).unwrap();

        assert_eq!(element.render(3), 3);
        assert_eq!(element.render(3), 2);
        assert_eq!(element.render(3), 0);
        assert!(element.is_finished());

        let blocks = blocks.lock();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].0, vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3]);
        assert_eq!(blocks[0].1, 1000);
        assert_eq!(blocks[0].2, 2);
        assert_eq!(blocks[1].0, vec![0.4, -0.4, 0.5, -0.5]);
    }

    #[test]
    fn accepts_a_single_tap() {
        let element = PlaybackElement::new(stereo());
        let (first, _) = recording_tap();
        let (second, _) = recording_tap();

        element.connect_tap(first).unwrap();
        assert_eq!(element.connect_tap(second), Err(StudioError::AlreadyTapped));
    }

    #[test]
    fn untapped_playback_still_advances() {
        let element = PlaybackElement::new(stereo());
        assert_eq!(element.render(2), 2);
        assert!((element.position_secs() - 0.002).abs() < 1e-12);

        element.rewind();
        assert_eq!(element.position_secs(), 0.0);
    }

    #[test]
    fn closed_element_renders_nothing() {
        let element = PlaybackElement::new(stereo());
        element.close();
        assert!(element.is_closed());
        assert_eq!(element.render(4), 0);
    }
}
