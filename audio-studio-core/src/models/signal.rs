use std::sync::Arc;

use super::error::StudioError;

/// A decoded, immutable multi-channel sample buffer.
///
/// Samples are planar 32-bit floats, nominally in `[-1.0, 1.0]` (mix results
/// may exceed that range until encoding). Cloning is cheap: the sample data
/// is shared and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    sample_rate: u32,
    frames: usize,
    channels: Arc<[Vec<f32>]>,
}

impl AudioSignal {
    /// Build a signal from one sample vector per channel.
    ///
    /// Requires a positive sample rate, at least one channel, and equal
    /// channel lengths.
    pub fn from_channels(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self, StudioError> {
        if sample_rate == 0 {
            return Err(StudioError::InvalidSignal("sample rate must be positive".into()));
        }
        let Some(first) = channels.first() else {
            return Err(StudioError::InvalidSignal("at least one channel is required".into()));
        };
        let frames = first.len();
        if let Some((index, ch)) = channels.iter().enumerate().find(|(_, ch)| ch.len() != frames) {
            return Err(StudioError::InvalidSignal(format!(
                "channel {} has {} frames, expected {}",
                index,
                ch.len(),
                frames
            )));
        }
        Ok(Self {
            sample_rate,
            frames,
            channels: channels.into(),
        })
    }

    /// Build a signal whose shape the caller derived from valid signals.
    pub(crate) fn from_shaped(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        debug_assert!(sample_rate > 0 && !channels.is_empty());
        let frames = channels.first().map_or(0, Vec::len);
        debug_assert!(channels.iter().all(|ch| ch.len() == frames));
        Self {
            sample_rate,
            frames,
            channels: channels.into(),
        }
    }

    /// Build a signal from interleaved samples `[c0 f0, c1 f0, c0 f1, ...]`.
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(sample_rate: u32, channel_count: u16, samples: &[f32]) -> Result<Self, StudioError> {
        if channel_count == 0 {
            return Err(StudioError::InvalidSignal("at least one channel is required".into()));
        }
        let count = channel_count as usize;
        let frames = samples.len() / count;
        let mut channels = vec![Vec::with_capacity(frames); count];
        for frame in samples.chunks_exact(count) {
            for (ch, &sample) in channels.iter_mut().zip(frame) {
                ch.push(sample);
            }
        }
        Self::from_channels(sample_rate, channels)
    }

    /// A zero-filled signal of the given shape.
    pub fn silence(sample_rate: u32, channel_count: u16, frames: usize) -> Result<Self, StudioError> {
        Self::from_channels(sample_rate, vec![vec![0.0; frames]; channel_count as usize])
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    /// Samples of one channel, or None if out of range.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Frame-interleaved copy of the samples.
    pub fn interleaved(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.frames * self.channels.len());
        for frame in 0..self.frames {
            for ch in self.channels.iter() {
                out.push(ch[frame]);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_accessors() {
        let signal = AudioSignal::from_channels(48000, vec![vec![0.0; 24000], vec![0.0; 24000]]).unwrap();
        assert_eq!(signal.sample_rate(), 48000);
        assert_eq!(signal.channel_count(), 2);
        assert_eq!(signal.frame_count(), 24000);
        assert!((signal.duration_secs() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_rate_and_no_channels() {
        assert!(AudioSignal::from_channels(0, vec![vec![0.0]]).is_err());
        assert!(AudioSignal::from_channels(44100, vec![]).is_err());
    }

    #[test]
    fn rejects_ragged_channels() {
        let err = AudioSignal::from_channels(44100, vec![vec![0.0; 3], vec![0.0; 2]]).unwrap_err();
        assert!(matches!(err, StudioError::InvalidSignal(_)));
    }

    #[test]
    fn interleaved_round_trip() {
        let signal = AudioSignal::from_interleaved(8000, 2, &[0.1, 0.2, 0.3, 0.4, 0.5]).unwrap();
        assert_eq!(signal.frame_count(), 2);
        assert_eq!(signal.channel(0), Some(&[0.1, 0.3][..]));
        assert_eq!(signal.channel(1), Some(&[0.2, 0.4][..]));
        assert_eq!(signal.interleaved(), vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn empty_signal_is_valid() {
        let signal = AudioSignal::silence(44100, 1, 0).unwrap();
        assert!(signal.is_empty());
        assert_eq!(signal.duration_secs(), 0.0);
    }
}
