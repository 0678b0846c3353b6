use crate::models::error::StudioError;
use crate::models::signal::AudioSignal;

/// Pure-math offline mixer.
///
/// Renders several signals into one buffer shaped by the widest input:
/// highest sample rate, most channels, longest duration. Inputs at a lower
/// rate are linearly resampled; an input that ends early contributes silence.
/// No clipping is applied, so sums may leave `[-1.0, 1.0]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineMixer;

impl OfflineMixer {
    pub fn new() -> Self {
        Self
    }

    /// Sample-accurate sum of two signals. Inputs are not modified.
    pub fn mix(&self, a: &AudioSignal, b: &AudioSignal) -> AudioSignal {
        let sample_rate = a.sample_rate().max(b.sample_rate());
        let channels = a.channel_count().max(b.channel_count());
        let frames = frames_at_rate(a, sample_rate).max(frames_at_rate(b, sample_rate));

        let mut output = vec![vec![0.0f32; frames]; channels as usize];
        for input in [a, b] {
            Self::accumulate(&mut output, input, sample_rate);
        }

        AudioSignal::from_shaped(sample_rate, output)
    }

    /// Sum any number of signals; None when `inputs` is empty.
    pub fn mix_all(&self, inputs: &[&AudioSignal]) -> Option<AudioSignal> {
        let (first, rest) = inputs.split_first()?;
        Some(rest.iter().fold((*first).clone(), |acc, next| self.mix(&acc, next)))
    }

    /// Add `input` into `output` after mapping channels and resampling.
    ///
    /// Mono is spread to every output channel; otherwise channel `i` feeds
    /// output channel `i` and output channels beyond the input stay untouched.
    fn accumulate(output: &mut [Vec<f32>], input: &AudioSignal, sample_rate: u32) {
        let mono = input.channel_count() == 1;
        for (index, out) in output.iter_mut().enumerate() {
            let source_index = if mono { 0 } else { index };
            let Some(source) = input.channel(source_index) else {
                continue;
            };
            let resampled = resample_linear(source, input.sample_rate(), sample_rate, out.len());
            for (dst, src) in out.iter_mut().zip(resampled) {
                *dst += src;
            }
        }
    }
}

/// Frames `signal` spans once rendered at `sample_rate` (rounded up).
pub fn frames_at_rate(signal: &AudioSignal, sample_rate: u32) -> usize {
    if signal.sample_rate() == sample_rate {
        return signal.frame_count();
    }
    let scaled = signal.frame_count() as u128 * sample_rate as u128;
    scaled.div_ceil(signal.sample_rate() as u128) as usize
}

/// Linear-interpolation resampling of one channel to exactly `output_frames`.
///
/// Positions past the end of `samples` are silent. Matching rates copy the
/// input unchanged.
pub fn resample_linear(samples: &[f32], source_rate: u32, target_rate: u32, output_frames: usize) -> Vec<f32> {
    let mut output = vec![0.0f32; output_frames];
    if samples.is_empty() || source_rate == 0 || target_rate == 0 {
        return output;
    }

    if source_rate == target_rate {
        let n = samples.len().min(output_frames);
        output[..n].copy_from_slice(&samples[..n]);
        return output;
    }

    let step = source_rate as f64 / target_rate as f64;
    for (i, sample) in output.iter_mut().enumerate() {
        let position = i as f64 * step;
        let index = position as usize;
        let fraction = (position - index as f64) as f32;

        if index + 1 < samples.len() {
            *sample = samples[index] * (1.0 - fraction) + samples[index + 1] * fraction;
        } else if index < samples.len() {
            *sample = samples[index];
        } else {
            break;
        }
    }
    output
}

/// Mix two signals with the default mixer.
pub fn mix(a: &AudioSignal, b: &AudioSignal) -> AudioSignal {
    OfflineMixer::new().mix(a, b)
}

/// Mix a list of signals, failing on an empty list.
pub fn mix_tracks(inputs: &[&AudioSignal]) -> Result<AudioSignal, StudioError> {
    OfflineMixer::new()
        .mix_all(inputs)
        .ok_or_else(|| StudioError::InvalidSignal("nothing to mix".into()))
}
