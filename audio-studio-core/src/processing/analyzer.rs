//! Spectral analysis over a passive tap.
//!
//! Each poll windows the newest `transform_size` samples (Blackman), runs a
//! forward FFT, smooths magnitudes over time, and maps them from the
//! configured decibel range onto bytes.

use std::f32::consts::PI;
use std::ops::RangeInclusive;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::models::config::StudioConfig;
use crate::models::error::StudioError;
use crate::processing::tap::SignalTap;

/// Byte magnitudes for one poll, one per frequency bin.
///
/// Overwritten in place by every poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectrumFrame {
    bins: Vec<u8>,
}

impl SpectrumFrame {
    fn new(bin_count: usize) -> Self {
        Self {
            bins: vec![0; bin_count],
        }
    }

    pub fn bins(&self) -> &[u8] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

pub struct FrequencyAnalyzer {
    transform_size: usize,
    smoothing: f32,
    min_decibels: f32,
    byte_scale: f32,
    fallback_sample_rate: u32,
    bass_band_hz: [f32; 2],
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    time: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    frame: SpectrumFrame,
    average: f32,
    bass: f32,
    tap: Option<SignalTap>,
}

impl FrequencyAnalyzer {
    pub fn new(config: &StudioConfig) -> Result<Self, StudioError> {
        config.validate().map_err(StudioError::ConfigurationFailed)?;
        Ok(Self::from_validated(config))
    }

    pub(crate) fn from_validated(config: &StudioConfig) -> Self {
        let n = config.transform_size;
        let fft = FftPlanner::<f32>::new().plan_fft_forward(n);
        let scratch_len = fft.get_inplace_scratch_len();
        let bins = config.bin_count();

        Self {
            transform_size: n,
            smoothing: config.smoothing_time_constant,
            min_decibels: config.min_decibels,
            byte_scale: 255.0 / (config.max_decibels - config.min_decibels),
            fallback_sample_rate: config.fallback_sample_rate,
            bass_band_hz: config.bass_band_hz,
            fft,
            window: blackman_window(n),
            time: vec![0.0; n],
            spectrum: vec![Complex::new(0.0, 0.0); n],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            smoothed: vec![0.0; bins],
            frame: SpectrumFrame::new(bins),
            average: 0.0,
            bass: 0.0,
            tap: None,
        }
    }

    /// Connect `tap` as the only upstream, detaching any previous tap.
    ///
    /// A terminated tap is not attached; the analyzer stays detached and
    /// `false` is returned.
    pub fn attach(&mut self, tap: SignalTap) -> bool {
        self.detach();
        if !tap.is_live() {
            log::debug!("Ignoring attach of terminated {} tap", tap.kind());
            return false;
        }
        self.tap = Some(tap);
        true
    }

    /// Drop the reference to the current tap, if any. The tap itself is untouched.
    pub fn detach(&mut self) {
        self.tap = None;
    }

    pub fn is_attached(&self) -> bool {
        self.tap.is_some()
    }

    pub fn attached_tap(&self) -> Option<&SignalTap> {
        self.tap.as_ref()
    }

    pub fn transform_size(&self) -> usize {
        self.transform_size
    }

    pub fn bin_count(&self) -> usize {
        self.frame.len()
    }

    /// Sample rate used for bin frequencies: the tap's, else the fallback.
    pub fn sample_rate(&self) -> u32 {
        self.tap
            .as_ref()
            .and_then(SignalTap::sample_rate)
            .unwrap_or(self.fallback_sample_rate)
    }

    /// Width of one bin in Hz.
    pub fn bin_hz(&self) -> f32 {
        self.sample_rate() as f32 / self.transform_size as f32
    }

    /// Analyze the newest window and return fresh bin magnitudes.
    ///
    /// Never blocks on the audio path beyond copying the tap's window. A
    /// detached analyzer (or a tap that has since terminated) sees silence.
    pub fn poll(&mut self) -> &SpectrumFrame {
        match self.tap {
            Some(ref tap) if tap.is_live() => tap.copy_latest(&mut self.time),
            Some(_) => {
                self.tap = None;
                self.time.fill(0.0);
            }
            None => self.time.fill(0.0),
        }

        for ((slot, &sample), &w) in self.spectrum.iter_mut().zip(&self.time).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process_with_scratch(&mut self.spectrum, &mut self.scratch);

        let norm = 1.0 / self.transform_size as f32;
        let tau = self.smoothing;
        let mut sum = 0u64;
        for ((byte, smoothed), bin) in self
            .frame
            .bins
            .iter_mut()
            .zip(self.smoothed.iter_mut())
            .zip(&self.spectrum)
        {
            let magnitude = bin.norm() * norm;
            let next = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if next.is_finite() { next } else { 0.0 };

            let db = 20.0 * smoothed.log10();
            // -inf (silence) and NaN both land on 0.
            *byte = ((db - self.min_decibels) * self.byte_scale).clamp(0.0, 255.0) as u8;
            sum += *byte as u64;
        }

        let bins = self.frame.len().max(1) as f32;
        self.average = sum as f32 / bins / 255.0;
        self.bass = match self.bass_bin_range(self.sample_rate()) {
            Some(range) => {
                let count = range.clone().count() as f32;
                let total: u32 = self.frame.bins[range].iter().map(|&b| b as u32).sum();
                total as f32 / count / 255.0
            }
            None => 0.0,
        };

        &self.frame
    }

    /// Mean of all bins from the last poll, in `[0, 1]`.
    pub fn average_magnitude(&self) -> f32 {
        self.average
    }

    /// Mean of the bass-band bins from the last poll, in `[0, 1]`.
    pub fn bass_energy(&self) -> f32 {
        self.bass
    }

    /// Bins whose center frequency `k * sample_rate / transform_size` lies
    /// inside the configured bass band, or None if no bin does.
    pub fn bass_bin_range(&self, sample_rate: u32) -> Option<RangeInclusive<usize>> {
        let bin_hz = sample_rate as f32 / self.transform_size as f32;
        let [low, high] = self.bass_band_hz;
        let last = self.frame.len().checked_sub(1)?;

        let first = (low / bin_hz).floor() as usize;
        let first = (first..=last).find(|&k| k as f32 * bin_hz >= low)?;
        let mut end = first;
        while end < last && ((end + 1) as f32 * bin_hz) <= high {
            end += 1;
        }
        if end as f32 * bin_hz > high {
            return None;
        }
        Some(first..=end)
    }
}

fn blackman_window(n: usize) -> Vec<f32> {
    const A0: f32 = 0.42;
    const A1: f32 = 0.5;
    const A2: f32 = 0.08;
    (0..n)
        .map(|i| {
            let x = i as f32 / n as f32;
            A0 - A1 * (2.0 * PI * x).cos() + A2 * (4.0 * PI * x).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::source::SourceKind;

    fn analyzer() -> FrequencyAnalyzer {
        FrequencyAnalyzer::new(&StudioConfig::default()).unwrap()
    }

    fn sine(freq: f32, sample_rate: u32, frames: usize, amplitude: f32) -> Vec<f32> {
        (0..frames)
            .map(|i| amplitude * (2.0 * PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    fn loudest_bin(frame: &SpectrumFrame) -> usize {
        frame
            .bins()
            .iter()
            .enumerate()
            .max_by_key(|&(_, &b)| b)
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn frame_has_half_transform_bins() {
        let mut a = analyzer();
        assert_eq!(a.poll().len(), 2048);
        assert_eq!(a.bin_count(), 2048);
    }

    #[test]
    fn detached_analyzer_reports_silence() {
        let mut a = analyzer();
        assert!(a.poll().bins().iter().all(|&b| b == 0));
        assert_eq!(a.average_magnitude(), 0.0);
        assert_eq!(a.bass_energy(), 0.0);
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        let mut a = analyzer();
        let tap = SignalTap::new(SourceKind::Microphone, 4096);
        assert!(a.attach(tap.clone()));

        // 1 kHz at 44.1 kHz sits near bin 92.9; quiet enough not to saturate neighbours.
        tap.feed(&sine(1000.0, 44100, 4096, 0.01), 44100, 1);
        let peak = loudest_bin(a.poll());
        assert!((92..=94).contains(&peak), "peak at bin {}", peak);
        assert!(a.average_magnitude() > 0.0);
    }

    #[test]
    fn bass_tone_raises_bass_energy() {
        let mut a = analyzer();
        let tap = SignalTap::new(SourceKind::MediaElement, 4096);
        a.attach(tap.clone());

        tap.feed(&sine(50.0, 44100, 4096, 0.9), 44100, 1);
        a.poll();
        let bass = a.bass_energy();

        let mut b = analyzer();
        let treble = SignalTap::new(SourceKind::MediaElement, 4096);
        b.attach(treble.clone());
        treble.feed(&sine(5000.0, 44100, 4096, 0.9), 44100, 1);
        b.poll();

        assert!(bass > b.bass_energy());
        assert!(bass <= 1.0);
    }

    #[test]
    fn bass_band_bins_at_44100() {
        let a = analyzer();
        // bin width 10.77 Hz: bins 1..=8 span 10.8..86.1 Hz
        assert_eq!(a.bass_bin_range(44100), Some(1..=8));
        // bin width 11.72 Hz: bins 1..=7 span 11.7..82.0 Hz
        assert_eq!(a.bass_bin_range(48000), Some(1..=7));
    }

    #[test]
    fn smoothing_decays_after_detach() {
        let mut a = analyzer();
        let tap = SignalTap::new(SourceKind::Microphone, 4096);
        a.attach(tap.clone());
        tap.feed(&sine(440.0, 44100, 4096, 0.9), 44100, 1);
        a.poll();
        let loud = a.average_magnitude();

        a.detach();
        a.poll();
        let after = a.average_magnitude();
        assert!(after < loud);
        assert!(after > 0.0, "smoothing keeps some energy for one frame");
    }

    #[test]
    fn terminated_tap_is_not_attached() {
        let mut a = analyzer();
        let live = SignalTap::new(SourceKind::Microphone, 64);
        a.attach(live);
        assert!(a.is_attached());

        let dead = SignalTap::new(SourceKind::SystemLoopback, 64);
        dead.terminate();
        assert!(!a.attach(dead));
        assert!(!a.is_attached());
    }

    #[test]
    fn tap_terminated_while_attached_detaches_on_poll() {
        let mut a = analyzer();
        let tap = SignalTap::new(SourceKind::Microphone, 64);
        a.attach(tap.clone());
        tap.terminate();

        a.poll();
        assert!(!a.is_attached());
    }

    #[test]
    fn polling_never_alters_the_tap() {
        let mut a = analyzer();
        let tap = SignalTap::new(SourceKind::Microphone, 8);
        a.attach(tap.clone());
        tap.feed(&[0.1, 0.2, 0.3], 44100, 1);

        a.poll();
        let mut out = [0.0; 3];
        tap.copy_latest(&mut out);
        assert_eq!(out, [0.1, 0.2, 0.3]);
    }

    #[test]
    fn bin_hz_uses_tap_rate() {
        let mut a = analyzer();
        assert!((a.bin_hz() - 44100.0 / 4096.0).abs() < 1e-4);

        let tap = SignalTap::new(SourceKind::Microphone, 16);
        a.attach(tap.clone());
        tap.feed(&[0.0], 48000, 1);
        assert!((a.bin_hz() - 48000.0 / 4096.0).abs() < 1e-4);
    }

    #[test]
    fn blackman_endpoints() {
        let w = blackman_window(8);
        assert!(w[0].abs() < 1e-6);
        assert!((w[4] - 1.0).abs() < 1e-6);
    }
}
