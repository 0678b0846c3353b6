//! Canonical 16-bit PCM WAV encoding.
//!
//! Layout of the 44-byte RIFF header:
//! ```text
//! [0-3]    "RIFF"
//! [4-7]    file size - 8 (36 + data_size)
//! [8-11]   "WAVE"
//! [12-15]  "fmt "
//! [16-19]  16 (PCM format chunk size)
//! [20-21]  1 (PCM format code)
//! [22-23]  channels
//! [24-27]  sample_rate
//! [28-31]  byte_rate = sample_rate * channels * bits / 8
//! [32-33]  block_align = channels * bits / 8
//! [34-35]  bits_per_sample
//! [36-39]  "data"
//! [40-43]  data_size
//! ```

use crate::models::error::StudioError;
use crate::models::signal::AudioSignal;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

const PCM_FORMAT_CODE: u16 = 1;
const PCM_CHUNK_SIZE: u32 = 16;
const BITS_PER_SAMPLE: u16 = 16;

/// Fields of a canonical PCM WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub data_size: u32,
}

impl WavHeader {
    pub fn pcm16(channels: u16, sample_rate: u32, data_size: u32) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample: BITS_PER_SAMPLE,
            data_size,
        }
    }

    /// Bytes per second, or None if it does not fit the 32-bit field.
    pub fn checked_byte_rate(&self) -> Option<u32> {
        self.sample_rate.checked_mul(u32::from(self.checked_block_align()?))
    }

    /// Bytes per frame, or None if it does not fit the 16-bit field.
    pub fn checked_block_align(&self) -> Option<u16> {
        self.channels.checked_mul(self.bits_per_sample / 8)
    }

    /// Saturates on overflow; `encode` rejects such shapes up front.
    pub fn byte_rate(&self) -> u32 {
        self.checked_byte_rate().unwrap_or(u32::MAX)
    }

    /// Saturates on overflow; `encode` rejects such shapes up front.
    pub fn block_align(&self) -> u16 {
        self.checked_block_align().unwrap_or(u16::MAX)
    }

    /// RIFF chunk size: total file length minus 8.
    pub fn chunk_size(&self) -> u32 {
        self.data_size.saturating_add(36)
    }

    pub fn to_bytes(&self) -> [u8; WAV_HEADER_SIZE] {
        let mut header = [0u8; WAV_HEADER_SIZE];

        // RIFF chunk descriptor
        header[0..4].copy_from_slice(b"RIFF");
        header[4..8].copy_from_slice(&self.chunk_size().to_le_bytes());
        header[8..12].copy_from_slice(b"WAVE");

        // fmt sub-chunk
        header[12..16].copy_from_slice(b"fmt ");
        header[16..20].copy_from_slice(&PCM_CHUNK_SIZE.to_le_bytes());
        header[20..22].copy_from_slice(&PCM_FORMAT_CODE.to_le_bytes());
        header[22..24].copy_from_slice(&self.channels.to_le_bytes());
        header[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        header[28..32].copy_from_slice(&self.byte_rate().to_le_bytes());
        header[32..34].copy_from_slice(&self.block_align().to_le_bytes());
        header[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());

        // data sub-chunk
        header[36..40].copy_from_slice(b"data");
        header[40..44].copy_from_slice(&self.data_size.to_le_bytes());

        header
    }

    /// Parse the canonical 44-byte layout produced by `to_bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, StudioError> {
        if bytes.len() < WAV_HEADER_SIZE {
            return Err(StudioError::DecodeFailed(format!(
                "WAV header needs {} bytes, got {}",
                WAV_HEADER_SIZE,
                bytes.len()
            )));
        }
        if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
            return Err(StudioError::DecodeFailed("missing RIFF/WAVE tags".into()));
        }
        if &bytes[12..16] != b"fmt " || &bytes[36..40] != b"data" {
            return Err(StudioError::DecodeFailed("not a canonical PCM layout".into()));
        }
        if u16_at(bytes, 20) != PCM_FORMAT_CODE {
            return Err(StudioError::DecodeFailed("not integer PCM".into()));
        }

        Ok(Self {
            channels: u16_at(bytes, 22),
            sample_rate: u32_at(bytes, 24),
            bits_per_sample: u16_at(bytes, 34),
            data_size: u32_at(bytes, 40),
        })
    }
}

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// An encoded WAV file: header followed by interleaved little-endian i16 samples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedContainer {
    bytes: Vec<u8>,
}

impl EncodedContainer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn header(&self) -> Result<WavHeader, StudioError> {
        WavHeader::parse(&self.bytes)
    }

    /// Sample data after the header.
    pub fn data(&self) -> &[u8] {
        &self.bytes[WAV_HEADER_SIZE.min(self.bytes.len())..]
    }
}

/// Quantize one sample to signed 16-bit PCM.
///
/// Clamps to `[-1.0, 1.0]`, then scales negatives by 32768 and the rest by
/// 32767 so both full-scale ends are reachable. Ties round upward; NaN
/// becomes 0.
pub fn quantize_sample(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    let scaled = if clamped < 0.0 {
        clamped * 32768.0
    } else {
        clamped * 32767.0
    };
    (scaled + 0.5).floor() as i16
}

/// Serialize `signal` as a 16-bit PCM WAV container.
pub fn encode(signal: &AudioSignal) -> Result<EncodedContainer, StudioError> {
    let channels = signal.channel_count();
    let sample_count = signal.frame_count() * channels as usize;
    let data_size = sample_count
        .checked_mul(2)
        .and_then(|n| u32::try_from(n).ok())
        .filter(|n| n.checked_add(36).is_some())
        .ok_or_else(|| {
            StudioError::EncodingFailed(format!(
                "{} samples exceed the 4 GiB WAV limit",
                sample_count
            ))
        })?;

    let header = WavHeader::pcm16(channels, signal.sample_rate(), data_size);
    if header.checked_byte_rate().is_none() {
        return Err(StudioError::EncodingFailed(format!(
            "{} channels at {} Hz do not fit a 16-bit WAV header",
            channels,
            signal.sample_rate()
        )));
    }
    let mut bytes = Vec::with_capacity(WAV_HEADER_SIZE + data_size as usize);
    bytes.extend_from_slice(&header.to_bytes());

    let planes: Vec<&[f32]> = signal.channels().collect();
    for frame in 0..signal.frame_count() {
        for plane in &planes {
            bytes.extend_from_slice(&quantize_sample(plane[frame]).to_le_bytes());
        }
    }

    Ok(EncodedContainer { bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_riff_magic() {
        let header = WavHeader::pcm16(2, 48000, 0).to_bytes();
        assert_eq!(header.len(), 44);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(&header[8..12], b"WAVE");
        assert_eq!(&header[12..16], b"fmt ");
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u16_at(&header, 20), 1);
        assert_eq!(u32_at(&header, 16), 16);
    }

    #[test]
    fn header_48khz_stereo_16bit() {
        let header = WavHeader::pcm16(2, 48000, 9600).to_bytes();

        assert_eq!(u16_at(&header, 22), 2);
        assert_eq!(u32_at(&header, 24), 48000);
        assert_eq!(u32_at(&header, 28), 192000); // 48000 * 2 * 2
        assert_eq!(u16_at(&header, 32), 4);
        assert_eq!(u16_at(&header, 34), 16);
        assert_eq!(u32_at(&header, 40), 9600);
        assert_eq!(u32_at(&header, 4), 36 + 9600);
    }

    #[test]
    fn parse_reads_back_fields() {
        let header = WavHeader::pcm16(1, 22050, 100);
        assert_eq!(WavHeader::parse(&header.to_bytes()).unwrap(), header);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(WavHeader::parse(b"RIFF").is_err());
        assert!(WavHeader::parse(&[0u8; 44]).is_err());
    }

    #[test]
    fn quantize_uses_asymmetric_full_scale() {
        assert_eq!(quantize_sample(1.0), i16::MAX);
        assert_eq!(quantize_sample(-1.0), i16::MIN);
        assert_eq!(quantize_sample(0.0), 0);
        assert_eq!(quantize_sample(0.5), 16384);
        assert_eq!(quantize_sample(-0.5), -16384);
    }

    #[test]
    fn quantize_clamps_out_of_range() {
        assert_eq!(quantize_sample(2.0), i16::MAX);
        assert_eq!(quantize_sample(-3.0), i16::MIN);
        assert_eq!(quantize_sample(f32::NAN), 0);
    }

    #[test]
    fn two_frame_stereo_bytes() {
        // frame 0 = (1.0, -1.0), frame 1 = (0.0, 0.5)
        let signal = AudioSignal::from_channels(44100, vec![vec![1.0, 0.0], vec![-1.0, 0.5]]).unwrap();

        let container = encode(&signal).unwrap();

        assert_eq!(
            container.data(),
            &[0xFFu8, 0x7F, 0x00, 0x80, 0x00, 0x00, 0x00, 0x40]
        );
    }

    #[test]
    fn header_sizes_follow_shape() {
        let frames = 1000;
        let signal = AudioSignal::silence(22050, 3, frames).unwrap();

        let container = encode(&signal).unwrap();
        let header = container.header().unwrap();

        assert_eq!(header.byte_rate(), 22050 * 3 * 2);
        assert_eq!(header.data_size as usize, frames * 3 * 2);
        assert_eq!(container.len(), header.data_size as usize + 44);
        assert_eq!(header.chunk_size() as usize, container.len() - 8);
    }

    #[test]
    fn oversized_sample_rate_is_rejected() {
        let signal = AudioSignal::silence(u32::MAX, 1, 0).unwrap();
        assert!(matches!(encode(&signal), Err(StudioError::EncodingFailed(_))));
    }

    #[test]
    fn oversized_channel_count_is_rejected() {
        let signal = AudioSignal::silence(8000, 40000, 0).unwrap();
        assert!(matches!(encode(&signal), Err(StudioError::EncodingFailed(_))));
    }

    #[test]
    fn header_fields_saturate_instead_of_overflowing() {
        let header = WavHeader::pcm16(u16::MAX, u32::MAX, u32::MAX);
        assert_eq!(header.checked_block_align(), None);
        assert_eq!(header.checked_byte_rate(), None);
        assert_eq!(header.block_align(), u16::MAX);
        assert_eq!(header.byte_rate(), u32::MAX);
        assert_eq!(header.chunk_size(), u32::MAX);
    }

    #[test]
    fn empty_signal_is_header_only() {
        let signal = AudioSignal::silence(8000, 1, 0).unwrap();
        let container = encode(&signal).unwrap();
        assert_eq!(container.len(), 44);
        assert!(container.data().is_empty());
    }

    #[test]
    fn quantization_error_within_one_step() {
        let samples: Vec<f32> = (0..2000).map(|i| (i as f32 / 1000.0) - 1.0).collect();
        let signal = AudioSignal::from_channels(8000, vec![samples.clone()]).unwrap();
        let container = encode(&signal).unwrap();

        for (chunk, &original) in container.data().chunks_exact(2).zip(&samples) {
            let q = i16::from_le_bytes([chunk[0], chunk[1]]) as f32;
            let restored = if q < 0.0 { q / 32768.0 } else { q / 32767.0 };
            assert!((restored - original).abs() <= 1.0 / 32767.0);
        }
    }
}
