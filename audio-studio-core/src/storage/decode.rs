//! Decoding uploaded audio into an `AudioSignal`.
//!
//! Any format detection or decode failure is reported as `StudioError::DecodeFailed`;
//! a partially decoded signal is never returned.

use std::fs::File;
use std::io::{Cursor, ErrorKind};
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::models::error::StudioError;
use crate::models::signal::AudioSignal;

/// Decode an in-memory file. `extension` (e.g. "wav") helps format probing.
pub fn decode_bytes(bytes: Vec<u8>, extension: Option<&str>) -> Result<AudioSignal, StudioError> {
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    decode_stream(mss, &hint)
}

/// Decode a file from disk.
pub fn decode_file(path: impl AsRef<Path>) -> Result<AudioSignal, StudioError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| StudioError::StorageError(format!("failed to open {}: {}", path.display(), e)))?;

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let signal = decode_stream(mss, &hint)?;
    log::info!(
        "Decoded {}: {} Hz, {} ch, {:.2} s",
        path.display(),
        signal.sample_rate(),
        signal.channel_count(),
        signal.duration_secs()
    );
    Ok(signal)
}

fn decode_stream(mss: MediaSourceStream, hint: &Hint) -> Result<AudioSignal, StudioError> {
    let probed = symphonia::default::get_probe()
        .format(hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| StudioError::DecodeFailed(format!("unrecognized format: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| StudioError::DecodeFailed("no audio track".into()))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| StudioError::DecodeFailed(format!("unsupported codec: {}", e)))?;

    let mut sample_rate = params.sample_rate;
    let mut channel_count = params.channels.map(|c| c.count());
    let mut interleaved: Vec<f32> = Vec::new();
    let mut scratch: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(StudioError::DecodeFailed(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder
            .decode(&packet)
            .map_err(|e| StudioError::DecodeFailed(e.to_string()))?;
        let spec = *decoded.spec();
        let channels = spec.channels.count();
        let changed = channel_count.is_some_and(|c| c != channels) || sample_rate.is_some_and(|r| r != spec.rate);
        if changed && !interleaved.is_empty() {
            return Err(StudioError::DecodeFailed("stream changes format mid-file".into()));
        }
        sample_rate = Some(spec.rate);
        channel_count = Some(channels);

        let needed = decoded.capacity() * channels;
        if scratch.as_ref().map_or(true, |buf| buf.capacity() < needed) {
            scratch = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }
        if let Some(buf) = scratch.as_mut() {
            buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(buf.samples());
        }
    }

    let (Some(rate), Some(channels)) = (sample_rate, channel_count) else {
        return Err(StudioError::DecodeFailed("unknown sample rate or channel layout".into()));
    };
    if interleaved.is_empty() {
        return Err(StudioError::DecodeFailed("no audio frames decoded".into()));
    }
    let channels = u16::try_from(channels)
        .map_err(|_| StudioError::DecodeFailed(format!("too many channels: {}", channels)))?;

    AudioSignal::from_interleaved(rate, channels, &interleaved)
        .map_err(|e| StudioError::DecodeFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::wav_format;

    fn ramp(frames: usize, amplitude: f32) -> Vec<f32> {
        (0..frames)
            .map(|i| amplitude * ((i as f32 / frames as f32) * 2.0 - 1.0))
            .collect()
    }

    #[test]
    fn decodes_encoded_wav_within_one_step() {
        let left = ramp(2048, 0.25);
        let right: Vec<f32> = left.iter().map(|s| -s).collect();
        let signal = AudioSignal::from_channels(22050, vec![left, right]).unwrap();
        let container = wav_format::encode(&signal).unwrap();

        let decoded = decode_bytes(container.into_bytes(), Some("wav")).unwrap();

        assert_eq!(decoded.sample_rate(), 22050);
        assert_eq!(decoded.channel_count(), 2);
        assert_eq!(decoded.frame_count(), 2048);
        for (ours, theirs) in signal.channels().zip(decoded.channels()) {
            for (a, b) in ours.iter().zip(theirs) {
                assert!((a - b).abs() <= 1.0 / 32767.0, "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn garbage_is_a_decode_failure() {
        let err = decode_bytes(vec![0x13; 512], None).unwrap_err();
        assert!(matches!(err, StudioError::DecodeFailed(_)));
    }

    #[test]
    fn truncated_header_is_a_decode_failure() {
        let signal = AudioSignal::silence(8000, 1, 16).unwrap();
        let mut bytes = wav_format::encode(&signal).unwrap().into_bytes();
        bytes.truncate(20);

        assert!(matches!(
            decode_bytes(bytes, Some("wav")),
            Err(StudioError::DecodeFailed(_))
        ));
    }

    #[test]
    fn missing_file_is_a_storage_error() {
        let err = decode_file("/definitely/not/here.wav").unwrap_err();
        assert!(matches!(err, StudioError::StorageError(_)));
    }
}
