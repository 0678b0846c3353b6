use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::models::error::StudioError;
use crate::models::export::{ExportFormat, ExportMetadata};
use crate::models::signal::AudioSignal;
use crate::processing::wav_format::{self, EncodedContainer};

/// Encode `signal` in the requested format.
///
/// Only WAV has an encoder; MP3 and FLAC are rejected rather than silently
/// written as WAV.
pub fn export(signal: &AudioSignal, format: ExportFormat) -> Result<EncodedContainer, StudioError> {
    match format {
        ExportFormat::Wav => wav_format::encode(signal),
        ExportFormat::Mp3 | ExportFormat::Flac => Err(StudioError::UnsupportedFormat(format.to_string())),
    }
}

/// Encode `signal` and write it as `{dir}/{stem}.{ext}`.
pub fn write_export(
    dir: &Path,
    stem: &str,
    signal: &AudioSignal,
    format: ExportFormat,
) -> Result<ExportMetadata, StudioError> {
    let container = export(signal, format)?;

    fs::create_dir_all(dir)
        .map_err(|e| StudioError::StorageError(format!("failed to create directory: {}", e)))?;
    let file_path = dir.join(format!("{}.{}", stem, format.extension()));
    fs::write(&file_path, container.as_bytes())
        .map_err(|e| StudioError::StorageError(format!("failed to write export: {}", e)))?;

    let metadata = ExportMetadata {
        id: uuid::Uuid::new_v4().to_string(),
        file_path,
        format,
        sample_rate: signal.sample_rate(),
        channels: signal.channel_count(),
        frames: signal.frame_count(),
        duration_secs: signal.duration_secs(),
        size_bytes: container.len() as u64,
        checksum: sha256_hex(container.as_bytes()),
        created_at: chrono::Utc::now().to_rfc3339(),
    };
    log::info!(
        "Exported {} ({} bytes, {:.2} s)",
        metadata.file_path.display(),
        metadata.size_bytes,
        metadata.duration_secs
    );
    Ok(metadata)
}

/// SHA-256 hex digest.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short_signal() -> AudioSignal {
        AudioSignal::from_channels(44100, vec![vec![0.0, 0.5, -0.5, 1.0]]).unwrap()
    }

    #[test]
    fn wav_export_matches_encoder() {
        let signal = short_signal();
        let exported = export(&signal, ExportFormat::Wav).unwrap();
        assert_eq!(exported, wav_format::encode(&signal).unwrap());
    }

    #[test]
    fn lossy_and_lossless_alternatives_are_rejected() {
        let signal = short_signal();
        assert_eq!(
            export(&signal, ExportFormat::Mp3),
            Err(StudioError::UnsupportedFormat("mp3".into()))
        );
        assert_eq!(
            export(&signal, ExportFormat::Flac),
            Err(StudioError::UnsupportedFormat("flac".into()))
        );
    }

    #[test]
    fn write_export_produces_file_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let signal = short_signal();

        let metadata = write_export(dir.path(), "combined", &signal, ExportFormat::Wav).unwrap();

        assert_eq!(metadata.file_path, dir.path().join("combined.wav"));
        let bytes = fs::read(&metadata.file_path).unwrap();
        assert_eq!(bytes.len() as u64, metadata.size_bytes);
        assert_eq!(bytes.len(), 44 + 4 * 2);
        assert_eq!(metadata.checksum, sha256_hex(&bytes));
        assert_eq!(metadata.checksum.len(), 64);
        assert_eq!(metadata.frames, 4);
        assert!(chrono::DateTime::parse_from_rfc3339(&metadata.created_at).is_ok());
    }

    #[test]
    fn rejected_format_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");

        let result = write_export(&target, "combined", &short_signal(), ExportFormat::Mp3);

        assert!(result.is_err());
        assert!(!target.exists());
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
