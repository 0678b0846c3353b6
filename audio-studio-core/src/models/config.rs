use serde::{Deserialize, Serialize};

/// Configuration for an analysis context and its collaborators.
///
/// Transform parameters are fixed for the lifetime of the context that
/// consumes this configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    /// Samples per spectral window (default: 4096). Power of two.
    pub transform_size: usize,

    /// Smoothing between successive frames, 0.0 (none) to 1.0 (frozen).
    pub smoothing_time_constant: f32,

    /// Magnitude in dB mapped to byte value 0.
    pub min_decibels: f32,

    /// Magnitude in dB mapped to byte value 255.
    pub max_decibels: f32,

    /// Sample rate assumed for bin widths until a tap delivers audio.
    pub fallback_sample_rate: u32,

    /// Number of bars for logarithmic banding (default: 64).
    pub display_bars: usize,

    /// Frequency range in Hz averaged by `bass_energy`.
    pub bass_band_hz: [f32; 2],

    /// Pacing delay before a placeholder analysis report is returned.
    pub analysis_placeholder_delay_ms: u64,

    /// Credential for the remote analysis service, or None for placeholder mode.
    pub analysis_api_key: Option<String>,
}

impl StudioConfig {
    pub const MIN_TRANSFORM_SIZE: usize = 32;
    pub const MAX_TRANSFORM_SIZE: usize = 32768;

    pub fn validate(&self) -> Result<(), String> {
        if !self.transform_size.is_power_of_two()
            || !(Self::MIN_TRANSFORM_SIZE..=Self::MAX_TRANSFORM_SIZE).contains(&self.transform_size)
        {
            return Err(format!("unsupported transform size: {}", self.transform_size));
        }
        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(format!(
                "smoothing time constant out of range: {}",
                self.smoothing_time_constant
            ));
        }
        if self.min_decibels >= self.max_decibels {
            return Err("min decibels must be below max decibels".into());
        }
        if self.fallback_sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.display_bars == 0 {
            return Err("display bar count must be positive".into());
        }
        let [low, high] = self.bass_band_hz;
        if low < 0.0 || low > high {
            return Err(format!("invalid bass band: {}..{} Hz", low, high));
        }
        Ok(())
    }

    /// Parse a JSON document; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| format!("invalid config JSON: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Number of magnitude bins produced per frame.
    pub fn bin_count(&self) -> usize {
        self.transform_size / 2
    }
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            transform_size: 4096,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            fallback_sample_rate: 44100,
            display_bars: 64,
            bass_band_hz: [10.0, 90.0],
            analysis_placeholder_delay_ms: 1500,
            analysis_api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = StudioConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bin_count(), 2048);
    }

    #[test]
    fn rejects_non_power_of_two_transform() {
        let config = StudioConfig {
            transform_size: 3000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_decibel_range() {
        let config = StudioConfig {
            min_decibels: -30.0,
            max_decibels: -100.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = StudioConfig::from_json(r#"{ "display_bars": 32 }"#).unwrap();
        assert_eq!(config.display_bars, 32);
        assert_eq!(config.transform_size, 4096);
        assert!(config.analysis_api_key.is_none());
    }

    #[test]
    fn invalid_json_values_rejected() {
        assert!(StudioConfig::from_json(r#"{ "smoothing_time_constant": 2.0 }"#).is_err());
        assert!(StudioConfig::from_json("not json").is_err());
    }
}
