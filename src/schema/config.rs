//! Configuration types for conversion and playback.

use serde::{Deserialize, Serialize};

use crate::compute::{ColorAdjust, SamplingStrategy};

fn default_target_fps() -> u32 {
    30
}

fn default_stop_timeout_ms() -> u64 {
    1000
}

fn default_led_dimming() -> f32 {
    1.0
}

/// Top-level tool configuration, loaded from JSON by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub convert: ConvertConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

impl ToolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.convert.validate()?;
        self.playback.validate()
    }
}

/// Media to matrix conversion parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Matrix width in LEDs (columns).
    pub width: usize,
    /// Matrix height in LEDs (rows).
    pub height: usize,
    /// Free text stored in every frame.
    #[serde(default)]
    pub description: String,
    /// Color correction applied after averaging.
    #[serde(default)]
    pub adjust: ColorAdjust,
    /// Frame selection for multi-frame sources.
    #[serde(default)]
    pub sampling: SamplingStrategy,
    /// Resample still images to `width * f` x `height * f` (Lanczos) before averaging.
    #[serde(default)]
    pub prescale: Option<u32>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            width: 16,
            height: 16,
            description: String::new(),
            adjust: ColorAdjust::default(),
            sampling: SamplingStrategy::default(),
            prescale: None,
        }
    }
}

impl ConvertConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        let a = &self.adjust;
        for (name, value) in [
            ("brightness", a.brightness),
            ("contrast", a.contrast),
            ("saturation", a.saturation),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidCoefficient { name, value });
            }
        }
        match self.sampling {
            SamplingStrategy::Rate { fps } if fps.is_nan() || fps <= 0.0 => {
                return Err(ConfigError::InvalidSampling);
            }
            SamplingStrategy::Count { frames: 0 } => return Err(ConfigError::InvalidSampling),
            _ => {}
        }
        if self.prescale == Some(0) {
            return Err(ConfigError::InvalidPrescale);
        }
        Ok(())
    }
}

/// Preview playback parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Render loop rate.
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
    /// How long `stop` waits for the render loop to exit.
    #[serde(default = "default_stop_timeout_ms")]
    pub stop_timeout_ms: u64,
    /// Multiplier applied to colors at present time (LEDs look brighter than screens).
    #[serde(default = "default_led_dimming")]
    pub led_dimming: f32,
    /// Start playing right after loading instead of paused on frame 0.
    #[serde(default)]
    pub autoplay: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
            stop_timeout_ms: default_stop_timeout_ms(),
            led_dimming: default_led_dimming(),
            autoplay: false,
        }
    }
}

impl PlaybackConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps == 0 {
            return Err(ConfigError::InvalidFrameRate);
        }
        if !(0.0..=1.0).contains(&self.led_dimming) {
            return Err(ConfigError::InvalidDimming(self.led_dimming));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Matrix dimensions (width, height) must be non-zero")]
    InvalidDimensions,
    #[error("Color coefficient {name} must be finite and non-negative (got {value})")]
    InvalidCoefficient { name: &'static str, value: f64 },
    #[error("Sampling must request a positive rate or frame count")]
    InvalidSampling,
    #[error("Prescale factor must be non-zero")]
    InvalidPrescale,
    #[error("Target frame rate must be positive")]
    InvalidFrameRate,
    #[error("LED dimming must be within 0.0..=1.0 (got {0})")]
    InvalidDimming(f32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        ToolConfig::default().validate().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ToolConfig =
            serde_json::from_str(r#"{ "convert": { "width": 32, "height": 8 } }"#).unwrap();
        assert_eq!(config.convert.width, 32);
        assert!(config.convert.adjust.is_identity());
        assert_eq!(config.playback.target_fps, 30);
        config.validate().unwrap();
    }

    #[test]
    fn test_sampling_json() {
        let config: ConvertConfig = serde_json::from_str(
            r#"{ "width": 8, "height": 8, "sampling": { "type": "Rate", "fps": 10.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.sampling, SamplingStrategy::Rate { fps: 10.0 });
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = ConvertConfig::default();
        config.width = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDimensions)));

        let mut config = ConvertConfig::default();
        config.adjust.contrast = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidCoefficient { name: "contrast", .. })
        ));

        let playback = PlaybackConfig {
            target_fps: 0,
            ..Default::default()
        };
        assert!(matches!(playback.validate(), Err(ConfigError::InvalidFrameRate)));
    }
}
