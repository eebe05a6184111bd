//! Pipeline configuration loaded from `--config`.
//!
//! Every section and field defaults individually, so a config file only
//! needs the values it changes. Command-line flags are applied on top.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use cepstra_dsp::{
    EstimatorConfig, ExcitationConfig, Framer, Normalization, PadeOrder, PeriodogramFloor,
    PitchConfig, WindowKind,
};

/// Settings for every stage of the analysis-synthesis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Frame layout for spectral analysis.
    #[serde(default)]
    pub framing: Framer,
    /// Analysis window.
    #[serde(default)]
    pub window: WindowKind,
    /// Window normalization.
    #[serde(default = "default_normalization")]
    pub normalization: Normalization,
    /// Spectral envelope estimator.
    #[serde(default = "default_estimator")]
    pub estimator: EstimatorConfig,
    /// Pitch estimator. The sample rate is taken from the input file.
    #[serde(default)]
    pub pitch: PitchConfig,
    /// Excitation generator.
    #[serde(default)]
    pub excitation: ExcitationConfig,
    /// Synthesis filter.
    #[serde(default)]
    pub synthesis: SynthesisConfig,
}

/// Synthesis filter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SynthesisConfig {
    /// Pade approximation order of the MLSA filter.
    #[serde(default)]
    pub pade: PadeOrder,
    /// Use the transposed filter structure.
    #[serde(default)]
    pub transposed: bool,
}

fn default_normalization() -> Normalization {
    Normalization::Power
}

/// Estimator defaults with a small periodogram offset so silent frames
/// stay analyzable.
fn default_estimator() -> EstimatorConfig {
    EstimatorConfig::default().with_floor(PeriodogramFloor::InitialValue(1e-8))
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            framing: Framer::default(),
            window: WindowKind::default(),
            normalization: default_normalization(),
            estimator: default_estimator(),
            pitch: PitchConfig::default(),
            excitation: ExcitationConfig::default(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads a config file, or the defaults when no path is given.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(Path::new(path))
            .with_context(|| format!("Failed to read config file: {}", path))?;
        Self::from_json(&text).with_context(|| format!("Invalid config file: {}", path))
    }

    /// Parses a config from JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Parses a snake_case command-line value into a serde enum.
pub fn parse_enum<T: DeserializeOwned>(flag: &str, value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .with_context(|| format!("Invalid value for --{}: {}", flag, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cepstra_dsp::PitchOutput;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_is_default() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.normalization, Normalization::Power);
        assert_eq!(
            config.estimator.floor,
            PeriodogramFloor::InitialValue(1e-8)
        );
    }

    #[test]
    fn test_partial_sections_keep_field_defaults() {
        let config = PipelineConfig::from_json(
            r#"{
                "framing": {"frame_length": 512},
                "estimator": {"order": 30, "floor": {"floor_db": -80.0}},
                "pitch": {"output": "period"},
                "synthesis": {"pade": 5}
            }"#,
        )
        .unwrap();
        assert_eq!(config.framing.frame_length, 512);
        assert_eq!(config.framing.frame_shift, 80);
        assert_eq!(config.estimator.order, 30);
        assert_eq!(config.estimator.alpha, 0.42);
        assert_eq!(config.estimator.floor, PeriodogramFloor::FloorDb(-80.0));
        assert_eq!(config.pitch.output, PitchOutput::Period);
        assert_eq!(config.synthesis.pade, PadeOrder::Five);
        assert!(!config.synthesis.transposed);
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(PipelineConfig::from_json(r#"{"framing": {"hop": 80}}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"vocoder": {}}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"synthesis": {"pade": 6}}"#).is_err());
    }

    #[test]
    fn test_load_without_path() {
        assert_eq!(PipelineConfig::load(None).unwrap(), PipelineConfig::default());
        assert!(PipelineConfig::load(Some("/nonexistent/cepstra.json")).is_err());
    }

    #[test]
    fn test_parse_enum() {
        let kind: WindowKind = parse_enum("window", "hamming").unwrap();
        assert_eq!(kind, WindowKind::Hamming);
        let output: PitchOutput = parse_enum("format", "log_frequency").unwrap();
        assert_eq!(output, PitchOutput::LogFrequency);
        assert!(parse_enum::<WindowKind>("window", "kaiser").is_err());
    }
}
