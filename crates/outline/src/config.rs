use std::fs;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr, VariantNames};

use crate::error::{OutlineError, Result};

/// Pixel neighbourhood used both for region labelling and for resolving
/// saddle cells while tracing boundaries.
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, EnumIter, VariantNames, IntoStaticStr,
    PartialEq, Eq, Hash
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Connectivity {
    /// Horizontal and vertical neighbours only.
    Four,
    /// Diagonal neighbours are connected too.
    #[default]
    Eight,
}

impl From<Connectivity> for imageproc::region_labelling::Connectivity {
    fn from(connectivity: Connectivity) -> Self {
        match connectivity {
            Connectivity::Four => Self::Four,
            Connectivity::Eight => Self::Eight,
        }
    }
}

/// How the global foreground cutoff is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Maximise between-class variance of the intensity histogram.
    #[default]
    Otsu,
    /// Use a known cutoff in `[0, 1]`.
    Fixed { value: f32 },
}

/// Settings shared by every invocation of the outline pipeline.
///
/// Built once when the plugin is loaded and only ever borrowed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutlineConfig {
    /// Fraction of traced boundary points kept as spline control points.
    #[schemars(range(min = 0.0, max = 1.0))]
    pub simplification_ratio: f64,
    pub connectivity: Connectivity,
    /// Channel read from multi-channel images.
    pub channel: usize,
    /// Add per-region measurements to the invocation metadata.
    pub record_measurements: bool,
    pub threshold: ThresholdMethod,
}

impl Default for OutlineConfig {
    fn default() -> Self {
        Self {
            simplification_ratio: 0.05,
            connectivity: Connectivity::default(),
            channel: 0,
            record_measurements: true,
            threshold: ThresholdMethod::default(),
        }
    }
}

impl OutlineConfig {
    /// JSON schema describing the configuration file.
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(OutlineConfig)
    }

    pub fn validate(&self) -> Result<()> {
        let r = self.simplification_ratio;
        if !(r > 0.0 && r <= 1.0) {
            return Err(OutlineError::InvalidConfig(format!(
                "simplification_ratio must be in (0, 1], got {r}"
            )));
        }
        if let ThresholdMethod::Fixed { value } = self.threshold {
            if !(0.0..=1.0).contains(&value) {
                return Err(OutlineError::InvalidConfig(format!(
                    "fixed threshold must be in [0, 1], got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Load and validate a configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: OutlineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: OutlineConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(OutlineError::UnsupportedFileFormat),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults_match_plugin_behaviour() {
        let config = OutlineConfig::default();
        assert_eq!(config.simplification_ratio, 0.05);
        assert_eq!(config.connectivity, Connectivity::Eight);
        assert_eq!(config.threshold, ThresholdMethod::Otsu);
        assert_eq!(config.channel, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = OutlineConfig {
            simplification_ratio: 0.25,
            connectivity: Connectivity::Four,
            channel: 1,
            record_measurements: false,
            threshold: ThresholdMethod::Fixed { value: 0.4 },
        };
        let text = config.to_toml().unwrap();
        assert_eq!(OutlineConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = OutlineConfig::from_toml("connectivity = \"four\"\n").unwrap();
        assert_eq!(config.connectivity, Connectivity::Four);
        assert_eq!(config.simplification_ratio, 0.05);
    }

    #[test]
    fn test_json_threshold_method() {
        let config =
            OutlineConfig::from_json(r#"{"threshold": {"method": "fixed", "value": 0.3}}"#).unwrap();
        assert_eq!(config.threshold, ThresholdMethod::Fixed { value: 0.3 });
    }

    #[test]
    fn test_validation_rejects_bad_ratio() {
        for ratio in [0.0, -0.5, 1.5, f64::NAN] {
            let config = OutlineConfig {
                simplification_ratio: ratio,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(OutlineError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_validation_rejects_bad_fixed_threshold() {
        let config = OutlineConfig {
            threshold: ThresholdMethod::Fixed { value: 2.0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_extension() {
        assert!(matches!(
            OutlineConfig::from_file("config.yaml"),
            Err(OutlineError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn test_connectivity_names() {
        assert_eq!(Connectivity::Four.to_string(), "four");
        assert_eq!(Connectivity::from_str("eight").unwrap(), Connectivity::Eight);
        assert_eq!(<Connectivity as VariantNames>::VARIANTS, &["four", "eight"]);
    }

    #[test]
    fn test_schema_mentions_fields() {
        let schema = serde_json::to_string(&OutlineConfig::schema()).unwrap();
        assert!(schema.contains("simplification_ratio"));
        assert!(schema.contains("connectivity"));
    }
}
