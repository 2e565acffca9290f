//! Scaling configuration: level curve, fuzz constants and region bands

use super::ConfigError;
use crate::scaling::{fuzz_range, power_position, CurveShape, FuzzWindow};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Global fuzz percentage used when neither the affix nor the config overrides it
pub const DEFAULT_FUZZ_PCT: f64 = 0.15;
/// Absolute fuzz floor used when no config is available
pub const DEFAULT_MIN_ABSOLUTE_FUZZ: f64 = 1.0;
/// Level cap used when no config is available
pub const DEFAULT_MAX_LEVEL: u32 = 50;

/// Injected scaling configuration for affix rolling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingConfig {
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    /// Fraction of the center value used as fuzz (0.15 = 15%)
    #[serde(default = "default_fuzz_pct")]
    pub global_fuzz_pct: f64,
    /// Minimum fuzz regardless of the center value
    #[serde(default = "default_min_absolute_fuzz")]
    pub min_absolute_fuzz: f64,
    /// Optional curve; linear when absent
    #[serde(default)]
    pub curve: Option<CurveShape>,
    /// Level bands per region, indexed by region id
    #[serde(default)]
    pub regions: Vec<RegionBand>,
}

/// Level range appropriate for a region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionBand {
    pub min_level: u32,
    pub max_level: u32,
}

fn default_max_level() -> u32 {
    DEFAULT_MAX_LEVEL
}
fn default_fuzz_pct() -> f64 {
    DEFAULT_FUZZ_PCT
}
fn default_min_absolute_fuzz() -> f64 {
    DEFAULT_MIN_ABSOLUTE_FUZZ
}

impl Default for ScalingConfig {
    fn default() -> Self {
        ScalingConfig {
            max_level: DEFAULT_MAX_LEVEL,
            global_fuzz_pct: DEFAULT_FUZZ_PCT,
            min_absolute_fuzz: DEFAULT_MIN_ABSOLUTE_FUZZ,
            curve: None,
            regions: Vec::new(),
        }
    }
}

impl ScalingConfig {
    /// Power position for a level using this config's curve
    pub fn power_position(&self, level: u32) -> f64 {
        power_position(level, self.max_level, self.curve.as_ref())
    }

    /// Fuzz window around `center`; `fuzz_override` replaces the global percentage
    pub fn fuzz_range(
        &self,
        center: f64,
        effect_min: f64,
        effect_max: f64,
        fuzz_override: Option<f64>,
    ) -> FuzzWindow {
        let pct = fuzz_override.unwrap_or(self.global_fuzz_pct);
        fuzz_range(center, effect_min, effect_max, pct, self.min_absolute_fuzz)
    }

    /// Level band for a region, clamping unknown ids to the nearest band
    ///
    /// Only used to pick a level for procedural generation.
    pub fn region_level_range(&self, region_id: usize) -> (u32, u32) {
        if self.regions.is_empty() {
            tracing::warn!(region_id, "no region bands configured, using full level range");
            return (1, self.max_level);
        }
        let index = if region_id >= self.regions.len() {
            let clamped = self.regions.len() - 1;
            tracing::warn!(region_id, clamped, "region id out of range");
            clamped
        } else {
            region_id
        };
        let band = self.regions[index];
        (band.min_level.min(band.max_level), band.max_level.max(band.min_level))
    }

    /// Check the config for authoring mistakes
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_level <= 1 {
            return Err(ConfigError::ValidationError(format!(
                "max_level must exceed 1 (got {})",
                self.max_level
            )));
        }
        if self.global_fuzz_pct < 0.0 || self.min_absolute_fuzz < 0.0 {
            return Err(ConfigError::ValidationError(
                "fuzz values must be non-negative".to_string(),
            ));
        }
        if let Some(curve) = &self.curve {
            if !curve.is_monotonic() {
                return Err(ConfigError::ValidationError(
                    "scaling curve must be monotonic".to_string(),
                ));
            }
        }
        for (i, band) in self.regions.iter().enumerate() {
            if band.min_level > band.max_level {
                return Err(ConfigError::ValidationError(format!(
                    "region {} has min_level above max_level",
                    i
                )));
            }
        }
        Ok(())
    }
}

/// Load a scaling config from a TOML file
pub fn load_scaling_config(path: &Path) -> Result<ScalingConfig, ConfigError> {
    let config: ScalingConfig = super::load_toml(path)?;
    config.validate()?;
    Ok(config)
}

/// Load a scaling config from a TOML string
pub fn parse_scaling_config(content: &str) -> Result<ScalingConfig, ConfigError> {
    let config: ScalingConfig = super::parse_toml(content)?;
    config.validate()?;
    Ok(config)
}

/// Get the bundled scaling config
pub fn default_scaling_config() -> ScalingConfig {
    let toml = include_str!("../../config/scaling.toml");
    parse_scaling_config(toml).unwrap_or_else(|err| {
        tracing::warn!(%err, "bundled scaling config invalid, using defaults");
        ScalingConfig::default()
    })
}
