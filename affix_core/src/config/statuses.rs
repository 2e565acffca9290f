//! Status template loading

use super::ConfigError;
use crate::status::{StatusAffix, StatusRegistry};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Container for status templates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusesConfig {
    #[serde(rename = "statuses")]
    pub statuses: Vec<StatusAffix>,
}

fn build_registry(config: StatusesConfig) -> Result<StatusRegistry, ConfigError> {
    let mut registry = StatusRegistry::new();
    for status in config.statuses {
        if let Some(issue) = status.validate().into_iter().next() {
            return Err(ConfigError::ValidationError(issue.to_string()));
        }
        registry.register(status);
    }
    Ok(registry)
}

/// Load status templates from a TOML file
pub fn load_status_configs(path: &Path) -> Result<StatusRegistry, ConfigError> {
    let config: StatusesConfig = super::load_toml(path)?;
    build_registry(config)
}

/// Load status templates from a TOML string
pub fn parse_status_configs(content: &str) -> Result<StatusRegistry, ConfigError> {
    let config: StatusesConfig = super::parse_toml(content)?;
    build_registry(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{DecayStyle, DurationType, StatusTiming};
    use crate::types::{AffixCategory, Element};

    #[test]
    fn test_parse_statuses() {
        let toml = r#"
[[statuses]]
id = "scorch"
name = "Scorch"
max_stacks = 6
decay_style = "halving"
damage_per_stack = 3.0
element = "fire"
tick_timing = "end_of_turn"

[[statuses]]
id = "stoneskin"
name = "Stoneskin"
duration_type = "until_removed"
max_stacks = 2

[[statuses.stat_affixes]]
name = "Stone"
category = "armor_bonus"
effect_number = 5.0
"#;

        let registry = parse_status_configs(toml).unwrap();
        let scorch = registry.get("scorch").unwrap();
        assert_eq!(scorch.decay_style, DecayStyle::Halving);
        assert_eq!(scorch.element, Element::Fire);
        assert_eq!(scorch.tick_timing, StatusTiming::EndOfTurn);
        assert!((scorch.damage_per_stack - 3.0).abs() < f64::EPSILON);

        let stoneskin = registry.get("stoneskin").unwrap();
        assert_eq!(stoneskin.duration_type, DurationType::UntilRemoved);
        assert_eq!(stoneskin.stat_affixes[0].category, AffixCategory::ArmorBonus);
    }

    #[test]
    fn test_invalid_status_rejected() {
        let toml = r#"
[[statuses]]
id = "broken"
name = "Broken"
max_stacks = 0
"#;
        assert!(matches!(
            parse_status_configs(toml),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
