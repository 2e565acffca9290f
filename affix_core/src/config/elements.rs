//! Element affix table loading

use super::ConfigError;
use crate::dice::{ElementAffixEntry, ElementAffixTable};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Container for element affix entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementAffixesConfig {
    #[serde(default)]
    pub elements: Vec<ElementAffixEntry>,
}

fn build_table(config: ElementAffixesConfig) -> Result<ElementAffixTable, ConfigError> {
    for entry in &config.elements {
        if let Some(issue) = entry.affix.validate().into_iter().next() {
            return Err(ConfigError::ValidationError(issue.to_string()));
        }
    }
    Ok(config.elements.into_iter().collect())
}

/// Load element affixes from a TOML file
pub fn load_element_affixes(path: &Path) -> Result<ElementAffixTable, ConfigError> {
    let config: ElementAffixesConfig = super::load_toml(path)?;
    build_table(config)
}

/// Load element affixes from a TOML string
pub fn parse_element_affixes(content: &str) -> Result<ElementAffixTable, ConfigError> {
    let config: ElementAffixesConfig = super::parse_toml(content)?;
    build_table(config)
}
