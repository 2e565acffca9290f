//! Set catalog loading

use super::ConfigError;
use crate::set_bonus::{SetCatalog, SetDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Container for set definitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetsConfig {
    #[serde(default)]
    pub sets: Vec<SetDefinition>,
}

fn build_catalog(config: SetsConfig) -> Result<SetCatalog, ConfigError> {
    // names double as the source tag stamped on granted affixes
    let mut names = HashSet::new();
    for set in &config.sets {
        if let Some(issue) = set.validate().into_iter().next() {
            return Err(ConfigError::ValidationError(issue.to_string()));
        }
        if !names.insert(set.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "set name `{}` is used by more than one set",
                set.name
            )));
        }
    }
    Ok(config.sets.into_iter().collect())
}

/// Load set definitions from a TOML file
pub fn load_set_catalog(path: &Path) -> Result<SetCatalog, ConfigError> {
    let config: SetsConfig = super::load_toml(path)?;
    build_catalog(config)
}

/// Load set definitions from a TOML string
pub fn parse_set_catalog(content: &str) -> Result<SetCatalog, ConfigError> {
    let config: SetsConfig = super::parse_toml(content)?;
    build_catalog(config)
}

/// Bundled set catalog (empty if the embedded file is invalid)
pub fn default_set_catalog() -> SetCatalog {
    let toml = include_str!("../../config/sets.toml");
    parse_set_catalog(toml).unwrap_or_else(|err| {
        tracing::warn!(%err, "bundled set catalog invalid, using an empty catalog");
        SetCatalog::new()
    })
}
