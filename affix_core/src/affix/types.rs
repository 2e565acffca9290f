//! Affix templates and their evaluated contributions

use crate::condition::AffixCondition;
use crate::types::{AffixCategory, DieType, EffectData};
use crate::validation::{ValidationIssue, invalid};
use crate::value_source::{ValueSource, STAT_NAME_KEY};
use serde::{Deserialize, Serialize};

/// Sub-resource granted by a sub-effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GrantedResource {
    /// A combat action by id
    Action { action_id: String },
    /// Extra dice added to the pool
    Dice { dice: Vec<DieType> },
}

/// One step of a compound affix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffixSubEffect {
    #[serde(default)]
    pub category: AffixCategory,
    #[serde(default)]
    pub value_source: ValueSource,
    #[serde(default)]
    pub effect_number: f64,
    #[serde(default)]
    pub effect_data: EffectData,
    /// Use `condition` even when absent instead of inheriting the parent's
    #[serde(default)]
    pub override_condition: bool,
    #[serde(default)]
    pub condition: Option<AffixCondition>,
    #[serde(default)]
    pub granted: Option<GrantedResource>,
}

impl AffixSubEffect {
    pub fn new(category: AffixCategory, effect_number: f64) -> Self {
        AffixSubEffect {
            category,
            value_source: ValueSource::Static,
            effect_number,
            effect_data: EffectData::new(),
            override_condition: false,
            condition: None,
            granted: None,
        }
    }

    pub fn with_value_source(mut self, value_source: ValueSource) -> Self {
        self.value_source = value_source;
        self
    }

    pub fn with_condition(mut self, condition: Option<AffixCondition>) -> Self {
        self.override_condition = true;
        self.condition = condition;
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.effect_data.insert(key.into(), value);
        self
    }

    pub fn granting(mut self, granted: GrantedResource) -> Self {
        self.granted = Some(granted);
        self
    }
}

/// An item-level modifier template
///
/// When `sub_effects` is non-empty the top-level effect fields are inert and
/// evaluation walks the sub-effects in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Affix {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: AffixCategory,
    #[serde(default)]
    pub value_source: ValueSource,
    #[serde(default)]
    pub effect_min: f64,
    #[serde(default)]
    pub effect_max: f64,
    #[serde(default)]
    pub effect_number: f64,
    /// Per-affix override of the global fuzz percentage
    #[serde(default)]
    pub roll_fuzz: Option<f64>,
    #[serde(default)]
    pub effect_data: EffectData,
    #[serde(default)]
    pub condition: Option<AffixCondition>,
    #[serde(default)]
    pub sub_effects: Vec<AffixSubEffect>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Owner tag used for bulk removal (e.g. "set:Ember Regalia")
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub source_type: String,
}

impl Affix {
    pub fn new(name: impl Into<String>, category: AffixCategory, effect_number: f64) -> Self {
        Affix {
            name: name.into(),
            description: String::new(),
            category,
            value_source: ValueSource::Static,
            effect_min: 0.0,
            effect_max: 0.0,
            effect_number,
            roll_fuzz: None,
            effect_data: EffectData::new(),
            condition: None,
            sub_effects: Vec::new(),
            tags: Vec::new(),
            source: String::new(),
            source_type: String::new(),
        }
    }

    pub fn with_range(mut self, effect_min: f64, effect_max: f64) -> Self {
        self.effect_min = effect_min;
        self.effect_max = effect_max;
        self
    }

    pub fn with_value_source(mut self, value_source: ValueSource) -> Self {
        self.value_source = value_source;
        self
    }

    pub fn with_condition(mut self, condition: AffixCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_sub_effect(mut self, sub_effect: AffixSubEffect) -> Self {
        self.sub_effects.push(sub_effect);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.effect_data.insert(key.into(), value);
        self
    }

    /// Owned runtime clone stamped with its source
    pub fn instantiate(&self, source: &str, source_type: &str) -> Affix {
        let mut instance = self.clone();
        instance.source = source.to_string();
        instance.source_type = source_type.to_string();
        instance
    }

    /// Whether this affix rolls its value from a range
    pub fn has_scaling(&self) -> bool {
        self.effect_max > self.effect_min
    }

    pub fn is_compound(&self) -> bool {
        !self.sub_effects.is_empty()
    }

    /// Design-time checks
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let owner = self.name.as_str();

        if self.effect_min > self.effect_max {
            issues.push(ValidationIssue::InvertedRange {
                owner: owner.to_string(),
                min: self.effect_min,
                max: self.effect_max,
            });
        }
        if let Some(fuzz) = self.roll_fuzz {
            if fuzz < 0.0 {
                issues.push(ValidationIssue::NegativeFuzz {
                    owner: owner.to_string(),
                    value: fuzz,
                });
            }
        }
        if self.name.trim().is_empty() {
            issues.push(invalid("<unnamed affix>", "affix name is empty"));
        }

        if self.is_compound() {
            if self.effect_number != 0.0 || self.has_scaling() {
                issues.push(ValidationIssue::ShadowedTopLevel {
                    owner: owner.to_string(),
                });
            }
            for sub in &self.sub_effects {
                check_stat_name(owner, sub.value_source, &sub.effect_data, &mut issues);
            }
        } else {
            check_stat_name(owner, self.value_source, &self.effect_data, &mut issues);
        }
        issues
    }
}

fn check_stat_name(
    owner: &str,
    source: ValueSource,
    data: &EffectData,
    issues: &mut Vec<ValidationIssue>,
) {
    if source == ValueSource::PlayerStat && !data.contains_key(STAT_NAME_KEY) {
        issues.push(ValidationIssue::MissingEffectKey {
            owner: owner.to_string(),
            key: STAT_NAME_KEY.to_string(),
        });
    }
}

/// One (category, value) produced by evaluating an affix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffixContribution {
    pub category: AffixCategory,
    pub value: f64,
    #[serde(default)]
    pub granted: Option<GrantedResource>,
    /// Name of the affix that produced this contribution
    pub affix_name: String,
    #[serde(default)]
    pub source: String,
}
