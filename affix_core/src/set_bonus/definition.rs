//! Set definitions and the catalog they are looked up from

use crate::affix::Affix;
use crate::dice::DiceAffix;
use crate::validation::{invalid, ValidationIssue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source type stamped on set-bonus affix instances
pub const SET_SOURCE_TYPE: &str = "set";

/// A bonus tier unlocked at a piece count
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetBonusThreshold {
    pub required_pieces: u32,
    #[serde(default)]
    pub description: String,
    /// Affixes added to the player's affix pool
    #[serde(default)]
    pub affixes: Vec<Affix>,
    /// Dice affixes applied to dice from this set's equipped items
    #[serde(default)]
    pub dice_affixes: Vec<DiceAffix>,
}

impl SetBonusThreshold {
    pub fn new(required_pieces: u32) -> Self {
        SetBonusThreshold {
            required_pieces,
            description: String::new(),
            affixes: Vec::new(),
            dice_affixes: Vec::new(),
        }
    }

    pub fn with_affix(mut self, affix: Affix) -> Self {
        self.affixes.push(affix);
        self
    }

    pub fn with_dice_affix(mut self, affix: DiceAffix) -> Self {
        self.dice_affixes.push(affix);
        self
    }
}

/// An equipment set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDefinition {
    pub set_id: String,
    pub name: String,
    /// Pieces in the full set; 0 means "highest threshold"
    #[serde(default)]
    pub total_pieces: u32,
    #[serde(default)]
    pub thresholds: Vec<SetBonusThreshold>,
}

impl SetDefinition {
    pub fn new(set_id: impl Into<String>, name: impl Into<String>) -> Self {
        SetDefinition {
            set_id: set_id.into(),
            name: name.into(),
            total_pieces: 0,
            thresholds: Vec::new(),
        }
    }

    pub fn with_total_pieces(mut self, total_pieces: u32) -> Self {
        self.total_pieces = total_pieces;
        self
    }

    pub fn with_threshold(mut self, threshold: SetBonusThreshold) -> Self {
        self.thresholds.push(threshold);
        self
    }

    /// Source tag used for every instance this set injects
    pub fn source_tag(&self) -> String {
        format!("set:{}", self.name)
    }

    pub fn piece_count(&self) -> u32 {
        if self.total_pieces > 0 {
            self.total_pieces
        } else {
            self.thresholds
                .iter()
                .map(|t| t.required_pieces)
                .max()
                .unwrap_or(0)
        }
    }

    /// Thresholds unlocked with `equipped` pieces, in declaration order
    pub fn active_thresholds(&self, equipped: u32) -> impl Iterator<Item = &SetBonusThreshold> {
        self.thresholds
            .iter()
            .filter(move |t| equipped > 0 && t.required_pieces <= equipped)
    }

    /// Design-time checks
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let owner = self.set_id.as_str();
        if self.set_id.trim().is_empty() {
            issues.push(invalid("<unnamed set>", "set_id is empty"));
        }
        if self.thresholds.is_empty() {
            issues.push(invalid(owner, "set has no thresholds"));
        }
        for threshold in &self.thresholds {
            if threshold.required_pieces == 0 {
                issues.push(invalid(owner, "threshold requires 0 pieces"));
            }
            if self.total_pieces > 0 && threshold.required_pieces > self.total_pieces {
                issues.push(invalid(
                    owner,
                    format!(
                        "threshold requires {} pieces but the set has {}",
                        threshold.required_pieces, self.total_pieces
                    ),
                ));
            }
            for affix in &threshold.affixes {
                issues.extend(affix.validate());
            }
            for affix in &threshold.dice_affixes {
                issues.extend(affix.validate());
            }
        }
        issues
    }
}

/// Set definitions by id
#[derive(Debug, Clone, Default)]
pub struct SetCatalog {
    sets: BTreeMap<String, SetDefinition>,
}

impl SetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, set: SetDefinition) {
        self.sets.insert(set.set_id.clone(), set);
    }

    pub fn get(&self, set_id: &str) -> Option<&SetDefinition> {
        self.sets.get(set_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SetDefinition> {
        self.sets.values()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl FromIterator<SetDefinition> for SetCatalog {
    fn from_iter<I: IntoIterator<Item = SetDefinition>>(iter: I) -> Self {
        let mut catalog = SetCatalog::new();
        for set in iter {
            catalog.register(set);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AffixCategory;

    fn ember() -> SetDefinition {
        SetDefinition::new("ember", "Ember Regalia")
            .with_total_pieces(3)
            .with_threshold(
                SetBonusThreshold::new(2)
                    .with_affix(Affix::new("Kindle", AffixCategory::DamageBonus, 2.0)),
            )
            .with_threshold(
                SetBonusThreshold::new(3)
                    .with_affix(Affix::new("Blaze", AffixCategory::CritChance, 0.05)),
            )
    }

    #[test]
    fn test_active_thresholds() {
        let set = ember();
        assert_eq!(set.active_thresholds(0).count(), 0);
        assert_eq!(set.active_thresholds(1).count(), 0);
        assert_eq!(set.active_thresholds(2).count(), 1);
        assert_eq!(set.active_thresholds(3).count(), 2);
        assert_eq!(set.source_tag(), "set:Ember Regalia");
    }

    #[test]
    fn test_validate() {
        assert!(ember().validate().is_empty());
        let bad = SetDefinition::new("bad", "Bad")
            .with_total_pieces(2)
            .with_threshold(SetBonusThreshold::new(4));
        assert_eq!(bad.validate().len(), 1);
        assert_eq!(bad.piece_count(), 2);
    }
}
