//! SetBonusTracker - keeps set-bonus instances in sync with equipment

use super::definition::{SetCatalog, SetDefinition, SET_SOURCE_TYPE};
use crate::affix::AffixPool;
use crate::dice::DicePool;
use crate::player::{Equipment, EquipmentItem};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Emitted when a set's equipped count changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetBonusChanged {
    pub set_id: String,
    pub new_count: u32,
    pub total_pieces: u32,
}

/// Per-set equipped counts and the instances injected for them
#[derive(Debug, Clone, Default)]
pub struct SetBonusTracker {
    catalog: SetCatalog,
    counts: BTreeMap<String, u32>,
}

impl SetBonusTracker {
    pub fn new(catalog: SetCatalog) -> Self {
        SetBonusTracker {
            catalog,
            counts: BTreeMap::new(),
        }
    }

    pub fn catalog(&self) -> &SetCatalog {
        &self.catalog
    }

    /// Last recorded equipped count for a set
    pub fn equipped_count(&self, set_id: &str) -> u32 {
        self.counts.get(set_id).copied().unwrap_or(0)
    }

    /// Required piece counts of the thresholds currently active for a set
    pub fn active_thresholds(&self, set_id: &str) -> Vec<u32> {
        let count = self.equipped_count(set_id);
        self.catalog
            .get(set_id)
            .map(|set| set.active_thresholds(count).map(|t| t.required_pieces).collect())
            .unwrap_or_default()
    }

    /// Recount every known set in one pass and resync the ones that changed
    ///
    /// A changed set is fully deactivated (everything tagged with its source
    /// removed from both pools) and then every threshold it now meets is
    /// reactivated. Unchanged sets are not touched, so a second call without
    /// an equipment change mutates nothing and reports nothing.
    pub fn recalculate_all(
        &mut self,
        equipment: &Equipment,
        affixes: &mut AffixPool,
        dice: &mut DicePool,
    ) -> Vec<SetBonusChanged> {
        self.warn_unknown_sets(equipment);

        let mut changes = Vec::new();
        for set in self.catalog.iter() {
            let new_count = equipment.items_in_set(&set.set_id).count() as u32;
            let old_count = self.counts.get(&set.set_id).copied().unwrap_or(0);
            if new_count == old_count {
                continue;
            }

            deactivate(set, affixes, dice);
            if new_count > 0 {
                activate(set, new_count, equipment, affixes, dice);
            }

            changes.push(SetBonusChanged {
                set_id: set.set_id.clone(),
                new_count,
                total_pieces: set.piece_count(),
            });
        }

        for change in &changes {
            if change.new_count == 0 {
                self.counts.remove(&change.set_id);
            } else {
                self.counts.insert(change.set_id.clone(), change.new_count);
            }
        }
        changes
    }

    fn warn_unknown_sets(&self, equipment: &Equipment) {
        let unknown: HashSet<&str> = equipment
            .items()
            .filter_map(|item| item.set_id())
            .filter(|id| self.catalog.get(id).is_none())
            .collect();
        for set_id in unknown {
            tracing::warn!(set_id, "equipped item references an unknown set");
        }
    }
}

fn deactivate(set: &SetDefinition, affixes: &mut AffixPool, dice: &mut DicePool) {
    let source = set.source_tag();
    let removed_affixes = affixes.remove_by_source(&source);
    let removed_dice_affixes = dice.remove_affixes_by_source(&source);
    if removed_affixes + removed_dice_affixes > 0 {
        tracing::debug!(
            set = %set.set_id,
            removed_affixes,
            removed_dice_affixes,
            "set bonuses deactivated"
        );
    }
}

fn activate(
    set: &SetDefinition,
    count: u32,
    equipment: &Equipment,
    affixes: &mut AffixPool,
    dice: &mut DicePool,
) {
    let source = set.source_tag();
    let set_items: HashSet<&str> = equipment
        .items_in_set(&set.set_id)
        .map(|item| item.name())
        .collect();

    for threshold in set.active_thresholds(count) {
        for affix in &threshold.affixes {
            affixes.add(affix.instantiate(&source, SET_SOURCE_TYPE));
        }
        for template in &threshold.dice_affixes {
            let instance = template.instantiate(&source, SET_SOURCE_TYPE);
            dice.apply_affix_where(&instance, |die| {
                die.origin_item
                    .as_deref()
                    .is_some_and(|origin| set_items.contains(origin))
            });
        }
        tracing::debug!(
            set = %set.set_id,
            required_pieces = threshold.required_pieces,
            "set threshold activated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affix::Affix;
    use crate::dice::{DiceAffix, DiceEffectType, DieResource};
    use crate::player::Item;
    use crate::set_bonus::SetBonusThreshold;
    use crate::types::{AffixCategory, DieType, EquipmentSlot, Rarity};

    fn catalog() -> SetCatalog {
        let ember = SetDefinition::new("ember", "Ember Regalia")
            .with_total_pieces(3)
            .with_threshold(
                SetBonusThreshold::new(2)
                    .with_affix(Affix::new("Kindle", AffixCategory::DamageBonus, 2.0))
                    .with_dice_affix(DiceAffix::new(
                        "Smolder",
                        DiceEffectType::ModifyValueFlat,
                        1.0,
                    )),
            )
            .with_threshold(
                SetBonusThreshold::new(3)
                    .with_affix(Affix::new("Blaze", AffixCategory::CritChance, 0.05)),
            );
        [ember].into_iter().collect()
    }

    fn ember_piece(name: &str, slot: EquipmentSlot) -> Item {
        Item::new(name, slot, Rarity::Rare)
            .with_set("ember")
            .with_die(DieResource::new(DieType::D6))
    }

    #[test]
    fn test_activation_and_idempotence() {
        let mut tracker = SetBonusTracker::new(catalog());
        let mut equipment = Equipment::new();
        equipment.equip(ember_piece("Ember Hood", EquipmentSlot::Head));
        equipment.equip(ember_piece("Ember Grips", EquipmentSlot::Gloves));
        let mut affixes = AffixPool::new();
        let mut dice = DicePool::new();
        for item in equipment.items() {
            for die in &item.dice {
                dice.add_die(die.clone());
            }
        }
        dice.add_die(DieResource::new(DieType::D8));

        let changes = tracker.recalculate_all(&equipment, &mut affixes, &mut dice);
        assert_eq!(
            changes,
            vec![SetBonusChanged {
                set_id: "ember".to_string(),
                new_count: 2,
                total_pieces: 3,
            }]
        );
        assert_eq!(affixes.len(), 1);
        assert_eq!(tracker.active_thresholds("ember"), vec![2]);
        // only the two set dice get the dice affix
        let with_affix = dice.dice().iter().filter(|d| !d.applied_affixes().is_empty()).count();
        assert_eq!(with_affix, 2);

        assert!(tracker.recalculate_all(&equipment, &mut affixes, &mut dice).is_empty());
        assert_eq!(affixes.len(), 1);
        assert_eq!(dice.dice()[0].applied_affixes().len(), 1);
    }

    #[test]
    fn test_drop_below_threshold_removes_exactly_set_affixes() {
        let mut tracker = SetBonusTracker::new(catalog());
        let mut equipment = Equipment::new();
        equipment.equip(ember_piece("Ember Hood", EquipmentSlot::Head));
        equipment.equip(ember_piece("Ember Grips", EquipmentSlot::Gloves));
        equipment.equip(ember_piece("Ember Treads", EquipmentSlot::Boots));
        let mut affixes = AffixPool::new();
        affixes.add(
            Affix::new("Helm Armor", AffixCategory::ArmorBonus, 3.0)
                .instantiate("item:Ember Hood", "item"),
        );
        let mut dice = DicePool::new();

        tracker.recalculate_all(&equipment, &mut affixes, &mut dice);
        assert_eq!(affixes.len(), 3);
        assert_eq!(tracker.active_thresholds("ember"), vec![2, 3]);

        equipment.unequip(EquipmentSlot::Boots);
        equipment.unequip(EquipmentSlot::Gloves);
        let changes = tracker.recalculate_all(&equipment, &mut affixes, &mut dice);
        assert_eq!(changes[0].new_count, 1);
        assert_eq!(affixes.len(), 1);
        assert_eq!(affixes.get_all_affixes().next().unwrap().name, "Helm Armor");
        assert!(tracker.active_thresholds("ember").is_empty());
    }

    #[test]
    fn test_unequip_all_clears_count() {
        let mut tracker = SetBonusTracker::new(catalog());
        let mut equipment = Equipment::new();
        equipment.equip(ember_piece("Ember Hood", EquipmentSlot::Head));
        let mut affixes = AffixPool::new();
        let mut dice = DicePool::new();

        assert_eq!(tracker.recalculate_all(&equipment, &mut affixes, &mut dice).len(), 1);
        equipment.unequip(EquipmentSlot::Head);
        let changes = tracker.recalculate_all(&equipment, &mut affixes, &mut dice);
        assert_eq!(changes[0].new_count, 0);
        assert_eq!(tracker.equipped_count("ember"), 0);
    }
}
