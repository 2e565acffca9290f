//! DieResource - a runtime die and its value layers

use super::affix::DiceAffix;
use crate::types::{DieType, Element};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lowest value a die can ever show
pub const MIN_DIE_VALUE: i32 = 1;

/// Which layer of a die's stack an affix came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffixLayer {
    /// Looked up from the die's element
    Element,
    /// Baked into the die template
    Inherent,
    /// Added at runtime (equipment, set bonuses, buffs)
    Applied,
}

/// Notification emitted by a die mutation, forwarded to observers by the turn loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DieEvent {
    ValueModified { slot: usize, old: i32, new: i32 },
    TagAdded { slot: usize, tag: String },
    TagRemoved { slot: usize, tag: String },
    Locked { slot: usize },
    RerollGranted { slot: usize, count: u32 },
    AutoRerolled { slot: usize, old: i32, new: i32 },
    DuplicateRequested { slot: usize },
    DieTypeChanged { slot: usize, from: DieType, to: DieType },
    DamageTypeSet { slot: usize, element: Element, layer: AffixLayer },
    StatusGranted { slot: usize, status_id: String, stacks: u32 },
}

/// A runtime die instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DieResource {
    pub die_type: DieType,
    /// Innate damage type (None = inherits from the action)
    #[serde(default)]
    pub element: Element,
    /// Template affixes, never mutated at runtime
    #[serde(default)]
    inherent_affixes: Vec<DiceAffix>,
    /// Runtime affixes in application order
    #[serde(default)]
    applied_affixes: Vec<DiceAffix>,
    /// Raw roll
    #[serde(default = "default_value")]
    pub current_value: i32,
    /// Post-affix value, never below 1
    #[serde(default = "default_value")]
    pub modified_value: i32,
    /// Flat external bias folded into the baseline
    #[serde(default)]
    pub modifier: i32,
    /// Tags restored on every reset
    #[serde(default)]
    pub base_tags: BTreeSet<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub slot_index: usize,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub can_reroll: bool,
    #[serde(default)]
    pub rerolls_granted: u32,
    /// Item this die came from, used to scope set-bonus dice affixes
    #[serde(default)]
    pub origin_item: Option<String>,
    #[serde(skip)]
    pub is_consumed: bool,
    #[serde(skip)]
    damage_type_inherent: Option<Element>,
    #[serde(skip)]
    damage_type_applied: Option<Element>,
}

fn default_value() -> i32 {
    MIN_DIE_VALUE
}

impl DieResource {
    pub fn new(die_type: DieType) -> Self {
        DieResource {
            die_type,
            element: Element::None,
            inherent_affixes: Vec::new(),
            applied_affixes: Vec::new(),
            current_value: MIN_DIE_VALUE,
            modified_value: MIN_DIE_VALUE,
            modifier: 0,
            base_tags: BTreeSet::new(),
            tags: BTreeSet::new(),
            slot_index: 0,
            is_locked: false,
            can_reroll: false,
            rerolls_granted: 0,
            origin_item: None,
            is_consumed: false,
            damage_type_inherent: None,
            damage_type_applied: None,
        }
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.element = element;
        self
    }

    pub fn with_inherent_affix(mut self, affix: DiceAffix) -> Self {
        self.inherent_affixes.push(affix);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        self.base_tags.insert(tag.clone());
        self.tags.insert(tag);
        self
    }

    /// Die with a fixed raw value, handy for scripted rolls
    pub fn with_value(mut self, value: i32) -> Self {
        self.current_value = value.clamp(MIN_DIE_VALUE, self.max_value());
        self.reset_modifications();
        self
    }

    /// Highest face
    pub fn max_value(&self) -> i32 {
        self.die_type.faces() as i32
    }

    pub fn is_max_roll(&self) -> bool {
        self.current_value == self.max_value()
    }

    /// Roll a fresh raw value and reset the modified layer
    ///
    /// Locked dice keep their value.
    pub fn roll(&mut self, rng: &mut impl Rng) -> i32 {
        if !self.is_locked {
            self.current_value = rng.gen_range(MIN_DIE_VALUE..=self.max_value());
        }
        self.reset_modifications();
        self.current_value
    }

    /// Restore the baseline: modified = current + modifier, base tags only
    pub fn reset_modifications(&mut self) {
        self.modified_value = (self.current_value + self.modifier).max(MIN_DIE_VALUE);
        self.tags = self.base_tags.clone();
        self.rerolls_granted = 0;
        self.can_reroll = false;
        self.damage_type_inherent = None;
        self.damage_type_applied = None;
    }

    fn set_modified(&mut self, value: i32) -> Option<DieEvent> {
        let old = self.modified_value;
        let new = value.max(MIN_DIE_VALUE);
        if new == old {
            return None;
        }
        self.modified_value = new;
        Some(DieEvent::ValueModified {
            slot: self.slot_index,
            old,
            new,
        })
    }

    /// Add a flat amount, floor 1
    pub fn apply_flat_modifier(&mut self, amount: f64) -> Option<DieEvent> {
        let value = (self.modified_value as f64 + amount).round() as i32;
        self.set_modified(value)
    }

    /// Multiply by an absolute factor (1.0 is a no-op), floor 1
    pub fn apply_percent_modifier(&mut self, factor: f64) -> Option<DieEvent> {
        let value = (self.modified_value as f64 * factor).round() as i32;
        self.set_modified(value)
    }

    /// Raise the value to at least `minimum`; never lowers it
    pub fn set_minimum_value(&mut self, minimum: i32) -> Option<DieEvent> {
        if self.modified_value >= minimum {
            return None;
        }
        self.set_modified(minimum)
    }

    /// Lower the value to at most `maximum`; never raises it
    pub fn set_maximum_value(&mut self, maximum: i32) -> Option<DieEvent> {
        if self.modified_value <= maximum {
            return None;
        }
        self.set_modified(maximum)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn add_tag(&mut self, tag: &str) -> Option<DieEvent> {
        self.tags.insert(tag.to_string()).then(|| DieEvent::TagAdded {
            slot: self.slot_index,
            tag: tag.to_string(),
        })
    }

    pub fn remove_tag(&mut self, tag: &str) -> Option<DieEvent> {
        self.tags.remove(tag).then(|| DieEvent::TagRemoved {
            slot: self.slot_index,
            tag: tag.to_string(),
        })
    }

    pub fn lock(&mut self) -> Option<DieEvent> {
        if self.is_locked {
            return None;
        }
        self.is_locked = true;
        Some(DieEvent::Locked {
            slot: self.slot_index,
        })
    }

    pub fn unlock(&mut self) {
        self.is_locked = false;
    }

    pub fn grant_rerolls(&mut self, count: u32) -> Option<DieEvent> {
        if count == 0 {
            return None;
        }
        self.rerolls_granted += count;
        self.can_reroll = true;
        Some(DieEvent::RerollGranted {
            slot: self.slot_index,
            count,
        })
    }

    /// Spend a granted reroll, returning the new raw value
    ///
    /// Affixes are not re-run; the caller triggers them again if needed.
    pub fn use_reroll(&mut self, rng: &mut impl Rng) -> Option<i32> {
        if self.rerolls_granted == 0 || self.is_locked {
            return None;
        }
        self.rerolls_granted -= 1;
        self.can_reroll = self.rerolls_granted > 0;
        self.current_value = rng.gen_range(MIN_DIE_VALUE..=self.max_value());
        self.modified_value = (self.current_value + self.modifier).max(MIN_DIE_VALUE);
        Some(self.current_value)
    }

    /// Swap to another die type, clamping the raw value to the new faces
    ///
    /// The modified value keeps its offset from the raw value, so both
    /// layers stay consistent with the new faces.
    pub fn change_die_type(&mut self, die_type: DieType) -> Vec<DieEvent> {
        if die_type == self.die_type {
            return Vec::new();
        }
        let from = self.die_type;
        let offset = self.modified_value - self.current_value;
        self.die_type = die_type;
        self.current_value = self.current_value.min(self.max_value());

        let mut events = vec![DieEvent::DieTypeChanged {
            slot: self.slot_index,
            from,
            to: die_type,
        }];
        events.extend(self.set_modified(self.current_value + offset));
        events
    }

    /// Record a damage type from an affix layer
    pub fn set_damage_type(&mut self, element: Element, layer: AffixLayer) -> DieEvent {
        match layer {
            AffixLayer::Applied => self.damage_type_applied = Some(element),
            AffixLayer::Element | AffixLayer::Inherent => self.damage_type_inherent = Some(element),
        }
        DieEvent::DamageTypeSet {
            slot: self.slot_index,
            element,
            layer,
        }
    }

    /// Damage type for the combat resolver: applied affix, inherent affix, innate element
    pub fn effective_damage_type(&self) -> Element {
        self.damage_type_applied
            .or(self.damage_type_inherent)
            .unwrap_or(self.element)
    }

    pub fn inherent_affixes(&self) -> &[DiceAffix] {
        &self.inherent_affixes
    }

    pub fn applied_affixes(&self) -> &[DiceAffix] {
        &self.applied_affixes
    }

    pub fn add_affix(&mut self, affix: DiceAffix) {
        self.applied_affixes.push(affix);
    }

    /// Remove applied affixes tagged with `source`; inherent ones are untouched
    pub fn remove_affixes_by_source(&mut self, source: &str) -> usize {
        let before = self.applied_affixes.len();
        self.applied_affixes.retain(|a| a.source != source);
        before - self.applied_affixes.len()
    }

    /// Inherent affixes in declaration order, then applied in application order
    pub fn get_all_affixes(&self) -> impl Iterator<Item = (AffixLayer, &DiceAffix)> {
        self.inherent_affixes
            .iter()
            .map(|a| (AffixLayer::Inherent, a))
            .chain(self.applied_affixes.iter().map(|a| (AffixLayer::Applied, a)))
    }

    /// Copy for DUPLICATE_ON_MAX: same template and raw value, runtime affixes stripped
    pub fn duplicate(&self) -> DieResource {
        let mut copy = self.clone();
        copy.applied_affixes.clear();
        copy.is_locked = false;
        copy.is_consumed = false;
        copy.base_tags.insert(DUPLICATE_TAG.to_string());
        copy.reset_modifications();
        copy
    }
}

/// Tag carried by dice created through duplication
pub const DUPLICATE_TAG: &str = "duplicate";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::DiceEffectType;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_roll_in_range_and_resets() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut die = DieResource::new(DieType::D8);
        die.modifier = 2;
        for _ in 0..100 {
            let value = die.roll(&mut rng);
            assert!((1..=8).contains(&value));
            assert_eq!(die.modified_value, value + 2);
        }
    }

    #[test]
    fn test_locked_die_keeps_value() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut die = DieResource::new(DieType::D20).with_value(17);
        die.lock();
        for _ in 0..10 {
            assert_eq!(die.roll(&mut rng), 17);
        }
    }

    #[test]
    fn test_value_floor() {
        let mut die = DieResource::new(DieType::D6).with_value(2);
        die.apply_flat_modifier(-10.0);
        assert_eq!(die.modified_value, 1);
        die.apply_percent_modifier(0.0);
        assert_eq!(die.modified_value, 1);
        die.set_maximum_value(-4);
        assert_eq!(die.modified_value, 1);
    }

    #[test]
    fn test_one_sided_clamps() {
        let mut die = DieResource::new(DieType::D6).with_value(4);
        assert!(die.set_minimum_value(2).is_none());
        assert_eq!(die.modified_value, 4);
        assert!(die.set_maximum_value(5).is_none());
        assert_eq!(die.modified_value, 4);

        assert!(die.set_minimum_value(5).is_some());
        assert_eq!(die.modified_value, 5);
        die.set_maximum_value(3);
        assert_eq!(die.modified_value, 3);
    }

    #[test]
    fn test_percent_is_absolute_multiplier() {
        let mut die = DieResource::new(DieType::D10).with_value(6);
        assert!(die.apply_percent_modifier(1.0).is_none());
        die.apply_percent_modifier(1.5);
        assert_eq!(die.modified_value, 9);
    }

    #[test]
    fn test_damage_type_priority() {
        let mut die = DieResource::new(DieType::D6).with_element(Element::Ice);
        assert_eq!(die.effective_damage_type(), Element::Ice);
        die.set_damage_type(Element::Fire, AffixLayer::Inherent);
        assert_eq!(die.effective_damage_type(), Element::Fire);
        die.set_damage_type(Element::Shadow, AffixLayer::Applied);
        die.set_damage_type(Element::Holy, AffixLayer::Inherent);
        assert_eq!(die.effective_damage_type(), Element::Shadow);
        die.reset_modifications();
        assert_eq!(die.effective_damage_type(), Element::Ice);
    }

    #[test]
    fn test_affix_order_and_source_removal() {
        let mut die = DieResource::new(DieType::D6)
            .with_inherent_affix(DiceAffix::new("Base", DiceEffectType::ModifyValueFlat, 1.0));
        die.add_affix(
            DiceAffix::new("A", DiceEffectType::ModifyValueFlat, 1.0)
                .instantiate("set:Ember", "set"),
        );
        die.add_affix(
            DiceAffix::new("B", DiceEffectType::ModifyValueFlat, 1.0)
                .instantiate("item:Ring", "item"),
        );

        let names: Vec<_> = die.get_all_affixes().map(|(_, a)| a.name.as_str()).collect();
        assert_eq!(names, ["Base", "A", "B"]);

        assert_eq!(die.remove_affixes_by_source("set:Ember"), 1);
        assert_eq!(die.inherent_affixes().len(), 1);
        assert_eq!(die.applied_affixes().len(), 1);
    }

    #[test]
    fn test_duplicate_strips_applied() {
        let mut die = DieResource::new(DieType::D6).with_value(6);
        die.add_affix(DiceAffix::new("A", DiceEffectType::LockDie, 0.0));
        let copy = die.duplicate();
        assert!(copy.applied_affixes().is_empty());
        assert!(copy.has_tag(DUPLICATE_TAG));
        assert_eq!(copy.current_value, 6);
    }

    #[test]
    fn test_change_die_type_clamps() {
        let mut die = DieResource::new(DieType::D20).with_value(15);
        die.change_die_type(DieType::D6);
        assert_eq!(die.current_value, 6);
        assert_eq!(die.modified_value, 6);
        assert!(die.change_die_type(DieType::D6).is_empty());
    }

    #[test]
    fn test_change_die_type_keeps_modifications() {
        let mut die = DieResource::new(DieType::D20).with_value(18);
        die.apply_flat_modifier(2.0);
        let events = die.change_die_type(DieType::D6);
        assert_eq!(die.current_value, 6);
        assert_eq!(die.modified_value, 8);
        assert_eq!(
            events,
            vec![
                DieEvent::DieTypeChanged {
                    slot: 0,
                    from: DieType::D20,
                    to: DieType::D6,
                },
                DieEvent::ValueModified {
                    slot: 0,
                    old: 20,
                    new: 8,
                },
            ]
        );
    }

    #[test]
    fn test_use_reroll_spends_grants() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut die = DieResource::new(DieType::D6).with_value(1);
        assert!(die.use_reroll(&mut rng).is_none());

        die.grant_rerolls(1);
        assert!(die.can_reroll);
        let value = die.use_reroll(&mut rng).unwrap();
        assert!((1..=6).contains(&value));
        assert_eq!(die.modified_value, value);
        assert!(!die.can_reroll);
        assert!(die.use_reroll(&mut rng).is_none());

        die.grant_rerolls(2);
        die.lock();
        assert!(die.use_reroll(&mut rng).is_none());
        assert_eq!(die.rerolls_granted, 2);
    }
}
