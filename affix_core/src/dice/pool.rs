//! DicePool - a combatant's ordered die sequence

use super::affix::{DiceAffix, DiceAffixTrigger};
use super::die::{DieEvent, DieResource, DUPLICATE_TAG};
use super::engine::DiceAffixEngine;
use crate::context::EvalContext;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Ordered dice; `slot_index` always matches position
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DicePool {
    dice: Vec<DieResource>,
}

impl DicePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }

    pub fn dice(&self) -> &[DieResource] {
        &self.dice
    }

    pub fn get(&self, index: usize) -> Option<&DieResource> {
        self.dice.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut DieResource> {
        self.dice.get_mut(index)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut DieResource> {
        self.dice.iter_mut()
    }

    /// Append a die, returning its slot
    pub fn add_die(&mut self, mut die: DieResource) -> usize {
        let slot = self.dice.len();
        die.slot_index = slot;
        self.dice.push(die);
        slot
    }

    pub fn remove_die(&mut self, index: usize) -> Option<DieResource> {
        if index >= self.dice.len() {
            tracing::warn!(index, len = self.dice.len(), "remove_die index out of range");
            return None;
        }
        let die = self.dice.remove(index);
        self.reindex();
        Some(die)
    }

    /// Remove every die that came from `item`
    pub fn remove_dice_from_item(&mut self, item: &str) -> usize {
        let before = self.dice.len();
        self.dice.retain(|d| d.origin_item.as_deref() != Some(item));
        self.reindex();
        before - self.dice.len()
    }

    fn reindex(&mut self) {
        for (slot, die) in self.dice.iter_mut().enumerate() {
            die.slot_index = slot;
        }
    }

    /// Move the die at `from` to `to`, then fire ON_REORDER
    ///
    /// Out-of-range indices clamp to the last slot.
    pub fn reorder<R: Rng>(
        &mut self,
        from: usize,
        to: usize,
        engine: &DiceAffixEngine,
        ctx: &EvalContext<'_>,
        rng: &mut R,
    ) -> Vec<DieEvent> {
        let Some(last) = self.dice.len().checked_sub(1) else {
            return Vec::new();
        };
        if from > last || to > last {
            tracing::warn!(from, to, last, "reorder index out of range, clamping");
        }
        let (from, to) = (from.min(last), to.min(last));
        if from == to {
            return Vec::new();
        }
        let die = self.dice.remove(from);
        self.dice.insert(to, die);
        self.reindex();
        self.process_trigger(DiceAffixTrigger::OnReorder, engine, ctx, rng)
    }

    /// Roll every die, then run PASSIVE and ON_ROLL affixes
    ///
    /// Dice requested by DUPLICATE_ON_MAX are appended after resolution and
    /// do not trigger again.
    pub fn roll_all<R: Rng>(
        &mut self,
        engine: &DiceAffixEngine,
        ctx: &EvalContext<'_>,
        rng: &mut R,
    ) -> Vec<DieEvent> {
        for die in &mut self.dice {
            die.is_consumed = false;
            die.roll(rng);
        }
        let mut events = self.process_trigger(DiceAffixTrigger::Passive, engine, ctx, rng);
        events.extend(self.process_trigger(DiceAffixTrigger::OnRoll, engine, ctx, rng));

        let mut requested: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                DieEvent::DuplicateRequested { slot } => Some(*slot),
                _ => None,
            })
            .collect();
        requested.sort_unstable();
        requested.dedup();
        for slot in requested {
            if let Some(copy) = self.dice.get(slot).map(DieResource::duplicate) {
                self.add_die(copy);
            }
        }
        events
    }

    /// Run every die's affixes for `trigger`
    pub fn process_trigger<R: Rng>(
        &mut self,
        trigger: DiceAffixTrigger,
        engine: &DiceAffixEngine,
        ctx: &EvalContext<'_>,
        rng: &mut R,
    ) -> Vec<DieEvent> {
        let ctx = ctx.clone().with_dice_pool_size(self.dice.len());
        engine.process_trigger(&mut self.dice, trigger, &ctx, rng)
    }

    /// Spend a die: run its ON_USE affixes and mark it consumed
    pub fn use_die<R: Rng>(
        &mut self,
        index: usize,
        engine: &DiceAffixEngine,
        ctx: &EvalContext<'_>,
        rng: &mut R,
    ) -> Option<(i32, Vec<DieEvent>)> {
        if self.dice.get(index)?.is_consumed {
            return None;
        }
        let ctx = ctx.clone().with_dice_pool_size(self.dice.len());
        let events =
            engine.process_die_trigger(&mut self.dice, index, DiceAffixTrigger::OnUse, &ctx, rng);
        let die = self.dice.get_mut(index)?;
        die.is_consumed = true;
        Some((die.modified_value, events))
    }

    /// Apply a runtime affix to every die matching `filter`
    pub fn apply_affix_where(
        &mut self,
        affix: &DiceAffix,
        filter: impl Fn(&DieResource) -> bool,
    ) -> usize {
        let mut applied = 0;
        for die in self.dice.iter_mut().filter(|d| filter(d)) {
            die.add_affix(affix.clone());
            applied += 1;
        }
        applied
    }

    /// Remove applied affixes tagged with `source` from every die
    pub fn remove_affixes_by_source(&mut self, source: &str) -> usize {
        self.dice
            .iter_mut()
            .map(|d| d.remove_affixes_by_source(source))
            .sum()
    }

    /// Drop dice created by duplication (end of turn)
    pub fn clear_duplicates(&mut self) -> usize {
        let before = self.dice.len();
        self.dice.retain(|d| !d.base_tags.contains(DUPLICATE_TAG));
        self.reindex();
        before - self.dice.len()
    }

    /// Sum of modified values of dice not yet used
    pub fn total_value(&self) -> i32 {
        self.dice
            .iter()
            .filter(|d| !d.is_consumed)
            .map(|d| d.modified_value)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::{DiceEffectType, NeighborTarget, PositionRequirement};
    use crate::types::DieType;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn pool(values: &[i32]) -> DicePool {
        let mut pool = DicePool::new();
        for v in values {
            pool.add_die(DieResource::new(DieType::D6).with_value(*v));
        }
        pool
    }

    #[test]
    fn test_slots_follow_position() {
        let mut pool = pool(&[1, 2, 3]);
        pool.remove_die(0);
        assert_eq!(pool.dice()[0].slot_index, 0);
        assert_eq!(pool.dice()[1].slot_index, 1);
        assert!(pool.remove_die(9).is_none());
    }

    #[test]
    fn test_reorder_fires_on_reorder() {
        let engine = DiceAffixEngine::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut pool = pool(&[2, 2, 2]);
        let leader = DiceAffix::new("Point Man", DiceEffectType::ModifyValueFlat, 3.0)
            .with_trigger(DiceAffixTrigger::OnReorder)
            .with_position(PositionRequirement::First);
        pool.get_mut(2).unwrap().add_affix(leader);

        let events = pool.reorder(2, 0, &engine, &EvalContext::new(), &mut rng);
        assert_eq!(events.len(), 1);
        assert_eq!(pool.dice()[0].modified_value, 5);
        assert_eq!(pool.dice()[0].applied_affixes().len(), 1);
    }

    #[test]
    fn test_roll_all_applies_on_roll_affixes() {
        let engine = DiceAffixEngine::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut pool = pool(&[1, 1]);
        let floor = DiceAffix::new("Steady", DiceEffectType::SetMinimumValue, 4.0)
            .targeting(NeighborTarget::AllDice);
        pool.get_mut(0).unwrap().add_affix(floor);

        for _ in 0..20 {
            pool.roll_all(&engine, &EvalContext::new(), &mut rng);
            assert!(pool.dice().iter().all(|d| d.modified_value >= 4));
        }
    }

    #[test]
    fn test_duplicates_appended_once() {
        let engine = DiceAffixEngine::default();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut pool = DicePool::new();
        let mut die = DieResource::new(DieType::D4)
            .with_inherent_affix(DiceAffix::new("Echo", DiceEffectType::DuplicateOnMax, 0.0));
        die.lock();
        pool.add_die(die.with_value(4));

        pool.roll_all(&engine, &EvalContext::new(), &mut rng);
        assert_eq!(pool.len(), 2);
        assert!(pool.dice()[1].has_tag(DUPLICATE_TAG));
        assert_eq!(pool.dice()[1].slot_index, 1);

        assert_eq!(pool.clear_duplicates(), 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_use_die_consumes_once() {
        let engine = DiceAffixEngine::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut pool = pool(&[3, 5]);
        pool.get_mut(0).unwrap().add_affix(
            DiceAffix::new("Follow Through", DiceEffectType::ModifyValueFlat, 1.0)
                .with_trigger(DiceAffixTrigger::OnUse)
                .targeting(NeighborTarget::Right),
        );

        let (value, events) = pool.use_die(0, &engine, &EvalContext::new(), &mut rng).unwrap();
        assert_eq!(value, 3);
        assert_eq!(events.len(), 1);
        assert_eq!(pool.dice()[1].modified_value, 6);
        assert!(pool.use_die(0, &engine, &EvalContext::new(), &mut rng).is_none());
        assert_eq!(pool.total_value(), 6);
    }

    #[test]
    fn test_remove_affixes_by_source_across_dice() {
        let mut pool = pool(&[1, 1, 1]);
        let affix = DiceAffix::new("Set", DiceEffectType::ModifyValueFlat, 1.0)
            .instantiate("set:Ember", "set");
        assert_eq!(pool.apply_affix_where(&affix, |d| d.slot_index != 1), 2);
        assert_eq!(pool.remove_affixes_by_source("set:Ember"), 2);
        assert!(pool.dice().iter().all(|d| d.applied_affixes().is_empty()));
    }
}
