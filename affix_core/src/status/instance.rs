//! Active status instances

use super::types::{DecayStyle, StatusAffix};
use crate::affix::{AffixEvaluator, AffixTotals};
use crate::context::EvalContext;
use crate::types::Element;
use std::sync::Arc;

/// Remaining turns for statuses that are not turn-based
pub const NOT_TURN_BASED: i32 = -1;

/// Payload of one tick
#[derive(Debug, Clone, Default)]
pub struct StatusTick {
    pub status_id: String,
    pub damage: f64,
    pub heal: f64,
    pub element: Element,
    /// Stat modifiers already multiplied by the stack count
    pub stats: AffixTotals,
}

/// A status applied to a combatant
#[derive(Debug, Clone)]
pub struct StatusInstance {
    pub template: Arc<StatusAffix>,
    pub current_stacks: u32,
    /// Turns left, or [`NOT_TURN_BASED`]
    pub remaining_turns: i32,
    /// Who applied it
    pub source_name: String,
}

impl StatusInstance {
    /// New instance with stacks clamped to the template's max
    pub fn create(template: Arc<StatusAffix>, stacks: u32, source_name: impl Into<String>) -> Self {
        let remaining_turns = if template.is_turn_based() {
            template.default_duration
        } else {
            NOT_TURN_BASED
        };
        StatusInstance {
            current_stacks: stacks.min(template.max_stacks),
            remaining_turns,
            source_name: source_name.into(),
            template,
        }
    }

    pub fn id(&self) -> &str {
        &self.template.id
    }

    /// Add stacks (clamped), refreshing duration when the template asks for it
    ///
    /// Returns how many stacks were actually gained.
    pub fn add_stacks(&mut self, stacks: u32) -> u32 {
        let before = self.current_stacks;
        self.current_stacks = before.saturating_add(stacks).min(self.template.max_stacks);
        if self.template.refresh_on_reapply && self.template.is_turn_based() {
            self.remaining_turns = self.template.default_duration;
        }
        self.current_stacks - before
    }

    pub fn remove_stacks(&mut self, stacks: u32) -> u32 {
        let before = self.current_stacks;
        self.current_stacks = before.saturating_sub(stacks);
        before - self.current_stacks
    }

    /// Compute this tick's payload without touching stacks or duration
    pub fn apply_tick(&self, evaluator: &AffixEvaluator, ctx: &EvalContext<'_>) -> StatusTick {
        let stacks = self.current_stacks as f64;
        let mut stats = AffixTotals::new();
        for affix in &self.template.stat_affixes {
            for contribution in evaluator.evaluate(affix, ctx) {
                stats.add_scaled(contribution, stacks);
            }
        }
        StatusTick {
            status_id: self.template.id.clone(),
            damage: self.template.damage_per_stack * stacks,
            heal: self.template.heal_per_stack * stacks,
            element: self.template.element,
            stats,
        }
    }

    /// Apply the template's decay, returning stacks lost
    pub fn apply_decay(&mut self) -> u32 {
        let before = self.current_stacks;
        self.current_stacks = match self.template.decay_style {
            DecayStyle::None => before,
            DecayStyle::Flat => before.saturating_sub(self.template.decay_amount),
            DecayStyle::Halving if before <= 1 => 0,
            DecayStyle::Halving => before.div_ceil(2),
        };
        before - self.current_stacks
    }

    /// Count down one turn (turn-based statuses only)
    pub fn decrement_duration(&mut self) {
        if self.template.is_turn_based() && self.remaining_turns > 0 {
            self.remaining_turns -= 1;
        }
    }

    pub fn is_expired(&self) -> bool {
        self.current_stacks == 0 || (self.template.is_turn_based() && self.remaining_turns <= 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affix::Affix;
    use crate::status::DurationType;
    use crate::types::AffixCategory;

    fn template(max_stacks: u32, decay_style: DecayStyle) -> Arc<StatusAffix> {
        let mut status = StatusAffix::new("burn", "Burn");
        status.max_stacks = max_stacks;
        status.decay_style = decay_style;
        status.damage_per_stack = 2.0;
        status.element = Element::Fire;
        Arc::new(status)
    }

    #[test]
    fn test_stacks_clamp_to_max() {
        let mut instance = StatusInstance::create(template(5, DecayStyle::None), 3, "goblin");
        assert_eq!(instance.add_stacks(5 + 5), 2);
        assert_eq!(instance.current_stacks, 5);
        let instance = StatusInstance::create(template(5, DecayStyle::None), 99, "x");
        assert_eq!(instance.current_stacks, 5);
    }

    #[test]
    fn test_refresh_on_reapply() {
        let mut instance = StatusInstance::create(template(5, DecayStyle::None), 1, "goblin");
        instance.remaining_turns = 1;
        instance.add_stacks(1);
        assert_eq!(instance.remaining_turns, 3);

        let mut sticky = StatusAffix::new("mark", "Mark");
        sticky.refresh_on_reapply = false;
        let mut instance = StatusInstance::create(Arc::new(sticky), 1, "goblin");
        instance.remaining_turns = 1;
        instance.add_stacks(1);
        assert_eq!(instance.remaining_turns, 1);
    }

    #[test]
    fn test_halving_decay_clears_single_stack() {
        let mut instance = StatusInstance::create(template(10, DecayStyle::Halving), 5, "x");
        instance.apply_decay();
        assert_eq!(instance.current_stacks, 3);
        instance.apply_decay();
        assert_eq!(instance.current_stacks, 2);
        instance.apply_decay();
        assert_eq!(instance.current_stacks, 1);
        instance.apply_decay();
        assert_eq!(instance.current_stacks, 0);
        assert!(instance.is_expired());
    }

    #[test]
    fn test_flat_decay() {
        let mut status = (*template(10, DecayStyle::Flat)).clone();
        status.decay_amount = 2;
        let mut instance = StatusInstance::create(Arc::new(status), 3, "x");
        assert_eq!(instance.apply_decay(), 2);
        assert_eq!(instance.apply_decay(), 1);
        assert_eq!(instance.current_stacks, 0);
    }

    #[test]
    fn test_tick_is_pure() {
        let mut status = (*template(10, DecayStyle::None)).clone();
        status.stat_affixes.push(Affix::new("Scorched", AffixCategory::ArmorBonus, -1.0));
        let instance = StatusInstance::create(Arc::new(status), 4, "x");

        let tick = instance.apply_tick(&AffixEvaluator::without_scaling(), &EvalContext::new());
        assert!((tick.damage - 8.0).abs() < f64::EPSILON);
        assert!((tick.stats.get(AffixCategory::ArmorBonus) + 4.0).abs() < f64::EPSILON);
        assert_eq!(tick.element, Element::Fire);
        assert_eq!(instance.current_stacks, 4);
        assert_eq!(instance.remaining_turns, 3);
    }

    #[test]
    fn test_duration_only_for_turn_based() {
        let mut status = StatusAffix::new("ward", "Ward");
        status.duration_type = DurationType::UntilRemoved;
        let mut instance = StatusInstance::create(Arc::new(status), 1, "x");
        assert_eq!(instance.remaining_turns, NOT_TURN_BASED);
        instance.decrement_duration();
        assert_eq!(instance.remaining_turns, NOT_TURN_BASED);
        assert!(!instance.is_expired());

        let mut timed = StatusInstance::create(template(1, DecayStyle::None), 1, "x");
        for _ in 0..3 {
            assert!(!timed.is_expired());
            timed.decrement_duration();
        }
        assert!(timed.is_expired());
    }
}
