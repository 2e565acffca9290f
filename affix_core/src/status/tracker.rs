//! StatusTracker - a combatant's active statuses and their turn-phase processing

use super::instance::{StatusInstance, StatusTick};
use super::types::{StatusAffix, StatusTiming};
use super::StatusRegistry;
use crate::affix::{AffixEvaluator, AffixTotals};
use crate::context::EvalContext;
use crate::dice::DieEvent;
use std::sync::Arc;

/// Result of processing one timing point
#[derive(Debug, Clone, Default)]
pub struct StatusTimingResult {
    pub ticks: Vec<StatusTick>,
    pub total_damage: f64,
    pub total_heal: f64,
    /// Ids of statuses that expired during this phase
    pub expired: Vec<String>,
}

/// Active statuses, one instance per status id
#[derive(Debug, Clone, Default)]
pub struct StatusTracker {
    instances: Vec<StatusInstance>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn get(&self, status_id: &str) -> Option<&StatusInstance> {
        self.instances.iter().find(|i| i.id() == status_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusInstance> {
        self.instances.iter()
    }

    /// Apply stacks of a status, merging into an existing instance
    ///
    /// Returns the stack count afterwards.
    pub fn apply(&mut self, template: Arc<StatusAffix>, stacks: u32, source_name: &str) -> u32 {
        if let Some(existing) = self.instances.iter_mut().find(|i| i.id() == template.id) {
            existing.add_stacks(stacks);
            return existing.current_stacks;
        }
        if stacks == 0 {
            return 0;
        }
        let instance = StatusInstance::create(template, stacks, source_name);
        let current = instance.current_stacks;
        self.instances.push(instance);
        current
    }

    /// Apply a status by id; unknown ids are skipped with a warning
    pub fn apply_by_id(
        &mut self,
        registry: &StatusRegistry,
        status_id: &str,
        stacks: u32,
        source_name: &str,
    ) -> Option<u32> {
        match registry.get(status_id) {
            Some(template) => Some(self.apply(template, stacks, source_name)),
            None => {
                tracing::warn!(status_id, "unknown status id");
                None
            }
        }
    }

    /// Apply every status granted by dice effects
    pub fn apply_die_events(
        &mut self,
        registry: &StatusRegistry,
        events: &[DieEvent],
        source_name: &str,
    ) {
        for event in events {
            if let DieEvent::StatusGranted { status_id, stacks, .. } = event {
                self.apply_by_id(registry, status_id, *stacks, source_name);
            }
        }
    }

    pub fn remove_stacks(&mut self, status_id: &str, stacks: u32) -> u32 {
        let removed = self
            .instances
            .iter_mut()
            .find(|i| i.id() == status_id)
            .map_or(0, |i| i.remove_stacks(stacks));
        self.remove_expired();
        removed
    }

    /// Run everything configured for `timing`: tick, then decay, then duration
    pub fn process_timing(
        &mut self,
        timing: StatusTiming,
        evaluator: &AffixEvaluator,
        ctx: &EvalContext<'_>,
    ) -> StatusTimingResult {
        let mut result = StatusTimingResult::default();
        for instance in &mut self.instances {
            if instance.template.tick_timing == timing {
                let tick = instance.apply_tick(evaluator, ctx);
                result.total_damage += tick.damage;
                result.total_heal += tick.heal;
                result.ticks.push(tick);
            }
            if instance.template.decay_timing == timing {
                instance.apply_decay();
            }
            if instance.template.duration_timing == timing {
                instance.decrement_duration();
            }
        }
        result.expired = self.remove_expired();
        result
    }

    fn remove_expired(&mut self) -> Vec<String> {
        let mut expired = Vec::new();
        self.instances.retain(|instance| {
            if instance.is_expired() {
                tracing::debug!(status = %instance.id(), "status expired");
                expired.push(instance.id().to_string());
                false
            } else {
                true
            }
        });
        expired
    }

    /// Remove a status regardless of stacks; non-cleansable statuses stay
    pub fn cleanse(&mut self, status_id: &str) -> bool {
        let before = self.instances.len();
        self.instances
            .retain(|i| !(i.id() == status_id && i.template.cleansable));
        before != self.instances.len()
    }

    /// Remove every cleansable debuff, returning their ids
    pub fn cleanse_debuffs(&mut self) -> Vec<String> {
        let mut removed = Vec::new();
        self.instances.retain(|i| {
            let strip = i.template.is_debuff && i.template.cleansable;
            if strip {
                removed.push(i.id().to_string());
            }
            !strip
        });
        removed
    }

    /// Stat modifiers from every active status, scaled by stacks
    pub fn total_stat_contributions(
        &self,
        evaluator: &AffixEvaluator,
        ctx: &EvalContext<'_>,
    ) -> AffixTotals {
        let mut totals = AffixTotals::new();
        for instance in &self.instances {
            totals.merge(instance.apply_tick(evaluator, ctx).stats);
        }
        totals
    }
}
