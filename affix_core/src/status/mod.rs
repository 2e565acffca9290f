//! Status effects (stacking buffs and debuffs with timed ticks)

mod instance;
mod tracker;
mod types;

pub use instance::{StatusInstance, StatusTick, NOT_TURN_BASED};
pub use tracker::{StatusTimingResult, StatusTracker};
pub use types::{DecayStyle, DurationType, StatusAffix, StatusTiming};

use crate::affix::Affix;
use crate::types::{AffixCategory, Element};
use std::collections::HashMap;
use std::sync::Arc;

/// Status template registry
#[derive(Debug, Clone, Default)]
pub struct StatusRegistry {
    /// Mapping from status ID to its shared template
    templates: HashMap<String, Arc<StatusAffix>>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        StatusRegistry {
            templates: HashMap::new(),
        }
    }

    pub fn register(&mut self, status: StatusAffix) {
        self.templates.insert(status.id.clone(), Arc::new(status));
    }

    /// Shared handle to a template
    pub fn get(&self, id: &str) -> Option<Arc<StatusAffix>> {
        self.templates.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Built-in statuses
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        // Burn - fire damage, loses a stack each turn
        registry.register(StatusAffix {
            max_stacks: 10,
            decay_style: DecayStyle::Flat,
            decay_amount: 1,
            damage_per_stack: 2.0,
            element: Element::Fire,
            is_debuff: true,
            ..StatusAffix::new("burn", "Burn")
        });

        // Poison - lingers until halved away
        registry.register(StatusAffix {
            max_stacks: 20,
            duration_type: DurationType::UntilRemoved,
            decay_style: DecayStyle::Halving,
            damage_per_stack: 1.0,
            element: Element::Poison,
            is_debuff: true,
            ..StatusAffix::new("poison", "Poison")
        });

        // Bleed - short, hits when the bearer takes damage
        registry.register(StatusAffix {
            max_stacks: 5,
            default_duration: 2,
            damage_per_stack: 1.5,
            element: Element::Slashing,
            is_debuff: true,
            tick_timing: StatusTiming::OnDamaged,
            ..StatusAffix::new("bleed", "Bleed")
        });

        registry.register(StatusAffix {
            max_stacks: 3,
            heal_per_stack: 2.0,
            ..StatusAffix::new("regeneration", "Regeneration")
        });

        // Fortify - armor per stack
        registry.register(StatusAffix {
            max_stacks: 3,
            default_duration: 2,
            stat_affixes: vec![Affix::new("Fortified", AffixCategory::ArmorBonus, 2.0)],
            ..StatusAffix::new("fortify", "Fortify")
        });

        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let registry = StatusRegistry::with_defaults();
        assert_eq!(registry.len(), 5);
        for id in ["burn", "poison", "bleed", "regeneration", "fortify"] {
            let status = registry.get(id).unwrap();
            assert!(status.validate().is_empty(), "{id} should validate");
        }
    }

    #[test]
    fn test_templates_are_shared() {
        let registry = StatusRegistry::with_defaults();
        let a = registry.get("burn").unwrap();
        let b = registry.get("burn").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
