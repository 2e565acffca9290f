//! DiceAffixEngine - runs dice affixes against an ordered die sequence
//!
//! Each activation snapshots the sequence first, so every step of a compound
//! affix reads pre-activation neighbor values and tags. Conditions see the
//! source die through these facts, layered over the caller's context:
//!
//! - `die_value`, `die_raw_value`, `die_max`, `is_max_roll`
//! - `slot_index`, `total_dice`
//! - `die_tags` (list), `die_element`

use super::affix::{
    DiceAffix, DiceAffixSubEffect, DiceAffixTrigger, DiceEffectType, NeighborTarget, DIE_TYPE_KEY,
    ELEMENT_KEY, STATUS_ID_KEY, TAG_KEY, THRESHOLD_KEY,
};
use super::die::{AffixLayer, DieEvent, DieResource, MIN_DIE_VALUE};
use super::elements::ElementAffixTable;
use super::targeting::{check_position, get_target_indices};
use crate::condition::{effective_condition, evaluate_optional, AffixCondition};
use crate::context::{ContextValue, EvalContext, LayeredFacts};
use crate::types::{DieType, EffectDataExt, Element};
use rand::Rng;
use std::collections::BTreeSet;
use std::str::FromStr;

/// CONDITIONAL nesting deeper than this is cut off
const MAX_NESTING: usize = 8;

/// Depth and the condition multipliers gathered on the way down
#[derive(Debug, Clone, Copy)]
struct Nesting {
    depth: usize,
    multiplier: f64,
}

impl Nesting {
    const TOP: Nesting = Nesting {
        depth: 0,
        multiplier: 1.0,
    };
}

/// State captured before an activation mutates anything
struct Snapshot {
    source: usize,
    layer: AffixLayer,
    values: Vec<i32>,
    tags: Vec<BTreeSet<String>>,
}

/// Applies dice affixes for a trigger
#[derive(Debug, Clone, Default)]
pub struct DiceAffixEngine {
    elements: ElementAffixTable,
}

impl DiceAffixEngine {
    pub fn new(elements: ElementAffixTable) -> Self {
        DiceAffixEngine { elements }
    }

    pub fn with_defaults() -> Self {
        Self::new(ElementAffixTable::with_defaults())
    }

    pub fn elements(&self) -> &ElementAffixTable {
        &self.elements
    }

    /// A die's full stack in mutation order: element, inherent, applied
    pub fn affix_stack(&self, die: &DieResource) -> Vec<(AffixLayer, DiceAffix)> {
        let element = self
            .elements
            .get(die.element)
            .map(|a| (AffixLayer::Element, a.clone()));
        element
            .into_iter()
            .chain(die.get_all_affixes().map(|(layer, a)| (layer, a.clone())))
            .collect()
    }

    /// Run every die's affixes for `trigger`, left to right
    pub fn process_trigger<R: Rng>(
        &self,
        dice: &mut [DieResource],
        trigger: DiceAffixTrigger,
        ctx: &EvalContext<'_>,
        rng: &mut R,
    ) -> Vec<DieEvent> {
        let mut events = Vec::new();
        for index in 0..dice.len() {
            events.extend(self.process_die_trigger(dice, index, trigger, ctx, rng));
        }
        events
    }

    /// Run one die's affixes for `trigger`
    pub fn process_die_trigger<R: Rng>(
        &self,
        dice: &mut [DieResource],
        index: usize,
        trigger: DiceAffixTrigger,
        ctx: &EvalContext<'_>,
        rng: &mut R,
    ) -> Vec<DieEvent> {
        let Some(die) = dice.get(index) else {
            tracing::warn!(index, total = dice.len(), "trigger on a die outside the sequence");
            return Vec::new();
        };
        let mut events = Vec::new();
        for (layer, affix) in self.affix_stack(die) {
            if affix.trigger == trigger {
                events.extend(self.activate(dice, index, layer, &affix, ctx, rng));
            }
        }
        events
    }

    /// Activate one affix from the die at `source`
    pub fn activate<R: Rng>(
        &self,
        dice: &mut [DieResource],
        source: usize,
        layer: AffixLayer,
        affix: &DiceAffix,
        ctx: &EvalContext<'_>,
        rng: &mut R,
    ) -> Vec<DieEvent> {
        let total = dice.len();
        if source >= total {
            return Vec::new();
        }
        if !check_position(source, total, affix.position_requirement, affix.required_slot) {
            tracing::debug!(affix = %affix.name, source, "position requirement not met");
            return Vec::new();
        }

        let snapshot = Snapshot {
            source,
            layer,
            values: dice.iter().map(|d| d.modified_value).collect(),
            tags: dice.iter().map(|d| d.tags.clone()).collect(),
        };
        let facts = die_facts(ctx, &dice[source], snapshot.values[source], total);

        let mut events = Vec::new();
        for step in affix.steps().iter() {
            let condition = effective_condition(
                step.override_condition,
                step.condition.as_ref(),
                affix.condition.as_ref(),
            );
            self.run_step(
                dice,
                &snapshot,
                step,
                affix.neighbor_target,
                condition,
                &facts,
                ctx,
                rng,
                &mut events,
                Nesting::TOP,
            );
        }
        events
    }

    #[allow(clippy::too_many_arguments)]
    fn run_step<R: Rng>(
        &self,
        dice: &mut [DieResource],
        snapshot: &Snapshot,
        step: &DiceAffixSubEffect,
        default_target: NeighborTarget,
        condition: Option<&AffixCondition>,
        facts: &LayeredFacts<'_>,
        ctx: &EvalContext<'_>,
        rng: &mut R,
        events: &mut Vec<DieEvent>,
        nesting: Nesting,
    ) {
        let result = evaluate_optional(condition, facts);
        if result.blocked {
            tracing::debug!(effect = %step.effect_type, "dice effect blocked by condition");
            return;
        }
        let multiplier = nesting.multiplier * result.multiplier;
        let target = step.target_override.unwrap_or(default_target);

        if step.effect_type == DiceEffectType::Conditional {
            let Some(nested) = step.nested.as_deref() else {
                tracing::warn!("conditional dice effect without a nested effect");
                return;
            };
            if nesting.depth >= MAX_NESTING {
                tracing::warn!(depth = nesting.depth, "conditional nesting too deep, skipping");
                return;
            }
            let predicate = evaluate_optional(nested.condition.as_ref(), facts);
            if predicate.blocked {
                tracing::debug!("nested dice effect blocked by its predicate");
                return;
            }
            let inner = effective_condition(
                nested.effect.override_condition,
                nested.effect.condition.as_ref(),
                None,
            );
            self.run_step(
                dice,
                snapshot,
                &nested.effect,
                target,
                inner,
                facts,
                ctx,
                rng,
                events,
                Nesting {
                    depth: nesting.depth + 1,
                    multiplier: multiplier * predicate.multiplier,
                },
            );
            return;
        }

        let value = step
            .value_source
            .resolve_value(step.value, &step.effect_data, ctx)
            * multiplier;

        for index in get_target_indices(snapshot.source, dice.len(), target) {
            events.extend(apply_effect(dice, snapshot, index, step, value, rng));
        }
    }
}

fn die_facts<'a>(
    ctx: &'a EvalContext<'_>,
    die: &DieResource,
    value: i32,
    total: usize,
) -> LayeredFacts<'a> {
    let mut facts = LayeredFacts::new(ctx);
    facts.insert("die_value", value as f64);
    facts.insert("die_raw_value", die.current_value as f64);
    facts.insert("die_max", die.max_value() as f64);
    facts.insert("is_max_roll", die.is_max_roll());
    facts.insert("slot_index", die.slot_index);
    facts.insert("total_dice", total);
    facts.insert("die_element", die.element.to_string());
    facts.insert(
        "die_tags",
        ContextValue::List(die.tags.iter().cloned().map(ContextValue::Text).collect()),
    );
    facts
}

fn apply_effect<R: Rng>(
    dice: &mut [DieResource],
    snapshot: &Snapshot,
    index: usize,
    step: &DiceAffixSubEffect,
    value: f64,
    rng: &mut R,
) -> Vec<DieEvent> {
    let data = &step.effect_data;
    let event = match step.effect_type {
        DiceEffectType::ModifyValueFlat => dice[index].apply_flat_modifier(value),
        DiceEffectType::ModifyValuePercent => dice[index].apply_percent_modifier(value),
        DiceEffectType::SetMinimumValue => dice[index].set_minimum_value(value.round() as i32),
        DiceEffectType::SetMaximumValue => dice[index].set_maximum_value(value.round() as i32),
        DiceEffectType::AddTag => {
            let Some(tag) = required_str(data.get_str(TAG_KEY), TAG_KEY) else {
                return Vec::new();
            };
            dice[index].add_tag(tag)
        }
        DiceEffectType::RemoveTag => {
            let Some(tag) = required_str(data.get_str(TAG_KEY), TAG_KEY) else {
                return Vec::new();
            };
            dice[index].remove_tag(tag)
        }
        DiceEffectType::CopyTags => {
            // the source die picks up the target's tags as they were before activation
            let source = snapshot.source;
            return snapshot.tags[index]
                .iter()
                .filter_map(|tag| dice[source].add_tag(tag))
                .collect();
        }
        DiceEffectType::GrantReroll => dice[index].grant_rerolls(value.round().max(1.0) as u32),
        DiceEffectType::AutoRerollLow => {
            let threshold = data.get_f64(THRESHOLD_KEY).unwrap_or(value);
            let die = &mut dice[index];
            if die.is_locked || die.current_value as f64 > threshold {
                return Vec::new();
            }
            let old = die.modified_value;
            die.current_value = rng.gen_range(MIN_DIE_VALUE..=die.max_value());
            die.modified_value = (die.current_value + die.modifier).max(MIN_DIE_VALUE);
            Some(DieEvent::AutoRerolled {
                slot: die.slot_index,
                old,
                new: die.modified_value,
            })
        }
        DiceEffectType::DuplicateOnMax => dice[index]
            .is_max_roll()
            .then(|| DieEvent::DuplicateRequested { slot: index }),
        DiceEffectType::LockDie => dice[index].lock(),
        DiceEffectType::ChangeDieType => {
            let faces = data.get_i64(DIE_TYPE_KEY).unwrap_or(value.round() as i64);
            match DieType::from_faces(faces.max(0) as u32) {
                Some(die_type) => return dice[index].change_die_type(die_type),
                None => {
                    tracing::warn!(faces, "unknown die type for change_die_type");
                    None
                }
            }
        }
        DiceEffectType::CopyNeighborValue => {
            let gained = snapshot.values[index] as f64 * value;
            dice[snapshot.source].apply_flat_modifier(gained)
        }
        DiceEffectType::AddDamageType => {
            let Some(name) = required_str(data.get_str(ELEMENT_KEY), ELEMENT_KEY) else {
                return Vec::new();
            };
            match Element::from_str(name) {
                Ok(element) => Some(dice[index].set_damage_type(element, snapshot.layer)),
                Err(_) => {
                    tracing::warn!(element = name, "unknown element for add_damage_type");
                    None
                }
            }
        }
        DiceEffectType::GrantStatusEffect => {
            let Some(status_id) = required_str(data.get_str(STATUS_ID_KEY), STATUS_ID_KEY) else {
                return Vec::new();
            };
            Some(DieEvent::StatusGranted {
                slot: index,
                status_id: status_id.to_string(),
                stacks: value.round().max(1.0) as u32,
            })
        }
        // handled by run_step
        DiceEffectType::Conditional => None,
    };
    event.into_iter().collect()
}

fn required_str<'a>(value: Option<&'a str>, key: &str) -> Option<&'a str> {
    if value.is_none() {
        tracing::warn!(key, "dice effect missing effect_data key");
    }
    value
}
