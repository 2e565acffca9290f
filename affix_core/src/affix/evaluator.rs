//! AffixEvaluator - resolve affixes into category contributions

use super::types::{Affix, AffixContribution};
use crate::condition::{effective_condition, evaluate_optional};
use crate::config::ScalingConfig;
use crate::context::EvalContext;
use crate::scaling::lerp;
use rand::Rng;

/// Evaluates affixes against a runtime context
///
/// The scaling config is injected at construction; without one, rolling falls
/// back to a linear curve and the default fuzz constants.
#[derive(Debug, Clone, Default)]
pub struct AffixEvaluator {
    scaling: Option<ScalingConfig>,
}

impl AffixEvaluator {
    pub fn new(scaling: ScalingConfig) -> Self {
        AffixEvaluator {
            scaling: Some(scaling),
        }
    }

    pub fn without_scaling() -> Self {
        AffixEvaluator { scaling: None }
    }

    pub fn scaling(&self) -> Option<&ScalingConfig> {
        self.scaling.as_ref()
    }

    /// Resolve one affix into its contributions
    ///
    /// Compound affixes emit one contribution per unblocked sub-effect, in
    /// declaration order. Blocked steps are skipped.
    pub fn evaluate(&self, affix: &Affix, ctx: &EvalContext<'_>) -> Vec<AffixContribution> {
        if affix.sub_effects.is_empty() {
            let result = evaluate_optional(affix.condition.as_ref(), ctx);
            if result.blocked {
                tracing::debug!(affix = %affix.name, "affix blocked by condition");
                return Vec::new();
            }
            let value = affix
                .value_source
                .resolve_value(affix.effect_number, &affix.effect_data, ctx)
                * result.multiplier;
            return vec![AffixContribution {
                category: affix.category,
                value,
                granted: None,
                affix_name: affix.name.clone(),
                source: affix.source.clone(),
            }];
        }

        let mut contributions = Vec::with_capacity(affix.sub_effects.len());
        for (step, sub) in affix.sub_effects.iter().enumerate() {
            let condition = effective_condition(
                sub.override_condition,
                sub.condition.as_ref(),
                affix.condition.as_ref(),
            );
            let result = evaluate_optional(condition, ctx);
            if result.blocked {
                tracing::debug!(affix = %affix.name, step, "sub-effect blocked by condition");
                continue;
            }
            let value = sub
                .value_source
                .resolve_value(sub.effect_number, &sub.effect_data, ctx)
                * result.multiplier;
            contributions.push(AffixContribution {
                category: sub.category,
                value,
                granted: sub.granted.clone(),
                affix_name: affix.name.clone(),
                source: affix.source.clone(),
            });
        }
        contributions
    }

    /// Evaluate several affixes against the same context
    ///
    /// Callers pass a context whose affix counts were captured before any
    /// affix in the batch was added to the pool, so batch order never changes
    /// the result.
    pub fn evaluate_batch<'b>(
        &self,
        affixes: impl IntoIterator<Item = &'b Affix>,
        ctx: &EvalContext<'_>,
    ) -> Vec<AffixContribution> {
        affixes
            .into_iter()
            .flat_map(|affix| self.evaluate(affix, ctx))
            .collect()
    }

    /// Roll `effect_number` from the affix range at power position `t`
    ///
    /// One-time mutation at generation time. Affixes without a range are left
    /// untouched. Integral ranges roll whole numbers.
    pub fn roll_value(&self, affix: &mut Affix, t: f64, rng: &mut impl Rng) {
        if !affix.has_scaling() {
            return;
        }
        let scaling = match &self.scaling {
            Some(scaling) => scaling.clone(),
            None => {
                tracing::warn!(affix = %affix.name, "no scaling config, using default fuzz");
                ScalingConfig::default()
            }
        };

        let t = t.clamp(0.0, 1.0);
        let center = lerp(affix.effect_min, affix.effect_max, t);
        let window =
            scaling.fuzz_range(center, affix.effect_min, affix.effect_max, affix.roll_fuzz);

        let mut value = if window.max > window.min {
            rng.gen_range(window.min..=window.max)
        } else {
            window.min
        };
        if affix.effect_min.fract() == 0.0 && affix.effect_max.fract() == 0.0 {
            value = round_within(value, window.min, window.max);
        }
        affix.effect_number = value;
    }

    /// Roll an affix for a character or item level
    pub fn roll_for_level(&self, affix: &mut Affix, level: u32, rng: &mut impl Rng) {
        let t = match &self.scaling {
            Some(scaling) => scaling.power_position(level),
            None => ScalingConfig::default().power_position(level),
        };
        self.roll_value(affix, t, rng);
    }
}

/// Round to a whole number, staying inside `[min, max]` when a whole number fits
fn round_within(value: f64, min: f64, max: f64) -> f64 {
    let (lo, hi) = (min.ceil(), max.floor());
    if lo <= hi {
        value.round().clamp(lo, hi)
    } else {
        value.round()
    }
}
