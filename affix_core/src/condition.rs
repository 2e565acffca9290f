//! ConditionEvaluator - gating predicates with an optional value multiplier
//!
//! A condition never fails loudly: unknown or missing context keys evaluate
//! to "not met".

use crate::context::{ContextValue, FactLookup, SOURCE_TAG_KEY};
use crate::types::impl_ordinal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, FromRepr};

const EPSILON: f64 = 1e-9;

/// Comparison performed by a condition
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum ConditionKind {
    /// Always passes
    #[default]
    Always = 0,
    Equals,
    NotEquals,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    /// Fact is truthy
    Truthy,
    /// `source_tag` equals the comparand
    SourceTagEquals,
    /// `source_tag` contains the comparand (substring or list member)
    SourceTagContains,
    /// Key is present at all
    HasKey,
    /// Fact is a list containing the comparand
    InList,
    /// Passes when the fact is numeric; multiplier = fact × comparand
    ScaleByValue,
}

impl_ordinal!(ConditionKind);

/// Right-hand side of a comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Comparand {
    #[default]
    None,
    Number(f64),
    Text(String),
}

impl Comparand {
    fn as_number(&self) -> Option<f64> {
        match self {
            Comparand::Number(n) => Some(*n),
            Comparand::Text(s) => s.trim().parse().ok(),
            Comparand::None => None,
        }
    }

    fn matches(&self, value: &ContextValue) -> bool {
        match (self, value) {
            (Comparand::Text(expected), ContextValue::Text(actual)) => expected == actual,
            (Comparand::None, _) => false,
            (comparand, value) => match (comparand.as_number(), value.as_number()) {
                (Some(a), Some(b)) => (a - b).abs() < EPSILON,
                _ => false,
            },
        }
    }
}

/// Outcome of evaluating a condition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConditionResult {
    /// Effect suppressed entirely
    pub blocked: bool,
    /// Scales the resolved value when not blocked
    pub multiplier: f64,
}

impl ConditionResult {
    pub const PASS: ConditionResult = ConditionResult {
        blocked: false,
        multiplier: 1.0,
    };

    pub const BLOCKED: ConditionResult = ConditionResult {
        blocked: true,
        multiplier: 0.0,
    };

    pub fn pass_with(multiplier: f64) -> Self {
        ConditionResult {
            blocked: false,
            multiplier,
        }
    }
}

impl Default for ConditionResult {
    fn default() -> Self {
        Self::PASS
    }
}

/// A typed predicate over the runtime context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffixCondition {
    #[serde(default)]
    pub kind: ConditionKind,
    /// Context key to read (ignored by `always` and the source-tag kinds)
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: Comparand,
    #[serde(default)]
    pub negate: bool,
    /// Multiplier reported when the condition passes
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

impl Default for AffixCondition {
    fn default() -> Self {
        AffixCondition {
            kind: ConditionKind::Always,
            key: String::new(),
            value: Comparand::None,
            negate: false,
            multiplier: 1.0,
        }
    }
}

impl AffixCondition {
    pub fn new(kind: ConditionKind, key: impl Into<String>, value: Comparand) -> Self {
        AffixCondition {
            kind,
            key: key.into(),
            value,
            ..Default::default()
        }
    }

    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Evaluate against a context
    pub fn evaluate(&self, ctx: &dyn FactLookup) -> ConditionResult {
        if self.kind == ConditionKind::ScaleByValue {
            return self.evaluate_scaling(ctx);
        }

        let passed = match self.test(ctx) {
            Some(result) => result != self.negate,
            None => {
                tracing::debug!(
                    key = %self.key,
                    kind = %self.kind,
                    "condition key missing, not met"
                );
                false
            }
        };

        if passed {
            ConditionResult::pass_with(self.multiplier)
        } else {
            ConditionResult::BLOCKED
        }
    }

    fn evaluate_scaling(&self, ctx: &dyn FactLookup) -> ConditionResult {
        let fact = ctx.fact(&self.key).and_then(|v| v.as_number());
        let per_unit = self.value.as_number().unwrap_or(1.0);
        match fact {
            Some(n) => ConditionResult::pass_with(n * per_unit * self.multiplier),
            None => ConditionResult::BLOCKED,
        }
    }

    /// Raw predicate before negation; `None` when the key cannot be read
    fn test(&self, ctx: &dyn FactLookup) -> Option<bool> {
        match self.kind {
            ConditionKind::Always => Some(true),
            ConditionKind::HasKey => Some(ctx.fact(&self.key).is_some()),
            ConditionKind::Truthy => ctx.fact(&self.key).map(|v| v.is_truthy()),
            ConditionKind::Equals => ctx.fact(&self.key).map(|v| self.value.matches(&v)),
            ConditionKind::NotEquals => ctx.fact(&self.key).map(|v| !self.value.matches(&v)),
            ConditionKind::GreaterThan => self.compare(ctx, |a, b| a > b),
            ConditionKind::GreaterOrEqual => self.compare(ctx, |a, b| a >= b - EPSILON),
            ConditionKind::LessThan => self.compare(ctx, |a, b| a < b),
            ConditionKind::LessOrEqual => self.compare(ctx, |a, b| a <= b + EPSILON),
            ConditionKind::SourceTagEquals => ctx
                .fact(SOURCE_TAG_KEY)
                .map(|tag| self.value.matches(&tag)),
            ConditionKind::SourceTagContains => {
                ctx.fact(SOURCE_TAG_KEY).map(|tag| self.contained_in(&tag))
            }
            ConditionKind::InList => ctx.fact(&self.key).map(|v| match v {
                ContextValue::List(items) => items.iter().any(|item| self.value.matches(item)),
                _ => false,
            }),
            ConditionKind::ScaleByValue => ctx.fact(&self.key).map(|v| v.as_number().is_some()),
        }
    }

    fn compare(&self, ctx: &dyn FactLookup, op: impl Fn(f64, f64) -> bool) -> Option<bool> {
        let actual = ctx.fact(&self.key)?.as_number()?;
        let expected = self.value.as_number()?;
        Some(op(actual, expected))
    }

    fn contained_in(&self, tag: &ContextValue) -> bool {
        match (tag, &self.value) {
            (ContextValue::Text(text), Comparand::Text(needle)) => text.contains(needle.as_str()),
            (ContextValue::List(items), comparand) => items.iter().any(|i| comparand.matches(i)),
            _ => false,
        }
    }
}

/// Pick the condition that applies to a sub-effect
///
/// With `override_condition` set, the sub-effect's own condition is used even
/// when absent (absent means always fire). Otherwise its own condition wins if
/// present, falling back to the parent's.
pub fn effective_condition<'a>(
    override_condition: bool,
    own: Option<&'a AffixCondition>,
    parent: Option<&'a AffixCondition>,
) -> Option<&'a AffixCondition> {
    if override_condition {
        if own.is_none() {
            tracing::debug!("override_condition set without a condition, always firing");
        }
        own
    } else {
        own.or(parent)
    }
}

/// Evaluate an optional condition; absent conditions always pass
pub fn evaluate_optional(
    condition: Option<&AffixCondition>,
    ctx: &dyn FactLookup,
) -> ConditionResult {
    condition.map_or(ConditionResult::PASS, |c| c.evaluate(ctx))
}
