//! Typed runtime context read by conditions and value sources
//!
//! Every handle is optional. A missing handle resolves to the documented
//! default of whatever reads it (0, 1.0, or "condition not met"), never to an
//! error.

use crate::affix::AffixCountSnapshot;
use crate::player::{Combatant, PlayerView};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Fact key holding the acting source's tag
pub const SOURCE_TAG_KEY: &str = "source_tag";

/// A value a condition can compare against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<ContextValue>),
}

impl ContextValue {
    /// Numeric view; booleans read as 1/0
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ContextValue::Number(n) => Some(*n),
            ContextValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            ContextValue::Text(s) => s.trim().parse().ok(),
            ContextValue::List(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContextValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            ContextValue::Bool(b) => *b,
            ContextValue::Number(n) => *n != 0.0,
            ContextValue::Text(s) => !s.is_empty(),
            ContextValue::List(items) => !items.is_empty(),
        }
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Bool(value)
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Number(value)
    }
}

impl From<i32> for ContextValue {
    fn from(value: i32) -> Self {
        ContextValue::Number(value as f64)
    }
}

impl From<usize> for ContextValue {
    fn from(value: usize) -> Self {
        ContextValue::Number(value as f64)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl<T: Into<ContextValue>> From<Vec<T>> for ContextValue {
    fn from(values: Vec<T>) -> Self {
        ContextValue::List(values.into_iter().map(Into::into).collect())
    }
}

/// Keyed fact lookup used by condition evaluation
pub trait FactLookup {
    fn fact(&self, key: &str) -> Option<ContextValue>;
}

/// Read-only runtime context for one evaluation
#[derive(Clone, Default)]
pub struct EvalContext<'a> {
    /// Player stat and equipment accessor
    pub player: Option<&'a dyn PlayerView>,
    /// Acting combatant, for health-percent lookups
    pub source: Option<&'a dyn Combatant>,
    /// Frozen affix-pool category counts
    pub affix_counts: Option<&'a AffixCountSnapshot>,
    pub dice_pool_size: Option<usize>,
    pub turn_number: Option<u32>,
    facts: HashMap<String, ContextValue>,
}

impl<'a> EvalContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_player(mut self, player: &'a dyn PlayerView) -> Self {
        self.player = Some(player);
        self
    }

    pub fn with_source(mut self, source: &'a dyn Combatant) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_affix_counts(mut self, counts: &'a AffixCountSnapshot) -> Self {
        self.affix_counts = Some(counts);
        self
    }

    pub fn with_dice_pool_size(mut self, size: usize) -> Self {
        self.dice_pool_size = Some(size);
        self
    }

    pub fn with_turn(mut self, turn_number: u32) -> Self {
        self.turn_number = Some(turn_number);
        self
    }

    pub fn with_source_tag(self, tag: impl Into<String>) -> Self {
        self.with_fact(SOURCE_TAG_KEY, ContextValue::Text(tag.into()))
    }

    pub fn with_fact(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.facts.insert(key.into(), value.into());
        self
    }

    pub fn set_fact(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.facts.insert(key.into(), value.into());
    }

    /// Health fraction of the acting source, falling back to the player
    pub fn health_percent(&self) -> Option<f64> {
        self.source
            .and_then(|s| s.health_percent())
            .or_else(|| self.player.and_then(|p| p.health_percent()))
    }
}

impl FactLookup for EvalContext<'_> {
    fn fact(&self, key: &str) -> Option<ContextValue> {
        if let Some(value) = self.facts.get(key) {
            return Some(value.clone());
        }
        match key {
            "turn_number" => self.turn_number.map(|t| ContextValue::Number(t as f64)),
            "dice_pool_size" => self.dice_pool_size.map(ContextValue::from),
            "health_percent" => self.health_percent().map(ContextValue::Number),
            "equipped_item_count" => self
                .player
                .map(|p| ContextValue::from(p.equipment().equipped_count())),
            _ => self
                .player
                .and_then(|p| p.stat(key))
                .map(ContextValue::Number),
        }
    }
}

impl fmt::Debug for EvalContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("has_player", &self.player.is_some())
            .field("has_source", &self.source.is_some())
            .field("affix_counts", &self.affix_counts)
            .field("dice_pool_size", &self.dice_pool_size)
            .field("turn_number", &self.turn_number)
            .field("facts", &self.facts)
            .finish()
    }
}

/// Facts layered over a base lookup; the overlay wins
pub struct LayeredFacts<'a> {
    base: &'a dyn FactLookup,
    overlay: HashMap<String, ContextValue>,
}

impl<'a> LayeredFacts<'a> {
    pub fn new(base: &'a dyn FactLookup) -> Self {
        LayeredFacts {
            base,
            overlay: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.overlay.insert(key.into(), value.into());
    }
}

impl FactLookup for LayeredFacts<'_> {
    fn fact(&self, key: &str) -> Option<ContextValue> {
        self.overlay
            .get(key)
            .cloned()
            .or_else(|| self.base.fact(key))
    }
}
