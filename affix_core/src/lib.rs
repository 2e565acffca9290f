//! affix_core - Affix and dice-affix resolution engine for turn-based games
//!
//! This library provides:
//! - Affix: data-defined item modifiers resolved into category contributions
//! - DiceAffix: position- and neighbor-aware modifiers over an ordered die sequence
//! - Set bonuses: equipment-driven thresholds kept in sync with both pools
//! - Status effects: stacking, decaying, ticking buffs and debuffs
//! - Scaling: level curves and fuzzed roll windows for procedural generation

pub mod affix;
pub mod condition;
pub mod config;
pub mod context;
pub mod dice;
pub mod player;
pub mod prelude;
pub mod record;
pub mod scaling;
pub mod set_bonus;
pub mod status;
pub mod types;
pub mod validation;
pub mod value_source;

// Re-export core types for convenience
pub use affix::{Affix, AffixContribution, AffixEvaluator, AffixPool, AffixSubEffect, AffixTotals};
pub use condition::{AffixCondition, ConditionKind, ConditionResult};
pub use config::{ConfigError, ScalingConfig};
pub use context::{ContextValue, EvalContext};
pub use dice::{DiceAffix, DiceAffixEngine, DicePool, DieEvent, DieResource};
pub use player::{Equipment, Item, PlayerState, PlayerView};
pub use record::{FromRecord, RecordError, ToRecord};
pub use set_bonus::{SetBonusTracker, SetCatalog, SetDefinition};
pub use status::{StatusAffix, StatusInstance, StatusRegistry, StatusTracker};
pub use types::{AffixCategory, DieType, Element, EquipmentSlot, Rarity};
pub use validation::ValidationIssue;
pub use value_source::ValueSource;
