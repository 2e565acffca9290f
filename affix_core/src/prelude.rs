//! Prelude module for convenient imports
//!
//! ```rust
//! use affix_core::prelude::*;
//! ```

// Core types
pub use crate::types::{AffixCategory, DieType, EffectData, Element, EquipmentSlot, Rarity};
pub use crate::context::{EvalContext, FactLookup};
pub use crate::player::{Combatant, Equipment, EquipmentItem, Item, PlayerState, PlayerView};

// Affixes
pub use crate::affix::{
    Affix, AffixEvaluator, AffixPool, AffixSubEffect, AffixTotals, GrantedResource,
};
pub use crate::condition::{AffixCondition, Comparand, ConditionKind};
pub use crate::value_source::ValueSource;

// Dice
pub use crate::dice::{
    DiceAffix, DiceAffixEngine, DiceAffixSubEffect, DiceAffixTrigger, DiceEffectType, DicePool,
    DieEvent, DieResource, NeighborTarget, PositionRequirement,
};

// Sets and statuses
pub use crate::set_bonus::{SetBonusThreshold, SetBonusTracker, SetCatalog, SetDefinition};
pub use crate::status::{StatusAffix, StatusRegistry, StatusTiming, StatusTracker};

// Config
pub use crate::config::{default_scaling_config, default_set_catalog, ScalingConfig};
