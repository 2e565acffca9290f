//! Dice affix system
//!
//! Dice sit in an ordered sequence. Each die carries a stack of dice affixes
//! (element, inherent, applied) that mutate its value and state when their
//! trigger fires, gated by position and aimed at neighbors.

mod affix;
mod die;
mod elements;
mod engine;
mod pool;
pub mod targeting;

pub use affix::{
    ComponentVisual, DiceAffix, DiceAffixSubEffect, DiceAffixTrigger, DiceEffectType, DiceVisuals,
    NestedEffect, NeighborTarget, PositionRequirement, VisualEffect, DIE_TYPE_KEY, ELEMENT_KEY,
    STATUS_ID_KEY, TAG_KEY, THRESHOLD_KEY,
};
pub use die::{AffixLayer, DieEvent, DieResource, DUPLICATE_TAG, MIN_DIE_VALUE};
pub use elements::{ElementAffixEntry, ElementAffixTable};
pub use engine::DiceAffixEngine;
pub use pool::DicePool;
pub use targeting::{check_position, get_target_indices};
