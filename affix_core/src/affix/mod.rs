//! Item-level affixes: templates, evaluation and the player's affix pool

mod evaluator;
mod pool;
mod totals;
mod types;

pub use evaluator::AffixEvaluator;
pub use pool::{AffixCountSnapshot, AffixId, AffixInstance, AffixPool};
pub use totals::AffixTotals;
pub use types::{Affix, AffixContribution, AffixSubEffect, GrantedResource};
