//! ValueSourceResolver - turns a value source tag into a multiplier
//!
//! Final contribution = effect_number × resolved multiplier.

use crate::context::EvalContext;
use crate::types::{impl_ordinal, AffixCategory, EffectData, EffectDataExt};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString, FromRepr};

/// Effect data key naming the stat for [`ValueSource::PlayerStat`]
pub const STAT_NAME_KEY: &str = "stat_name";
/// Effect data key naming the category for [`ValueSource::ActiveAffixCount`]
pub const COUNT_CATEGORY_KEY: &str = "count_category";

/// Where an affix's multiplier comes from
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum ValueSource {
    /// effect_number used as-is
    #[default]
    Static = 0,
    PlayerStat,
    PlayerHealthPercent,
    EquippedItemCount,
    ActiveAffixCount,
    EquipmentRaritySum,
    DicePoolSize,
    CombatTurnNumber,
}

impl_ordinal!(ValueSource);

impl ValueSource {
    /// Resolve the multiplier for this source
    pub fn resolve_multiplier(self, effect_data: &EffectData, ctx: &EvalContext<'_>) -> f64 {
        match self {
            ValueSource::Static => 1.0,
            ValueSource::PlayerStat => resolve_player_stat(effect_data, ctx),
            ValueSource::PlayerHealthPercent => ctx.health_percent().unwrap_or(1.0),
            ValueSource::EquippedItemCount => ctx
                .player
                .map_or(0.0, |p| p.equipment().equipped_count() as f64),
            ValueSource::ActiveAffixCount => resolve_affix_count(effect_data, ctx),
            ValueSource::EquipmentRaritySum => ctx
                .player
                .map_or(0.0, |p| p.equipment().rarity_sum() as f64),
            ValueSource::DicePoolSize => ctx.dice_pool_size.unwrap_or(0) as f64,
            ValueSource::CombatTurnNumber => ctx.turn_number.unwrap_or(0) as f64,
        }
    }

    /// `effect_number × multiplier`
    pub fn resolve_value(
        self,
        effect_number: f64,
        effect_data: &EffectData,
        ctx: &EvalContext<'_>,
    ) -> f64 {
        effect_number * self.resolve_multiplier(effect_data, ctx)
    }
}

fn resolve_player_stat(effect_data: &EffectData, ctx: &EvalContext<'_>) -> f64 {
    let Some(stat_name) = effect_data.get_str(STAT_NAME_KEY) else {
        tracing::warn!("player_stat value source without a stat_name");
        return 0.0;
    };
    let Some(player) = ctx.player else {
        return 0.0;
    };
    match player.stat(stat_name) {
        Some(value) => value,
        None => {
            tracing::warn!(stat_name, "unknown player stat");
            0.0
        }
    }
}

fn resolve_affix_count(effect_data: &EffectData, ctx: &EvalContext<'_>) -> f64 {
    let Some(counts) = ctx.affix_counts else {
        return 0.0;
    };
    match effect_data.get_str(COUNT_CATEGORY_KEY) {
        Some(name) => match AffixCategory::from_str(name) {
            Ok(category) => counts.count(category) as f64,
            Err(_) => {
                tracing::warn!(category = name, "unknown affix category for count");
                0.0
            }
        },
        None => counts.total() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affix::{Affix, AffixPool};
    use crate::player::{Item, PlayerState};
    use crate::types::{EquipmentSlot, Rarity};
    use serde_json::json;

    fn data(key: &str, value: &str) -> EffectData {
        let mut data = EffectData::new();
        data.insert(key.to_string(), json!(value));
        data
    }

    #[test]
    fn test_static_ignores_context() {
        let ctx = EvalContext::new();
        let value = ValueSource::Static.resolve_value(4.0, &EffectData::new(), &ctx);
        assert!((value - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_handles_use_defaults() {
        let ctx = EvalContext::new();
        let empty = EffectData::new();
        assert_eq!(ValueSource::PlayerHealthPercent.resolve_multiplier(&empty, &ctx), 1.0);
        assert_eq!(ValueSource::EquippedItemCount.resolve_multiplier(&empty, &ctx), 0.0);
        assert_eq!(ValueSource::DicePoolSize.resolve_multiplier(&empty, &ctx), 0.0);
        assert_eq!(ValueSource::CombatTurnNumber.resolve_multiplier(&empty, &ctx), 0.0);
        assert_eq!(
            ValueSource::PlayerStat.resolve_multiplier(&data(STAT_NAME_KEY, "strength"), &ctx),
            0.0
        );
    }

    #[test]
    fn test_player_backed_sources() {
        let mut player = PlayerState::new("hero", 30.0).with_stat("strength", 6.0);
        player.current_health = 15.0;
        player
            .equipment
            .equip(Item::new("Helm", EquipmentSlot::Head, Rarity::Rare));
        player
            .equipment
            .equip(Item::new("Boots", EquipmentSlot::Boots, Rarity::Legendary));
        let ctx = EvalContext::new().with_player(&player);

        let strength = data(STAT_NAME_KEY, "strength");
        assert_eq!(ValueSource::PlayerStat.resolve_value(2.0, &strength, &ctx), 12.0);
        assert_eq!(
            ValueSource::PlayerStat.resolve_multiplier(&data(STAT_NAME_KEY, "wisdom"), &ctx),
            0.0
        );
        assert_eq!(
            ValueSource::PlayerHealthPercent.resolve_multiplier(&EffectData::new(), &ctx),
            0.5
        );
        assert_eq!(
            ValueSource::EquippedItemCount.resolve_multiplier(&EffectData::new(), &ctx),
            2.0
        );
        assert_eq!(
            ValueSource::EquipmentRaritySum.resolve_multiplier(&EffectData::new(), &ctx),
            6.0
        );
    }

    #[test]
    fn test_active_affix_count_reads_snapshot() {
        let mut pool = AffixPool::new();
        pool.add(Affix::new("Might", AffixCategory::StrengthBonus, 1.0));
        pool.add(Affix::new("Might II", AffixCategory::StrengthBonus, 2.0));
        pool.add(Affix::new("Guard", AffixCategory::ArmorBonus, 3.0));
        let snapshot = pool.snapshot();
        let ctx = EvalContext::new().with_affix_counts(&snapshot);

        let strength = data(COUNT_CATEGORY_KEY, "strength_bonus");
        assert_eq!(ValueSource::ActiveAffixCount.resolve_multiplier(&strength, &ctx), 2.0);
        assert_eq!(
            ValueSource::ActiveAffixCount.resolve_multiplier(&EffectData::new(), &ctx),
            3.0
        );
    }
}
