//! Core types shared across the affix and dice engines

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use strum::{Display, EnumString, FromRepr};

/// Free-form keyed parameters attached to affixes (tag names, thresholds, payloads)
pub type EffectData = BTreeMap<String, Value>;

/// Typed accessors over [`EffectData`]
pub trait EffectDataExt {
    fn get_f64(&self, key: &str) -> Option<f64>;
    fn get_i64(&self, key: &str) -> Option<i64>;
    fn get_str(&self, key: &str) -> Option<&str>;
    fn get_bool(&self, key: &str) -> Option<bool>;
}

impl EffectDataExt for EffectData {
    fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    fn get_i64(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
            _ => None,
        }
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }
}

/// Enums that travel as integer ordinals in flat records
pub trait Ordinal: Sized + Copy {
    fn ordinal(self) -> u8;
    fn from_ordinal(value: u8) -> Option<Self>;
}

macro_rules! impl_ordinal {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::types::Ordinal for $ty {
                fn ordinal(self) -> u8 {
                    self as u8
                }

                fn from_ordinal(value: u8) -> Option<Self> {
                    Self::from_repr(value)
                }
            }
        )*
    };
}
pub(crate) use impl_ordinal;

/// Which stat or pool an item-level affix feeds
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    Display, EnumString, FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[repr(u8)]
pub enum AffixCategory {
    #[default]
    None = 0,
    // Attributes
    StrengthBonus,
    AgilityBonus,
    IntellectBonus,
    LuckBonus,
    // Resources
    HealthBonus,
    ManaBonus,
    // Defense
    ArmorBonus,
    BarrierBonus,
    DefenseMultiplier,
    ElementalResistance,
    StatusResistance,
    // Offense
    DamageBonus,
    DamageMultiplier,
    ElementalDamage,
    CritChance,
    Lifesteal,
    Thorns,
    HealingBonus,
    // Dice pool
    DiceValueBonus,
    ExtraDice,
    RerollBonus,
    // Grants
    ProcEffect,
    GrantAction,
    Misc,
}

/// Damage-type tag carried by a die (None = inherits)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    Display, EnumString, FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[repr(u8)]
pub enum Element {
    #[default]
    None = 0,
    Slashing,
    Blunt,
    Piercing,
    Fire,
    Ice,
    Shock,
    Poison,
    Shadow,
    Holy,
}

/// Face count of a die
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DieType {
    D4,
    #[default]
    D6,
    D8,
    D10,
    D12,
    D20,
}

impl DieType {
    /// Number of faces (also the maximum roll)
    pub fn faces(self) -> u32 {
        match self {
            DieType::D4 => 4,
            DieType::D6 => 6,
            DieType::D8 => 8,
            DieType::D10 => 10,
            DieType::D12 => 12,
            DieType::D20 => 20,
        }
    }

    /// Look up a die type by face count
    pub fn from_faces(faces: u32) -> Option<DieType> {
        match faces {
            4 => Some(DieType::D4),
            6 => Some(DieType::D6),
            8 => Some(DieType::D8),
            10 => Some(DieType::D10),
            12 => Some(DieType::D12),
            20 => Some(DieType::D20),
            _ => None,
        }
    }
}

/// Item rarity; the tier feeds EQUIPMENT_RARITY_SUM
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    Display, EnumString, FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[repr(u8)]
pub enum Rarity {
    #[default]
    Common = 0,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Numeric tier (Common = 0)
    pub fn tier(self) -> u32 {
        self as u32
    }
}

/// Equipment slot for gear
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EquipmentSlot {
    Head,
    Torso,
    Gloves,
    Boots,
    MainHand,
    OffHand,
    Accessory,
}

impl EquipmentSlot {
    /// Get all equipment slots
    pub fn all() -> &'static [EquipmentSlot] {
        &[
            EquipmentSlot::Head,
            EquipmentSlot::Torso,
            EquipmentSlot::Gloves,
            EquipmentSlot::Boots,
            EquipmentSlot::MainHand,
            EquipmentSlot::OffHand,
            EquipmentSlot::Accessory,
        ]
    }
}

impl_ordinal!(AffixCategory, Element, Rarity);
