//! Player and equipment boundary consumed by value sources and set tracking

use crate::affix::Affix;
use crate::dice::DieResource;
use crate::types::{EquipmentSlot, Rarity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Anything with a health pool (acting combatant for health-percent lookups)
pub trait Combatant {
    fn current_health(&self) -> f64;
    fn max_health(&self) -> f64;

    /// Current health as a fraction of max, `None` when max health is unusable
    fn health_percent(&self) -> Option<f64> {
        let max = self.max_health();
        if max > 0.0 {
            Some((self.current_health() / max).clamp(0.0, 1.0))
        } else {
            None
        }
    }
}

/// Uniform view over equippable items
pub trait EquipmentItem {
    fn name(&self) -> &str;
    fn rarity(&self) -> Rarity;
    /// Set this item belongs to, if any
    fn set_id(&self) -> Option<&str>;
}

/// Stat and equipment accessor for the player
pub trait PlayerView: Combatant {
    /// Named stat lookup, `None` for unknown stats
    fn stat(&self, name: &str) -> Option<f64>;
    fn equipment(&self) -> &Equipment;
}

/// An equippable item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub slot: EquipmentSlot,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default)]
    pub set_id: Option<String>,
    /// Affixes granted while equipped
    #[serde(default)]
    pub affixes: Vec<Affix>,
    /// Dice this item contributes to the dice pool
    #[serde(default)]
    pub dice: Vec<DieResource>,
}

impl Item {
    pub fn new(name: impl Into<String>, slot: EquipmentSlot, rarity: Rarity) -> Self {
        Item {
            name: name.into(),
            slot,
            rarity,
            set_id: None,
            affixes: Vec::new(),
            dice: Vec::new(),
        }
    }

    pub fn with_set(mut self, set_id: impl Into<String>) -> Self {
        self.set_id = Some(set_id.into());
        self
    }

    pub fn with_affix(mut self, affix: Affix) -> Self {
        self.affixes.push(affix);
        self
    }

    /// Add a die, stamping it with this item as its origin
    pub fn with_die(mut self, mut die: DieResource) -> Self {
        die.origin_item = Some(self.name.clone());
        self.dice.push(die);
        self
    }
}

impl EquipmentItem for Item {
    fn name(&self) -> &str {
        &self.name
    }

    fn rarity(&self) -> Rarity {
        self.rarity
    }

    fn set_id(&self) -> Option<&str> {
        self.set_id.as_deref()
    }
}

/// Equipped items by slot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Equipment {
    slots: BTreeMap<EquipmentSlot, Item>,
}

impl Equipment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Equip an item into its slot, returning the item it replaced
    pub fn equip(&mut self, item: Item) -> Option<Item> {
        self.slots.insert(item.slot, item)
    }

    pub fn unequip(&mut self, slot: EquipmentSlot) -> Option<Item> {
        self.slots.remove(&slot)
    }

    pub fn equipped(&self, slot: EquipmentSlot) -> Option<&Item> {
        self.slots.get(&slot)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.slots.values()
    }

    /// Number of occupied slots
    pub fn equipped_count(&self) -> usize {
        self.slots.len()
    }

    /// Sum of rarity tiers across equipped items
    pub fn rarity_sum(&self) -> u32 {
        self.slots.values().map(|item| item.rarity().tier()).sum()
    }

    /// Equipped items belonging to a set
    pub fn items_in_set<'a>(&'a self, set_id: &'a str) -> impl Iterator<Item = &'a Item> + 'a {
        self.slots
            .values()
            .filter(move |item| item.set_id() == Some(set_id))
    }
}

/// Plain player state implementing [`PlayerView`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerState {
    pub name: String,
    pub current_health: f64,
    pub max_health: f64,
    #[serde(default)]
    pub stats: HashMap<String, f64>,
    #[serde(default)]
    pub equipment: Equipment,
}

impl PlayerState {
    pub fn new(name: impl Into<String>, max_health: f64) -> Self {
        PlayerState {
            name: name.into(),
            current_health: max_health,
            max_health,
            stats: HashMap::new(),
            equipment: Equipment::new(),
        }
    }

    pub fn with_stat(mut self, name: impl Into<String>, value: f64) -> Self {
        self.stats.insert(name.into(), value);
        self
    }
}

impl Combatant for PlayerState {
    fn current_health(&self) -> f64 {
        self.current_health
    }

    fn max_health(&self) -> f64 {
        self.max_health
    }
}

impl PlayerView for PlayerState {
    fn stat(&self, name: &str) -> Option<f64> {
        self.stats.get(name).copied()
    }

    fn equipment(&self) -> &Equipment {
        &self.equipment
    }
}
