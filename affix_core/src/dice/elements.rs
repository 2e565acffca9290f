//! Element affix table - the first layer of every die's affix stack

use super::affix::{DiceAffix, DiceAffixTrigger, DiceEffectType, ELEMENT_KEY};
use crate::types::Element;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One element → dice affix mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementAffixEntry {
    pub element: Element,
    pub affix: DiceAffix,
}

/// Dice affixes keyed by element
#[derive(Debug, Clone, Default)]
pub struct ElementAffixTable {
    affixes: HashMap<Element, DiceAffix>,
}

impl ElementAffixTable {
    pub fn new() -> Self {
        ElementAffixTable {
            affixes: HashMap::new(),
        }
    }

    pub fn register(&mut self, element: Element, affix: DiceAffix) {
        if element == Element::None {
            tracing::warn!(affix = %affix.name, "element affix registered for `none`, ignoring");
            return;
        }
        self.affixes.insert(element, affix);
    }

    pub fn get(&self, element: Element) -> Option<&DiceAffix> {
        self.affixes.get(&element)
    }

    pub fn len(&self) -> usize {
        self.affixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.affixes.is_empty()
    }

    /// One passive ADD_DAMAGE_TYPE affix per element
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for element in [
            Element::Slashing,
            Element::Blunt,
            Element::Piercing,
            Element::Fire,
            Element::Ice,
            Element::Shock,
            Element::Poison,
            Element::Shadow,
            Element::Holy,
        ] {
            let affix = DiceAffix::new(format!("{element}_die"), DiceEffectType::AddDamageType, 0.0)
                .with_trigger(DiceAffixTrigger::Passive)
                .with_data(ELEMENT_KEY, serde_json::Value::String(element.to_string()));
            table.register(element, affix);
        }
        table
    }
}

impl FromIterator<ElementAffixEntry> for ElementAffixTable {
    fn from_iter<I: IntoIterator<Item = ElementAffixEntry>>(iter: I) -> Self {
        let mut table = ElementAffixTable::new();
        for entry in iter {
            table.register(entry.element, entry.affix);
        }
        table
    }
}
