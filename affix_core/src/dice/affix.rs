//! DiceAffix templates

use crate::condition::AffixCondition;
use crate::types::{impl_ordinal, EffectData, EffectDataExt, Element};
use crate::validation::{invalid, ValidationIssue};
use crate::value_source::ValueSource;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::str::FromStr;
use strum::{Display, EnumString, FromRepr};

/// When a dice affix fires
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum DiceAffixTrigger {
    #[default]
    OnRoll = 0,
    OnUse,
    Passive,
    OnReorder,
    OnCombatStart,
    OnCombatEnd,
}

/// Slot gate checked against the source die's position
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum PositionRequirement {
    #[default]
    Any = 0,
    First,
    Last,
    NotFirst,
    NotLast,
    SpecificSlot,
    EvenSlots,
    OddSlots,
}

/// Which dice an effect lands on, relative to the source die
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum NeighborTarget {
    #[default]
    SelfDie = 0,
    Left,
    Right,
    BothNeighbors,
    AllLeft,
    AllRight,
    AllOthers,
    AllDice,
}

/// Mutation a dice effect performs
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum DiceEffectType {
    #[default]
    ModifyValueFlat = 0,
    /// Absolute multiplier; 1.0 is a no-op
    ModifyValuePercent,
    SetMinimumValue,
    SetMaximumValue,
    AddTag,
    RemoveTag,
    CopyTags,
    GrantReroll,
    AutoRerollLow,
    DuplicateOnMax,
    LockDie,
    ChangeDieType,
    CopyNeighborValue,
    AddDamageType,
    GrantStatusEffect,
    Conditional,
}

/// Legacy single visual effect (pre per-component visuals)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum VisualEffect {
    #[default]
    None = 0,
    Glow,
    Pulse,
    Sparkle,
    Flame,
    Frost,
    Lightning,
    Shadow,
}

/// Per-component visual treatment
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum ComponentVisual {
    #[default]
    None = 0,
    Tint,
    Glow,
    Pulse,
    Shimmer,
    Particles,
}

impl_ordinal!(
    DiceAffixTrigger,
    PositionRequirement,
    NeighborTarget,
    DiceEffectType,
    VisualEffect,
    ComponentVisual,
);

/// Per-component visuals for the fill, border and value label of a die
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceVisuals {
    #[serde(default)]
    pub fill: ComponentVisual,
    #[serde(default)]
    pub border: ComponentVisual,
    #[serde(default)]
    pub value: ComponentVisual,
}

impl DiceVisuals {
    pub fn is_empty(&self) -> bool {
        self.fill == ComponentVisual::None
            && self.border == ComponentVisual::None
            && self.value == ComponentVisual::None
    }

    /// Per-component equivalent of a legacy visual
    pub fn from_legacy(legacy: VisualEffect) -> Self {
        let (fill, border, value) = match legacy {
            VisualEffect::None => (
                ComponentVisual::None,
                ComponentVisual::None,
                ComponentVisual::None,
            ),
            VisualEffect::Glow => (
                ComponentVisual::None,
                ComponentVisual::Glow,
                ComponentVisual::None,
            ),
            VisualEffect::Pulse => (
                ComponentVisual::None,
                ComponentVisual::Pulse,
                ComponentVisual::Pulse,
            ),
            VisualEffect::Sparkle => (
                ComponentVisual::Particles,
                ComponentVisual::None,
                ComponentVisual::Shimmer,
            ),
            VisualEffect::Flame
            | VisualEffect::Frost
            | VisualEffect::Lightning
            | VisualEffect::Shadow => {
                (ComponentVisual::Tint, ComponentVisual::Glow, ComponentVisual::None)
            }
        };
        DiceVisuals { fill, border, value }
    }
}

/// Extra predicate wrapped around a nested effect (CONDITIONAL)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NestedEffect {
    #[serde(default)]
    pub condition: Option<AffixCondition>,
    pub effect: DiceAffixSubEffect,
}

/// One step of a compound dice affix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceAffixSubEffect {
    #[serde(default)]
    pub effect_type: DiceEffectType,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub value_source: ValueSource,
    #[serde(default)]
    pub effect_data: EffectData,
    /// Replaces the parent's neighbor target for this step
    #[serde(default)]
    pub target_override: Option<NeighborTarget>,
    #[serde(default)]
    pub override_condition: bool,
    #[serde(default)]
    pub condition: Option<AffixCondition>,
    #[serde(default)]
    pub nested: Option<Box<NestedEffect>>,
}

impl DiceAffixSubEffect {
    pub fn new(effect_type: DiceEffectType, value: f64) -> Self {
        DiceAffixSubEffect {
            effect_type,
            value,
            value_source: ValueSource::Static,
            effect_data: EffectData::new(),
            target_override: None,
            override_condition: false,
            condition: None,
            nested: None,
        }
    }

    pub fn targeting(mut self, target: NeighborTarget) -> Self {
        self.target_override = Some(target);
        self
    }

    pub fn with_value_source(mut self, value_source: ValueSource) -> Self {
        self.value_source = value_source;
        self
    }

    pub fn with_condition(mut self, condition: Option<AffixCondition>) -> Self {
        self.override_condition = true;
        self.condition = condition;
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.effect_data.insert(key.into(), value);
        self
    }

    /// Turn this step into a CONDITIONAL wrapper around `effect`
    pub fn wrapping(condition: Option<AffixCondition>, effect: DiceAffixSubEffect) -> Self {
        let mut step = DiceAffixSubEffect::new(DiceEffectType::Conditional, 0.0);
        step.nested = Some(Box::new(NestedEffect { condition, effect }));
        step
    }

    fn validate_into(&self, owner: &str, issues: &mut Vec<ValidationIssue>) {
        validate_effect(owner, self.effect_type, &self.effect_data, self.nested.as_deref(), issues);
    }
}

/// A die-level modifier template
///
/// When `sub_effects` is non-empty the top-level effect fields are inert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceAffix {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub trigger: DiceAffixTrigger,
    #[serde(default)]
    pub position_requirement: PositionRequirement,
    /// Slot for [`PositionRequirement::SpecificSlot`]
    #[serde(default)]
    pub required_slot: usize,
    #[serde(default)]
    pub neighbor_target: NeighborTarget,
    #[serde(default)]
    pub effect_type: DiceEffectType,
    #[serde(default)]
    pub effect_value: f64,
    #[serde(default)]
    pub value_source: ValueSource,
    #[serde(default)]
    pub effect_data: EffectData,
    #[serde(default)]
    pub condition: Option<AffixCondition>,
    #[serde(default)]
    pub nested: Option<Box<NestedEffect>>,
    #[serde(default)]
    pub sub_effects: Vec<DiceAffixSubEffect>,
    /// Legacy single visual, kept for old data
    #[serde(default)]
    pub visual_effect: VisualEffect,
    #[serde(default)]
    pub visuals: DiceVisuals,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub source_type: String,
}

impl DiceAffix {
    pub fn new(name: impl Into<String>, effect_type: DiceEffectType, effect_value: f64) -> Self {
        DiceAffix {
            name: name.into(),
            description: String::new(),
            trigger: DiceAffixTrigger::OnRoll,
            position_requirement: PositionRequirement::Any,
            required_slot: 0,
            neighbor_target: NeighborTarget::SelfDie,
            effect_type,
            effect_value,
            value_source: ValueSource::Static,
            effect_data: EffectData::new(),
            condition: None,
            nested: None,
            sub_effects: Vec::new(),
            visual_effect: VisualEffect::None,
            visuals: DiceVisuals::default(),
            source: String::new(),
            source_type: String::new(),
        }
    }

    pub fn with_trigger(mut self, trigger: DiceAffixTrigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_position(mut self, requirement: PositionRequirement) -> Self {
        self.position_requirement = requirement;
        self
    }

    pub fn at_slot(mut self, slot: usize) -> Self {
        self.position_requirement = PositionRequirement::SpecificSlot;
        self.required_slot = slot;
        self
    }

    pub fn targeting(mut self, target: NeighborTarget) -> Self {
        self.neighbor_target = target;
        self
    }

    pub fn with_value_source(mut self, value_source: ValueSource) -> Self {
        self.value_source = value_source;
        self
    }

    pub fn with_condition(mut self, condition: AffixCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.effect_data.insert(key.into(), value);
        self
    }

    pub fn with_nested(
        mut self,
        condition: Option<AffixCondition>,
        effect: DiceAffixSubEffect,
    ) -> Self {
        self.effect_type = DiceEffectType::Conditional;
        self.nested = Some(Box::new(NestedEffect { condition, effect }));
        self
    }

    pub fn with_sub_effect(mut self, sub_effect: DiceAffixSubEffect) -> Self {
        self.sub_effects.push(sub_effect);
        self
    }

    /// Owned runtime clone stamped with its source
    pub fn instantiate(&self, source: &str, source_type: &str) -> DiceAffix {
        let mut instance = self.clone();
        instance.source = source.to_string();
        instance.source_type = source_type.to_string();
        instance
    }

    /// The steps this affix runs, in order
    ///
    /// A simple affix is a single step built from its top-level fields, which
    /// inherits the parent condition and neighbor target.
    pub fn steps(&self) -> Cow<'_, [DiceAffixSubEffect]> {
        if !self.sub_effects.is_empty() {
            return Cow::Borrowed(&self.sub_effects);
        }
        Cow::Owned(vec![DiceAffixSubEffect {
            effect_type: self.effect_type,
            value: self.effect_value,
            value_source: self.value_source,
            effect_data: self.effect_data.clone(),
            target_override: None,
            override_condition: false,
            condition: None,
            nested: self.nested.clone(),
        }])
    }

    /// Per-component visuals, derived from the legacy field for old data
    pub fn effective_visuals(&self) -> DiceVisuals {
        if self.visuals.is_empty() && self.visual_effect != VisualEffect::None {
            DiceVisuals::from_legacy(self.visual_effect)
        } else {
            self.visuals
        }
    }

    /// Element this affix tags onto dice, when it is an ADD_DAMAGE_TYPE affix
    pub fn granted_element(&self) -> Option<Element> {
        self.steps()
            .iter()
            .filter(|s| s.effect_type == DiceEffectType::AddDamageType)
            .find_map(|s| {
                s.effect_data
                    .get_str(ELEMENT_KEY)
                    .and_then(|e| Element::from_str(e).ok())
            })
    }

    /// Design-time checks
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let owner = self.name.as_str();
        if self.name.trim().is_empty() {
            issues.push(invalid("<unnamed dice affix>", "dice affix name is empty"));
        }
        if self.sub_effects.is_empty() {
            validate_effect(
                owner,
                self.effect_type,
                &self.effect_data,
                self.nested.as_deref(),
                &mut issues,
            );
        } else {
            if self.effect_value != 0.0 || self.nested.is_some() {
                issues.push(ValidationIssue::ShadowedTopLevel {
                    owner: owner.to_string(),
                });
            }
            for sub in &self.sub_effects {
                sub.validate_into(owner, &mut issues);
            }
        }
        issues
    }
}

/// Effect data key for tag effects
pub const TAG_KEY: &str = "tag";
/// Effect data key for AUTO_REROLL_LOW
pub const THRESHOLD_KEY: &str = "threshold";
/// Effect data key for CHANGE_DIE_TYPE (face count)
pub const DIE_TYPE_KEY: &str = "die_type";
/// Effect data key for ADD_DAMAGE_TYPE
pub const ELEMENT_KEY: &str = "element";
/// Effect data key for GRANT_STATUS_EFFECT
pub const STATUS_ID_KEY: &str = "status_id";

fn validate_effect(
    owner: &str,
    effect_type: DiceEffectType,
    data: &EffectData,
    nested: Option<&NestedEffect>,
    issues: &mut Vec<ValidationIssue>,
) {
    let require = |key: &str, issues: &mut Vec<ValidationIssue>| {
        if !data.contains_key(key) {
            issues.push(ValidationIssue::MissingEffectKey {
                owner: owner.to_string(),
                key: key.to_string(),
            });
        }
    };

    match effect_type {
        DiceEffectType::AddTag | DiceEffectType::RemoveTag => require(TAG_KEY, issues),
        DiceEffectType::GrantStatusEffect => require(STATUS_ID_KEY, issues),
        DiceEffectType::AddDamageType => match data.get_str(ELEMENT_KEY) {
            Some(name) if Element::from_str(name).is_ok() => {}
            Some(_) => issues.push(ValidationIssue::InvalidEffectValue {
                owner: owner.to_string(),
                key: ELEMENT_KEY.to_string(),
            }),
            None => require(ELEMENT_KEY, issues),
        },
        DiceEffectType::ChangeDieType => {
            if let Some(faces) = data.get_i64(DIE_TYPE_KEY) {
                if crate::types::DieType::from_faces(faces.max(0) as u32).is_none() {
                    issues.push(ValidationIssue::InvalidEffectValue {
                        owner: owner.to_string(),
                        key: DIE_TYPE_KEY.to_string(),
                    });
                }
            }
        }
        DiceEffectType::Conditional => match nested {
            Some(nested) => nested.effect.validate_into(owner, issues),
            None => issues.push(ValidationIssue::EmptyConditional {
                owner: owner.to_string(),
            }),
        },
        _ => {}
    }
}
