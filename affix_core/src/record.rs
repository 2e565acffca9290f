//! Flat key/value records for authored affix data
//!
//! Enums travel as integer ordinals. Absent fields take the same defaults as
//! a freshly constructed template, so older records keep loading as fields
//! are added. Only `name` is required.

use crate::affix::{Affix, AffixSubEffect, GrantedResource};
use crate::condition::{AffixCondition, Comparand};
use crate::dice::{DiceAffix, DiceAffixSubEffect, DiceVisuals, NestedEffect};
use crate::types::{EffectData, Ordinal};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// A flat record
pub type Record = Map<String, Value>;

/// Malformed record data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("field `{field}` has no variant with ordinal {value}")]
    InvalidOrdinal { field: String, value: i64 },
    #[error("field `{field}` should be {expected}")]
    WrongType { field: String, expected: &'static str },
    #[error("missing required field `{0}`")]
    MissingField(String),
}

/// Types that flatten into a [`Record`]
pub trait ToRecord {
    fn to_record(&self) -> Record;
}

/// Types rebuilt from a [`Record`]
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> Result<Self, RecordError>;
}

fn wrong_type(field: &str, expected: &'static str) -> RecordError {
    RecordError::WrongType {
        field: field.to_string(),
        expected,
    }
}

/// Present and not null
fn field<'a>(record: &'a Record, name: &str) -> Option<&'a Value> {
    record.get(name).filter(|v| !v.is_null())
}

fn read_string(record: &Record, name: &str) -> Result<String, RecordError> {
    match field(record, name) {
        None => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(wrong_type(name, "a string")),
    }
}

fn read_f64(record: &Record, name: &str, default: f64) -> Result<f64, RecordError> {
    match field(record, name) {
        None => Ok(default),
        Some(value) => value.as_f64().ok_or_else(|| wrong_type(name, "a number")),
    }
}

fn read_opt_f64(record: &Record, name: &str) -> Result<Option<f64>, RecordError> {
    field(record, name)
        .map(|value| value.as_f64().ok_or_else(|| wrong_type(name, "a number")))
        .transpose()
}

fn read_usize(record: &Record, name: &str) -> Result<usize, RecordError> {
    match field(record, name) {
        None => Ok(0),
        Some(value) => value
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| wrong_type(name, "a non-negative integer")),
    }
}

fn read_bool(record: &Record, name: &str) -> Result<bool, RecordError> {
    match field(record, name) {
        None => Ok(false),
        Some(value) => value.as_bool().ok_or_else(|| wrong_type(name, "a boolean")),
    }
}

fn read_ordinal<T: Ordinal + Default>(record: &Record, name: &str) -> Result<T, RecordError> {
    Ok(read_opt_ordinal(record, name)?.unwrap_or_default())
}

fn read_opt_ordinal<T: Ordinal>(record: &Record, name: &str) -> Result<Option<T>, RecordError> {
    let Some(value) = field(record, name) else {
        return Ok(None);
    };
    let raw = value
        .as_i64()
        .ok_or_else(|| wrong_type(name, "an integer ordinal"))?;
    u8::try_from(raw)
        .ok()
        .and_then(T::from_ordinal)
        .map(Some)
        .ok_or_else(|| RecordError::InvalidOrdinal {
            field: name.to_string(),
            value: raw,
        })
}

fn read_object<'a>(record: &'a Record, name: &str) -> Result<Option<&'a Record>, RecordError> {
    match field(record, name) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(wrong_type(name, "an object")),
    }
}

fn read_list<T: FromRecord>(record: &Record, name: &str) -> Result<Vec<T>, RecordError> {
    match field(record, name) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => T::from_record(map),
                _ => Err(wrong_type(name, "a list of objects")),
            })
            .collect(),
        Some(_) => Err(wrong_type(name, "a list")),
    }
}

fn read_effect_data(record: &Record) -> Result<EffectData, RecordError> {
    Ok(read_object(record, "effect_data")?
        .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default())
}

fn read_condition(record: &Record, name: &str) -> Result<Option<AffixCondition>, RecordError> {
    read_object(record, name)?
        .map(AffixCondition::from_record)
        .transpose()
}

fn number(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}

fn ordinal<T: Ordinal>(value: T) -> Value {
    Value::from(value.ordinal())
}

fn effect_data_value(data: &EffectData) -> Value {
    Value::Object(data.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

fn list<T: ToRecord>(items: &[T]) -> Value {
    Value::Array(items.iter().map(|i| Value::Object(i.to_record())).collect())
}

fn optional<T: ToRecord>(item: Option<&T>) -> Value {
    item.map_or(Value::Null, |i| Value::Object(i.to_record()))
}

impl ToRecord for AffixCondition {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("kind".into(), ordinal(self.kind));
        record.insert("key".into(), Value::from(self.key.clone()));
        let value = match &self.value {
            Comparand::None => Value::Null,
            Comparand::Number(n) => number(*n),
            Comparand::Text(s) => Value::from(s.clone()),
        };
        record.insert("value".into(), value);
        record.insert("negate".into(), Value::from(self.negate));
        record.insert("multiplier".into(), number(self.multiplier));
        record
    }
}

impl FromRecord for AffixCondition {
    fn from_record(record: &Record) -> Result<Self, RecordError> {
        let value = match field(record, "value") {
            None => Comparand::None,
            Some(Value::String(s)) => Comparand::Text(s.clone()),
            Some(v) => Comparand::Number(
                v.as_f64()
                    .ok_or_else(|| wrong_type("value", "a number or string"))?,
            ),
        };
        Ok(AffixCondition {
            kind: read_ordinal(record, "kind")?,
            key: read_string(record, "key")?,
            value,
            negate: read_bool(record, "negate")?,
            multiplier: read_f64(record, "multiplier", 1.0)?,
        })
    }
}

impl ToRecord for AffixSubEffect {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("category".into(), ordinal(self.category));
        record.insert("value_source".into(), ordinal(self.value_source));
        record.insert("effect_number".into(), number(self.effect_number));
        record.insert("effect_data".into(), effect_data_value(&self.effect_data));
        record.insert("override_condition".into(), Value::from(self.override_condition));
        record.insert("condition_override".into(), optional(self.condition.as_ref()));
        let granted = self
            .granted
            .as_ref()
            .and_then(|g| serde_json::to_value(g).ok())
            .unwrap_or(Value::Null);
        record.insert("granted".into(), granted);
        record
    }
}

impl FromRecord for AffixSubEffect {
    fn from_record(record: &Record) -> Result<Self, RecordError> {
        let granted = field(record, "granted")
            .map(|v| {
                serde_json::from_value::<GrantedResource>(v.clone())
                    .map_err(|_| wrong_type("granted", "a granted action or dice object"))
            })
            .transpose()?;
        Ok(AffixSubEffect {
            category: read_ordinal(record, "category")?,
            value_source: read_ordinal(record, "value_source")?,
            effect_number: read_f64(record, "effect_number", 0.0)?,
            effect_data: read_effect_data(record)?,
            override_condition: read_bool(record, "override_condition")?,
            condition: read_condition(record, "condition_override")?,
            granted,
        })
    }
}

impl ToRecord for Affix {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("name".into(), Value::from(self.name.clone()));
        record.insert("description".into(), Value::from(self.description.clone()));
        record.insert("category".into(), ordinal(self.category));
        record.insert("value_source".into(), ordinal(self.value_source));
        record.insert("effect_min".into(), number(self.effect_min));
        record.insert("effect_max".into(), number(self.effect_max));
        record.insert("effect_number".into(), number(self.effect_number));
        record.insert("roll_fuzz".into(), self.roll_fuzz.map_or(Value::Null, number));
        record.insert("effect_data".into(), effect_data_value(&self.effect_data));
        record.insert("condition".into(), optional(self.condition.as_ref()));
        record.insert("sub_effects".into(), list(&self.sub_effects));
        record.insert(
            "tags".into(),
            Value::Array(self.tags.iter().cloned().map(Value::from).collect()),
        );
        record.insert("source".into(), Value::from(self.source.clone()));
        record.insert("source_type".into(), Value::from(self.source_type.clone()));
        record
    }
}

impl FromRecord for Affix {
    fn from_record(record: &Record) -> Result<Self, RecordError> {
        let name = match field(record, "name") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(wrong_type("name", "a string")),
            None => return Err(RecordError::MissingField("name".to_string())),
        };
        let tags: Vec<String> = match field(record, "tags") {
            None => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|t| {
                    t.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| wrong_type("tags", "a list of strings"))
                })
                .collect::<Result<_, _>>()?,
            Some(_) => return Err(wrong_type("tags", "a list of strings")),
        };
        Ok(Affix {
            name,
            description: read_string(record, "description")?,
            category: read_ordinal(record, "category")?,
            value_source: read_ordinal(record, "value_source")?,
            effect_min: read_f64(record, "effect_min", 0.0)?,
            effect_max: read_f64(record, "effect_max", 0.0)?,
            effect_number: read_f64(record, "effect_number", 0.0)?,
            roll_fuzz: read_opt_f64(record, "roll_fuzz")?,
            effect_data: read_effect_data(record)?,
            condition: read_condition(record, "condition")?,
            sub_effects: read_list(record, "sub_effects")?,
            tags,
            source: read_string(record, "source")?,
            source_type: read_string(record, "source_type")?,
        })
    }
}

impl ToRecord for NestedEffect {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("condition".into(), optional(self.condition.as_ref()));
        record.insert("effect".into(), Value::Object(self.effect.to_record()));
        record
    }
}

impl FromRecord for NestedEffect {
    fn from_record(record: &Record) -> Result<Self, RecordError> {
        let effect = read_object(record, "effect")?
            .ok_or_else(|| RecordError::MissingField("effect".to_string()))?;
        Ok(NestedEffect {
            condition: read_condition(record, "condition")?,
            effect: DiceAffixSubEffect::from_record(effect)?,
        })
    }
}

fn read_nested(record: &Record) -> Result<Option<Box<NestedEffect>>, RecordError> {
    read_object(record, "nested")?
        .map(|map| NestedEffect::from_record(map).map(Box::new))
        .transpose()
}

impl ToRecord for DiceAffixSubEffect {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("effect_type".into(), ordinal(self.effect_type));
        record.insert("value".into(), number(self.value));
        record.insert("value_source".into(), ordinal(self.value_source));
        record.insert("effect_data".into(), effect_data_value(&self.effect_data));
        record.insert(
            "target_override".into(),
            self.target_override.map_or(Value::Null, ordinal),
        );
        record.insert("override_condition".into(), Value::from(self.override_condition));
        record.insert("condition_override".into(), optional(self.condition.as_ref()));
        record.insert("nested".into(), optional(self.nested.as_deref()));
        record
    }
}

impl FromRecord for DiceAffixSubEffect {
    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(DiceAffixSubEffect {
            effect_type: read_ordinal(record, "effect_type")?,
            value: read_f64(record, "value", 0.0)?,
            value_source: read_ordinal(record, "value_source")?,
            effect_data: read_effect_data(record)?,
            target_override: read_opt_ordinal(record, "target_override")?,
            override_condition: read_bool(record, "override_condition")?,
            condition: read_condition(record, "condition_override")?,
            nested: read_nested(record)?,
        })
    }
}

impl ToRecord for DiceAffix {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("name".into(), Value::from(self.name.clone()));
        record.insert("description".into(), Value::from(self.description.clone()));
        record.insert("trigger".into(), ordinal(self.trigger));
        record.insert("position_requirement".into(), ordinal(self.position_requirement));
        record.insert("required_slot".into(), Value::from(self.required_slot));
        record.insert("neighbor_target".into(), ordinal(self.neighbor_target));
        record.insert("effect_type".into(), ordinal(self.effect_type));
        record.insert("effect_value".into(), number(self.effect_value));
        record.insert("value_source".into(), ordinal(self.value_source));
        record.insert("effect_data".into(), effect_data_value(&self.effect_data));
        record.insert("condition".into(), optional(self.condition.as_ref()));
        record.insert("nested".into(), optional(self.nested.as_deref()));
        record.insert("sub_effects".into(), list(&self.sub_effects));
        record.insert("visual_effect".into(), ordinal(self.visual_effect));
        record.insert("fill_visual".into(), ordinal(self.visuals.fill));
        record.insert("border_visual".into(), ordinal(self.visuals.border));
        record.insert("value_visual".into(), ordinal(self.visuals.value));
        record.insert("source".into(), Value::from(self.source.clone()));
        record.insert("source_type".into(), Value::from(self.source_type.clone()));
        record
    }
}

impl FromRecord for DiceAffix {
    fn from_record(record: &Record) -> Result<Self, RecordError> {
        let name = match field(record, "name") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(wrong_type("name", "a string")),
            None => return Err(RecordError::MissingField("name".to_string())),
        };
        Ok(DiceAffix {
            name,
            description: read_string(record, "description")?,
            trigger: read_ordinal(record, "trigger")?,
            position_requirement: read_ordinal(record, "position_requirement")?,
            required_slot: read_usize(record, "required_slot")?,
            neighbor_target: read_ordinal(record, "neighbor_target")?,
            effect_type: read_ordinal(record, "effect_type")?,
            effect_value: read_f64(record, "effect_value", 0.0)?,
            value_source: read_ordinal(record, "value_source")?,
            effect_data: read_effect_data(record)?,
            condition: read_condition(record, "condition")?,
            nested: read_nested(record)?,
            sub_effects: read_list(record, "sub_effects")?,
            visual_effect: read_ordinal(record, "visual_effect")?,
            visuals: DiceVisuals {
                fill: read_ordinal(record, "fill_visual")?,
                border: read_ordinal(record, "border_visual")?,
                value: read_ordinal(record, "value_visual")?,
            },
            source: read_string(record, "source")?,
            source_type: read_string(record, "source_type")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionKind;
    use crate::dice::{
        ComponentVisual, DiceAffixTrigger, DiceEffectType, NeighborTarget, VisualEffect, TAG_KEY,
    };
    use crate::types::{AffixCategory, DieType};
    use crate::value_source::{ValueSource, STAT_NAME_KEY};
    use serde_json::json;

    fn compound_affix() -> Affix {
        let low_hp =
            AffixCondition::new(ConditionKind::LessThan, "health_percent", Comparand::Number(0.5))
                .with_multiplier(2.0);
        Affix::new("Last Stand", AffixCategory::None, 0.0)
            .with_condition(low_hp)
            .with_sub_effect(
                AffixSubEffect::new(AffixCategory::StrengthBonus, 1.5)
                    .with_value_source(ValueSource::PlayerStat)
                    .with_data(STAT_NAME_KEY, json!("strength")),
            )
            .with_sub_effect(
                AffixSubEffect::new(AffixCategory::ExtraDice, 0.0)
                    .with_condition(Some(AffixCondition::new(
                        ConditionKind::Equals,
                        "class",
                        Comparand::Text("warrior".to_string()),
                    )))
                    .granting(GrantedResource::Dice {
                        dice: vec![DieType::D4, DieType::D4],
                    }),
            )
            .with_sub_effect(
                AffixSubEffect::new(AffixCategory::ArmorBonus, 3.0).with_condition(None),
            )
            .instantiate("item:Tattered Cloak", "item")
    }

    #[test]
    fn test_affix_round_trip() {
        let mut affix = compound_affix();
        affix.roll_fuzz = Some(0.25);
        affix.tags = vec!["defensive".to_string()];
        let back = Affix::from_record(&affix.to_record()).unwrap();
        assert_eq!(back, affix);
    }

    #[test]
    fn test_dice_affix_round_trip() {
        let mut affix = DiceAffix::new("Siphon", DiceEffectType::ModifyValueFlat, 0.0)
            .with_trigger(DiceAffixTrigger::OnUse)
            .at_slot(2)
            .with_sub_effect(
                DiceAffixSubEffect::new(DiceEffectType::ModifyValueFlat, -1.0)
                    .targeting(NeighborTarget::Left),
            )
            .with_sub_effect(DiceAffixSubEffect::wrapping(
                Some(AffixCondition::new(ConditionKind::Truthy, "is_max_roll", Comparand::None)),
                DiceAffixSubEffect::new(DiceEffectType::AddTag, 0.0)
                    .with_data(TAG_KEY, json!("surge")),
            ));
        affix.visuals.border = ComponentVisual::Pulse;
        let back = DiceAffix::from_record(&affix.to_record()).unwrap();
        assert_eq!(back, affix);
    }

    #[test]
    fn test_absent_fields_take_defaults() {
        let mut record = Record::new();
        record.insert("name".into(), json!("Bare"));
        let affix = Affix::from_record(&record).unwrap();
        assert_eq!(affix, Affix::new("Bare", AffixCategory::None, 0.0));

        let dice = DiceAffix::from_record(&record).unwrap();
        assert_eq!(dice, DiceAffix::new("Bare", DiceEffectType::ModifyValueFlat, 0.0));

        let mut condition = Record::new();
        condition.insert("kind".into(), json!(ConditionKind::HasKey.ordinal()));
        let parsed = AffixCondition::from_record(&condition).unwrap();
        assert!((parsed.multiplier - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_legacy_visual_only_record() {
        let mut record = Record::new();
        record.insert("name".into(), json!("Old Glow"));
        record.insert("visual_effect".into(), json!(VisualEffect::Glow.ordinal()));
        let affix = DiceAffix::from_record(&record).unwrap();
        assert!(affix.visuals.is_empty());
        assert_eq!(affix.effective_visuals().border, ComponentVisual::Glow);
    }

    #[test]
    fn test_malformed_records() {
        let mut record = Record::new();
        assert_eq!(
            Affix::from_record(&record),
            Err(RecordError::MissingField("name".to_string()))
        );

        record.insert("name".into(), json!("Bad"));
        record.insert("category".into(), json!(250));
        assert_eq!(
            Affix::from_record(&record),
            Err(RecordError::InvalidOrdinal {
                field: "category".to_string(),
                value: 250,
            })
        );

        record.insert("category".into(), json!("damage_bonus"));
        assert!(matches!(
            Affix::from_record(&record),
            Err(RecordError::WrongType { .. })
        ));
    }
}
