//! Status effect templates

use crate::affix::Affix;
use crate::types::{impl_ordinal, Element};
use crate::validation::{invalid, ValidationIssue};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, FromRepr};

/// How a status counts down
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum DurationType {
    /// Expires after `default_duration` decrements
    #[default]
    TurnBased = 0,
    /// Lasts until stacks run out or it is cleansed
    UntilRemoved,
}

/// How stacks fall off at the decay timing
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum DecayStyle {
    #[default]
    None = 0,
    /// Subtract `decay_amount`
    Flat,
    /// ceil(stacks / 2); a single stack clears
    Halving,
}

/// Turn phase at which a status does something
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
    FromRepr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum StatusTiming {
    #[default]
    StartOfTurn = 0,
    EndOfTurn,
    OnHit,
    OnDamaged,
    OnHeal,
}

impl_ordinal!(DurationType, DecayStyle, StatusTiming);

/// A status effect template, shared read-only by its instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusAffix {
    /// Unique identifier (e.g. "burn")
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_max_stacks")]
    pub max_stacks: u32,
    #[serde(default)]
    pub duration_type: DurationType,
    /// Turns for turn-based statuses
    #[serde(default = "default_duration")]
    pub default_duration: i32,
    /// Reapplying resets remaining turns
    #[serde(default = "default_true")]
    pub refresh_on_reapply: bool,
    #[serde(default)]
    pub decay_style: DecayStyle,
    #[serde(default = "default_decay_amount")]
    pub decay_amount: u32,
    #[serde(default)]
    pub damage_per_stack: f64,
    #[serde(default)]
    pub heal_per_stack: f64,
    /// Damage type of the tick damage
    #[serde(default)]
    pub element: Element,
    /// Stat modifiers, scaled by the stack count
    #[serde(default)]
    pub stat_affixes: Vec<Affix>,
    #[serde(default)]
    pub is_debuff: bool,
    #[serde(default = "default_true")]
    pub cleansable: bool,
    /// When damage/heal/stat payloads apply
    #[serde(default = "default_tick_timing")]
    pub tick_timing: StatusTiming,
    /// When remaining turns count down
    #[serde(default = "default_end_timing")]
    pub duration_timing: StatusTiming,
    /// When decay runs
    #[serde(default = "default_end_timing")]
    pub decay_timing: StatusTiming,
}

fn default_max_stacks() -> u32 {
    1
}

fn default_duration() -> i32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_decay_amount() -> u32 {
    1
}

fn default_tick_timing() -> StatusTiming {
    StatusTiming::StartOfTurn
}

fn default_end_timing() -> StatusTiming {
    StatusTiming::EndOfTurn
}

impl StatusAffix {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        StatusAffix {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            max_stacks: default_max_stacks(),
            duration_type: DurationType::TurnBased,
            default_duration: default_duration(),
            refresh_on_reapply: true,
            decay_style: DecayStyle::None,
            decay_amount: default_decay_amount(),
            damage_per_stack: 0.0,
            heal_per_stack: 0.0,
            element: Element::None,
            stat_affixes: Vec::new(),
            is_debuff: false,
            cleansable: true,
            tick_timing: default_tick_timing(),
            duration_timing: default_end_timing(),
            decay_timing: default_end_timing(),
        }
    }

    pub fn is_turn_based(&self) -> bool {
        self.duration_type == DurationType::TurnBased
    }

    /// Design-time checks
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let owner = self.id.as_str();
        if self.id.trim().is_empty() {
            issues.push(invalid("<unnamed status>", "status id is empty"));
        }
        if self.max_stacks == 0 {
            issues.push(invalid(owner, "max_stacks must be at least 1"));
        }
        if self.is_turn_based() && self.default_duration <= 0 {
            issues.push(invalid(owner, "turn-based status needs a positive default_duration"));
        }
        if self.decay_style == DecayStyle::Flat && self.decay_amount == 0 {
            issues.push(invalid(owner, "flat decay with decay_amount 0 never decays"));
        }
        if self.damage_per_stack < 0.0 || self.heal_per_stack < 0.0 {
            issues.push(invalid(owner, "per-stack damage and heal must be non-negative"));
        }
        for affix in &self.stat_affixes {
            issues.extend(affix.validate());
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_defaults() {
        let status: StatusAffix = toml::from_str(
            r#"
id = "chill"
name = "Chill"
"#,
        )
        .unwrap();
        assert_eq!(status.max_stacks, 1);
        assert_eq!(status.default_duration, 3);
        assert!(status.refresh_on_reapply);
        assert_eq!(status.tick_timing, StatusTiming::StartOfTurn);
        assert_eq!(status.duration_timing, StatusTiming::EndOfTurn);
        assert!(status.validate().is_empty());
    }

    #[test]
    fn test_validate_flags_problems() {
        let mut status = StatusAffix::new("bad", "Bad");
        status.max_stacks = 0;
        status.default_duration = 0;
        status.decay_style = DecayStyle::Flat;
        status.decay_amount = 0;
        assert_eq!(status.validate().len(), 3);
    }
}
