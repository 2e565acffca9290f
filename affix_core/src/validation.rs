//! Design-time validation issues for authored templates

use thiserror::Error;

/// A problem found in authored affix, status or set data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    #[error("{owner}: effect_min ({min}) is greater than effect_max ({max})")]
    InvertedRange { owner: String, min: f64, max: f64 },
    #[error("{owner}: roll_fuzz must be non-negative (got {value})")]
    NegativeFuzz { owner: String, value: f64 },
    #[error("{owner}: missing effect_data key `{key}`")]
    MissingEffectKey { owner: String, key: String },
    #[error("{owner}: effect_data key `{key}` has an invalid value")]
    InvalidEffectValue { owner: String, key: String },
    #[error("{owner}: top-level effect fields are ignored because sub_effects are present")]
    ShadowedTopLevel { owner: String },
    #[error("{owner}: conditional effect has no nested effect")]
    EmptyConditional { owner: String },
    #[error("{owner}: {message}")]
    Invalid { owner: String, message: String },
}

/// Short helper for the common "invalid with message" case
pub(crate) fn invalid(owner: &str, message: impl Into<String>) -> ValidationIssue {
    ValidationIssue::Invalid {
        owner: owner.to_string(),
        message: message.into(),
    }
}
