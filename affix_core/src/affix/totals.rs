//! AffixTotals - collects contributions before the combat resolver reads them

use super::types::{AffixContribution, GrantedResource};
use crate::types::AffixCategory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-category sums of evaluated contributions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffixTotals {
    values: BTreeMap<AffixCategory, f64>,
    /// Actions and dice granted by sub-effects, in evaluation order
    pub granted: Vec<GrantedResource>,
    /// (affix name, category, value) for breakdown displays
    pub breakdown: Vec<(String, AffixCategory, f64)>,
}

impl AffixTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, contribution: AffixContribution) {
        *self.values.entry(contribution.category).or_insert(0.0) += contribution.value;
        self.breakdown
            .push((contribution.affix_name, contribution.category, contribution.value));
        if let Some(granted) = contribution.granted {
            self.granted.push(granted);
        }
    }

    /// Add a contribution scaled by a factor (status stacks)
    pub fn add_scaled(&mut self, mut contribution: AffixContribution, factor: f64) {
        contribution.value *= factor;
        self.add(contribution);
    }

    /// Merge another set of totals into this one
    pub fn merge(&mut self, other: AffixTotals) {
        for (category, value) in other.values {
            *self.values.entry(category).or_insert(0.0) += value;
        }
        self.granted.extend(other.granted);
        self.breakdown.extend(other.breakdown);
    }

    /// Sum for a category (0 when absent)
    pub fn get(&self, category: AffixCategory) -> f64 {
        self.values.get(&category).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AffixCategory, f64)> + '_ {
        self.values.iter().map(|(c, v)| (*c, *v))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.granted.is_empty()
    }
}

impl FromIterator<AffixContribution> for AffixTotals {
    fn from_iter<I: IntoIterator<Item = AffixContribution>>(iter: I) -> Self {
        let mut totals = AffixTotals::new();
        for contribution in iter {
            totals.add(contribution);
        }
        totals
    }
}
