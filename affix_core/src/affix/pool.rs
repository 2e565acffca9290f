//! AffixPool - the player's active affixes

use super::evaluator::AffixEvaluator;
use super::totals::AffixTotals;
use super::types::{Affix, AffixContribution};
use crate::context::EvalContext;
use crate::types::AffixCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier of an affix instance inside a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AffixId(pub u64);

/// A runtime affix instance owned by the pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffixInstance {
    pub id: AffixId,
    pub affix: Affix,
}

/// Frozen per-category counts, read by ACTIVE_AFFIX_COUNT
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffixCountSnapshot {
    counts: HashMap<AffixCategory, usize>,
    total: usize,
}

impl AffixCountSnapshot {
    pub fn count(&self, category: AffixCategory) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Active affixes in insertion order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AffixPool {
    next_id: u64,
    entries: Vec<AffixInstance>,
}

impl AffixPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an owned instance, returning its id
    pub fn add(&mut self, affix: Affix) -> AffixId {
        let id = AffixId(self.next_id);
        self.next_id += 1;
        self.entries.push(AffixInstance { id, affix });
        id
    }

    /// Remove a single instance
    pub fn remove(&mut self, id: AffixId) -> Option<Affix> {
        let index = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(index).affix)
    }

    /// Remove every instance tagged with `source`, returning how many went
    pub fn remove_by_source(&mut self, source: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.affix.source != source);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: AffixId) -> Option<&Affix> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.affix)
    }

    pub fn get_all_affixes(&self) -> impl Iterator<Item = &Affix> {
        self.entries.iter().map(|e| &e.affix)
    }

    pub fn instances(&self) -> &[AffixInstance] {
        &self.entries
    }

    pub fn affixes_in_category(&self, category: AffixCategory) -> impl Iterator<Item = &Affix> {
        self.get_all_affixes().filter(move |a| a.category == category)
    }

    pub fn affixes_from_source<'a>(
        &'a self,
        source: &'a str,
    ) -> impl Iterator<Item = &'a Affix> + 'a {
        self.get_all_affixes().filter(move |a| a.source == source)
    }

    pub fn count_in_category(&self, category: AffixCategory) -> usize {
        self.affixes_in_category(category).count()
    }

    /// Capture category counts for one evaluation batch
    ///
    /// Compound affixes count once per distinct sub-effect category.
    pub fn snapshot(&self) -> AffixCountSnapshot {
        let mut snapshot = AffixCountSnapshot::default();
        for affix in self.get_all_affixes() {
            snapshot.total += 1;
            if affix.sub_effects.is_empty() {
                *snapshot.counts.entry(affix.category).or_insert(0) += 1;
            } else {
                let mut seen: Vec<AffixCategory> = Vec::new();
                for sub in &affix.sub_effects {
                    if !seen.contains(&sub.category) {
                        seen.push(sub.category);
                        *snapshot.counts.entry(sub.category).or_insert(0) += 1;
                    }
                }
            }
        }
        snapshot
    }

    /// Add a batch of instances and evaluate them as one trigger window
    ///
    /// Every value is resolved against the counts from before the batch, then
    /// the whole batch is inserted.
    pub fn add_batch(
        &mut self,
        affixes: Vec<Affix>,
        evaluator: &AffixEvaluator,
        ctx: &EvalContext<'_>,
    ) -> (Vec<AffixId>, Vec<AffixContribution>) {
        let snapshot = self.snapshot();
        let batch_ctx = ctx.clone().with_affix_counts(&snapshot);
        let contributions = evaluator.evaluate_batch(&affixes, &batch_ctx);
        let ids = affixes.into_iter().map(|affix| self.add(affix)).collect();
        (ids, contributions)
    }

    /// Evaluate the whole pool into per-category totals
    pub fn evaluate_all(&self, evaluator: &AffixEvaluator, ctx: &EvalContext<'_>) -> AffixTotals {
        let snapshot = self.snapshot();
        let pool_ctx = ctx.clone().with_affix_counts(&snapshot);
        let mut totals = AffixTotals::new();
        for contribution in evaluator.evaluate_batch(self.get_all_affixes(), &pool_ctx) {
            totals.add(contribution);
        }
        totals
    }
}
