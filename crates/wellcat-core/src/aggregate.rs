use crate::classify::{Category, CategoryFamily, ClassifiedRecord};
use crate::model::WellType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-mix and per-well-type category counts for one run.
///
/// Counts only ever grow. Two tallies built from disjoint shards can be
/// merged in any order and give the same result as one pass over the union.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub total: u64,
    /// Wells that reached the catch-all rule.
    pub fallbacks: u64,
    pub by_mix: BTreeMap<String, BTreeMap<Category, u64>>,
    pub by_well_type: BTreeMap<WellType, BTreeMap<Category, u64>>,
}

impl CategoryTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: &ClassifiedRecord) {
        self.add_one(
            &record.record.mix_name,
            record.record.well_type,
            record.category(),
        );
        if record.classification.is_fallback() {
            self.fallbacks += 1;
        }
    }

    pub fn add_one(&mut self, mix_name: &str, well_type: WellType, category: Category) {
        *self
            .by_mix
            .entry(mix_name.to_string())
            .or_default()
            .entry(category)
            .or_insert(0) += 1;
        *self
            .by_well_type
            .entry(well_type)
            .or_default()
            .entry(category)
            .or_insert(0) += 1;
        self.total += 1;
    }

    pub fn merge(&mut self, other: &CategoryTally) {
        self.total += other.total;
        self.fallbacks += other.fallbacks;
        for (mix, counts) in &other.by_mix {
            let into = self.by_mix.entry(mix.clone()).or_default();
            for (category, n) in counts {
                *into.entry(*category).or_insert(0) += n;
            }
        }
        for (well_type, counts) in &other.by_well_type {
            let into = self.by_well_type.entry(*well_type).or_default();
            for (category, n) in counts {
                *into.entry(*category).or_insert(0) += n;
            }
        }
    }

    pub fn count(&self, mix_name: &str, category: Category) -> u64 {
        self.by_mix
            .get(mix_name)
            .and_then(|m| m.get(&category))
            .copied()
            .unwrap_or(0)
    }

    pub fn count_for_type(&self, well_type: WellType, category: Category) -> u64 {
        self.by_well_type
            .get(&well_type)
            .and_then(|m| m.get(&category))
            .copied()
            .unwrap_or(0)
    }

    /// Counts per category across all mixes. Categories never seen are omitted.
    pub fn category_totals(&self) -> BTreeMap<Category, u64> {
        let mut totals = BTreeMap::new();
        for counts in self.by_mix.values() {
            for (category, n) in counts {
                *totals.entry(*category).or_insert(0) += n;
            }
        }
        totals
    }

    /// Counts per family. All four families are present, zero if unseen.
    pub fn family_totals(&self) -> BTreeMap<CategoryFamily, u64> {
        let mut totals: BTreeMap<CategoryFamily, u64> =
            CategoryFamily::ALL.iter().map(|f| (*f, 0)).collect();
        for (category, n) in self.category_totals() {
            *totals.entry(category.family()).or_insert(0) += n;
        }
        totals
    }

    pub fn needs_review(&self) -> u64 {
        self.category_totals()
            .get(&Category::NeedsReview)
            .copied()
            .unwrap_or(0)
    }
}

/// Reduce classified records to a tally.
pub fn aggregate<'a, I>(records: I) -> CategoryTally
where
    I: IntoIterator<Item = &'a ClassifiedRecord>,
{
    let mut tally = CategoryTally::new();
    for record in records {
        tally.add(record);
    }
    tally
}
