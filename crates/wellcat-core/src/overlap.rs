use crate::classify::{CategoryFamily, ClassifiedRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

/// A labelled set of well identifiers that must not share members with
/// any other set it is checked against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedWellSet {
    pub label: String,
    pub wells: BTreeSet<String>,
}

impl NamedWellSet {
    pub fn new<I, S>(label: impl Into<String>, wells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            wells: wells.into_iter().map(Into::into).collect(),
        }
    }
}

/// Two buckets that claim the same wells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapFinding {
    pub left: String,
    pub right: String,
    pub shared: BTreeSet<String>,
}

/// Pairwise intersections of the given sets. An empty result is a passing audit.
pub fn find_overlaps(sets: &[NamedWellSet]) -> Vec<OverlapFinding> {
    let mut findings = Vec::new();
    for (i, left) in sets.iter().enumerate() {
        for right in &sets[i + 1..] {
            let shared: BTreeSet<String> = left.wells.intersection(&right.wells).cloned().collect();
            if shared.is_empty() {
                continue;
            }
            warn!(
                left = %left.label,
                right = %right.label,
                wells = shared.len(),
                "wells assigned to two exclusive buckets"
            );
            findings.push(OverlapFinding {
                left: left.label.clone(),
                right: right.label.clone(),
                shared,
            });
        }
    }
    findings
}

/// One well-id set per category family, for checking a single batch.
pub fn family_well_sets(records: &[ClassifiedRecord]) -> Vec<NamedWellSet> {
    CategoryFamily::ALL
        .iter()
        .map(|family| {
            NamedWellSet::new(
                family.as_str(),
                records
                    .iter()
                    .filter(|r| r.category().family() == *family)
                    .map(|r| r.record.well_id.clone()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disjoint_sets_pass() {
        let sets = vec![
            NamedWellSet::new("sample.test_repeated", ["a", "b"]),
            NamedWellSet::new("discrepancy.acted_upon", ["c"]),
        ];
        assert!(find_overlaps(&sets).is_empty());
    }

    #[test]
    fn test_overlap_reports_shared_ids() {
        let sets = vec![
            NamedWellSet::new("sample.test_repeated", ["a", "b", "c"]),
            NamedWellSet::new("discrepancy.acted_upon", ["c", "d"]),
            NamedWellSet::new("control.unresolved", ["b", "c"]),
        ];
        let findings = find_overlaps(&sets);
        assert_eq!(findings.len(), 3);
        assert_eq!(findings[0].left, "sample.test_repeated");
        assert_eq!(findings[0].right, "discrepancy.acted_upon");
        assert_eq!(findings[0].shared, BTreeSet::from(["c".to_string()]));
        assert_eq!(findings[1].right, "control.unresolved");
        assert_eq!(findings[1].shared.len(), 2);
    }

    #[test]
    fn test_single_set_has_no_pairs() {
        assert!(find_overlaps(&[NamedWellSet::new("only", ["a"])]).is_empty());
        assert!(find_overlaps(&[]).is_empty());
    }
}
