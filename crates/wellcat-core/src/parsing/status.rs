use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// The operator action recorded by a repeat-type LIMS status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RepeatAction {
    Reamp,
    Rexct,
    Rxt,
    Rpt,
    /// Test not performed.
    Tnp,
}

impl RepeatAction {
    pub fn code(&self) -> &'static str {
        match self {
            RepeatAction::Reamp => "REAMP",
            RepeatAction::Rexct => "REXCT",
            RepeatAction::Rxt => "RXT",
            RepeatAction::Rpt => "RPT",
            RepeatAction::Tnp => "TNP",
        }
    }
}

/// Markers searched for, in order. TNP comes first so a status carrying
/// several markers is still recognised as test-not-performed.
const REPEAT_MARKERS: &[(&str, RepeatAction)] = &[
    ("TNP", RepeatAction::Tnp),
    ("REAMP", RepeatAction::Reamp),
    ("REXCT", RepeatAction::Rexct),
    ("RXT", RepeatAction::Rxt),
    ("RPT", RepeatAction::Rpt),
];

/// Canonical LIMS status set every lab vocabulary is folded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NormalizedStatus {
    Detected,
    NotDetected,
    RepeatAction(RepeatAction),
    Excluded,
    Inconclusive,
    Other,
    Absent,
}

impl NormalizedStatus {
    /// DETECTED or NOT DETECTED: a result was reported.
    pub fn is_canonical(&self) -> bool {
        matches!(self, NormalizedStatus::Detected | NormalizedStatus::NotDetected)
    }

    /// Any status proving the well was repeated, excluded or not reported.
    pub fn is_repeat_or_exclusion(&self) -> bool {
        matches!(
            self,
            NormalizedStatus::RepeatAction(_)
                | NormalizedStatus::Excluded
                | NormalizedStatus::Inconclusive
        )
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, NormalizedStatus::Absent)
    }

    pub fn label(&self) -> &'static str {
        match self {
            NormalizedStatus::Detected => "DETECTED",
            NormalizedStatus::NotDetected => "NOT DETECTED",
            NormalizedStatus::RepeatAction(action) => action.code(),
            NormalizedStatus::Excluded => "EXCLUDED",
            NormalizedStatus::Inconclusive => "INCONCLUSIVE",
            NormalizedStatus::Other => "OTHER",
            NormalizedStatus::Absent => "",
        }
    }
}

impl fmt::Display for NormalizedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedStatus::Absent => write!(f, "(none)"),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Target of a lab-specific status synonym.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanonicalStatus {
    #[serde(rename = "DETECTED")]
    Detected,
    #[serde(rename = "NOT DETECTED")]
    NotDetected,
}

impl From<CanonicalStatus> for NormalizedStatus {
    fn from(c: CanonicalStatus) -> Self {
        match c {
            CanonicalStatus::Detected => NormalizedStatus::Detected,
            CanonicalStatus::NotDetected => NormalizedStatus::NotDetected,
        }
    }
}

/// Case-insensitive synonym table, keyed by the trimmed upper-cased raw status.
#[derive(Debug, Clone, Default)]
pub struct StatusSynonyms {
    map: HashMap<String, CanonicalStatus>,
}

impl StatusSynonyms {
    pub fn from_map(entries: &BTreeMap<String, CanonicalStatus>) -> Self {
        let map = entries
            .iter()
            .map(|(raw, canonical)| (raw.trim().to_uppercase(), *canonical))
            .collect();
        Self { map }
    }

    pub fn get(&self, raw: &str) -> Option<CanonicalStatus> {
        self.map.get(&raw.trim().to_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Fold a raw LIMS status into the canonical status set.
///
/// Order of checks:
/// 1. Empty or missing -> `Absent`
/// 2. Lab synonym table (case-insensitive exact match)
/// 3. Literal `DETECTED` / `NOT DETECTED`
/// 4. Repeat markers (`TNP`, `REAMP`, `REXCT`, `RXT`, `RPT`), by containment
/// 5. `EXCLUDE`, then `INCONCLUSIVE`, by containment
/// 6. Everything else -> `Other`
pub fn normalize_status(raw: Option<&str>, synonyms: &StatusSynonyms) -> NormalizedStatus {
    let trimmed = match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return NormalizedStatus::Absent,
    };

    if let Some(canonical) = synonyms.get(trimmed) {
        return canonical.into();
    }

    let upper = trimmed.to_uppercase();
    match upper.as_str() {
        "DETECTED" => return NormalizedStatus::Detected,
        "NOT DETECTED" => return NormalizedStatus::NotDetected,
        _ => {}
    }

    if let Some((_, action)) = REPEAT_MARKERS.iter().find(|(m, _)| upper.contains(m)) {
        return NormalizedStatus::RepeatAction(*action);
    }

    if upper.contains("EXCLUDE") {
        NormalizedStatus::Excluded
    } else if upper.contains("INCONCLUSIVE") {
        NormalizedStatus::Inconclusive
    } else {
        NormalizedStatus::Other
    }
}
