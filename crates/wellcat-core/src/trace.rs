use crate::classify::{Category, ClassifiedRecord, Confidence};
use crate::model::WellType;
use crate::overlap::OverlapFinding;
use crate::parsing::{NormalizedStatus, ResolutionForm};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

pub const TRACE_SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceSeverity {
    Critical,
    Important,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceVisibility {
    Always,
    Auto,
    OnDemand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStepType {
    NormalizeStatus,
    ParseResolution,
    RuleMatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceStep {
    pub step_type: TraceStepType,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceDecision {
    pub decision_id: String,
    pub well_id: String,
    pub mix_name: String,
    pub well_type: WellType,
    pub rule_id: String,
    pub category: Category,
    pub reason: String,
    pub severity: TraceSeverity,
    pub visibility: TraceVisibility,
    pub steps: Vec<TraceStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceWarning {
    /// First well that raised this warning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub well_id: Option<String>,
    pub message: String,
    /// How many wells raised the same warning.
    pub occurrences: u64,
    pub severity: TraceSeverity,
    pub visibility: TraceVisibility,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceBundle {
    pub trace_schema_version: String,
    pub decisions: Vec<TraceDecision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<TraceWarning>,
}

impl Default for TraceBundle {
    fn default() -> Self {
        Self {
            trace_schema_version: TRACE_SCHEMA_VERSION.to_string(),
            decisions: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

impl TraceBundle {
    pub fn critical_count(&self) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.severity == TraceSeverity::Critical)
            .count()
    }
}

fn decision_severity(record: &ClassifiedRecord) -> TraceSeverity {
    let c = &record.classification;
    if c.is_fallback() {
        TraceSeverity::Critical
    } else if c.category == Category::NeedsReview
        || c.category == Category::DiscrepNeedsClsData
        || c.confidence == Confidence::Heuristic
    {
        TraceSeverity::Important
    } else {
        TraceSeverity::Info
    }
}

pub fn build_well_decision(idx: usize, record: &ClassifiedRecord) -> TraceDecision {
    let raw_status = record.record.lims_status_raw.as_deref().unwrap_or("");
    let raw_resolution = record.record.resolution_codes_raw.as_deref().unwrap_or("");
    let severity = decision_severity(record);

    TraceDecision {
        decision_id: format!("dec_{}_{}", idx, record.record.well_id),
        well_id: record.record.well_id.clone(),
        mix_name: record.record.mix_name.clone(),
        well_type: record.record.well_type,
        rule_id: record.classification.rule_id.to_string(),
        category: record.category(),
        reason: record.classification.rationale.clone(),
        severity,
        visibility: match severity {
            TraceSeverity::Info => TraceVisibility::OnDemand,
            _ => TraceVisibility::Always,
        },
        steps: vec![
            TraceStep {
                step_type: TraceStepType::NormalizeStatus,
                message: format!(
                    "Normalized status '{}' -> {}",
                    raw_status, record.normalized_status
                ),
            },
            TraceStep {
                step_type: TraceStepType::ParseResolution,
                message: format!(
                    "Parsed resolution '{}' as {:?}: {}",
                    raw_resolution, record.resolution_form, record.resolution_tokens
                ),
            },
            TraceStep {
                step_type: TraceStepType::RuleMatch,
                message: format!(
                    "Rule '{}' (tier {}) -> {}",
                    record.classification.rule_id,
                    record.classification.tier,
                    record.category()
                ),
            },
        ],
    }
}

/// Warnings keyed by cause, so a status seen on a thousand wells is one entry.
#[derive(Default)]
struct WarningLog {
    entries: BTreeMap<String, TraceWarning>,
}

impl WarningLog {
    fn raise(&mut self, key: String, well_id: Option<&str>, message: String, severity: TraceSeverity) {
        self.entries
            .entry(key)
            .and_modify(|w| w.occurrences += 1)
            .or_insert_with(|| {
                warn!(well_id = well_id.unwrap_or("-"), "{message}");
                TraceWarning {
                    well_id: well_id.map(String::from),
                    message,
                    occurrences: 1,
                    severity,
                    visibility: TraceVisibility::Always,
                }
            });
    }

    fn into_warnings(self) -> Vec<TraceWarning> {
        self.entries.into_values().collect()
    }
}

/// Build the audit trace for a classified batch.
pub fn build_trace(records: &[ClassifiedRecord], overlaps: &[OverlapFinding]) -> TraceBundle {
    let mut decisions = Vec::with_capacity(records.len());
    let mut log = WarningLog::default();
    let mut seen_ids = HashSet::new();

    for (idx, record) in records.iter().enumerate() {
        decisions.push(build_well_decision(idx, record));
        let well_id = record.record.well_id.as_str();

        if record.normalized_status == NormalizedStatus::Other {
            let raw = record.status_label();
            log.raise(
                format!("status:{raw}"),
                Some(well_id),
                format!("Unmapped LIMS status '{raw}'; add it to the lab vocabulary"),
                TraceSeverity::Important,
            );
        }

        if record.resolution_form == ResolutionForm::Malformed {
            let raw = record.record.resolution_codes_raw.as_deref().unwrap_or("");
            log.raise(
                format!("resolution:{raw}"),
                Some(well_id),
                format!("Malformed resolution field '{raw}' kept as a literal token"),
                TraceSeverity::Important,
            );
        }

        if record.classification.is_fallback() {
            log.raise(
                format!(
                    "fallback:{}|{}|{}|{}",
                    record.record.well_type,
                    record.record.error_code().unwrap_or(""),
                    record.resolution_tokens,
                    record.status_label()
                ),
                Some(well_id),
                format!("No rule matched: {}", record.classification.rationale),
                TraceSeverity::Critical,
            );
        }

        if !seen_ids.insert(well_id) {
            log.raise(
                format!("duplicate:{well_id}"),
                Some(well_id),
                format!("Well id '{well_id}' appears more than once in the batch"),
                TraceSeverity::Important,
            );
        }
    }

    for finding in overlaps {
        log.raise(
            format!("overlap:{}|{}", finding.left, finding.right),
            None,
            format!(
                "{} wells in both '{}' and '{}'",
                finding.shared.len(),
                finding.left,
                finding.right
            ),
            TraceSeverity::Critical,
        );
    }

    TraceBundle {
        trace_schema_version: TRACE_SCHEMA_VERSION.to_string(),
        decisions,
        warnings: log.into_warnings(),
    }
}
