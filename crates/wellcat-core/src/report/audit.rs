use crate::aggregate::CategoryTally;
use crate::classify::{
    Category, CategoryFamily, ClassifiedRecord, ClassifyOptions, Confidence, ReportSection,
};
use crate::error::WellcatError;
use crate::model::WellType;
use crate::overlap::{find_overlaps, NamedWellSet, OverlapFinding};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub const REPORT_SCHEMA_VERSION: &str = "1.0";

/// (section, clinical category) pairs that must never share a well.
pub const EXCLUSIVE_BUCKETS: &[(ReportSection, &str)] = &[
    (ReportSection::Sample, "unresolved"),
    (ReportSection::Sample, "test_repeated"),
    (ReportSection::Sample, "error_ignored"),
    (ReportSection::Control, "unresolved"),
    (ReportSection::Control, "test_repeated"),
    (ReportSection::Control, "error_ignored"),
    (ReportSection::Discrepancy, "acted_upon"),
    (ReportSection::Discrepancy, "samples_repeated"),
    (ReportSection::Discrepancy, "ignored"),
];

/// A listed well, with the raw fields rendering layers display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub well_id: String,
    pub well_type: WellType,
    pub mix_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub resolution_codes: Option<String>,
    #[serde(default)]
    pub lims_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_cls: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dxai_cls: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_cls: Option<u8>,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinical_category: Option<String>,
    pub rule_id: String,
    pub rationale: String,
    pub confidence: Confidence,
}

impl From<&ClassifiedRecord> for ReportEntry {
    fn from(rec: &ClassifiedRecord) -> Self {
        let r = &rec.record;
        Self {
            well_id: r.well_id.clone(),
            well_type: r.well_type,
            mix_name: r.mix_name.clone(),
            sample_name: r.sample_name.clone(),
            run_name: r.run_name.clone(),
            error_code: r.error_code.clone(),
            error_message: r.error_message.clone(),
            resolution_codes: r.resolution_codes_raw.clone(),
            lims_status: r.lims_status_raw.clone(),
            machine_cls: r.machine_cls,
            dxai_cls: r.dxai_cls,
            final_cls: r.final_cls,
            category: rec.category(),
            clinical_category: rec.category().clinical_category().map(String::from),
            rule_id: rec.classification.rule_id.to_string(),
            rationale: rec.classification.rationale.clone(),
            confidence: rec.classification.confidence,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub total: u64,
    /// Count per clinical category.
    #[serde(flatten)]
    pub counts: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionReport {
    pub summary: SectionSummary,
    pub errors: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total: u64,
    pub families: BTreeMap<CategoryFamily, u64>,
    pub categories: BTreeMap<Category, u64>,
    pub needs_review: u64,
    pub fallbacks: u64,
    pub overlaps: usize,
}

/// Structured export of one audit run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub report_schema_version: String,
    pub lab: String,
    pub options: ClassifyOptions,
    pub summary: AuditSummary,
    pub mixes: BTreeMap<String, BTreeMap<Category, u64>>,
    pub well_types: BTreeMap<WellType, BTreeMap<Category, u64>>,
    pub reports: BTreeMap<ReportSection, SectionReport>,
    /// Wells routed to manual review.
    #[serde(default)]
    pub review: Vec<ReportEntry>,
    #[serde(default)]
    pub overlaps: Vec<OverlapFinding>,
}

impl AuditReport {
    pub fn build(
        lab: &str,
        options: ClassifyOptions,
        records: &[ClassifiedRecord],
        tally: &CategoryTally,
        overlaps: &[OverlapFinding],
    ) -> Self {
        let mut reports: BTreeMap<ReportSection, SectionReport> = ReportSection::ALL
            .iter()
            .map(|s| (*s, SectionReport::default()))
            .collect();
        let mut review = Vec::new();

        for rec in records {
            let category = rec.category();
            if category == Category::NeedsReview {
                review.push(ReportEntry::from(rec));
                continue;
            }
            let (Some(section), Some(clinical)) = (
                category.report_section(rec.record.well_type),
                category.clinical_category(),
            ) else {
                continue;
            };
            let report = reports.entry(section).or_default();
            report.summary.total += 1;
            *report
                .summary
                .counts
                .entry(clinical.to_string())
                .or_insert(0) += 1;
            report.errors.push(ReportEntry::from(rec));
        }

        AuditReport {
            report_schema_version: REPORT_SCHEMA_VERSION.to_string(),
            lab: lab.to_string(),
            options,
            summary: AuditSummary {
                total: tally.total,
                families: tally.family_totals(),
                categories: tally.category_totals(),
                needs_review: tally.needs_review(),
                fallbacks: tally.fallbacks,
                overlaps: overlaps.len(),
            },
            mixes: tally.by_mix.clone(),
            well_types: tally.by_well_type.clone(),
            reports,
            review,
            overlaps: overlaps.to_vec(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), WellcatError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

fn label(section: ReportSection, clinical: &str) -> String {
    format!("{}.{}", section.as_str(), clinical)
}

/// The nine exclusive bucket sets of a report.
pub fn report_well_sets(report: &AuditReport) -> Vec<NamedWellSet> {
    EXCLUSIVE_BUCKETS
        .iter()
        .map(|(section, clinical)| {
            let wells = report
                .reports
                .get(section)
                .map(|r| {
                    r.errors
                        .iter()
                        .filter(|e| e.clinical_category.as_deref() == Some(*clinical))
                        .map(|e| e.well_id.clone())
                        .collect::<BTreeSet<_>>()
                })
                .unwrap_or_default();
            NamedWellSet {
                label: label(*section, clinical),
                wells,
            }
        })
        .collect()
}

/// Overlap check over a report produced by this tool.
pub fn overlap_from_report(report: &AuditReport) -> Vec<OverlapFinding> {
    find_overlaps(&report_well_sets(report))
}

/// Overlap check over any report document with the
/// `reports.<section>.errors[].{well_id, clinical_category}` shape.
/// Sections or entries that are missing simply contribute empty sets.
pub fn overlap_from_value(doc: &Value) -> Vec<OverlapFinding> {
    let sets: Vec<NamedWellSet> = EXCLUSIVE_BUCKETS
        .iter()
        .map(|(section, clinical)| {
            let errors = doc
                .get("reports")
                .and_then(|r| r.get(section.as_str()))
                .and_then(|s| s.get("errors"))
                .and_then(Value::as_array);
            let wells = errors
                .into_iter()
                .flatten()
                .filter(|e| e.get("clinical_category").and_then(Value::as_str) == Some(*clinical))
                .filter_map(|e| match e.get("well_id")? {
                    Value::String(s) => Some(s.clone()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .collect::<BTreeSet<_>>();
            NamedWellSet {
                label: label(*section, clinical),
                wells,
            }
        })
        .collect();
    find_overlaps(&sets)
}

/// Load a saved report from disk and check it.
pub fn overlap_from_path(path: &Path) -> Result<Vec<OverlapFinding>, WellcatError> {
    let content = std::fs::read_to_string(path)?;
    let doc: Value = serde_json::from_str(&content)?;
    Ok(overlap_from_value(&doc))
}
