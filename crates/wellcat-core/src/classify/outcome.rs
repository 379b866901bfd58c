use crate::model::{WellRecord, WellType};
use crate::parsing::{NormalizedStatus, ResolutionForm, ResolutionTokens};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Audit category assigned to exactly one well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    DiscrepInError,
    DiscrepIgnored,
    DiscrepResultChanged,
    DiscrepNeedsClsData,
    SopUnresolved,
    SopIgnored,
    SopRepeated,
    ValidDetected,
    ValidNotDetected,
    ValidControl,
    ValidOther,
    IgnoreWell,
    ControlAffectedSample,
    NeedsReview,
}

/// Families partition the categories; a well belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFamily {
    Discrepancy,
    Sop,
    Valid,
    Administrative,
}

impl CategoryFamily {
    pub const ALL: [CategoryFamily; 4] = [
        CategoryFamily::Discrepancy,
        CategoryFamily::Sop,
        CategoryFamily::Valid,
        CategoryFamily::Administrative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryFamily::Discrepancy => "discrepancy",
            CategoryFamily::Sop => "sop",
            CategoryFamily::Valid => "valid",
            CategoryFamily::Administrative => "administrative",
        }
    }
}

impl fmt::Display for CategoryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Structured report section a categorised well is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    Sample,
    Control,
    Discrepancy,
}

impl ReportSection {
    pub const ALL: [ReportSection; 3] = [
        ReportSection::Sample,
        ReportSection::Control,
        ReportSection::Discrepancy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportSection::Sample => "sample",
            ReportSection::Control => "control",
            ReportSection::Discrepancy => "discrepancy",
        }
    }
}

impl Category {
    pub const ALL: [Category; 14] = [
        Category::DiscrepInError,
        Category::DiscrepIgnored,
        Category::DiscrepResultChanged,
        Category::DiscrepNeedsClsData,
        Category::SopUnresolved,
        Category::SopIgnored,
        Category::SopRepeated,
        Category::ValidDetected,
        Category::ValidNotDetected,
        Category::ValidControl,
        Category::ValidOther,
        Category::IgnoreWell,
        Category::ControlAffectedSample,
        Category::NeedsReview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::DiscrepInError => "DISCREP_IN_ERROR",
            Category::DiscrepIgnored => "DISCREP_IGNORED",
            Category::DiscrepResultChanged => "DISCREP_RESULT_CHANGED",
            Category::DiscrepNeedsClsData => "DISCREP_NEEDS_CLS_DATA",
            Category::SopUnresolved => "SOP_UNRESOLVED",
            Category::SopIgnored => "SOP_IGNORED",
            Category::SopRepeated => "SOP_REPEATED",
            Category::ValidDetected => "VALID_DETECTED",
            Category::ValidNotDetected => "VALID_NOT_DETECTED",
            Category::ValidControl => "VALID_CONTROL",
            Category::ValidOther => "VALID_OTHER",
            Category::IgnoreWell => "IGNORE_WELL",
            Category::ControlAffectedSample => "CONTROL_AFFECTED_SAMPLE",
            Category::NeedsReview => "NEEDS_REVIEW",
        }
    }

    pub fn family(&self) -> CategoryFamily {
        match self {
            Category::DiscrepInError
            | Category::DiscrepIgnored
            | Category::DiscrepResultChanged
            | Category::DiscrepNeedsClsData => CategoryFamily::Discrepancy,
            Category::SopUnresolved | Category::SopIgnored | Category::SopRepeated => {
                CategoryFamily::Sop
            }
            Category::ValidDetected
            | Category::ValidNotDetected
            | Category::ValidControl
            | Category::ValidOther => CategoryFamily::Valid,
            Category::IgnoreWell | Category::ControlAffectedSample | Category::NeedsReview => {
                CategoryFamily::Administrative
            }
        }
    }

    /// Name rendering layers read from the structured report.
    /// Only SOP and discrepancy categories are listed there.
    pub fn clinical_category(&self) -> Option<&'static str> {
        match self {
            Category::SopUnresolved => Some("unresolved"),
            Category::SopRepeated => Some("test_repeated"),
            Category::SopIgnored => Some("error_ignored"),
            Category::DiscrepResultChanged => Some("acted_upon"),
            Category::DiscrepInError => Some("samples_repeated"),
            Category::DiscrepIgnored => Some("ignored"),
            Category::DiscrepNeedsClsData => Some("needs_cls_data"),
            _ => None,
        }
    }

    /// Section of the structured report this category is listed in.
    /// SOP categories split by well type; discrepancies have their own section.
    pub fn report_section(&self, well_type: WellType) -> Option<ReportSection> {
        match self.family() {
            CategoryFamily::Discrepancy => Some(ReportSection::Discrepancy),
            CategoryFamily::Sop => Some(match well_type {
                WellType::Sample => ReportSection::Sample,
                WellType::Control => ReportSection::Control,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// How firmly the observable fields support the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Definitive,
    /// Inferred from the LIMS status because machine/final calls were missing.
    Heuristic,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Definitive => write!(f, "definitive"),
            Confidence::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// Outcome of running one well through the rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Stable identifier of the rule that fired.
    pub rule_id: &'static str,
    /// Precedence tier of that rule (1 = evaluated first).
    pub tier: u8,
    pub category: Category,
    /// Human-readable audit note. Documentation only, never branched on.
    pub rationale: String,
    pub confidence: Confidence,
}

impl Classification {
    /// True when no rule matched and the catch-all fired.
    pub fn is_fallback(&self) -> bool {
        self.rule_id == crate::classify::rules::FALLBACK_RULE_ID
    }
}

/// A well together with its derived fields and classification.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub record: WellRecord,
    pub normalized_status: NormalizedStatus,
    pub resolution_tokens: ResolutionTokens,
    pub resolution_form: ResolutionForm,
    #[serde(flatten)]
    pub classification: Classification,
}

impl ClassifiedRecord {
    pub fn category(&self) -> Category {
        self.classification.category
    }

    /// Status label for exports: the canonical name for mapped statuses,
    /// the trimmed raw value for unmapped ones.
    pub fn status_label(&self) -> String {
        match self.normalized_status {
            NormalizedStatus::Other => self
                .record
                .lims_status_raw
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .to_string(),
            other => other.label().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_has_one_family() {
        for family in CategoryFamily::ALL {
            let members = Category::ALL.iter().filter(|c| c.family() == family).count();
            assert!(members >= 3, "{family} has {members} members");
        }
        assert_eq!(Category::ALL.len(), 14);
    }

    #[test]
    fn test_serde_names_match_as_str() {
        for c in Category::ALL {
            let json = serde_json::to_string(&c).unwrap();
            assert_eq!(json, format!("\"{}\"", c.as_str()));
        }
    }

    #[test]
    fn test_clinical_categories() {
        assert_eq!(Category::DiscrepResultChanged.clinical_category(), Some("acted_upon"));
        assert_eq!(Category::SopRepeated.clinical_category(), Some("test_repeated"));
        assert_eq!(Category::ValidDetected.clinical_category(), None);
        assert_eq!(Category::NeedsReview.clinical_category(), None);
    }

    #[test]
    fn test_report_section_splits_sop_by_well_type() {
        assert_eq!(
            Category::SopIgnored.report_section(WellType::Control),
            Some(ReportSection::Control)
        );
        assert_eq!(
            Category::SopIgnored.report_section(WellType::Sample),
            Some(ReportSection::Sample)
        );
        assert_eq!(
            Category::DiscrepIgnored.report_section(WellType::Control),
            Some(ReportSection::Discrepancy)
        );
        assert_eq!(Category::ValidControl.report_section(WellType::Control), None);
    }
}
