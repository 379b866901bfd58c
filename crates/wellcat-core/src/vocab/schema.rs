use crate::parsing::CanonicalStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-laboratory vocabulary: how controls are recognised and which LIMS
/// statuses are synonyms for a reported result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabVocabulary {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub version: String,
    /// SQL-LIKE patterns (`%` any run, `_` one char) matched case-insensitively
    /// against the well's role alias. Any match makes the well a control.
    pub control_role_patterns: Vec<String>,
    /// Raw LIMS status -> canonical status.
    #[serde(default)]
    pub lims_synonyms: BTreeMap<String, CanonicalStatus>,
    #[serde(default)]
    pub codes: CodeVocabulary,
}

/// Error and resolution codes the rule table keys on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeVocabulary {
    /// Administrative error codes; wells carrying them are not audited.
    pub ignore_error_codes: Vec<String>,
    /// Error codes marking a sample whose result was driven by a failed control.
    pub control_affected_error_codes: Vec<String>,
    /// Substrings identifying a classification or CT discrepancy error code.
    pub discrepancy_error_markers: Vec<String>,
    /// Acknowledgement token that on its own is not a real resolution.
    pub administrative_marker: String,
    /// Resolution fragments indicating a classification-level action.
    pub classification_indicators: Vec<String>,
    /// Resolution fragment meaning the operator chose to skip the error.
    pub skip_token: String,
}

impl Default for CodeVocabulary {
    fn default() -> Self {
        Self {
            ignore_error_codes: vec![
                "MIX_MISSING".into(),
                "UNKNOWN_MIX".into(),
                "UNKNOWN_ROLE".into(),
            ],
            control_affected_error_codes: vec![
                "INHERITED_EXTRACTION_FAILURE".into(),
                "INHERITED_CONTROL_FAILURE".into(),
            ],
            discrepancy_error_markers: vec!["CLSDISC".into(), "CTDISC".into()],
            administrative_marker: "BLA".into(),
            classification_indicators: vec!["WDCLS".into(), "WDCT".into()],
            skip_token: "SKIP".into(),
        }
    }
}

impl CodeVocabulary {
    pub fn is_ignored(&self, error_code: &str) -> bool {
        self.ignore_error_codes
            .iter()
            .any(|c| c.eq_ignore_ascii_case(error_code))
    }

    pub fn is_control_affected(&self, error_code: &str) -> bool {
        self.control_affected_error_codes
            .iter()
            .any(|c| c.eq_ignore_ascii_case(error_code))
    }

    pub fn is_discrepancy(&self, error_code: &str) -> bool {
        let upper = error_code.to_uppercase();
        self.discrepancy_error_markers
            .iter()
            .any(|m| upper.contains(&m.to_uppercase()))
    }
}
