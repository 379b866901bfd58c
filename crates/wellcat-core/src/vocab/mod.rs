pub mod builtin;
pub mod pattern;
pub mod schema;

use crate::error::WellcatError;
use crate::model::WellType;
use crate::parsing::StatusSynonyms;
use pattern::like_match;
use schema::LabVocabulary;
use std::path::Path;

impl LabVocabulary {
    /// True when the role alias matches any of the lab's control patterns.
    pub fn is_control_alias(&self, role_alias: &str) -> bool {
        self.control_role_patterns
            .iter()
            .any(|p| like_match(p.trim(), role_alias.trim()))
    }

    /// Decide the well type. An explicit type from the export wins; otherwise
    /// the role alias is matched; wells without an alias are samples.
    pub fn well_type_for(&self, role_alias: Option<&str>, explicit: Option<WellType>) -> WellType {
        if let Some(t) = explicit {
            return t;
        }
        match role_alias {
            Some(alias) if self.is_control_alias(alias) => WellType::Control,
            _ => WellType::Sample,
        }
    }

    pub fn status_synonyms(&self) -> StatusSynonyms {
        StatusSynonyms::from_map(&self.lims_synonyms)
    }
}

/// Load a lab vocabulary from a JSON file.
pub fn load_vocabulary(path: &Path) -> Result<LabVocabulary, WellcatError> {
    let content = std::fs::read_to_string(path).map_err(|e| WellcatError::VocabularyLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_vocabulary(&content, path)
}

/// Parse a lab vocabulary from a JSON string.
pub fn parse_vocabulary(json: &str, source: &Path) -> Result<LabVocabulary, WellcatError> {
    let vocab: LabVocabulary =
        serde_json::from_str(json).map_err(|e| WellcatError::VocabularyLoad {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
    validate_vocabulary(&vocab)?;
    Ok(vocab)
}

/// Parse a lab vocabulary from a JSON string (no file path context).
pub fn parse_vocabulary_str(json: &str) -> Result<LabVocabulary, WellcatError> {
    let vocab: LabVocabulary = serde_json::from_str(json).map_err(WellcatError::Json)?;
    validate_vocabulary(&vocab)?;
    Ok(vocab)
}

/// Validate that a vocabulary is well-formed.
pub fn validate_vocabulary(vocab: &LabVocabulary) -> Result<(), WellcatError> {
    if vocab.name.trim().is_empty() {
        return Err(WellcatError::VocabularyInvalid(
            "name must not be empty".into(),
        ));
    }

    if vocab.control_role_patterns.is_empty() {
        return Err(WellcatError::VocabularyInvalid(format!(
            "'{}' defines no control_role_patterns; every well would be a sample",
            vocab.name
        )));
    }

    if vocab.control_role_patterns.iter().any(|p| p.trim().is_empty()) {
        return Err(WellcatError::VocabularyInvalid(format!(
            "'{}' has a blank control role pattern",
            vocab.name
        )));
    }

    if let Some(key) = vocab.lims_synonyms.keys().find(|k| k.trim().is_empty()) {
        return Err(WellcatError::VocabularyInvalid(format!(
            "'{}' has a blank LIMS synonym key ({:?})",
            vocab.name, key
        )));
    }

    let code_lists = [
        ("ignore_error_codes", &vocab.codes.ignore_error_codes),
        ("control_affected_error_codes", &vocab.codes.control_affected_error_codes),
        ("discrepancy_error_markers", &vocab.codes.discrepancy_error_markers),
        ("classification_indicators", &vocab.codes.classification_indicators),
    ];
    for (field, entries) in code_lists {
        // Discrepancy markers and indicators match by substring, so blank matches everything
        if entries.iter().any(|e| e.trim().is_empty()) {
            return Err(WellcatError::VocabularyInvalid(format!(
                "'{}' has a blank entry in codes.{}",
                vocab.name, field
            )));
        }
    }

    if vocab.codes.administrative_marker.trim().is_empty() {
        return Err(WellcatError::VocabularyInvalid(
            "codes.administrative_marker must not be empty".into(),
        ));
    }

    if vocab.codes.skip_token.trim().is_empty() {
        return Err(WellcatError::VocabularyInvalid(
            "codes.skip_token must not be empty".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{normalize_status, NormalizedStatus};

    const MINIMAL: &str = r#"{
        "name": "Test lab",
        "version": "1",
        "control_role_patterns": ["%PC", "NTC"],
        "lims_synonyms": { "Detected_LOQ": "DETECTED" }
    }"#;

    #[test]
    fn test_parse_valid_vocabulary() {
        let v = parse_vocabulary_str(MINIMAL).unwrap();
        assert_eq!(v.name, "Test lab");
        assert_eq!(v.codes.administrative_marker, "BLA");
        assert!(v.codes.is_ignored("mix_missing"));
    }

    #[test]
    fn test_codes_override_is_partial() {
        let json = r#"{
            "name": "Lab",
            "version": "1",
            "control_role_patterns": ["NTC"],
            "codes": { "administrative_marker": "ACK" }
        }"#;
        let v = parse_vocabulary_str(json).unwrap();
        assert_eq!(v.codes.administrative_marker, "ACK");
        assert_eq!(v.codes.skip_token, "SKIP");
        assert!(v.codes.is_discrepancy("CLSDISC_WELL"));
    }

    #[test]
    fn test_empty_patterns_rejected() {
        let json = r#"{ "name": "Bad", "version": "1", "control_role_patterns": [] }"#;
        assert!(parse_vocabulary_str(json).is_err());
    }

    #[test]
    fn test_blank_pattern_rejected() {
        let json = r#"{ "name": "Bad", "version": "1", "control_role_patterns": ["NTC", " "] }"#;
        assert!(parse_vocabulary_str(json).is_err());
    }

    #[test]
    fn test_unknown_canonical_rejected() {
        let json = r#"{
            "name": "Bad",
            "version": "1",
            "control_role_patterns": ["NTC"],
            "lims_synonyms": { "POS": "POSITIVE" }
        }"#;
        assert!(parse_vocabulary_str(json).is_err());
    }

    fn with_codes(codes: &str) -> String {
        format!(
            r#"{{ "name": "Lab", "version": "1", "control_role_patterns": ["NTC"], "codes": {codes} }}"#
        )
    }

    #[test]
    fn test_blank_ignore_code_rejected() {
        let json = with_codes(r#"{ "ignore_error_codes": ["MIX_MISSING", ""] }"#);
        let err = parse_vocabulary_str(&json).unwrap_err();
        assert!(err.to_string().contains("codes.ignore_error_codes"));
    }

    #[test]
    fn test_blank_control_affected_code_rejected() {
        let json = with_codes(r#"{ "control_affected_error_codes": ["  "] }"#);
        let err = parse_vocabulary_str(&json).unwrap_err();
        assert!(err.to_string().contains("codes.control_affected_error_codes"));
    }

    #[test]
    fn test_blank_discrepancy_marker_rejected() {
        let json = with_codes(r#"{ "discrepancy_error_markers": ["CLSDISC", ""] }"#);
        let err = parse_vocabulary_str(&json).unwrap_err();
        assert!(err.to_string().contains("codes.discrepancy_error_markers"));
    }

    #[test]
    fn test_blank_classification_indicator_rejected() {
        let json = with_codes(r#"{ "classification_indicators": [""] }"#);
        let err = parse_vocabulary_str(&json).unwrap_err();
        assert!(err.to_string().contains("codes.classification_indicators"));
    }

    #[test]
    fn test_blank_codes_cannot_reroute_sop_wells() {
        use crate::classify::{Category, Classifier, ClassifyOptions};
        use crate::model::WellRecord;

        let json = with_codes(
            r#"{ "discrepancy_error_markers": [""], "classification_indicators": [""] }"#,
        );
        assert!(parse_vocabulary_str(&json).is_err());

        // The same lab without the blank entries keeps resolved errors in the SOP family
        let v = parse_vocabulary_str(&with_codes("{}")).unwrap();
        let mut well = WellRecord::new("w1", WellType::Sample, "HSV");
        well.error_code = Some("ADJ_CT".into());
        well.resolution_codes_raw = Some(r#"["RPT"]"#.into());
        well.lims_status_raw = Some("DETECTED".into());
        let out = Classifier::new(&v, ClassifyOptions::default()).classify_record(well);
        assert_eq!(out.category(), Category::SopIgnored);
    }

    #[test]
    fn test_well_type_resolution() {
        let v = parse_vocabulary_str(MINIMAL).unwrap();
        assert_eq!(v.well_type_for(Some("HSV PC"), None), WellType::Control);
        assert_eq!(v.well_type_for(Some("ntc"), None), WellType::Control);
        assert_eq!(v.well_type_for(Some("Patient"), None), WellType::Sample);
        assert_eq!(v.well_type_for(None, None), WellType::Sample);
        assert_eq!(
            v.well_type_for(Some("Patient"), Some(WellType::Control)),
            WellType::Control
        );
    }

    #[test]
    fn test_synonyms_feed_normalizer() {
        let v = parse_vocabulary_str(MINIMAL).unwrap();
        let syn = v.status_synonyms();
        assert_eq!(normalize_status(Some("detected_loq"), &syn), NormalizedStatus::Detected);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lab.json");
        std::fs::write(&path, MINIMAL).unwrap();
        assert_eq!(load_vocabulary(&path).unwrap().name, "Test lab");

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            load_vocabulary(&missing),
            Err(WellcatError::VocabularyLoad { .. })
        ));
    }
}
