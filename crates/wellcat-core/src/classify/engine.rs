use crate::classify::outcome::{Classification, ClassifiedRecord};
use crate::classify::rules::{first_match, CallComparison, WellFacts};
use crate::model::{WellRecord, WellType};
use crate::parsing::{
    normalize_status, parse_resolution_detailed, NormalizedStatus, ResolutionTokens, StatusSynonyms,
};
use crate::vocab::schema::{CodeVocabulary, LabVocabulary};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Switches for the two places where the rule table can be told to be less strict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifyOptions {
    /// Infer DISCREP_IGNORED from a canonical status when a discrepancy well
    /// lacks machine/final calls. Such results carry heuristic confidence.
    #[serde(default)]
    pub discrepancy_heuristic: bool,
    /// Accept clean wells with an unmapped status as VALID_OTHER instead of
    /// sending them to review.
    #[serde(default)]
    pub accept_unmapped_status: bool,
}

/// Observable attributes of one well, already normalized.
#[derive(Debug, Clone)]
pub struct ClassifyInput<'a> {
    pub well_type: WellType,
    pub error_code: Option<&'a str>,
    pub tokens: &'a ResolutionTokens,
    pub status: NormalizedStatus,
    pub machine_cls: Option<u8>,
    pub final_cls: Option<u8>,
}

/// Classify one well. Pure and total: every input yields exactly one category.
pub fn classify(
    input: &ClassifyInput<'_>,
    codes: &CodeVocabulary,
    options: &ClassifyOptions,
) -> Classification {
    let facts = WellFacts::derive(
        input.well_type,
        input.error_code,
        input.tokens,
        input.status,
        CallComparison::of(input.machine_cls, input.final_cls),
        codes,
    );
    let rule = first_match(&facts, options);
    Classification {
        rule_id: rule.id,
        tier: rule.tier,
        category: rule.category,
        rationale: rule.render(&facts),
        confidence: rule.confidence,
    }
}

/// Classifier bound to one lab vocabulary.
#[derive(Debug, Clone)]
pub struct Classifier {
    synonyms: StatusSynonyms,
    codes: CodeVocabulary,
    options: ClassifyOptions,
}

impl Classifier {
    pub fn new(vocabulary: &LabVocabulary, options: ClassifyOptions) -> Self {
        Self {
            synonyms: vocabulary.status_synonyms(),
            codes: vocabulary.codes.clone(),
            options,
        }
    }

    pub fn options(&self) -> &ClassifyOptions {
        &self.options
    }

    pub fn classify_record(&self, record: WellRecord) -> ClassifiedRecord {
        let status = normalize_status(record.lims_status_raw.as_deref(), &self.synonyms);
        let parsed = parse_resolution_detailed(record.resolution_codes_raw.as_deref());

        let classification = classify(
            &ClassifyInput {
                well_type: record.well_type,
                error_code: record.error_code(),
                tokens: &parsed.tokens,
                status,
                machine_cls: record.machine_cls,
                final_cls: record.final_cls,
            },
            &self.codes,
            &self.options,
        );

        debug!(
            well_id = %record.well_id,
            rule = classification.rule_id,
            category = %classification.category,
            "classified well"
        );

        ClassifiedRecord {
            record,
            normalized_status: status,
            resolution_tokens: parsed.tokens,
            resolution_form: parsed.form,
            classification,
        }
    }

    /// Classify records in input order.
    pub fn classify_batch<I>(&self, records: I) -> Vec<ClassifiedRecord>
    where
        I: IntoIterator<Item = WellRecord>,
    {
        records
            .into_iter()
            .map(|r| self.classify_record(r))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::outcome::{Category, Confidence};
    use crate::vocab::builtin::load_preset;

    fn classifier() -> Classifier {
        Classifier::new(&load_preset("qst").unwrap(), ClassifyOptions::default())
    }

    fn well(
        well_type: WellType,
        error: Option<&str>,
        resolution: Option<&str>,
        status: Option<&str>,
    ) -> WellRecord {
        let mut r = WellRecord::new("w1", well_type, "HSV");
        r.error_code = error.map(String::from);
        r.resolution_codes_raw = resolution.map(String::from);
        r.lims_status_raw = status.map(String::from);
        r
    }

    #[test]
    fn test_synonym_status_is_valid() {
        let out = classifier().classify_record(well(
            WellType::Sample,
            None,
            Some("[]"),
            Some("HSV1_DETECTED"),
        ));
        assert_eq!(out.category(), Category::ValidDetected);
        assert_eq!(out.normalized_status, NormalizedStatus::Detected);
    }

    #[test]
    fn test_unmapped_status_goes_to_review() {
        let out = classifier().classify_record(well(
            WellType::Sample,
            None,
            None,
            Some("DETECTED_QUANT"),
        ));
        assert_eq!(out.category(), Category::NeedsReview);
        assert!(out.classification.is_fallback());
        assert_eq!(out.status_label(), "DETECTED_QUANT");
    }

    #[test]
    fn test_deterministic() {
        let c = classifier();
        let rec = well(WellType::Control, Some("ADJ_CT"), Some("RPT"), Some("RPT"));
        let a = c.classify_record(rec.clone());
        let b = c.classify_record(rec);
        assert_eq!(a.classification, b.classification);
    }

    #[test]
    fn test_heuristic_confidence() {
        let c = Classifier::new(
            &load_preset("qst").unwrap(),
            ClassifyOptions {
                discrepancy_heuristic: true,
                accept_unmapped_status: false,
            },
        );
        let out = c.classify_record(well(
            WellType::Sample,
            Some("CLSDISC_WELL"),
            Some(r#"["RPT"]"#),
            Some("NOT DETECTED"),
        ));
        assert_eq!(out.category(), Category::DiscrepIgnored);
        assert_eq!(out.classification.confidence, Confidence::Heuristic);
    }

    #[test]
    fn test_batch_keeps_order() {
        let recs = vec![
            well(WellType::Sample, Some("MIX_MISSING"), None, None),
            well(WellType::Sample, None, None, Some("DETECTED")),
        ];
        let out = classifier().classify_batch(recs);
        let cats: Vec<_> = out.iter().map(|r| r.category()).collect();
        assert_eq!(cats, vec![Category::IgnoreWell, Category::ValidDetected]);
    }

    #[test]
    fn test_rationale_names_error_code() {
        let out = classifier().classify_record(well(WellType::Sample, Some("ADJ_CT"), Some("[]"), None));
        assert_eq!(out.category(), Category::SopUnresolved);
        assert!(out.classification.rationale.contains("ADJ_CT"));
    }
}
