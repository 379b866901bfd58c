use crate::classify::{Category, ClassifiedRecord};
use crate::error::WellcatError;
use crate::model::WellType;
use crate::parsing::ResolutionTokens;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// One distinct combination of observable fields, with how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternRow {
    #[serde(rename = "WELL_TYPE")]
    pub well_type: WellType,
    #[serde(rename = "ERROR_CODE")]
    pub error_code: String,
    #[serde(rename = "ERROR_MESSAGE")]
    pub error_message: String,
    #[serde(rename = "RESOLUTION_CODES")]
    pub resolution_codes: String,
    #[serde(rename = "WELL_LIMS_STATUS")]
    pub lims_status: String,
    #[serde(rename = "OCCURRENCE_COUNT")]
    pub count: u64,
    #[serde(rename = "CATEGORY")]
    pub category: Category,
    #[serde(rename = "NOTES")]
    pub notes: String,
}

type PatternKey = (WellType, String, ResolutionTokens, String, Category);

/// Collapse classified wells into distinct patterns, most frequent first.
/// The first error message and rationale seen for a pattern are kept.
pub fn pattern_table(records: &[ClassifiedRecord]) -> Vec<PatternRow> {
    let mut patterns: BTreeMap<PatternKey, PatternRow> = BTreeMap::new();

    for rec in records {
        let error_code = rec.record.error_code().unwrap_or("").to_string();
        let status = rec.status_label();
        let key = (
            rec.record.well_type,
            error_code.clone(),
            rec.resolution_tokens.clone(),
            status.clone(),
            rec.category(),
        );
        patterns
            .entry(key)
            .and_modify(|row| row.count += 1)
            .or_insert_with(|| PatternRow {
                well_type: rec.record.well_type,
                error_code,
                error_message: rec.record.error_message.clone().unwrap_or_default(),
                resolution_codes: rec.resolution_tokens.to_json_array(),
                lims_status: status,
                count: 1,
                category: rec.category(),
                notes: rec.classification.rationale.clone(),
            });
    }

    let mut rows: Vec<PatternRow> = patterns.into_values().collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

pub fn write_pattern_csv<W: Write>(rows: &[PatternRow], writer: W) -> Result<(), WellcatError> {
    let mut out = csv::Writer::from_writer(writer);
    for row in rows {
        out.serialize(row)?;
    }
    out.flush()?;
    Ok(())
}

pub fn save_pattern_csv(rows: &[PatternRow], path: &Path) -> Result<(), WellcatError> {
    let file = std::fs::File::create(path)?;
    write_pattern_csv(rows, file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ClassifyOptions, Classifier};
    use crate::model::WellRecord;
    use crate::vocab::builtin::load_preset;

    fn well(id: &str, error: Option<&str>, message: &str, resolution: &str, status: &str) -> WellRecord {
        let mut r = WellRecord::new(id, WellType::Sample, "HSV");
        r.error_code = error.map(String::from);
        r.error_message = Some(message.to_string());
        r.resolution_codes_raw = Some(resolution.to_string());
        r.lims_status_raw = Some(status.to_string());
        r
    }

    fn classified() -> Vec<ClassifiedRecord> {
        let c = Classifier::new(&load_preset("qst").unwrap(), ClassifyOptions::default());
        c.classify_batch(vec![
            well("a", Some("ADJ_CT"), "first", r#"["RPT"]"#, "DETECTED"),
            well("b", None, "", "[]", "DETECTED"),
            well("c", Some("ADJ_CT"), "second", "RPT", "DETECTED"),
            well("d", Some("ADJ_CT"), "third", r#"["RPT"]"#, "HSV1_DETECTED"),
        ])
    }

    #[test]
    fn test_patterns_grouped_and_sorted() {
        let rows = pattern_table(&classified());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].count, 3);
        assert_eq!(rows[0].error_code, "ADJ_CT");
        assert_eq!(rows[0].error_message, "first");
        assert_eq!(rows[0].resolution_codes, r#"["RPT"]"#);
        assert_eq!(rows[0].lims_status, "DETECTED");
        assert_eq!(rows[0].category, Category::SopIgnored);
        assert_eq!(rows[1].category, Category::ValidDetected);
        assert_eq!(rows.iter().map(|r| r.count).sum::<u64>(), 4);
    }

    #[test]
    fn test_csv_header_and_rows() {
        let rows = pattern_table(&classified());
        let mut buf = Vec::new();
        write_pattern_csv(&rows, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("WELL_TYPE,ERROR_CODE,ERROR_MESSAGE,RESOLUTION_CODES,WELL_LIMS_STATUS,OCCURRENCE_COUNT,CATEGORY,NOTES")
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("SAMPLE,ADJ_CT,first,\"[\"\"RPT\"\"]\",DETECTED,3,SOP_IGNORED,"));
    }

    #[test]
    fn test_save_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.csv");
        save_pattern_csv(&pattern_table(&classified()), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }
}
