use crate::error::WellcatError;
use crate::ingest::{check_headers, normalize_key, WellRow, WellSource};
use serde_json::{Map, Value};

/// Reads a delimited export with a header row. Column names are matched
/// case-insensitively, so `WELL_ID` and `well_id` both work.
#[derive(Debug, Clone, Copy)]
pub struct CsvSource {
    delimiter: u8,
}

impl Default for CsvSource {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvSource {
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl WellSource for CsvSource {
    fn read_rows(&self, bytes: &[u8]) -> Result<Vec<WellRow>, WellcatError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(normalize_key).collect();
        check_headers(&headers)?;

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            if record.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            let fields: Map<String, Value> = headers
                .iter()
                .zip(record.iter())
                .filter(|(_, v)| !v.trim().is_empty())
                .map(|(h, v)| (h.clone(), Value::String(v.to_string())))
                .collect();
            // Header is line 1
            rows.push(WellRow::from_fields(idx + 2, fields)?);
        }
        Ok(rows)
    }

    fn format_name(&self) -> &str {
        if self.delimiter == b'\t' {
            "tsv"
        } else {
            "csv"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uppercase_headers() {
        let csv = "\u{feff}WELL_ID,ROLE_ALIAS,ERROR_CODE,RESOLUTION_CODES,LIMS_STATUS,MIX_NAME\n\
                   w1,Patient,ADJ_CT,\"[\"\"RPT\"\"]\",DETECTED,HSV\n\
                   w2,HSV PC,,,,HSV\n";
        let rows = CsvSource::default().read_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].well_id, "w1");
        assert_eq!(rows[0].resolution_codes.as_deref(), Some(r#"["RPT"]"#));
        assert_eq!(rows[1].error_code, None);
        assert_eq!(rows[1].role_alias.as_deref(), Some("HSV PC"));
    }

    #[test]
    fn test_cls_columns() {
        let csv = "well_id,machine_cls,final_cls\nw1,1,0\nw2,,\n";
        let rows = CsvSource::default().read_rows(csv.as_bytes()).unwrap();
        assert_eq!((rows[0].machine_cls, rows[0].final_cls), (Some(1), Some(0)));
        assert_eq!((rows[1].machine_cls, rows[1].final_cls), (None, None));
    }

    #[test]
    fn test_missing_well_id_column() {
        let err = CsvSource::default()
            .read_rows(b"id,mix_name\n1,HSV\n")
            .unwrap_err();
        assert!(matches!(err, WellcatError::MissingColumn(_)));
    }

    #[test]
    fn test_blank_lines_skipped_and_row_numbers() {
        let csv = "well_id,final_cls\nw1,1\n,\nw3,7\n";
        let err = CsvSource::default().read_rows(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, WellcatError::MalformedRow { row: 4, .. }));
    }

    #[test]
    fn test_duplicate_normalized_header_rejected() {
        let csv = "WELL_ID,well_id,lims_status\nw1,w2,DETECTED\n";
        let err = CsvSource::default().read_rows(csv.as_bytes()).unwrap_err();
        match err {
            WellcatError::Ingest(msg) => assert!(msg.contains("'well_id'")),
            other => panic!("expected ingest error, got {other:?}"),
        }
    }

    #[test]
    fn test_tab_delimited() {
        let tsv = "well_id\tlims_status\nw1\tNOT DETECTED\n";
        let source = CsvSource::with_delimiter(b'\t');
        let rows = source.read_rows(tsv.as_bytes()).unwrap();
        assert_eq!(rows[0].lims_status.as_deref(), Some("NOT DETECTED"));
        assert_eq!(source.format_name(), "tsv");
    }
}
