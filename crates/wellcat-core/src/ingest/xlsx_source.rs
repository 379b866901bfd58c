use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use serde_json::{Map, Number, Value};

use crate::error::WellcatError;
use crate::ingest::{check_headers, normalize_key, WellRow, WellSource};

/// Sheet read when present; otherwise the first worksheet is used.
pub const DEFAULT_SHEET: &str = "Wells";

/// Reads a workbook whose first row holds the column names.
#[derive(Debug, Clone)]
pub struct XlsxSource {
    sheet: String,
}

impl Default for XlsxSource {
    fn default() -> Self {
        Self {
            sheet: DEFAULT_SHEET.to_string(),
        }
    }
}

impl XlsxSource {
    pub fn with_sheet(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
        }
    }
}

impl WellSource for XlsxSource {
    fn read_rows(&self, bytes: &[u8]) -> Result<Vec<WellRow>, WellcatError> {
        let cursor = Cursor::new(bytes);
        let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(cursor)
            .map_err(|e| WellcatError::Xlsx(format!("failed to open xlsx: {e}")))?;

        let names = workbook.sheet_names();
        let sheet_name = names
            .iter()
            .find(|n| n.eq_ignore_ascii_case(&self.sheet))
            .or_else(|| names.first())
            .cloned()
            .ok_or_else(|| WellcatError::Xlsx("workbook has no worksheets".into()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| WellcatError::Xlsx(format!("sheet '{sheet_name}' unreadable: {e}")))?;

        let mut rows_iter = range.rows();
        let headers: Vec<String> = match rows_iter.next() {
            Some(cells) => cells
                .iter()
                .map(|c| cell_as_string(c).map(|s| normalize_key(&s)).unwrap_or_default())
                .collect(),
            None => return Err(WellcatError::Xlsx(format!("sheet '{sheet_name}' is empty"))),
        };
        check_headers(&headers)?;

        let mut rows = Vec::new();
        for (idx, cells) in rows_iter.enumerate() {
            let fields: Map<String, Value> = headers
                .iter()
                .zip(cells.iter())
                .filter(|(h, _)| !h.is_empty())
                .filter_map(|(h, c)| cell_as_value(c).map(|v| (h.clone(), v)))
                .collect();
            if fields.is_empty() {
                continue;
            }
            // Header is sheet row 1
            rows.push(WellRow::from_fields(idx + 2, fields)?);
        }
        Ok(rows)
    }

    fn format_name(&self) -> &str {
        "xlsx"
    }
}

fn cell_as_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::DateTime(dt) => Some(dt.to_string()),
        Data::Empty => None,
        _ => Some(format!("{cell}")),
    }
}

fn cell_as_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::Bool(b) => Some(Value::Bool(*b)),
        Data::Int(i) => Some(Value::Number((*i).into())),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => {
            Some(Value::Number((*f as i64).into()))
        }
        Data::Float(f) => Number::from_f64(*f).map(Value::Number),
        Data::Error(_) => None,
        other => cell_as_string(other).map(Value::String),
    }
}
