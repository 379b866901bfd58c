pub mod csv_source;
pub mod json_source;
pub mod xlsx_source;

use crate::error::WellcatError;
use crate::model::{WellRecord, WellType};
use crate::vocab::schema::LabVocabulary;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

pub use csv_source::CsvSource;
pub use json_source::JsonSource;
pub use xlsx_source::XlsxSource;

/// Mix name used when the export leaves it blank.
pub const UNKNOWN_MIX: &str = "Unknown";

/// One well as exported by the data-access layer, before the lab vocabulary
/// has decided its well type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct WellRow {
    #[serde(deserialize_with = "required_text")]
    pub well_id: String,
    #[serde(default, deserialize_with = "text")]
    pub role_alias: Option<String>,
    /// Explicit well type; overrides the role-alias match when recognised.
    #[serde(default, deserialize_with = "text")]
    pub well_type: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub error_code: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub error_message: Option<String>,
    /// A string as stored, or a JSON array re-encoded as its literal.
    #[serde(default, deserialize_with = "text")]
    pub resolution_codes: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub lims_status: Option<String>,
    #[serde(default, deserialize_with = "cls_call")]
    pub machine_cls: Option<u8>,
    #[serde(default, deserialize_with = "cls_call")]
    pub dxai_cls: Option<u8>,
    #[serde(default, deserialize_with = "cls_call")]
    pub final_cls: Option<u8>,
    #[serde(default, deserialize_with = "text")]
    pub mix_name: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub sample_name: Option<String>,
    #[serde(default, deserialize_with = "text")]
    pub run_name: Option<String>,
}

impl WellRow {
    pub fn new(well_id: impl Into<String>) -> Self {
        Self {
            well_id: well_id.into(),
            ..Default::default()
        }
    }

    /// Build a row from loosely typed fields. Keys are matched case-insensitively;
    /// `row` is the 1-based position reported in errors.
    pub fn from_fields(row: usize, fields: Map<String, Value>) -> Result<Self, WellcatError> {
        let lowered: Map<String, Value> = fields
            .into_iter()
            .map(|(k, v)| (normalize_key(&k), v))
            .collect();
        serde_json::from_value(Value::Object(lowered)).map_err(|e| WellcatError::MalformedRow {
            row,
            reason: e.to_string(),
        })
    }
}

/// Lower-case, trimmed, BOM-stripped column name.
pub(crate) fn normalize_key(key: &str) -> String {
    key.trim_matches('\u{feff}').trim().to_lowercase()
}

/// Check a normalized header row: `well_id` must be present and no two
/// columns may normalize to the same name. Blank headers are ignored.
pub(crate) fn check_headers(headers: &[String]) -> Result<(), WellcatError> {
    if !headers.iter().any(|h| h == "well_id") {
        return Err(WellcatError::MissingColumn("well_id".into()));
    }
    let mut seen = HashSet::new();
    for h in headers.iter().filter(|h| !h.is_empty()) {
        if !seen.insert(h.as_str()) {
            return Err(WellcatError::Ingest(format!(
                "duplicate column '{h}' (column names are matched case-insensitively)"
            )));
        }
    }
    Ok(())
}

impl LabVocabulary {
    /// Turn an exported row into a classifier input.
    pub fn resolve(&self, row: WellRow) -> WellRecord {
        let explicit = row.well_type.as_deref().and_then(WellType::from_str_loose);
        let well_type = self.well_type_for(row.role_alias.as_deref(), explicit);
        WellRecord {
            well_id: row.well_id,
            well_type,
            role_alias: row.role_alias,
            error_code: row.error_code,
            error_message: row.error_message,
            resolution_codes_raw: row.resolution_codes,
            lims_status_raw: row.lims_status,
            machine_cls: row.machine_cls,
            dxai_cls: row.dxai_cls,
            final_cls: row.final_cls,
            mix_name: row.mix_name.unwrap_or_else(|| UNKNOWN_MIX.to_string()),
            sample_name: row.sample_name,
            run_name: row.run_name,
        }
    }
}

/// Trait for well export readers.
pub trait WellSource: Send + Sync {
    /// Read every well row from the raw export bytes.
    fn read_rows(&self, bytes: &[u8]) -> Result<Vec<WellRow>, WellcatError>;

    /// Name of this reader (for diagnostics).
    fn format_name(&self) -> &str;
}

/// Pick a reader from the file extension.
pub fn source_for_path(path: &Path) -> Result<Box<dyn WellSource>, WellcatError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "json" => Ok(Box::new(JsonSource)),
        "csv" => Ok(Box::new(CsvSource::default())),
        "tsv" => Ok(Box::new(CsvSource::with_delimiter(b'\t'))),
        "xlsx" | "xlsm" => Ok(Box::new(XlsxSource::default())),
        other => Err(WellcatError::Ingest(format!(
            "unsupported input format '{}' for {} (expected json, csv, tsv or xlsx)",
            other,
            path.display()
        ))),
    }
}

/// Read a well export from disk, choosing the reader by extension.
pub fn read_wells(path: &Path) -> Result<Vec<WellRow>, WellcatError> {
    let source = source_for_path(path)?;
    let bytes = std::fs::read(path)?;
    let rows = source.read_rows(&bytes)?;
    tracing::info!(
        path = %path.display(),
        format = source.format_name(),
        rows = rows.len(),
        "read well export"
    );
    Ok(rows)
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", f as i64)),
            _ => Some(n.to_string()),
        },
        other => Some(other.to_string()),
    }
}

fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(value_to_text))
}

fn required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    text(deserializer)?.ok_or_else(|| serde::de::Error::custom("well_id must not be empty"))
}

fn cls_call<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Bool(b)) => return Ok(Some(u8::from(b))),
        Some(v) => v,
    };
    let parsed = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f == 0.0 => Ok(Some(0)),
        Some(f) if f == 1.0 => Ok(Some(1)),
        _ => Err(serde::de::Error::custom(format!(
            "classification call must be 0 or 1, got {value}"
        ))),
    }
}
