use crate::error::WellcatError;
use crate::ingest::{WellRow, WellSource};
use serde_json::Value;

/// Reads a JSON array of well objects, or an object with a `wells` array.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSource;

impl WellSource for JsonSource {
    fn read_rows(&self, bytes: &[u8]) -> Result<Vec<WellRow>, WellcatError> {
        let doc: Value = serde_json::from_slice(bytes)?;
        let items = match doc {
            Value::Array(items) => items,
            Value::Object(mut obj) => match obj.remove("wells") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(WellcatError::Ingest(
                        "expected a JSON array of wells or an object with a 'wells' array".into(),
                    ))
                }
            },
            _ => {
                return Err(WellcatError::Ingest(
                    "expected a JSON array of wells".into(),
                ))
            }
        };

        items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::Object(fields) => WellRow::from_fields(idx + 1, fields),
                other => Err(WellcatError::MalformedRow {
                    row: idx + 1,
                    reason: format!("expected an object, got {other}"),
                }),
            })
            .collect()
    }

    fn format_name(&self) -> &str {
        "json"
    }
}
