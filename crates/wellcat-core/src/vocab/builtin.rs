use crate::error::WellcatError;
use crate::vocab::schema::LabVocabulary;
use crate::vocab::validate_vocabulary;

const QST_JSON: &str = include_str!("../../../../rules/labs/qst.json");
const NOTTS_JSON: &str = include_str!("../../../../rules/labs/notts.json");
const VIRA_JSON: &str = include_str!("../../../../rules/labs/vira.json");

/// Built-in lab vocabularies.
pub const PRESETS: &[&str] = &["qst", "notts", "vira"];

/// Load a built-in lab vocabulary by name (case-insensitive).
pub fn load_preset(name: &str) -> Result<LabVocabulary, WellcatError> {
    let json = match name.trim().to_lowercase().as_str() {
        "qst" => QST_JSON,
        "notts" => NOTTS_JSON,
        "vira" => VIRA_JSON,
        _ => {
            return Err(WellcatError::UnknownPreset {
                name: name.to_string(),
                available: PRESETS.join(", "),
            })
        }
    };
    let vocab: LabVocabulary = serde_json::from_str(json)?;
    validate_vocabulary(&vocab)?;
    Ok(vocab)
}
