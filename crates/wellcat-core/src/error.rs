use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum WellcatError {
    #[error("failed to load lab vocabulary from {path}: {reason}")]
    VocabularyLoad { path: PathBuf, reason: String },

    #[error("invalid lab vocabulary: {0}")]
    VocabularyInvalid(String),

    #[error("unknown lab preset '{name}'. Available: {available}")]
    UnknownPreset { name: String, available: String },

    #[error("failed to read well export: {0}")]
    Ingest(String),

    #[error("well export is missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: {reason}")]
    MalformedRow { row: usize, reason: String },

    #[error("xlsx error: {0}")]
    Xlsx(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
