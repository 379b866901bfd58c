use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a well on the plate, as decided by the lab vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WellType {
    Sample,
    Control,
}

impl fmt::Display for WellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl WellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WellType::Sample => "SAMPLE",
            WellType::Control => "CONTROL",
        }
    }

    pub fn from_str_loose(s: &str) -> Option<WellType> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "sample" | "patient" => Some(WellType::Sample),
            "control" => Some(WellType::Control),
            _ => None,
        }
    }
}

/// A single well as handed over by the data-access layer, with its well type
/// already resolved. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellRecord {
    pub well_id: String,
    pub well_type: WellType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_alias: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Raw resolution field: empty, a JSON array literal, a pipe-delimited
    /// scalar or a bare token.
    #[serde(default, rename = "resolution_codes")]
    pub resolution_codes_raw: Option<String>,
    /// Raw LIMS status in the lab's own vocabulary.
    #[serde(default, rename = "lims_status")]
    pub lims_status_raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_cls: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dxai_cls: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_cls: Option<u8>,
    pub mix_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<String>,
}

impl WellRecord {
    /// A bare record with only the attributes the classifier looks at.
    pub fn new(well_id: impl Into<String>, well_type: WellType, mix_name: impl Into<String>) -> Self {
        Self {
            well_id: well_id.into(),
            well_type,
            role_alias: None,
            error_code: None,
            error_message: None,
            resolution_codes_raw: None,
            lims_status_raw: None,
            machine_cls: None,
            dxai_cls: None,
            final_cls: None,
            mix_name: mix_name.into(),
            sample_name: None,
            run_name: None,
        }
    }

    /// The error code, with blank strings treated as absent.
    pub fn error_code(&self) -> Option<&str> {
        self.error_code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn has_cls_observation(&self) -> bool {
        self.machine_cls.is_some() || self.dxai_cls.is_some() || self.final_cls.is_some()
    }
}
