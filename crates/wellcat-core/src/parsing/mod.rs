//! Per-record field parsing: LIMS status normalization and resolution-code
//! tokenization. Both are total; malformed input degrades, it never errors.

pub mod resolution;
pub mod status;

pub use resolution::{
    has_meaningful_resolution, parse_resolution_codes, parse_resolution_detailed,
    ParsedResolution, ResolutionForm, ResolutionTokens,
};
pub use status::{normalize_status, CanonicalStatus, NormalizedStatus, RepeatAction, StatusSynonyms};
