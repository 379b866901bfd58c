pub mod audit;
pub mod pattern;

pub use audit::{
    overlap_from_path, overlap_from_report, overlap_from_value, report_well_sets, AuditReport,
    AuditSummary, ReportEntry, SectionReport, SectionSummary, EXCLUSIVE_BUCKETS,
};
pub use pattern::{pattern_table, save_pattern_csv, write_pattern_csv, PatternRow};
