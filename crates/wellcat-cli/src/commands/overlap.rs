use std::path::Path;

use wellcat_core::error::WellcatError;
use wellcat_core::report::overlap_from_path;

use crate::output;

/// Check a saved report. Returns `Ok(true)` when no bucket pair shares a well.
pub fn run(report_file: &Path, output_format: &str) -> Result<bool, WellcatError> {
    let findings = overlap_from_path(report_file)?;

    match output_format {
        "json" => output::json::print(&findings)?,
        _ => {
            if findings.is_empty() {
                println!("No overlaps between tracked categories.");
            } else {
                output::table::print_overlaps(&findings);
            }
        }
    }

    Ok(findings.is_empty())
}
