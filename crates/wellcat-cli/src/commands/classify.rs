use std::path::PathBuf;

use tracing::info;
use wellcat_core::error::WellcatError;
use wellcat_core::ingest::read_wells;
use wellcat_core::report::save_pattern_csv;
use wellcat_core::vocab::builtin;
use wellcat_core::vocab::schema::LabVocabulary;
use wellcat_core::ClassifyOptions;

use crate::output;

pub struct ClassifyArgs {
    pub input_file: PathBuf,
    pub lab: Option<String>,
    pub vocab: Option<PathBuf>,
    pub output_format: String,
    pub patterns: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub heuristic_discrepancy: bool,
    pub accept_unmapped_status: bool,
    pub show_records: bool,
}

fn load_lab(lab: Option<&str>, vocab: Option<&PathBuf>) -> Result<LabVocabulary, WellcatError> {
    match (lab, vocab) {
        (_, Some(path)) => wellcat_core::vocab::load_vocabulary(path),
        (Some(name), None) => builtin::load_preset(name),
        (None, None) => Err(WellcatError::VocabularyInvalid(format!(
            "no lab vocabulary given; use --lab ({}) or --vocab FILE",
            builtin::PRESETS.join(", ")
        ))),
    }
}

pub fn run(args: ClassifyArgs) -> Result<(), WellcatError> {
    let vocabulary = load_lab(args.lab.as_deref(), args.vocab.as_ref())?;
    let options = ClassifyOptions {
        discrepancy_heuristic: args.heuristic_discrepancy,
        accept_unmapped_status: args.accept_unmapped_status,
    };

    let rows = read_wells(&args.input_file)?;
    let run = wellcat_core::audit_wells(rows, &vocabulary, options);

    if let Some(path) = &args.patterns {
        let patterns = run.patterns();
        save_pattern_csv(&patterns, path)?;
        info!(path = %path.display(), patterns = patterns.len(), "wrote pattern table");
    }

    let report = run.report();
    if let Some(path) = &args.report {
        report.save(path)?;
        info!(path = %path.display(), "wrote audit report");
    }

    match args.output_format.as_str() {
        "json" => output::json::print(&report)?,
        _ => output::table::print(&run, &report, args.show_records),
    }

    Ok(())
}
