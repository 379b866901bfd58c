pub mod aggregate;
pub mod classify;
pub mod error;
pub mod ingest;
pub mod model;
pub mod overlap;
pub mod parsing;
pub mod report;
pub mod trace;
pub mod vocab;

use aggregate::CategoryTally;
use classify::{ClassifiedRecord, Classifier};
use ingest::WellRow;
use overlap::{family_well_sets, find_overlaps, OverlapFinding};
use report::AuditReport;
use trace::TraceBundle;
use tracing::{info, warn};
use vocab::schema::LabVocabulary;

pub use classify::ClassifyOptions;

/// Everything produced by one audit pass over a batch of wells.
#[derive(Debug, Clone)]
pub struct AuditRun {
    pub lab: String,
    pub options: ClassifyOptions,
    pub records: Vec<ClassifiedRecord>,
    pub tally: CategoryTally,
    /// Wells found in more than one category family. Empty for a sound rule table.
    pub overlaps: Vec<OverlapFinding>,
    pub trace: TraceBundle,
}

impl AuditRun {
    pub fn report(&self) -> AuditReport {
        AuditReport::build(
            &self.lab,
            self.options,
            &self.records,
            &self.tally,
            &self.overlaps,
        )
    }

    pub fn patterns(&self) -> Vec<report::PatternRow> {
        report::pattern_table(&self.records)
    }

    /// True when every well landed in a definite category and no family overlaps.
    pub fn passed(&self) -> bool {
        self.tally.fallbacks == 0 && self.overlaps.is_empty()
    }
}

/// Main API entry point: resolve, classify, count and cross-check a batch.
pub fn audit_wells<I>(rows: I, vocabulary: &LabVocabulary, options: ClassifyOptions) -> AuditRun
where
    I: IntoIterator<Item = WellRow>,
{
    let classifier = Classifier::new(vocabulary, options);
    let records =
        classifier.classify_batch(rows.into_iter().map(|row| vocabulary.resolve(row)));

    let tally = aggregate::aggregate(&records);
    let overlaps = find_overlaps(&family_well_sets(&records));
    let trace = trace::build_trace(&records, &overlaps);

    info!(
        lab = %vocabulary.name,
        wells = tally.total,
        needs_review = tally.needs_review(),
        "classified batch"
    );
    if tally.fallbacks > 0 {
        warn!(
            count = tally.fallbacks,
            "wells reached the catch-all rule; extend the rule table or lab vocabulary"
        );
    }

    AuditRun {
        lab: vocabulary.name.clone(),
        options,
        records,
        tally,
        overlaps,
        trace,
    }
}
