use wellcat_core::classify::{Category, Confidence};
use wellcat_core::model::WellType;
use wellcat_core::overlap::OverlapFinding;
use wellcat_core::report::AuditReport;
use wellcat_core::trace::TraceSeverity;
use wellcat_core::AuditRun;

pub fn print(run: &AuditRun, report: &AuditReport, show_records: bool) {
    println!("=== {} ===\n", report.lab);
    println!("  Wells: {}", report.summary.total);
    for (family, n) in &report.summary.families {
        println!("    {:<16} {}", family, n);
    }
    println!();

    print_categories(run);
    print_mixes(report);

    if show_records {
        print_records(run);
    }

    if !report.review.is_empty() {
        println!("Needs review ({}):", report.review.len());
        for entry in &report.review {
            println!(
                "  {:<12} {:<8} {}",
                entry.well_id, entry.well_type, entry.rationale
            );
        }
        println!();
    }

    if !run.trace.warnings.is_empty() {
        println!("Warnings:");
        for w in &run.trace.warnings {
            let marker = match w.severity {
                TraceSeverity::Critical => "!!",
                TraceSeverity::Important => " !",
                TraceSeverity::Info => "  ",
            };
            if w.occurrences > 1 {
                println!("  {} {} (x{})", marker, w.message, w.occurrences);
            } else {
                println!("  {} {}", marker, w.message);
            }
        }
        println!();
    }

    print_overlaps(&run.overlaps);

    if run.passed() {
        println!("Audit: every well has exactly one category.");
    } else {
        println!(
            "Audit: {} well(s) reached the catch-all rule, {} family overlap(s).",
            run.tally.fallbacks,
            run.overlaps.len()
        );
    }
}

fn print_categories(run: &AuditRun) {
    let totals = run.tally.category_totals();
    if totals.is_empty() {
        return;
    }
    println!(
        "  {:<26} {:>8} {:>8} {:>8}",
        "Category", "Sample", "Control", "Total"
    );
    println!("  {}", "-".repeat(26 + 3 * 9));
    for (category, total) in &totals {
        println!(
            "  {:<26} {:>8} {:>8} {:>8}",
            category.as_str(),
            run.tally.count_for_type(WellType::Sample, *category),
            run.tally.count_for_type(WellType::Control, *category),
            total
        );
    }
    println!();
}

fn print_mixes(report: &AuditReport) {
    if report.mixes.len() < 2 {
        return;
    }
    println!("  By mix:");
    for (mix, counts) in &report.mixes {
        let total: u64 = counts.values().sum();
        let review = counts.get(&Category::NeedsReview).copied().unwrap_or(0);
        if review > 0 {
            println!("    {:<20} {:>6}  ({} need review)", mix, total, review);
        } else {
            println!("    {:<20} {:>6}", mix, total);
        }
    }
    println!();
}

fn print_records(run: &AuditRun) {
    let id_width = run
        .records
        .iter()
        .map(|r| r.record.well_id.len())
        .max()
        .unwrap_or(8)
        .max(8);

    println!("  Wells:");
    for rec in &run.records {
        let heuristic = if rec.classification.confidence == Confidence::Heuristic {
            " (?)"
        } else {
            ""
        };
        println!(
            "  {:<width$}  {:<8} {:<12} -> {}{}",
            rec.record.well_id,
            rec.record.well_type,
            rec.record.mix_name,
            rec.category(),
            heuristic,
            width = id_width
        );
        println!(
            "  {:<width$}  [{}] {}",
            "",
            rec.classification.rule_id,
            rec.classification.rationale,
            width = id_width
        );
    }
    println!();
}

pub fn print_overlaps(findings: &[OverlapFinding]) {
    if findings.is_empty() {
        return;
    }
    println!("Overlaps:");
    for f in findings {
        let examples: Vec<&str> = f.shared.iter().take(5).map(String::as_str).collect();
        println!(
            "  {} <-> {}: {} wells (e.g. {})",
            f.left,
            f.right,
            f.shared.len(),
            examples.join(", ")
        );
    }
    println!();
}
