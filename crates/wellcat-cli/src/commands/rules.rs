use wellcat_core::classify::{rule_table, Confidence};
use wellcat_core::error::WellcatError;

use crate::output;

pub fn run(output_format: &str) -> Result<(), WellcatError> {
    let table = rule_table();

    if output_format == "json" {
        return output::json::print(&table);
    }

    println!("Rules are evaluated top to bottom; the first match decides.\n");

    let id_width = table.iter().map(|r| r.id.len()).max().unwrap_or(20);
    let mut tier = 0;
    for rule in table {
        if rule.tier != tier {
            tier = rule.tier;
            println!("Tier {}", tier);
        }
        let heuristic = if rule.confidence == Confidence::Heuristic {
            " (heuristic, opt-in)"
        } else {
            ""
        };
        println!(
            "  {:<width$}  {:<24}{}",
            rule.id,
            rule.category,
            heuristic,
            width = id_width
        );
        println!("  {:<width$}  {}", "", rule.template, width = id_width);
    }
    println!();

    Ok(())
}
