mod commands;
mod logging;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "wellcat",
    version,
    about = "Audit classifier for molecular-diagnostics assay wells"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every well in an export (JSON, CSV/TSV or XLSX)
    Classify {
        /// Path to the well export
        input_file: PathBuf,

        /// Built-in lab vocabulary: qst, notts, vira
        #[arg(short, long = "lab", value_name = "NAME", conflicts_with = "vocab")]
        lab: Option<String>,

        /// Custom lab vocabulary JSON file
        #[arg(long = "vocab", value_name = "FILE")]
        vocab: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the pattern table (one row per distinct well pattern) as CSV
        #[arg(long, value_name = "FILE")]
        patterns: Option<PathBuf>,

        /// Write the structured audit report as JSON
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        /// Infer discrepancy outcomes from LIMS status when machine/final calls are missing
        #[arg(long)]
        heuristic_discrepancy: bool,

        /// Accept clean wells with an unmapped LIMS status as VALID_OTHER
        #[arg(long)]
        accept_unmapped_status: bool,

        /// List every classified well
        #[arg(long)]
        show_records: bool,
    },
    /// Check a saved audit report for wells listed in two exclusive buckets
    Overlap {
        /// Path to the report JSON
        report_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Inspect and validate lab vocabularies
    Labs {
        #[command(subcommand)]
        action: LabsAction,
    },
    /// Print the classification rule table in evaluation order
    Rules {
        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
}

#[derive(Subcommand)]
enum LabsAction {
    /// List built-in lab vocabularies
    List,
    /// Show a lab vocabulary's control patterns, status synonyms and codes
    Explain {
        /// Preset name (e.g., "qst")
        name: String,
    },
    /// Validate a custom lab vocabulary file
    Validate {
        /// Path to JSON vocabulary file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Classify {
            input_file,
            lab,
            vocab,
            output,
            patterns,
            report,
            heuristic_discrepancy,
            accept_unmapped_status,
            show_records,
        } => commands::classify::run(commands::classify::ClassifyArgs {
            input_file,
            lab,
            vocab,
            output_format: output,
            patterns,
            report,
            heuristic_discrepancy,
            accept_unmapped_status,
            show_records,
        }),
        Commands::Overlap {
            report_file,
            output,
        } => match commands::overlap::run(&report_file, &output) {
            Ok(true) => Ok(()),
            Ok(false) => std::process::exit(2),
            Err(e) => Err(e),
        },
        Commands::Labs { action } => match action {
            LabsAction::List => commands::labs::list(),
            LabsAction::Explain { name } => commands::labs::explain(&name),
            LabsAction::Validate { file } => commands::labs::validate(&file),
        },
        Commands::Rules { output } => commands::rules::run(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
