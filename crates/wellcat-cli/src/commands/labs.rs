use std::path::Path;

use wellcat_core::error::WellcatError;
use wellcat_core::vocab::builtin;
use wellcat_core::vocab::schema::LabVocabulary;

pub fn list() -> Result<(), WellcatError> {
    println!("Built-in lab vocabularies:\n");
    for name in builtin::PRESETS {
        let v = builtin::load_preset(name)?;
        println!(
            "  {:<8} v{}  {} control patterns, {} status synonyms",
            name,
            v.version,
            v.control_role_patterns.len(),
            v.lims_synonyms.len()
        );
        if let Some(ref desc) = v.description {
            println!("           {}", desc);
        }
        println!();
    }
    Ok(())
}

pub fn explain(name: &str) -> Result<(), WellcatError> {
    let v = builtin::load_preset(name)?;
    print_vocabulary(&v);
    Ok(())
}

pub fn validate(file: &Path) -> Result<(), WellcatError> {
    let v = wellcat_core::vocab::load_vocabulary(file)?;

    println!("Lab vocabulary '{}' (v{}) is valid.", v.name, v.version);
    println!("  Control patterns: {}", v.control_role_patterns.join(", "));
    println!("  Status synonyms: {}", v.lims_synonyms.len());

    // Warnings, not errors
    let mut warnings = Vec::new();
    for pattern in &v.control_role_patterns {
        if pattern.trim() == "%" {
            warnings.push(format!(
                "pattern '{}' matches every role alias; every well becomes a control",
                pattern
            ));
        }
    }
    for raw in v.lims_synonyms.keys() {
        let upper = raw.trim().to_uppercase();
        if upper == "DETECTED" || upper == "NOT DETECTED" {
            warnings.push(format!("synonym '{}' is already canonical", raw));
        }
    }

    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {}", w);
        }
    }

    Ok(())
}

fn print_vocabulary(v: &LabVocabulary) {
    println!("{} (version {})\n", v.name, v.version);
    if let Some(ref desc) = v.description {
        println!("{}\n", desc);
    }

    println!("A well is a control when its role alias matches any of:\n");
    for p in &v.control_role_patterns {
        println!("  {}", p);
    }
    println!("\n('%' matches any run of characters, '_' exactly one; case-insensitive.)\n");

    if !v.lims_synonyms.is_empty() {
        println!("LIMS status synonyms:\n");
        let width = v.lims_synonyms.keys().map(|k| k.len()).max().unwrap_or(10);
        for (raw, canonical) in &v.lims_synonyms {
            let target = match canonical {
                wellcat_core::parsing::CanonicalStatus::Detected => "DETECTED",
                wellcat_core::parsing::CanonicalStatus::NotDetected => "NOT DETECTED",
            };
            println!("  {:<width$}  -> {}", raw, target, width = width);
        }
        println!();
    }

    let c = &v.codes;
    println!("Codes:\n");
    println!("  Ignored error codes:          {}", c.ignore_error_codes.join(", "));
    println!(
        "  Control-affected error codes: {}",
        c.control_affected_error_codes.join(", ")
    );
    println!(
        "  Discrepancy code markers:     {}",
        c.discrepancy_error_markers.join(", ")
    );
    println!("  Acknowledgement marker:       {}", c.administrative_marker);
    println!(
        "  Classification indicators:    {}",
        c.classification_indicators.join(", ")
    );
    println!("  Skip token:                   {}", c.skip_token);
    println!();
}
