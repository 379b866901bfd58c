pub mod engine;
pub mod outcome;
pub mod rules;

pub use engine::{classify, ClassifyInput, ClassifyOptions, Classifier};
pub use outcome::{
    Category, CategoryFamily, Classification, ClassifiedRecord, Confidence, ReportSection,
};
pub use rules::{rule_table, Rule, FALLBACK_RULE_ID};
