//! The ordered rule table.
//!
//! Rules are evaluated top to bottom and the first match wins, so a row's
//! position is part of its meaning. Each tier groups the rows of one
//! precedence level; rows within a tier are mutually exclusive or ordered
//! from most to least specific.

use crate::classify::engine::ClassifyOptions;
use crate::classify::outcome::{Category, Confidence};
use crate::model::WellType;
use crate::parsing::{has_meaningful_resolution, NormalizedStatus, RepeatAction, ResolutionTokens};
use crate::vocab::schema::CodeVocabulary;
use serde::Serialize;

pub const FALLBACK_RULE_ID: &str = "fallback";

/// What kind of error code a well carries, resolved against the code vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    None,
    Ignored,
    ControlAffected,
    Discrepancy,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionShape {
    Empty,
    /// Only the administrative acknowledgement marker.
    MarkerOnly,
    Meaningful,
}

/// Machine call versus final reported call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallComparison {
    /// Either call is missing.
    Unknown,
    Agree,
    Disagree,
}

impl CallComparison {
    pub fn of(machine_cls: Option<u8>, final_cls: Option<u8>) -> Self {
        match (machine_cls, final_cls) {
            (Some(m), Some(f)) if m == f => CallComparison::Agree,
            (Some(_), Some(_)) => CallComparison::Disagree,
            _ => CallComparison::Unknown,
        }
    }
}

/// Everything the predicates look at, derived once per well.
#[derive(Debug, Clone)]
pub struct WellFacts<'a> {
    pub well_type: WellType,
    pub error_code: Option<&'a str>,
    pub error: ErrorKind,
    pub tokens: &'a ResolutionTokens,
    pub resolution: ResolutionShape,
    pub has_indicator: bool,
    pub has_skip: bool,
    pub status: NormalizedStatus,
    pub calls: CallComparison,
}

impl<'a> WellFacts<'a> {
    pub fn derive(
        well_type: WellType,
        error_code: Option<&'a str>,
        tokens: &'a ResolutionTokens,
        status: NormalizedStatus,
        calls: CallComparison,
        codes: &CodeVocabulary,
    ) -> Self {
        let error_code = error_code.map(str::trim).filter(|c| !c.is_empty());
        let error = match error_code {
            None => ErrorKind::None,
            Some(c) if codes.is_ignored(c) => ErrorKind::Ignored,
            Some(c) if codes.is_control_affected(c) => ErrorKind::ControlAffected,
            Some(c) if codes.is_discrepancy(c) => ErrorKind::Discrepancy,
            Some(_) => ErrorKind::Other,
        };
        let marker = codes.administrative_marker.as_str();
        let resolution = if tokens.is_empty() {
            ResolutionShape::Empty
        } else if has_meaningful_resolution(tokens, marker) {
            ResolutionShape::Meaningful
        } else {
            ResolutionShape::MarkerOnly
        };
        let has_indicator = codes
            .classification_indicators
            .iter()
            .any(|i| tokens.mentions(i));

        Self {
            well_type,
            error_code,
            error,
            tokens,
            resolution,
            has_indicator,
            has_skip: tokens.mentions(&codes.skip_token),
            status,
            calls,
        }
    }

    fn canonical(&self) -> bool {
        self.status.is_canonical()
    }

    fn repeat_or_exclusion(&self) -> bool {
        self.status.is_repeat_or_exclusion()
    }

    fn absent(&self) -> bool {
        self.status.is_absent()
    }

    fn no_error(&self) -> bool {
        self.error == ErrorKind::None
    }
}

type Predicate = fn(&WellFacts<'_>, &ClassifyOptions) -> bool;

/// One row of the rule table.
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub id: &'static str,
    pub tier: u8,
    pub category: Category,
    pub confidence: Confidence,
    /// Rationale with `{error_code}`, `{status}` and `{tokens}` placeholders.
    pub template: &'static str,
    #[serde(skip)]
    when: Predicate,
}

impl Rule {
    pub fn matches(&self, facts: &WellFacts<'_>, options: &ClassifyOptions) -> bool {
        (self.when)(facts, options)
    }

    pub fn render(&self, facts: &WellFacts<'_>) -> String {
        self.template
            .replace("{error_code}", facts.error_code.unwrap_or("(none)"))
            .replace("{status}", &facts.status.to_string())
            .replace("{tokens}", &facts.tokens.to_string())
    }
}

const fn rule(
    id: &'static str,
    tier: u8,
    category: Category,
    template: &'static str,
    when: Predicate,
) -> Rule {
    Rule {
        id,
        tier,
        category,
        confidence: Confidence::Definitive,
        template,
        when,
    }
}

const fn heuristic(
    id: &'static str,
    tier: u8,
    category: Category,
    template: &'static str,
    when: Predicate,
) -> Rule {
    Rule {
        id,
        tier,
        category,
        confidence: Confidence::Heuristic,
        template,
        when,
    }
}

pub const FALLBACK: Rule = rule(
    FALLBACK_RULE_ID,
    12,
    Category::NeedsReview,
    "No rule matched (error {error_code}, status {status}, resolution {tokens}); rule table or vocabulary is incomplete",
    |_, _| true,
);

static RULES: &[Rule] = &[
    // 1. Administrative exclusions
    rule(
        "ignore-code",
        1,
        Category::IgnoreWell,
        "Error {error_code} is administrative; well not audited",
        |f, _| f.error == ErrorKind::Ignored,
    ),
    // 2. Result driven by an upstream control
    rule(
        "control-affected",
        2,
        Category::ControlAffectedSample,
        "Error {error_code}: result driven by a failed control",
        |f, _| f.error == ErrorKind::ControlAffected,
    ),
    // 3. Nothing recorded at all
    rule(
        "nothing-recorded-control",
        3,
        Category::ValidControl,
        "Control passed with no error, status or resolution",
        |f, _| {
            f.no_error()
                && f.absent()
                && f.resolution == ResolutionShape::Empty
                && f.well_type == WellType::Control
        },
    ),
    rule(
        "nothing-recorded-sample",
        3,
        Category::IgnoreWell,
        "Sample with no error, status or resolution; nothing to audit",
        |f, _| {
            f.no_error()
                && f.absent()
                && f.resolution == ResolutionShape::Empty
                && f.well_type == WellType::Sample
        },
    ),
    // 4. Repeat recorded only through the status
    rule(
        "status-only-repeat",
        4,
        Category::IgnoreWell,
        "Repeat status {status} without error or resolution; no auditable cause",
        |f, _| {
            f.no_error()
                && f.resolution == ResolutionShape::Empty
                && matches!(f.status, NormalizedStatus::RepeatAction(a) if a != RepeatAction::Tnp)
        },
    ),
    // 5. Exclusion, inconclusive and test-not-performed statuses
    rule(
        "exclusion-status",
        5,
        Category::SopRepeated,
        "Status {status} shows the result was withheld",
        |f, _| {
            matches!(
                f.status,
                NormalizedStatus::Excluded
                    | NormalizedStatus::Inconclusive
                    | NormalizedStatus::RepeatAction(RepeatAction::Tnp)
            )
        },
    ),
    // 6. Administrative marker is the only resolution
    rule(
        "marker-discrep-agree",
        6,
        Category::DiscrepIgnored,
        "Discrepancy {error_code} acknowledged; final call kept the machine call",
        |f, _| {
            f.resolution == ResolutionShape::MarkerOnly
                && f.error == ErrorKind::Discrepancy
                && f.calls == CallComparison::Agree
        },
    ),
    rule(
        "marker-discrep-changed",
        6,
        Category::DiscrepResultChanged,
        "Discrepancy {error_code} acknowledged; final call differs from the machine call",
        |f, _| {
            f.resolution == ResolutionShape::MarkerOnly
                && f.error == ErrorKind::Discrepancy
                && f.calls == CallComparison::Disagree
        },
    ),
    heuristic(
        "marker-discrep-heuristic",
        6,
        Category::DiscrepIgnored,
        "Discrepancy {error_code} acknowledged; calls unavailable, inferred reported from status {status}",
        |f, o| {
            o.discrepancy_heuristic
                && f.resolution == ResolutionShape::MarkerOnly
                && f.error == ErrorKind::Discrepancy
                && f.canonical()
        },
    ),
    rule(
        "marker-discrep-in-error",
        6,
        Category::DiscrepInError,
        "Discrepancy {error_code} with only an acknowledgement marker",
        |f, _| f.resolution == ResolutionShape::MarkerOnly && f.error == ErrorKind::Discrepancy,
    ),
    rule(
        "marker-with-error",
        6,
        Category::SopUnresolved,
        "Error {error_code} carries only the acknowledgement marker {tokens}; unresolved",
        |f, _| f.resolution == ResolutionShape::MarkerOnly && f.error == ErrorKind::Other,
    ),
    rule(
        "marker-cls-agree",
        6,
        Category::DiscrepIgnored,
        "Acknowledged classification note; final call kept the machine call",
        |f, _| {
            f.resolution == ResolutionShape::MarkerOnly
                && f.canonical()
                && f.calls == CallComparison::Agree
        },
    ),
    rule(
        "marker-cls-changed",
        6,
        Category::DiscrepResultChanged,
        "Acknowledged classification note; final call differs from the machine call",
        |f, _| {
            f.resolution == ResolutionShape::MarkerOnly
                && f.canonical()
                && f.calls == CallComparison::Disagree
        },
    ),
    heuristic(
        "marker-cls-heuristic",
        6,
        Category::DiscrepIgnored,
        "Acknowledged classification note; calls unavailable, inferred reported from status {status}",
        |f, o| o.discrepancy_heuristic && f.resolution == ResolutionShape::MarkerOnly && f.canonical(),
    ),
    rule(
        "marker-needs-cls",
        6,
        Category::DiscrepNeedsClsData,
        "Acknowledged classification note with status {status}; machine/final calls required",
        |f, _| f.resolution == ResolutionShape::MarkerOnly && f.canonical(),
    ),
    rule(
        "marker-repeat",
        6,
        Category::DiscrepInError,
        "Acknowledged classification note followed by {status}",
        |f, _| f.resolution == ResolutionShape::MarkerOnly && f.repeat_or_exclusion(),
    ),
    rule(
        "marker-no-status",
        6,
        Category::IgnoreWell,
        "Acknowledgement marker without status",
        |f, _| f.resolution == ResolutionShape::MarkerOnly && f.absent(),
    ),
    rule(
        "marker-unmapped-status",
        6,
        Category::NeedsReview,
        "Acknowledgement marker with unmapped status {status}",
        |f, _| f.resolution == ResolutionShape::MarkerOnly,
    ),
    // 7. Classification-indicator tokens
    rule(
        "indicator-repeat",
        7,
        Category::DiscrepInError,
        "Classification action {tokens} followed by {status}",
        |f, _| f.has_indicator && f.repeat_or_exclusion(),
    ),
    rule(
        "indicator-reported",
        7,
        Category::DiscrepIgnored,
        "Classification action {tokens} with reported status {status}",
        |f, _| f.has_indicator && f.canonical(),
    ),
    rule(
        "indicator-no-status",
        7,
        Category::IgnoreWell,
        "Classification action {tokens} without status",
        |f, _| f.has_indicator && f.absent(),
    ),
    // 8. Explicit discrepancy error code
    rule(
        "discrep-agree",
        8,
        Category::DiscrepIgnored,
        "Discrepancy {error_code}; final call kept the machine call",
        |f, _| f.error == ErrorKind::Discrepancy && f.calls == CallComparison::Agree,
    ),
    rule(
        "discrep-changed",
        8,
        Category::DiscrepResultChanged,
        "Discrepancy {error_code}; final call differs from the machine call",
        |f, _| f.error == ErrorKind::Discrepancy && f.calls == CallComparison::Disagree,
    ),
    heuristic(
        "discrep-heuristic",
        8,
        Category::DiscrepIgnored,
        "Discrepancy {error_code}; calls unavailable, inferred reported from status {status}",
        |f, o| o.discrepancy_heuristic && f.error == ErrorKind::Discrepancy && f.canonical(),
    ),
    rule(
        "discrep-in-error",
        8,
        Category::DiscrepInError,
        "Discrepancy {error_code} without machine/final calls",
        |f, _| f.error == ErrorKind::Discrepancy,
    ),
    // 9. Any other error code, samples and controls alike
    rule(
        "error-unresolved",
        9,
        Category::SopUnresolved,
        "Error {error_code} has no resolution",
        |f, _| f.error == ErrorKind::Other && f.resolution != ResolutionShape::Meaningful,
    ),
    rule(
        "error-reported",
        9,
        Category::SopIgnored,
        "Error {error_code} resolved with {tokens}; result reported as {status}",
        |f, _| f.error == ErrorKind::Other && f.canonical(),
    ),
    rule(
        "error-repeated",
        9,
        Category::SopRepeated,
        "Error {error_code} resolved with {tokens}; well repeated ({status})",
        |f, _| f.error == ErrorKind::Other && f.repeat_or_exclusion(),
    ),
    rule(
        "error-skipped",
        9,
        Category::SopIgnored,
        "Error {error_code} skipped ({tokens})",
        |f, _| f.error == ErrorKind::Other && f.has_skip,
    ),
    rule(
        "error-actioned",
        9,
        Category::SopRepeated,
        "Error {error_code} resolved with {tokens}; status {status} ambiguous",
        |f, _| f.error == ErrorKind::Other,
    ),
    // 10. Error suppressed on reanalysis
    rule(
        "suppressed-reported",
        10,
        Category::SopIgnored,
        "No error code but resolution {tokens}; result reported as {status}",
        |f, _| f.no_error() && f.resolution == ResolutionShape::Meaningful && f.canonical(),
    ),
    rule(
        "suppressed-repeated",
        10,
        Category::SopRepeated,
        "No error code but resolution {tokens}; well repeated ({status})",
        |f, _| {
            f.no_error() && f.resolution == ResolutionShape::Meaningful && f.repeat_or_exclusion()
        },
    ),
    rule(
        "suppressed-no-status",
        10,
        Category::SopRepeated,
        "No error code but resolution {tokens} and no status",
        |f, _| f.no_error() && f.resolution == ResolutionShape::Meaningful && f.absent(),
    ),
    // 11. Clean wells
    rule(
        "valid-detected",
        11,
        Category::ValidDetected,
        "Reported DETECTED with no error",
        |f, _| {
            f.no_error()
                && f.resolution == ResolutionShape::Empty
                && f.status == NormalizedStatus::Detected
        },
    ),
    rule(
        "valid-not-detected",
        11,
        Category::ValidNotDetected,
        "Reported NOT DETECTED with no error",
        |f, _| {
            f.no_error()
                && f.resolution == ResolutionShape::Empty
                && f.status == NormalizedStatus::NotDetected
        },
    ),
    rule(
        "valid-control",
        11,
        Category::ValidControl,
        "Control with no error and no status",
        |f, _| {
            f.no_error()
                && f.resolution == ResolutionShape::Empty
                && f.absent()
                && f.well_type == WellType::Control
        },
    ),
    rule(
        "valid-other",
        11,
        Category::ValidOther,
        "No error; unmapped status {status} accepted",
        |f, o| {
            o.accept_unmapped_status
                && f.no_error()
                && f.resolution == ResolutionShape::Empty
                && f.status == NormalizedStatus::Other
        },
    ),
    FALLBACK,
];

/// The full rule table in evaluation order, ending with the catch-all.
pub fn rule_table() -> &'static [Rule] {
    RULES
}

/// First matching rule. The catch-all guarantees a match.
pub fn first_match(facts: &WellFacts<'_>, options: &ClassifyOptions) -> &'static Rule {
    RULES
        .iter()
        .find(|r| r.matches(facts, options))
        .unwrap_or(&FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_resolution_codes;

    struct Case {
        well_type: WellType,
        error_code: Option<&'static str>,
        tokens: ResolutionTokens,
        status: NormalizedStatus,
        calls: CallComparison,
    }

    impl Case {
        fn new(well_type: WellType) -> Self {
            Self {
                well_type,
                error_code: None,
                tokens: ResolutionTokens::default(),
                status: NormalizedStatus::Absent,
                calls: CallComparison::Unknown,
            }
        }

        fn error(mut self, code: &'static str) -> Self {
            self.error_code = Some(code);
            self
        }

        fn resolution(mut self, raw: &str) -> Self {
            self.tokens = parse_resolution_codes(Some(raw));
            self
        }

        fn status(mut self, status: NormalizedStatus) -> Self {
            self.status = status;
            self
        }

        fn calls(mut self, machine: u8, fin: u8) -> Self {
            self.calls = CallComparison::of(Some(machine), Some(fin));
            self
        }

        fn fire(&self, options: &ClassifyOptions) -> &'static str {
            let codes = CodeVocabulary::default();
            let facts = WellFacts::derive(
                self.well_type,
                self.error_code,
                &self.tokens,
                self.status,
                self.calls,
                &codes,
            );
            first_match(&facts, options).id
        }

        fn id(&self) -> &'static str {
            self.fire(&ClassifyOptions::default())
        }
    }

    fn sample() -> Case {
        Case::new(WellType::Sample)
    }

    fn control() -> Case {
        Case::new(WellType::Control)
    }

    const RPT: NormalizedStatus = NormalizedStatus::RepeatAction(RepeatAction::Rpt);
    const TNP: NormalizedStatus = NormalizedStatus::RepeatAction(RepeatAction::Tnp);

    #[test]
    fn test_ids_unique_and_tiers_ordered() {
        let table = rule_table();
        let mut ids: Vec<_> = table.iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), table.len());
        assert!(table.windows(2).all(|w| w[0].tier <= w[1].tier));
        assert_eq!(table.first().map(|r| r.tier), Some(1));
        assert_eq!(table.last().map(|r| r.id), Some(FALLBACK_RULE_ID));
    }

    #[test]
    fn test_tier1_beats_everything() {
        let case = sample()
            .error("MIX_MISSING")
            .resolution(r#"["BLA"]"#)
            .status(NormalizedStatus::Excluded);
        assert_eq!(case.id(), "ignore-code");
    }

    #[test]
    fn test_tier2_control_affected() {
        let case = sample().error("INHERITED_CONTROL_FAILURE").status(NormalizedStatus::Detected);
        assert_eq!(case.id(), "control-affected");
    }

    #[test]
    fn test_tier3_nothing_recorded() {
        assert_eq!(control().id(), "nothing-recorded-control");
        assert_eq!(sample().id(), "nothing-recorded-sample");
    }

    #[test]
    fn test_tier4_status_only_repeat() {
        assert_eq!(sample().status(RPT).id(), "status-only-repeat");
        // TNP is withheld, not an untraceable repeat
        assert_eq!(sample().status(TNP).id(), "exclusion-status");
    }

    #[test]
    fn test_tier5_exclusion_even_with_error() {
        let case = sample().error("ADJ_CT").resolution(r#"["RPT"]"#).status(NormalizedStatus::Excluded);
        assert_eq!(case.id(), "exclusion-status");
        assert_eq!(sample().status(NormalizedStatus::Inconclusive).id(), "exclusion-status");
    }

    #[test]
    fn test_tier6_marker_with_discrepancy() {
        let base = || control().error("CLSDISC_WELL").resolution(r#"["BLA"]"#).status(NormalizedStatus::Detected);
        assert_eq!(base().calls(1, 1).id(), "marker-discrep-agree");
        assert_eq!(base().calls(0, 1).id(), "marker-discrep-changed");
        assert_eq!(base().id(), "marker-discrep-in-error");

        let heuristic = ClassifyOptions {
            discrepancy_heuristic: true,
            ..Default::default()
        };
        assert_eq!(base().fire(&heuristic), "marker-discrep-heuristic");
    }

    #[test]
    fn test_tier6_marker_with_other_error() {
        let case = sample().error("ADJ_CT").resolution("BLA").status(NormalizedStatus::Detected);
        assert_eq!(case.id(), "marker-with-error");
    }

    #[test]
    fn test_tier6_marker_without_error() {
        let base = |s| sample().resolution(r#"["BLA"]"#).status(s);
        assert_eq!(base(NormalizedStatus::Detected).id(), "marker-needs-cls");
        assert_eq!(base(NormalizedStatus::NotDetected).calls(1, 0).id(), "marker-cls-changed");
        assert_eq!(base(NormalizedStatus::Detected).calls(1, 1).id(), "marker-cls-agree");
        assert_eq!(base(RPT).id(), "marker-repeat");
        assert_eq!(base(NormalizedStatus::Absent).id(), "marker-no-status");
        assert_eq!(base(NormalizedStatus::Other).id(), "marker-unmapped-status");
    }

    #[test]
    fn test_tier7_indicators() {
        let base = |s| sample().resolution(r#"["WDCLS"]"#).status(s);
        assert_eq!(base(RPT).id(), "indicator-repeat");
        assert_eq!(base(NormalizedStatus::NotDetected).id(), "indicator-reported");
        assert_eq!(base(NormalizedStatus::Absent).id(), "indicator-no-status");
        // Unmapped status falls past tier 7 and 10 to the catch-all
        assert_eq!(base(NormalizedStatus::Other).id(), FALLBACK_RULE_ID);
    }

    #[test]
    fn test_tier8_discrepancy_code() {
        let base = || sample().error("CTDISC").resolution(r#"["RPT"]"#).status(NormalizedStatus::Detected);
        assert_eq!(base().calls(1, 1).id(), "discrep-agree");
        assert_eq!(base().calls(1, 0).id(), "discrep-changed");
        assert_eq!(base().id(), "discrep-in-error");
    }

    #[test]
    fn test_tier9_error_branches() {
        assert_eq!(sample().error("ADJ_CT").id(), "error-unresolved");
        assert_eq!(
            sample().error("ADJ_CT").resolution(r#"["RPT"]"#).status(NormalizedStatus::Detected).id(),
            "error-reported"
        );
        assert_eq!(
            control().error("CTRL_FAIL").resolution(r#"["REAMP"]"#).status(RPT).id(),
            "error-repeated"
        );
        assert_eq!(
            sample().error("ADJ_CT").resolution("SKIP|WG").status(NormalizedStatus::Other).id(),
            "error-skipped"
        );
        assert_eq!(
            sample().error("ADJ_CT").resolution(r#"["RPT"]"#).id(),
            "error-actioned"
        );
    }

    #[test]
    fn test_tier10_suppressed_error() {
        let base = |s| control().resolution(r#"["RPT"]"#).status(s);
        assert_eq!(base(NormalizedStatus::Detected).id(), "suppressed-reported");
        assert_eq!(base(RPT).id(), "suppressed-repeated");
        assert_eq!(base(NormalizedStatus::Absent).id(), "suppressed-no-status");
        assert_eq!(base(NormalizedStatus::Other).id(), FALLBACK_RULE_ID);
    }

    #[test]
    fn test_tier11_valid_results() {
        assert_eq!(sample().status(NormalizedStatus::Detected).id(), "valid-detected");
        assert_eq!(control().status(NormalizedStatus::NotDetected).id(), "valid-not-detected");
        assert_eq!(sample().status(NormalizedStatus::Other).id(), FALLBACK_RULE_ID);

        let accept = ClassifyOptions {
            accept_unmapped_status: true,
            ..Default::default()
        };
        assert_eq!(sample().status(NormalizedStatus::Other).fire(&accept), "valid-other");
    }

    #[test]
    fn test_render_placeholders() {
        let codes = CodeVocabulary::default();
        let tokens = parse_resolution_codes(Some(r#"["RPT","SKIP"]"#));
        let facts = WellFacts::derive(
            WellType::Sample,
            Some("ADJ_CT"),
            &tokens,
            NormalizedStatus::Detected,
            CallComparison::Unknown,
            &codes,
        );
        let rule = first_match(&facts, &ClassifyOptions::default());
        assert_eq!(
            rule.render(&facts),
            "Error ADJ_CT resolved with RPT|SKIP; result reported as DETECTED"
        );
    }
}
