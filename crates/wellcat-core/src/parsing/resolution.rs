use serde::{Deserialize, Serialize};
use std::fmt;

/// Whole-field values meaning "no resolution was entered".
const EMPTY_MARKERS: &[&str] = &["", "[]", "NULL"];

/// Ordered, duplicate-free set of non-empty resolution tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolutionTokens(Vec<String>);

impl ResolutionTokens {
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = ResolutionTokens::default();
        for t in tokens {
            out.push(t.into());
        }
        out
    }

    fn push(&mut self, token: String) {
        let token = token.trim();
        if token.is_empty() || self.0.iter().any(|t| t == token) {
            return;
        }
        self.0.push(token.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Case-insensitive substring match against any token.
    pub fn mentions(&self, fragment: &str) -> bool {
        let needle = fragment.to_uppercase();
        self.0.iter().any(|t| t.to_uppercase().contains(&needle))
    }

    /// Tokens other than the administrative marker.
    pub fn without_marker<'a>(&'a self, marker: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.iter().filter(move |t| !t.eq_ignore_ascii_case(marker))
    }

    /// JSON array rendering, `[]` when empty.
    pub fn to_json_array(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }
}

impl fmt::Display for ResolutionTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "(none)")
        } else {
            write!(f, "{}", self.0.join("|"))
        }
    }
}

/// Shape the raw resolution field was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionForm {
    Empty,
    JsonArray,
    Delimited,
    Bare,
    /// Looked like a JSON array but did not decode; kept as one literal token.
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResolution {
    pub tokens: ResolutionTokens,
    pub form: ResolutionForm,
}

/// Parse a raw resolution-code field into tokens.
///
/// Never fails: undecodable input degrades to a single literal token.
pub fn parse_resolution_codes(raw: Option<&str>) -> ResolutionTokens {
    parse_resolution_detailed(raw).tokens
}

/// Like [`parse_resolution_codes`], also reporting the recognised form.
pub fn parse_resolution_detailed(raw: Option<&str>) -> ParsedResolution {
    let trimmed = raw.map(str::trim).unwrap_or("");
    if EMPTY_MARKERS.iter().any(|m| trimmed.eq_ignore_ascii_case(m)) {
        return ParsedResolution {
            tokens: ResolutionTokens::default(),
            form: ResolutionForm::Empty,
        };
    }

    if trimmed.starts_with('[') {
        return match serde_json::from_str::<Vec<serde_json::Value>>(trimmed) {
            Ok(values) => {
                let tokens = ResolutionTokens::new(values.into_iter().filter_map(json_token));
                let form = if tokens.is_empty() {
                    ResolutionForm::Empty
                } else {
                    ResolutionForm::JsonArray
                };
                ParsedResolution { tokens, form }
            }
            Err(_) => ParsedResolution {
                tokens: ResolutionTokens::new([trimmed]),
                form: ResolutionForm::Malformed,
            },
        };
    }

    let tokens = ResolutionTokens::new(trimmed.split('|'));
    let form = match tokens.len() {
        0 => ResolutionForm::Empty,
        1 => ResolutionForm::Bare,
        _ => ResolutionForm::Delimited,
    };
    ParsedResolution { tokens, form }
}

fn json_token(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// False when there is no resolution at all or only the administrative marker.
pub fn has_meaningful_resolution(tokens: &ResolutionTokens, marker: &str) -> bool {
    tokens.without_marker(marker).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Vec<String> {
        parse_resolution_codes(Some(s)).iter().map(String::from).collect()
    }

    #[test]
    fn test_empty_markers() {
        assert!(parse_resolution_codes(None).is_empty());
        assert!(parse("").is_empty());
        assert!(parse("  ").is_empty());
        assert!(parse("[]").is_empty());
        assert!(parse("NULL").is_empty());
    }

    #[test]
    fn test_json_array() {
        assert_eq!(parse(r#"["RPT"]"#), vec!["RPT"]);
        assert_eq!(parse(r#"["BLA", "", "WDCLS"]"#), vec!["BLA", "WDCLS"]);
    }

    #[test]
    fn test_json_array_of_empties_is_empty() {
        let parsed = parse_resolution_detailed(Some(r#"["", null]"#));
        assert!(parsed.tokens.is_empty());
        assert_eq!(parsed.form, ResolutionForm::Empty);
    }

    #[test]
    fn test_malformed_json_becomes_literal() {
        let parsed = parse_resolution_detailed(Some("['RPT']"));
        assert_eq!(parsed.form, ResolutionForm::Malformed);
        assert_eq!(parsed.tokens.iter().collect::<Vec<_>>(), vec!["['RPT']"]);
    }

    #[test]
    fn test_pipe_delimited() {
        let parsed = parse_resolution_detailed(Some("SKIP|WG"));
        assert_eq!(parsed.form, ResolutionForm::Delimited);
        assert_eq!(parsed.tokens.iter().collect::<Vec<_>>(), vec!["SKIP", "WG"]);
    }

    #[test]
    fn test_bare_token() {
        let parsed = parse_resolution_detailed(Some("BLA"));
        assert_eq!(parsed.form, ResolutionForm::Bare);
        assert_eq!(parse("BLA"), vec!["BLA"]);
    }

    #[test]
    fn test_duplicates_dropped_order_kept() {
        assert_eq!(parse(r#"["RPT", "SKIP", "RPT"]"#), vec!["RPT", "SKIP"]);
    }

    #[test]
    fn test_meaningful_resolution() {
        assert!(!has_meaningful_resolution(&parse_resolution_codes(Some("[]")), "BLA"));
        assert!(!has_meaningful_resolution(&parse_resolution_codes(Some(r#"["BLA"]"#)), "BLA"));
        assert!(!has_meaningful_resolution(&parse_resolution_codes(Some("bla")), "BLA"));
        assert!(has_meaningful_resolution(&parse_resolution_codes(Some(r#"["BLA","RPT"]"#)), "BLA"));
        assert!(has_meaningful_resolution(&parse_resolution_codes(Some("SKIP")), "BLA"));
    }

    #[test]
    fn test_mentions_is_substring() {
        let tokens = parse_resolution_codes(Some(r#"["wdcls_2", "Skip"]"#));
        assert!(tokens.mentions("WDCLS"));
        assert!(tokens.mentions("skip"));
        assert!(!tokens.mentions("WDCT"));
    }

    #[test]
    fn test_without_marker_is_case_insensitive() {
        let tokens = parse_resolution_codes(Some(r#"["bla", "RPT", "BLA "]"#));
        let rest: Vec<&str> = tokens.without_marker("BLA").collect();
        assert_eq!(rest, vec!["RPT"]);
        assert!(has_meaningful_resolution(&tokens, "BLA"));

        let only = parse_resolution_codes(Some("BLA|bla"));
        assert_eq!(only.without_marker("BLA").count(), 0);
        assert!(!has_meaningful_resolution(&only, "BLA"));
    }

    #[test]
    fn test_json_rendering() {
        assert_eq!(ResolutionTokens::default().to_json_array(), "[]");
        assert_eq!(ResolutionTokens::new(["RPT", "SKIP"]).to_json_array(), r#"["RPT","SKIP"]"#);
    }
}
