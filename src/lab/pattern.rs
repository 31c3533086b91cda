use log::warn;
use regex::{Regex, RegexBuilder};

/// Marks a pattern as a regular expression rather than a literal command.
pub const REGEX_PREFIX: &str = "re:";

/// Collapses whitespace runs to a single space, trims and lowercases.
pub fn normalize(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// An expected answer for a free-text command.
///
/// Parsed from its raw text once: literals are normalized up front and
/// regexes are compiled up front, so matching never fails at submit time.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Pattern {
    Literal { raw: String, normalized: String },
    Regex { raw: String, regex: Regex },
    /// A `re:` pattern that did not compile. Never matches.
    Invalid { raw: String },
}

impl Pattern {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(REGEX_PREFIX) {
            Some(expr) => match RegexBuilder::new(expr).case_insensitive(true).build() {
                Ok(regex) => Pattern::Regex {
                    raw: raw.to_string(),
                    regex,
                },
                Err(err) => {
                    warn!("Skipping pattern {:?}: {}", raw, err);
                    Pattern::Invalid {
                        raw: raw.to_string(),
                    }
                }
            },
            None => Pattern::Literal {
                raw: raw.to_string(),
                normalized: normalize(raw),
            },
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            Pattern::Literal { raw, .. } | Pattern::Regex { raw, .. } | Pattern::Invalid { raw } => {
                raw
            }
        }
    }

    pub fn matches(&self, entered: &str) -> bool {
        if entered.trim().is_empty() {
            return false;
        }
        match self {
            Pattern::Regex { regex, .. } => regex.is_match(entered),
            Pattern::Literal { normalized, .. } => {
                if normalized.is_empty() {
                    return false;
                }
                let entered = normalize(entered);
                entered == *normalized
                    || entered.contains(normalized.as_str())
                    || normalized.contains(entered.as_str())
            }
            Pattern::Invalid { .. } => false,
        }
    }

    /// How the pattern is shown back to the user in a hint.
    pub fn hint_form(&self) -> &str {
        match self {
            Pattern::Literal { normalized, .. } => normalized,
            Pattern::Regex { raw, .. } | Pattern::Invalid { raw } => raw,
        }
    }
}

impl From<String> for Pattern {
    fn from(raw: String) -> Self {
        Pattern::parse(&raw)
    }
}

impl From<&str> for Pattern {
    fn from(raw: &str) -> Self {
        Pattern::parse(raw)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        match pattern {
            Pattern::Literal { raw, .. } | Pattern::Regex { raw, .. } | Pattern::Invalid { raw } => {
                raw
            }
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw() == other.raw()
    }
}

/// Expected patterns are alternatives: any one of them is enough.
pub fn matches_any(patterns: &[Pattern], entered: &str) -> bool {
    patterns.iter().any(|p| p.matches(entered))
}

pub fn hint(patterns: &[Pattern]) -> String {
    let expected = patterns
        .iter()
        .map(Pattern::hint_form)
        .collect::<Vec<_>>()
        .join(", ");
    format!("Incorrect command. Expected one of: {}", expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_is_idempotent() {
        for s in ["  Router   ON ", "show\tip\n route", "", "   ", "ENABLE"] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
        assert_eq!(normalize("  show\tIP   route "), "show ip route");
    }

    #[test]
    fn literal_ignores_case_and_spacing() {
        assert!(Pattern::parse("router on").matches("Router  ON"));
        assert!(Pattern::parse("Router  ON").matches("router on"));
    }

    #[test]
    fn literal_accepts_containment_either_way() {
        let pattern = Pattern::parse("show ip route");
        assert!(pattern.matches("show ip route summary"));
        assert!(pattern.matches("show ip"));
        assert!(!pattern.matches("configure terminal"));
    }

    #[test]
    fn regex_searches_case_insensitively() {
        let pattern = Pattern::parse(r"re:^show\s");
        assert!(pattern.matches("show ip route"));
        assert!(pattern.matches("SHOW running-config"));
        assert!(!pattern.matches("configure terminal"));

        let anywhere = Pattern::parse(r"re:ip\s+route");
        assert!(anywhere.matches("do show ip   route"));
    }

    #[test]
    fn empty_input_never_matches() {
        assert!(!Pattern::parse("enable").matches(""));
        assert!(!Pattern::parse("enable").matches("   "));
        assert!(!Pattern::parse("re:.*").matches(""));
    }

    #[test]
    fn blank_literal_never_matches() {
        assert!(!Pattern::parse("   ").matches("enable"));
    }

    #[test]
    fn invalid_regex_is_skipped() {
        let broken = Pattern::parse("re:(unclosed");
        assert!(matches!(broken, Pattern::Invalid { .. }));
        assert!(!broken.matches("(unclosed"));

        let patterns = vec![broken, Pattern::parse("enable")];
        assert!(matches_any(&patterns, "enable"));
    }

    #[test]
    fn hint_shows_regex_raw_and_literals_normalized() {
        let patterns = vec![Pattern::parse("Show  IP Route"), Pattern::parse(r"re:^show\s+ip")];
        assert_eq!(
            hint(&patterns),
            r"Incorrect command. Expected one of: show ip route, re:^show\s+ip"
        );
    }

    #[test]
    fn round_trips_through_raw_text() {
        let json = serde_json::to_string(&Pattern::parse(r"re:^ping\s")).unwrap();
        assert_eq!(json, r#""re:^ping\\s""#);
        let back: Pattern = serde_json::from_str(&json).unwrap();
        assert!(back.matches("ping 10.0.0.1"));
    }
}
