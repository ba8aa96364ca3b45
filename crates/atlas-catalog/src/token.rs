//! Whitespace-insensitive identity of option values.
//!
//! Labels such as `E. coli K12` are displayed as-is but compared through
//! their token `E._coli_K12`: every whitespace run becomes one underscore.

use regex::Regex;

fn whitespace_regex() -> &'static Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Identity token of a label. Idempotent: a token maps to itself.
pub fn normalize_token(label: &str) -> String {
    whitespace_regex().replace_all(label, "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_runs_collapse_to_one_underscore() {
        assert_eq!(normalize_token("E. coli  K12"), "E._coli_K12");
        assert_eq!(normalize_token("Pseudomonas\taeruginosa"), "Pseudomonas_aeruginosa");
    }

    #[test]
    fn test_token_is_idempotent() {
        let once = normalize_token("phi X 174");
        assert_eq!(normalize_token(&once), once);
    }

    #[test]
    fn test_label_and_token_are_the_same_identity() {
        assert_eq!(normalize_token("E. coli K12"), normalize_token("E._coli_K12"));
        assert_ne!(normalize_token("E. coli K12"), normalize_token("E. coli B"));
    }
}
