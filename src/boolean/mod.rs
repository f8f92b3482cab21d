// src/boolean/mod.rs

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

const STANDARD_TRUE: &[&str] = &["true", "yes"];
const STANDARD_FALSE: &[&str] = &["false", "no"];
const EXTENDED_TRUE: &[&str] = &["true", "yes", "bad", "positive"];
const EXTENDED_FALSE: &[&str] = &["false", "no", "good", "negative"];

/// Raised when a diagnostic string matches neither synonym set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Given string {value} does not contain a recognized boolean!")]
pub struct UnrecognizedBoolean {
    /// The value exactly as it was handed in, before normalization.
    pub value: String,
}

/// Which synonym table the parser recognizes.
///
/// `Standard` only knows `true/yes` and `false/no`. `Extended` also accepts the
/// diagnostic wording `bad/positive` (true) and `good/negative` (false).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanVocabulary {
    #[default]
    Standard,
    Extended,
}

impl BooleanVocabulary {
    pub fn as_str(&self) -> &str {
        match self {
            BooleanVocabulary::Standard => "standard",
            BooleanVocabulary::Extended => "extended",
        }
    }

    fn true_set(&self) -> &'static [&'static str] {
        match self {
            BooleanVocabulary::Standard => STANDARD_TRUE,
            BooleanVocabulary::Extended => EXTENDED_TRUE,
        }
    }

    fn false_set(&self) -> &'static [&'static str] {
        match self {
            BooleanVocabulary::Standard => STANDARD_FALSE,
            BooleanVocabulary::Extended => EXTENDED_FALSE,
        }
    }
}

impl fmt::Display for BooleanVocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BooleanVocabulary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(BooleanVocabulary::Standard),
            "extended" => Ok(BooleanVocabulary::Extended),
            other => Err(format!(
                "unknown boolean vocabulary `{}` (expected `standard` or `extended`)",
                other
            )),
        }
    }
}

/// Strip every whitespace character and lowercase what is left.
pub fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Tri-state classifier for free-text diagnostic values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BooleanParser {
    vocabulary: BooleanVocabulary,
}

impl BooleanParser {
    pub fn new(vocabulary: BooleanVocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn is_true(&self, s: &str) -> bool {
        let cleaned = normalize(s);
        self.vocabulary.true_set().contains(&cleaned.as_str())
    }

    pub fn is_false(&self, s: &str) -> bool {
        let cleaned = normalize(s);
        self.vocabulary.false_set().contains(&cleaned.as_str())
    }

    pub fn parse(&self, s: &str) -> Result<bool, UnrecognizedBoolean> {
        if self.is_true(s) {
            Ok(true)
        } else if self.is_false(s) {
            Ok(false)
        } else {
            Err(UnrecognizedBoolean {
                value: s.to_string(),
            })
        }
    }

    /// `true` iff [`BooleanParser::parse`] would succeed.
    pub fn is_valid_boolean(&self, s: &str) -> bool {
        self.parse(s).is_ok()
    }
}

pub fn str_is_true(s: &str) -> bool {
    BooleanParser::default().is_true(s)
}

pub fn str_is_false(s: &str) -> bool {
    BooleanParser::default().is_false(s)
}

pub fn str_to_bool(s: &str) -> Result<bool, UnrecognizedBoolean> {
    BooleanParser::default().parse(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_sets_ignore_case_and_spacing() {
        let p = BooleanParser::default();
        for s in ["true", "TRUE", " Yes ", "y e s", "\tTrUe\n"] {
            assert_eq!(p.parse(s), Ok(true), "{s:?}");
        }
        for s in ["false", "No", " N O", "FALSE "] {
            assert_eq!(p.parse(s), Ok(false), "{s:?}");
        }
    }

    #[test]
    fn unrecognized_keeps_original_string() {
        let err = str_to_bool(" Maybe ").unwrap_err();
        assert_eq!(err.value, " Maybe ");
        assert_eq!(
            err.to_string(),
            "Given string  Maybe  does not contain a recognized boolean!"
        );
    }

    #[test]
    fn extended_vocabulary_adds_diagnostic_words() {
        let standard = BooleanParser::new(BooleanVocabulary::Standard);
        let extended = BooleanParser::new(BooleanVocabulary::Extended);

        assert!(standard.parse("Bad").is_err());
        assert_eq!(extended.parse("Bad"), Ok(true));
        assert_eq!(extended.parse("Positive"), Ok(true));
        assert_eq!(extended.parse("good"), Ok(false));
        assert_eq!(extended.parse("NEGATIVE"), Ok(false));
        assert_eq!(extended.parse("yes"), Ok(true));
    }

    #[test]
    fn is_valid_matches_parse() {
        for vocab in [BooleanVocabulary::Standard, BooleanVocabulary::Extended] {
            let p = BooleanParser::new(vocab);
            for s in ["", " ", "yes", "no", "1", "0", "bad", "good", "t r u e", "nope"] {
                assert_eq!(p.is_valid_boolean(s), p.parse(s).is_ok(), "{vocab} {s:?}");
            }
        }
    }

    #[test]
    fn true_and_false_are_disjoint() {
        let p = BooleanParser::new(BooleanVocabulary::Extended);
        for s in EXTENDED_TRUE.iter().chain(EXTENDED_FALSE) {
            assert_ne!(p.is_true(s), p.is_false(s), "{s}");
        }
    }

    #[test]
    fn free_functions_use_standard_table() {
        assert!(str_is_true("YES"));
        assert!(str_is_false("no"));
        assert!(!str_is_true("positive"));
    }

    #[test]
    fn vocabulary_from_str() {
        assert_eq!(
            "Extended".parse::<BooleanVocabulary>(),
            Ok(BooleanVocabulary::Extended)
        );
        assert!("loose".parse::<BooleanVocabulary>().is_err());
    }
}
