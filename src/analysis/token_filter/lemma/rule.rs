//! Rule-based English noun lemmatizer.
//!
//! Handles irregular plurals through an exception table and regular plurals
//! through a short list of suffix rules. Rules are applied until the word
//! stops changing, which makes the result a fixed point.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use super::Lemmatizer;

/// Irregular plural forms and their singulars.
const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("people", "person"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("oxen", "ox"),
    ("lives", "life"),
    ("wives", "wife"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("wolves", "wolf"),
    ("halves", "half"),
    ("movies", "movie"),
    ("cookies", "cookie"),
    ("calories", "calorie"),
];

/// Words that end like plurals but must be left alone.
const INVARIANT_WORDS: &[&str] = &[
    "news",
    "series",
    "species",
    "always",
    "perhaps",
    "towards",
    "afterwards",
    "sometimes",
    "nowadays",
    "means",
    "physics",
    "mathematics",
    "economics",
    "politics",
    "ethics",
];

/// Ordered suffix rules. The first match wins.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("sses", "ss"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("xes", "x"),
    ("ies", "y"),
    ("s", ""),
];

/// Endings that look plural but are singular ("class", "status", "basis").
const SINGULAR_ENDINGS: &[&str] = &["ss", "us", "is"];

const MAX_PASSES: usize = 8;

static EXCEPTIONS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| IRREGULAR_PLURALS.iter().copied().collect());

static INVARIANTS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| INVARIANT_WORDS.iter().copied().collect());

/// Lemmatizer driven by an exception table and suffix rules.
///
/// # Examples
///
/// ```
/// use guidebot::analysis::token_filter::lemma::{Lemmatizer, RuleLemmatizer};
///
/// let lemmatizer = RuleLemmatizer::new();
/// assert_eq!(lemmatizer.lemmatize("careers"), "career");
/// assert_eq!(lemmatizer.lemmatize("companies"), "company");
/// assert_eq!(lemmatizer.lemmatize("women"), "woman");
/// assert_eq!(lemmatizer.lemmatize("news"), "news");
/// ```
#[derive(Clone, Debug, Default)]
pub struct RuleLemmatizer;

impl RuleLemmatizer {
    /// Create a new rule-based lemmatizer.
    pub fn new() -> Self {
        RuleLemmatizer
    }

    /// Apply a single reduction step.
    fn step(word: &str) -> String {
        if let Some(singular) = EXCEPTIONS.get(word) {
            return (*singular).to_string();
        }
        if INVARIANTS.contains(word) || word.chars().count() <= 3 {
            return word.to_string();
        }
        if SINGULAR_ENDINGS.iter().any(|end| word.ends_with(end)) {
            return word.to_string();
        }

        for (suffix, replacement) in SUFFIX_RULES {
            if !word.ends_with(suffix) {
                continue;
            }
            // Four-letter words ("ties", "lies") only lose the final "s".
            if *suffix == "ies" && word.chars().count() <= 4 {
                continue;
            }
            let stem = &word[..word.len() - suffix.len()];
            return format!("{stem}{replacement}");
        }

        word.to_string()
    }
}

impl Lemmatizer for RuleLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        let mut current = word.to_string();
        for _ in 0..MAX_PASSES {
            let next = Self::step(&current);
            if next == current {
                break;
            }
            current = next;
        }
        current
    }

    fn name(&self) -> &'static str {
        "rule"
    }
}
