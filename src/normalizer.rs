//! Text normalization for intent classification.
//!
//! [`TextNormalizer`] reduces a raw utterance to a canonical string:
//! lowercase, alphabetic, stopword-free, lemmatized tokens joined by single
//! spaces. Normalization is total; it never fails on any string input.
//!
//! # Examples
//!
//! ```
//! use guidebot::normalizer::{TextNormalizer, normalize};
//!
//! let normalizer = TextNormalizer::new();
//! assert_eq!(normalizer.normalize("What jobs are there in IT?"), "job");
//! assert_eq!(normalize("See you later!"), "see later");
//! assert_eq!(normalize("How are you?"), "");
//! ```

use std::sync::{Arc, LazyLock};

use log::warn;

use crate::analysis::analyzer::{Analyzer, EnglishAnalyzer};
use crate::error::Result;

static DEFAULT_NORMALIZER: LazyLock<TextNormalizer> = LazyLock::new(TextNormalizer::new);

/// Normalize text with the default English pipeline.
pub fn normalize(raw: &str) -> String {
    DEFAULT_NORMALIZER.normalize(raw)
}

/// Deterministic transform from raw text to a canonical token string.
#[derive(Clone)]
pub struct TextNormalizer {
    analyzer: Arc<dyn Analyzer>,
}

impl TextNormalizer {
    /// Create a normalizer backed by the English analyzer.
    pub fn new() -> Self {
        Self::with_analyzer(Arc::new(EnglishAnalyzer::new()))
    }

    /// Create a normalizer backed by a custom analyzer.
    pub fn with_analyzer(analyzer: Arc<dyn Analyzer>) -> Self {
        TextNormalizer { analyzer }
    }

    /// Normalize text, surfacing analyzer failures.
    pub fn try_normalize(&self, raw: &str) -> Result<String> {
        let tokens = self.analyzer.analyze(raw)?;
        let words: Vec<String> = tokens
            .filter(|token| !token.is_stopped() && !token.is_empty())
            .map(|token| token.text)
            .collect();
        Ok(words.join(" "))
    }

    /// Normalize text. Never fails: an analyzer failure is logged and
    /// yields the empty string.
    pub fn normalize(&self, raw: &str) -> String {
        match self.try_normalize(raw) {
            Ok(normalized) => normalized,
            Err(e) => {
                warn!(
                    "Normalization with analyzer '{}' failed: {}",
                    self.analyzer.name(),
                    e
                );
                String::new()
            }
        }
    }

    /// Normalize a batch of texts, preserving order.
    pub fn normalize_all<I, S>(&self, texts: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        texts
            .into_iter()
            .map(|text| self.normalize(text.as_ref()))
            .collect()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TextNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextNormalizer")
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::TokenStream;
    use crate::error::GuidebotError;

    struct FailingAnalyzer;

    impl Analyzer for FailingAnalyzer {
        fn analyze(&self, _text: &str) -> Result<TokenStream> {
            Err(GuidebotError::analysis("boom"))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn test_normalize_pipeline() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize("Hi"), "hi");
        assert_eq!(normalizer.normalize("Good day"), "good day");
        assert_eq!(normalizer.normalize("Talk to you later"), "talk later");
        assert_eq!(normalizer.normalize("Thanks a lot"), "thank lot");
        assert_eq!(
            normalizer.normalize("Which COMPANIES hire 2 engineers?"),
            "company hire engineer"
        );
    }

    #[test]
    fn test_normalize_empty_results() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize(""), "");
        assert_eq!(normalizer.normalize("!!!"), "");
        assert_eq!(normalizer.normalize("How are you?"), "");
        assert_eq!(normalizer.normalize("   \t\n"), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = TextNormalizer::new();
        let samples = [
            "Hello there, how are you doing today?",
            "I'd like some career advice about software jobs!!",
            "The classes, buses and wolves of the Thes",
            "Physics series news ÉCOLES cafés",
            "Goodbye and thanks for all the help",
            "123 456 ---",
            "",
        ];
        for sample in samples {
            let once = normalizer.normalize(sample);
            assert_eq!(normalizer.normalize(&once), once, "input: {sample:?}");
        }
    }

    #[test]
    fn test_analyzer_failure_is_total() {
        let normalizer = TextNormalizer::with_analyzer(Arc::new(FailingAnalyzer));
        assert!(normalizer.try_normalize("hi").is_err());
        assert_eq!(normalizer.normalize("hi"), "");
    }

    #[test]
    fn test_normalize_all_preserves_order() {
        let normalizer = TextNormalizer::new();
        assert_eq!(
            normalizer.normalize_all(["Hey", "Bye"]),
            vec!["hey".to_string(), "bye".to_string()]
        );
    }

    #[test]
    fn test_free_function_matches_default() {
        assert_eq!(normalize("See you later"), TextNormalizer::new().normalize("See you later"));
    }
}
