//! Lemmatizing token filter and lemmatizer implementations.

use std::collections::HashSet;
use std::sync::Arc;

use super::Filter;
use super::stop::DEFAULT_ENGLISH_STOP_WORDS_SET;
use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for lemmatization algorithms.
pub trait Lemmatizer: Send + Sync {
    /// Reduce a lowercase word to its dictionary form.
    fn lemmatize(&self, word: &str) -> String;

    /// Get the name of this lemmatizer.
    fn name(&self) -> &'static str;
}

pub mod rule;

pub use rule::RuleLemmatizer;

/// Filter that replaces each token with its lemma.
///
/// A lemma that is itself a stop word is discarded and the surface form is
/// kept instead ("thes" stays "thes" rather than becoming "the"). Without
/// this, a second pass over normalized text would drop the word.
pub struct LemmaFilter {
    lemmatizer: Box<dyn Lemmatizer>,
    stop_words: Arc<HashSet<String>>,
}

impl std::fmt::Debug for LemmaFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LemmaFilter")
            .field("lemmatizer", &self.lemmatizer.name())
            .field("stop_words", &self.stop_words.len())
            .finish()
    }
}

impl LemmaFilter {
    /// Create a new lemma filter with the rule-based lemmatizer and the
    /// default English stop words.
    pub fn new() -> Self {
        LemmaFilter {
            lemmatizer: Box::new(RuleLemmatizer::new()),
            stop_words: Arc::new(DEFAULT_ENGLISH_STOP_WORDS_SET.clone()),
        }
    }

    /// Create a lemma filter with a custom lemmatizer.
    pub fn with_lemmatizer(lemmatizer: Box<dyn Lemmatizer>) -> Self {
        LemmaFilter {
            lemmatizer,
            ..Self::new()
        }
    }

    /// Use the given stop word set for the surface-form fallback.
    ///
    /// Should match the set of the stop filter that runs before this one.
    pub fn with_stop_words(mut self, stop_words: Arc<HashSet<String>>) -> Self {
        self.stop_words = stop_words;
        self
    }

    fn lemma_of(&self, word: &str) -> String {
        let lemma = self.lemmatizer.lemmatize(word);
        if lemma.is_empty() || self.stop_words.contains(&lemma) {
            word.to_string()
        } else {
            lemma
        }
    }
}

impl Default for LemmaFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for LemmaFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens = tokens
            .map(|token| {
                if token.is_stopped() {
                    token
                } else {
                    let lemma = self.lemma_of(&token.text);
                    token.with_text(lemma)
                }
            })
            .collect::<Vec<_>>();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "lemma"
    }
}
