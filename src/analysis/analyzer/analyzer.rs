//! Core analyzer trait definition.
//!
//! Analyzers combine a tokenizer and a chain of filters into one step that
//! turns raw text into a token stream:
//!
//! ```text
//! Raw Text → Tokenizer → Filter 1 → ... → Filter N → Token Stream
//! ```
//!
//! # Available Implementations
//!
//! - [`SimpleAnalyzer`](super::simple::SimpleAnalyzer) - Tokenization only, no filtering
//! - [`PipelineAnalyzer`](super::pipeline::PipelineAnalyzer) - Custom tokenizer + filter chains
//! - [`EnglishAnalyzer`](super::english::EnglishAnalyzer) - The chatbot's normalization pipeline
//!
//! # Examples
//!
//! ```
//! use guidebot::analysis::analyzer::Analyzer;
//! use guidebot::analysis::token::TokenStream;
//! use guidebot::error::Result;
//!
//! struct EmptyAnalyzer;
//!
//! impl Analyzer for EmptyAnalyzer {
//!     fn analyze(&self, _text: &str) -> Result<TokenStream> {
//!         Ok(Box::new(std::iter::empty()))
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "empty"
//!     }
//! }
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for analyzers that convert text into processed tokens.
///
/// Requires `Send + Sync` so a single analyzer can be shared by every
/// request the chatbot serves.
pub trait Analyzer: Send + Sync {
    /// Analyze the given text and return a stream of tokens.
    ///
    /// # Examples
    ///
    /// ```
    /// use guidebot::analysis::analyzer::{Analyzer, EnglishAnalyzer};
    ///
    /// let analyzer = EnglishAnalyzer::new();
    /// let tokens: Vec<_> = analyzer.analyze("The quick brown foxes").unwrap().collect();
    ///
    /// assert_eq!(tokens.len(), 3);
    /// assert_eq!(tokens[2].text, "fox");
    /// ```
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this analyzer (for debugging and logging).
    fn name(&self) -> &'static str;
}
