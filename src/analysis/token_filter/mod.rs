//! Token filter implementations for token transformation.
//!
//! Filters receive the token stream produced by a tokenizer and return a new
//! stream, rewriting or dropping tokens along the way.
//!
//! # Available Filters
//!
//! - [`lowercase::LowercaseFilter`] - Converts tokens to lowercase
//! - [`alphabetic::AlphabeticFilter`] - Keeps purely alphabetic tokens
//! - [`stop::StopFilter`] - Removes stop words
//! - [`lemma::LemmaFilter`] - Reduces words to their base form
//!
//! # Filter Chaining
//!
//! ```text
//! Tokenizer → Lowercase → Alphabetic → Stop Words → Lemmatizer
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod alphabetic;
pub mod lemma;
pub mod lowercase;
pub mod stop;

pub use alphabetic::AlphabeticFilter;
pub use lemma::{LemmaFilter, Lemmatizer, RuleLemmatizer};
pub use lowercase::LowercaseFilter;
pub use stop::StopFilter;
