//! Alphabetic filter implementation.
//!
//! Drops every token that contains a non-alphabetic character: numbers,
//! mixed alphanumerics ("mp3") and contractions ("don't") all go.
//!
//! # Examples
//!
//! ```
//! use guidebot::analysis::token_filter::Filter;
//! use guidebot::analysis::token_filter::alphabetic::AlphabeticFilter;
//! use guidebot::analysis::token::Token;
//!
//! let filter = AlphabeticFilter::new();
//! let tokens = vec![Token::new("top", 0), Token::new("10", 1), Token::new("jobs", 2)];
//! let result: Vec<_> = filter.filter(Box::new(tokens.into_iter()))
//!     .unwrap()
//!     .collect();
//!
//! assert_eq!(result.len(), 2);
//! assert_eq!(result[1].text, "jobs");
//! ```

use crate::analysis::token::{Token, TokenStream};
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// A filter that keeps only tokens made entirely of alphabetic characters.
#[derive(Clone, Debug, Default)]
pub struct AlphabeticFilter;

impl AlphabeticFilter {
    /// Create a new alphabetic filter.
    pub fn new() -> Self {
        AlphabeticFilter
    }

    /// Check whether a word would survive this filter.
    pub fn is_alphabetic(word: &str) -> bool {
        !word.is_empty() && word.chars().all(char::is_alphabetic)
    }
}

impl Filter for AlphabeticFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let filtered_tokens: Vec<Token> = tokens
            .filter(|token| token.is_stopped() || Self::is_alphabetic(&token.text))
            .collect();

        Ok(Box::new(filtered_tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "alphabetic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabetic_filter() {
        let filter = AlphabeticFilter::new();
        let tokens = vec![
            Token::new("hello", 0),
            Token::new("42", 1),
            Token::new("mp3", 2),
            Token::new("don't", 3),
            Token::new("résumé", 4),
        ];

        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        let texts: Vec<&str> = result.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "résumé"]);
    }

    #[test]
    fn test_is_alphabetic() {
        assert!(AlphabeticFilter::is_alphabetic("career"));
        assert!(!AlphabeticFilter::is_alphabetic(""));
        assert!(!AlphabeticFilter::is_alphabetic("c++"));
    }

    #[test]
    fn test_filter_name() {
        assert_eq!(AlphabeticFilter::new().name(), "alphabetic");
    }
}
