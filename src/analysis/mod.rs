//! Text analysis for guidebot.
//!
//! Tokenizers split raw text, token filters rewrite or drop tokens, and
//! analyzers chain the two into a reusable pipeline.

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

// Re-export commonly used types
pub use analyzer::*;
pub use token::*;
pub use token_filter::*;
pub use tokenizer::*;
