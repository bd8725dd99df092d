//! # Guidebot
//!
//! An intent-routing chatbot core. Free text is normalized, turned into a
//! TF-IDF vector and classified into one intent of a fixed catalog by a
//! one-vs-rest logistic regression model; a canned response of that intent is
//! returned.
//!
//! ## Features
//!
//! - Deterministic English normalization (tokenize, lowercase, drop
//!   non-alphabetic tokens and stop words, lemmatize)
//! - TF-IDF features with smoothed IDF and L2 normalization
//! - L2-regularized logistic regression trained with truncated Newton steps
//! - Versioned JSON model artifacts with a train-on-first-use fallback
//! - Immutable, shareable serving state
//!
//! ```
//! use guidebot::prelude::*;
//! use std::sync::Arc;
//!
//! let catalog = IntentCatalog::builtin().unwrap();
//! let bundle = ModelBundle::train(&catalog, &TrainingConfig::default()).unwrap();
//! let bot = Chatbot::new(Arc::new(catalog), Arc::new(bundle));
//!
//! assert_eq!(bot.classify("See you later").unwrap().tag, "farewell");
//! ```

pub mod analysis;
pub mod catalog;
pub mod chatbot;
pub mod cli;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod ml;
pub mod model_store;
pub mod normalizer;
pub mod response;
pub mod storage;

pub mod prelude {
    pub use crate::catalog::{Intent, IntentCatalog};
    pub use crate::chatbot::{Chatbot, InferenceOutcome, InferenceRequest};
    pub use crate::config::{ChatbotConfig, TrainingConfig};
    pub use crate::error::{GuidebotError, Result};
    pub use crate::lifecycle::{ModelOrigin, ModelState};
    pub use crate::ml::{Classification, ModelBundle};
    pub use crate::model_store::ModelStore;
    pub use crate::normalizer::{TextNormalizer, normalize};
    pub use crate::response::ResponseSelector;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
