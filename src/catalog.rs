//! Intent catalog: the closed set of intents the chatbot can recognize.
//!
//! The catalog is read once at startup and never mutated afterwards. It is
//! the single source of truth for the classifier's label space and for the
//! replies the response selector can return.
//!
//! # Format
//!
//! ```json
//! {"intents": [{"tag": "greeting", "patterns": ["Hi"], "responses": ["Hello!"], "context_set": ""}]}
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{GuidebotError, Result};
use crate::normalizer::TextNormalizer;

const BUILTIN_CATALOG: &str = include_str!("../data/intents.json");

/// Reply used when a predicted tag has no intent in the catalog.
pub const FALLBACK_RESPONSE: &str = "I'm still learning. Can you rephrase that?";

/// A named category of user request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// Unique identifier, also the classifier label.
    pub tag: String,
    /// Example utterances used for training.
    pub patterns: Vec<String>,
    /// Candidate replies.
    pub responses: Vec<String>,
    #[serde(
        default,
        alias = "context_set",
        deserialize_with = "deserialize_context",
        skip_serializing_if = "Option::is_none"
    )]
    pub context: Option<String>,
}

impl Intent {
    pub fn new<S: Into<String>>(tag: S, patterns: Vec<String>, responses: Vec<String>) -> Self {
        Intent {
            tag: tag.into(),
            patterns,
            responses,
            context: None,
        }
    }

    pub fn with_context<S: Into<String>>(mut self, context: S) -> Self {
        let context = context.into();
        self.context = if context.trim().is_empty() {
            None
        } else {
            Some(context)
        };
        self
    }
}

fn deserialize_context<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|context| !context.trim().is_empty()))
}

/// One normalized pattern paired with its intent tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingExample {
    pub normalized_text: String,
    pub label: String,
}

/// CRC32 over an ordered set of training examples.
///
/// Any change to a pattern's normalized form, a label, or the order of
/// examples changes the fingerprint.
pub fn corpus_fingerprint(examples: &[TrainingExample]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for example in examples {
        hasher.update(example.normalized_text.as_bytes());
        hasher.update(&[0x1f]);
        hasher.update(example.label.as_bytes());
        hasher.update(&[0x1e]);
    }
    hasher.finalize()
}

#[derive(Deserialize, Serialize)]
struct CatalogFile {
    intents: Vec<Intent>,
}

/// Validated, immutable collection of intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentCatalog {
    intents: Vec<Intent>,
}

impl IntentCatalog {
    /// Build a catalog, checking that it is non-empty, that tags are unique
    /// and that every intent has at least one pattern and one response.
    pub fn new(intents: Vec<Intent>) -> Result<Self> {
        if intents.is_empty() {
            return Err(GuidebotError::catalog("catalog contains no intents"));
        }

        let mut seen = HashSet::new();
        for intent in &intents {
            if intent.tag.trim().is_empty() {
                return Err(GuidebotError::catalog("intent tag must not be empty"));
            }
            if !seen.insert(intent.tag.as_str()) {
                return Err(GuidebotError::catalog(format!(
                    "duplicate intent tag '{}'",
                    intent.tag
                )));
            }
            if intent.patterns.is_empty() {
                return Err(GuidebotError::catalog(format!(
                    "intent '{}' has no patterns",
                    intent.tag
                )));
            }
            if intent.responses.is_empty() {
                return Err(GuidebotError::catalog(format!(
                    "intent '{}' has no responses",
                    intent.tag
                )));
            }
        }

        Ok(IntentCatalog { intents })
    }

    /// Parse a catalog from its JSON representation.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|e| GuidebotError::catalog(format!("invalid catalog JSON: {e}")))?;
        Self::new(file.intents)
    }

    /// Load a catalog from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            GuidebotError::catalog(format!("cannot read catalog {}: {e}", path.display()))
        })?;
        let catalog = Self::from_json_str(&json)?;
        debug!(
            "Loaded catalog with {} intents from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// The catalog shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    /// Serialize the catalog back into its JSON file format.
    pub fn to_json_string(&self) -> Result<String> {
        let file = CatalogFile {
            intents: self.intents.clone(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    /// Look up an intent by tag.
    pub fn get(&self, tag: &str) -> Option<&Intent> {
        self.intents.iter().find(|intent| intent.tag == tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    /// Tags in catalog order.
    pub fn tags(&self) -> Vec<&str> {
        self.intents.iter().map(|intent| intent.tag.as_str()).collect()
    }

    /// Tags in lexicographic order, matching the classifier's label order.
    pub fn sorted_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.intents.iter().map(|i| i.tag.clone()).collect();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Derive one training example per `(intent, pattern)` pair, in catalog
    /// order.
    pub fn training_examples(&self, normalizer: &TextNormalizer) -> Vec<TrainingExample> {
        self.intents
            .iter()
            .flat_map(|intent| {
                intent.patterns.iter().map(move |pattern| TrainingExample {
                    normalized_text: normalizer.normalize(pattern),
                    label: intent.tag.clone(),
                })
            })
            .collect()
    }

    /// Fingerprint of the training corpus this catalog produces.
    pub fn fingerprint(&self, normalizer: &TextNormalizer) -> u32 {
        corpus_fingerprint(&self.training_examples(normalizer))
    }
}
