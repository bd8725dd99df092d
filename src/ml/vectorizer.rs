//! TF-IDF vectorizer for text feature extraction.
//!
//! The vocabulary is the sorted set of distinct terms of the training
//! corpus; a term's feature index is its rank. Weights use smoothed inverse
//! document frequency and every transformed vector is L2-normalized.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, SimpleAnalyzer};
use crate::error::{GuidebotError, Result};
use crate::ml::FORMAT_VERSION;

/// Serialized form of a fitted vectorizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerArtifact {
    pub format_version: u32,
    pub vocabulary: Vec<String>,
    pub idf: Vec<f64>,
}

/// TF-IDF vectorizer for text feature extraction.
#[derive(Clone)]
pub struct TfIdfVectorizer {
    /// Vocabulary: word -> index mapping.
    vocabulary: HashMap<String, usize>,
    /// Terms ordered by index.
    terms: Vec<String>,
    /// Inverse document frequency for each word.
    idf: Vec<f64>,
    /// Analyzer for splitting normalized text into terms.
    analyzer: Arc<dyn Analyzer>,
}

impl std::fmt::Debug for TfIdfVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfIdfVectorizer")
            .field("vocabulary_size", &self.terms.len())
            .field("analyzer", &self.analyzer.name())
            .finish()
    }
}

impl TfIdfVectorizer {
    /// Create an unfitted vectorizer that splits terms on whitespace.
    pub fn new() -> Self {
        Self::with_analyzer(Arc::new(SimpleAnalyzer::whitespace()))
    }

    /// Create an unfitted vectorizer with the specified analyzer.
    pub fn with_analyzer(analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            vocabulary: HashMap::new(),
            terms: Vec::new(),
            idf: Vec::new(),
            analyzer,
        }
    }

    /// Fit the vectorizer on training documents.
    ///
    /// Fails when the corpus is empty or contains no terms at all.
    pub fn fit(&mut self, documents: &[String]) -> Result<()> {
        if documents.is_empty() {
            return Err(GuidebotError::training("cannot fit vectorizer on an empty corpus"));
        }

        let n_documents = documents.len();
        let mut document_frequency: BTreeMap<String, usize> = BTreeMap::new();

        for doc in documents {
            let unique_tokens: HashSet<String> = self.tokenize(doc)?.into_iter().collect();
            for token in unique_tokens {
                *document_frequency.entry(token).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(GuidebotError::training(
                "training corpus has an empty vocabulary",
            ));
        }

        // BTreeMap iteration is sorted, so index == lexicographic rank.
        let mut terms = Vec::with_capacity(document_frequency.len());
        let mut idf = Vec::with_capacity(document_frequency.len());
        for (term, df) in document_frequency {
            // IDF = ln((N + 1) / (df + 1)) + 1
            idf.push(((n_documents as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0);
            terms.push(term);
        }

        self.vocabulary = Self::index(&terms);
        self.terms = terms;
        self.idf = idf;

        Ok(())
    }

    /// Fit on the documents and transform each of them.
    pub fn fit_transform(&mut self, documents: &[String]) -> Result<Vec<Vec<f64>>> {
        self.fit(documents)?;
        documents.iter().map(|doc| self.transform(doc)).collect()
    }

    /// Transform a document into an L2-normalized TF-IDF feature vector.
    ///
    /// Terms outside the fitted vocabulary are ignored. A document with no
    /// known term maps to the zero vector.
    pub fn transform(&self, document: &str) -> Result<Vec<f64>> {
        let mut features = vec![0.0; self.terms.len()];

        for token in self.tokenize(document)? {
            if let Some(&idx) = self.vocabulary.get(&token) {
                features[idx] += 1.0;
            }
        }

        for (idx, value) in features.iter_mut().enumerate() {
            *value *= self.idf[idx];
        }

        let norm = features.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for value in &mut features {
                *value /= norm;
            }
        }

        Ok(features)
    }

    fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.analyzer.analyze(text)?.map(|token| token.text).collect())
    }

    fn index(terms: &[String]) -> HashMap<String, usize> {
        terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect()
    }

    /// Get the size of the vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    /// Check whether the vectorizer has been fitted.
    pub fn is_fitted(&self) -> bool {
        !self.terms.is_empty()
    }

    /// Terms in feature-index order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Feature index of a term.
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// CRC32 of the vocabulary, used to pair classifier weights with the
    /// feature space they were trained on.
    pub fn vocabulary_fingerprint(&self) -> u32 {
        vocabulary_fingerprint(&self.terms)
    }

    /// Export the fitted state.
    pub fn to_artifact(&self) -> VectorizerArtifact {
        VectorizerArtifact {
            format_version: FORMAT_VERSION,
            vocabulary: self.terms.clone(),
            idf: self.idf.clone(),
        }
    }

    /// Rebuild a vectorizer from an artifact, rejecting anything that could
    /// not have come out of [`fit`](Self::fit).
    pub fn from_artifact(artifact: VectorizerArtifact) -> Result<Self> {
        if artifact.format_version != FORMAT_VERSION {
            return Err(GuidebotError::corrupt(format!(
                "vectorizer format version {} (expected {})",
                artifact.format_version, FORMAT_VERSION
            )));
        }
        if artifact.vocabulary.is_empty() {
            return Err(GuidebotError::corrupt("vectorizer vocabulary is empty"));
        }
        if artifact.vocabulary.len() != artifact.idf.len() {
            return Err(GuidebotError::corrupt(format!(
                "vectorizer has {} terms but {} idf weights",
                artifact.vocabulary.len(),
                artifact.idf.len()
            )));
        }
        if artifact.vocabulary.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(GuidebotError::corrupt(
                "vectorizer vocabulary is not sorted or has duplicates",
            ));
        }
        if artifact.idf.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(GuidebotError::corrupt("vectorizer has invalid idf weights"));
        }

        let mut vectorizer = Self::new();
        vectorizer.vocabulary = Self::index(&artifact.vocabulary);
        vectorizer.terms = artifact.vocabulary;
        vectorizer.idf = artifact.idf;
        Ok(vectorizer)
    }
}

impl Default for TfIdfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

/// CRC32 over a vocabulary in index order.
pub fn vocabulary_fingerprint(terms: &[String]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    for term in terms {
        hasher.update(term.as_bytes());
        hasher.update(b"\n");
    }
    hasher.finalize()
}
