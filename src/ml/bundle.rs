//! The model bundle: a fitted vectorizer paired with its classifier.
//!
//! A bundle is built once (by training on a catalog or by loading stored
//! artifacts) and is read-only afterwards. It is the unit of persistence.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::catalog::{IntentCatalog, corpus_fingerprint};
use crate::config::TrainingConfig;
use crate::error::{GuidebotError, Result};
use crate::ml::FORMAT_VERSION;
use crate::ml::classifier::LogisticRegressionClassifier;
use crate::ml::vectorizer::{TfIdfVectorizer, VectorizerArtifact};
use crate::normalizer::TextNormalizer;

/// Facts about the training run that produced a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Training timestamp.
    pub trained_at: DateTime<Utc>,
    /// Number of training examples used.
    pub training_examples: usize,
    /// Fingerprint of the normalized training corpus.
    pub corpus_fingerprint: u32,
    /// Newton iterations used per label.
    pub iterations: BTreeMap<String, usize>,
}

/// Serialized form of a trained classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierArtifact {
    pub format_version: u32,
    pub labels: Vec<String>,
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
    pub c: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Fingerprint of the vocabulary the weights were trained against.
    pub vocabulary_fingerprint: u32,
    pub metadata: ModelMetadata,
}

/// Score of one label for one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Result of classifying one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Predicted intent tag.
    pub tag: String,
    /// The utterance after normalization.
    pub normalized: String,
    /// Decision score per label, in label order.
    pub scores: Vec<LabelScore>,
}

/// Paired vectorizer and classifier, plus the normalizer that feeds them.
#[derive(Debug, Clone)]
pub struct ModelBundle {
    normalizer: TextNormalizer,
    vectorizer: TfIdfVectorizer,
    classifier: LogisticRegressionClassifier,
    metadata: ModelMetadata,
}

impl ModelBundle {
    /// Train a bundle on a catalog with the default normalizer.
    pub fn train(catalog: &IntentCatalog, config: &TrainingConfig) -> Result<Self> {
        Self::train_with_normalizer(catalog, TextNormalizer::new(), config)
    }

    /// Train a bundle on a catalog.
    ///
    /// Fails with a training error when the corpus is empty, when every
    /// pattern normalizes to nothing, or when fewer than two intents exist.
    pub fn train_with_normalizer(
        catalog: &IntentCatalog,
        normalizer: TextNormalizer,
        config: &TrainingConfig,
    ) -> Result<Self> {
        let examples = catalog.training_examples(&normalizer);
        if examples.is_empty() {
            return Err(GuidebotError::training("catalog produced no training examples"));
        }

        let documents: Vec<String> = examples.iter().map(|e| e.normalized_text.clone()).collect();
        let labels: Vec<String> = examples.iter().map(|e| e.label.clone()).collect();

        let mut vectorizer = TfIdfVectorizer::new();
        let vectors = vectorizer.fit_transform(&documents)?;
        let classifier = LogisticRegressionClassifier::fit(&vectors, &labels, config)?;

        let metadata = ModelMetadata {
            trained_at: Utc::now(),
            training_examples: examples.len(),
            corpus_fingerprint: corpus_fingerprint(&examples),
            iterations: classifier
                .labels()
                .iter()
                .cloned()
                .zip(classifier.iterations().iter().copied())
                .collect(),
        };

        info!(
            "Trained model on {} examples: {} terms, {} labels, iterations {:?}",
            metadata.training_examples,
            vectorizer.vocabulary_size(),
            classifier.labels().len(),
            metadata.iterations
        );

        Ok(ModelBundle {
            normalizer,
            vectorizer,
            classifier,
            metadata,
        })
    }

    /// Rebuild a bundle from its two stored artifacts.
    ///
    /// The artifacts must share a format version and the classifier must
    /// have been trained against exactly this vocabulary.
    pub fn from_artifacts(
        vectorizer: VectorizerArtifact,
        classifier: ClassifierArtifact,
    ) -> Result<Self> {
        if classifier.format_version != FORMAT_VERSION {
            return Err(GuidebotError::corrupt(format!(
                "classifier format version {} (expected {})",
                classifier.format_version, FORMAT_VERSION
            )));
        }

        let vectorizer = TfIdfVectorizer::from_artifact(vectorizer)?;
        if vectorizer.vocabulary_fingerprint() != classifier.vocabulary_fingerprint {
            return Err(GuidebotError::corrupt(format!(
                "vocabulary fingerprint {:08x} does not match classifier's {:08x}",
                vectorizer.vocabulary_fingerprint(),
                classifier.vocabulary_fingerprint
            )));
        }

        let config = TrainingConfig {
            c: classifier.c,
            max_iterations: classifier.max_iterations,
            tolerance: classifier.tolerance,
        };
        let mut model = LogisticRegressionClassifier::from_parts(
            classifier.labels,
            classifier.weights,
            classifier.biases,
            config,
            vectorizer.vocabulary_size(),
        )?;
        let iterations = model
            .labels()
            .iter()
            .map(|label| classifier.metadata.iterations.get(label).copied().unwrap_or(0))
            .collect();
        model.set_iterations(iterations);

        Ok(ModelBundle {
            normalizer: TextNormalizer::new(),
            vectorizer,
            classifier: model,
            metadata: classifier.metadata,
        })
    }

    /// Export the bundle as its two artifacts.
    pub fn to_artifacts(&self) -> (VectorizerArtifact, ClassifierArtifact) {
        let config = self.classifier.config();
        let classifier = ClassifierArtifact {
            format_version: FORMAT_VERSION,
            labels: self.classifier.labels().to_vec(),
            weights: self.classifier.weights().to_vec(),
            biases: self.classifier.biases().to_vec(),
            c: config.c,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            vocabulary_fingerprint: self.vectorizer.vocabulary_fingerprint(),
            metadata: self.metadata.clone(),
        };
        (self.vectorizer.to_artifact(), classifier)
    }

    /// Reject a bundle that was not trained on this exact catalog.
    pub fn check_compatible(&self, catalog: &IntentCatalog) -> Result<()> {
        let tags = catalog.sorted_tags();
        if self.classifier.labels() != tags.as_slice() {
            return Err(GuidebotError::corrupt(format!(
                "stale model: labels {:?} differ from catalog tags {:?}",
                self.classifier.labels(),
                tags
            )));
        }

        let fingerprint = catalog.fingerprint(&self.normalizer);
        if fingerprint != self.metadata.corpus_fingerprint {
            return Err(GuidebotError::corrupt(format!(
                "stale model: corpus fingerprint {:08x} differs from catalog's {:08x}",
                self.metadata.corpus_fingerprint, fingerprint
            )));
        }

        Ok(())
    }

    /// Normalize, vectorize and score an utterance.
    pub fn classify(&self, text: &str) -> Result<Classification> {
        let normalized = self.normalizer.normalize(text);
        let features = self.vectorizer.transform(&normalized)?;
        let raw_scores = self.classifier.decision_scores(&features)?;
        let tag = self.classifier.predict(&features)?.to_string();

        let scores = self
            .classifier
            .labels()
            .iter()
            .zip(raw_scores)
            .map(|(label, score)| LabelScore {
                label: label.clone(),
                score,
            })
            .collect();

        Ok(Classification {
            tag,
            normalized,
            scores,
        })
    }

    /// Predict the intent tag of an utterance.
    pub fn predict(&self, text: &str) -> Result<String> {
        let normalized = self.normalizer.normalize(text);
        let features = self.vectorizer.transform(&normalized)?;
        Ok(self.classifier.predict(&features)?.to_string())
    }

    pub fn labels(&self) -> &[String] {
        self.classifier.labels()
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn vectorizer(&self) -> &TfIdfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &LogisticRegressionClassifier {
        &self.classifier
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }
}
