//! Machine learning components for intent classification.
//!
//! - [`vectorizer`]: TF-IDF feature extraction
//! - [`classifier`]: one-vs-rest logistic regression
//! - [`bundle`]: the paired, persistable model

pub mod bundle;
pub mod classifier;
pub mod vectorizer;

pub use bundle::{Classification, ClassifierArtifact, LabelScore, ModelBundle, ModelMetadata};
pub use classifier::LogisticRegressionClassifier;
pub use vectorizer::{TfIdfVectorizer, VectorizerArtifact};

/// Version tag written into every model artifact.
pub const FORMAT_VERSION: u32 = 1;
