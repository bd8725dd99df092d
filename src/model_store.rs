//! Persistence of model bundles.
//!
//! A bundle is stored as two JSON artifacts, `vectorizer.json` and
//! `classifier.json`, inside one storage. They are loaded as a matched pair:
//! any missing, unreadable or inconsistent file makes the whole load fail
//! with [`GuidebotError::NotFound`] or [`GuidebotError::Corrupt`], never a
//! partial bundle.
//!
//! # Examples
//!
//! ```
//! use guidebot::catalog::IntentCatalog;
//! use guidebot::config::TrainingConfig;
//! use guidebot::ml::ModelBundle;
//! use guidebot::model_store::ModelStore;
//! use guidebot::storage::MemoryStorage;
//!
//! let catalog = IntentCatalog::builtin().unwrap();
//! let bundle = ModelBundle::train(&catalog, &TrainingConfig::default()).unwrap();
//!
//! let store = ModelStore::new(Box::new(MemoryStorage::new()));
//! store.persist(&bundle).unwrap();
//!
//! let loaded = store.load_for(&catalog).unwrap();
//! assert_eq!(loaded.predict("Hi").unwrap(), bundle.predict("Hi").unwrap());
//! ```

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::catalog::IntentCatalog;
use crate::error::{GuidebotError, Result, StorageError};
use crate::ml::bundle::{ClassifierArtifact, ModelBundle};
use crate::ml::vectorizer::VectorizerArtifact;
use crate::storage::{FileStorage, Storage, StorageConfig};

/// File name of the vectorizer artifact.
pub const VECTORIZER_FILE: &str = "vectorizer.json";

/// File name of the classifier artifact.
pub const CLASSIFIER_FILE: &str = "classifier.json";

/// Prefixes of the temporary names artifacts are written under.
const TEMP_PREFIXES: [&str; 2] = ["vectorizer", "classifier"];

/// Loads and persists model bundles through a [`Storage`] backend.
#[derive(Debug)]
pub struct ModelStore {
    storage: Box<dyn Storage>,
}

impl ModelStore {
    /// Create a model store over any storage backend.
    pub fn new(storage: Box<dyn Storage>) -> Self {
        ModelStore { storage }
    }

    /// Open a file-backed store, creating the directory if needed.
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let storage = FileStorage::new(directory, StorageConfig::default())?;
        Ok(Self::new(Box::new(storage)))
    }

    /// Whether both artifacts are present. Says nothing about whether they
    /// are usable.
    pub fn exists(&self) -> bool {
        self.storage.file_exists(VECTORIZER_FILE) && self.storage.file_exists(CLASSIFIER_FILE)
    }

    /// Load the stored bundle.
    pub fn load(&self) -> Result<ModelBundle> {
        let vectorizer: VectorizerArtifact = self.read_artifact(VECTORIZER_FILE)?;
        let classifier: ClassifierArtifact = self.read_artifact(CLASSIFIER_FILE)?;
        let bundle = ModelBundle::from_artifacts(vectorizer, classifier)?;

        debug!(
            "Loaded model: {} terms, labels {:?}, trained at {}",
            bundle.vectorizer().vocabulary_size(),
            bundle.labels(),
            bundle.metadata().trained_at
        );
        Ok(bundle)
    }

    /// Load the stored bundle and check that it was trained on exactly this
    /// catalog. A stale bundle is reported as corrupt.
    pub fn load_for(&self, catalog: &IntentCatalog) -> Result<ModelBundle> {
        let bundle = self.load()?;
        bundle.check_compatible(catalog)?;
        Ok(bundle)
    }

    /// Persist a bundle, replacing whatever is stored.
    ///
    /// Both artifacts are fully written under temporary names before either
    /// is renamed into place. Should the process die between the two
    /// renames, the vocabulary fingerprint makes the mixed pair fail to load.
    /// Temporary files left behind by such a crash are removed first.
    pub fn persist(&self, bundle: &ModelBundle) -> Result<()> {
        self.sweep_temp_files()?;
        let (vectorizer, classifier) = bundle.to_artifacts();

        let vectorizer_tmp = self.write_temp(TEMP_PREFIXES[0], &vectorizer)?;
        let classifier_tmp = match self.write_temp(TEMP_PREFIXES[1], &classifier) {
            Ok(name) => name,
            Err(e) => {
                self.discard(&vectorizer_tmp);
                return Err(e);
            }
        };

        let renamed = self
            .storage
            .rename_file(&vectorizer_tmp, VECTORIZER_FILE)
            .and_then(|_| self.storage.rename_file(&classifier_tmp, CLASSIFIER_FILE));
        if let Err(e) = renamed {
            self.discard(&vectorizer_tmp);
            self.discard(&classifier_tmp);
            return Err(e);
        }
        self.storage.sync()?;

        info!(
            "Persisted model ({} terms, {} labels)",
            bundle.vectorizer().vocabulary_size(),
            bundle.labels().len()
        );
        Ok(())
    }

    /// Size in bytes of each stored artifact, keyed by file name. Missing
    /// artifacts are left out.
    pub fn artifact_sizes(&self) -> Result<BTreeMap<String, u64>> {
        let mut sizes = BTreeMap::new();
        for name in [VECTORIZER_FILE, CLASSIFIER_FILE] {
            if self.storage.file_exists(name) {
                sizes.insert(name.to_string(), self.storage.file_size(name)?);
            }
        }
        Ok(sizes)
    }

    /// Remove both artifacts.
    pub fn clear(&self) -> Result<()> {
        self.storage.delete_file(VECTORIZER_FILE)?;
        self.storage.delete_file(CLASSIFIER_FILE)
    }

    fn read_artifact<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        if !self.storage.file_exists(name) {
            return Err(GuidebotError::not_found(format!("model artifact {name}")));
        }

        let mut input = self.storage.open_input(name).map_err(|e| match e {
            GuidebotError::Storage(StorageError::FileNotFound(_)) => {
                GuidebotError::not_found(format!("model artifact {name}"))
            }
            other => other,
        })?;
        let mut json = String::new();
        input
            .read_to_string(&mut json)
            .map_err(|e| GuidebotError::corrupt(format!("{name} is unreadable: {e}")))?;
        input.close()?;

        serde_json::from_str(&json).map_err(|e| GuidebotError::corrupt(format!("{name}: {e}")))
    }

    fn write_temp<T: Serialize>(&self, prefix: &str, artifact: &T) -> Result<String> {
        let json = serde_json::to_vec_pretty(artifact)?;
        let (temp_name, mut output) = self.storage.create_temp_output(prefix)?;

        let written = output
            .write_all(&json)
            .map_err(GuidebotError::from)
            .and_then(|_| output.close());
        if let Err(e) = written {
            self.discard(&temp_name);
            return Err(e);
        }

        Ok(temp_name)
    }

    fn sweep_temp_files(&self) -> Result<()> {
        for name in self.storage.list_files()? {
            let stale = name.ends_with(".tmp")
                && TEMP_PREFIXES
                    .iter()
                    .any(|prefix| name.starts_with(&format!("{prefix}_")));
            if stale {
                debug!("Removing leftover temporary file {name}");
                self.discard(&name);
            }
        }
        Ok(())
    }

    fn discard(&self, name: &str) {
        if let Err(e) = self.storage.delete_file(name) {
            warn!("Failed to remove temporary file {name}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;
    use crate::storage::MemoryStorage;

    fn trained() -> (IntentCatalog, ModelBundle) {
        let catalog = IntentCatalog::builtin().unwrap();
        let bundle = ModelBundle::train(&catalog, &TrainingConfig::default()).unwrap();
        (catalog, bundle)
    }

    #[test]
    fn test_missing_model_is_not_found() {
        let store = ModelStore::new(Box::new(MemoryStorage::new()));
        assert!(!store.exists());
        assert!(matches!(store.load(), Err(GuidebotError::NotFound(_))));
    }

    #[test]
    fn test_persist_writes_only_final_names() {
        let storage = MemoryStorage::new();
        let store = ModelStore::new(Box::new(storage.clone()));
        let (_, bundle) = trained();

        store.persist(&bundle).unwrap();
        assert!(store.exists());
        assert_eq!(
            storage.list_files().unwrap(),
            vec![CLASSIFIER_FILE, VECTORIZER_FILE]
        );
    }

    #[test]
    fn test_persist_removes_leftover_temp_files() {
        let storage = MemoryStorage::new();
        storage.put("vectorizer_3.tmp", b"{").unwrap();
        storage.put("classifier_0.tmp", b"").unwrap();
        let store = ModelStore::new(Box::new(storage.clone()));
        let (_, bundle) = trained();

        store.persist(&bundle).unwrap();
        assert_eq!(
            storage.list_files().unwrap(),
            vec![CLASSIFIER_FILE, VECTORIZER_FILE]
        );
    }

    #[test]
    fn test_artifact_sizes() {
        let storage = MemoryStorage::new();
        let store = ModelStore::new(Box::new(storage.clone()));
        assert!(store.artifact_sizes().unwrap().is_empty());

        let (_, bundle) = trained();
        store.persist(&bundle).unwrap();
        let sizes = store.artifact_sizes().unwrap();
        assert_eq!(sizes.len(), 2);
        assert_eq!(
            sizes[VECTORIZER_FILE],
            storage.file_size(VECTORIZER_FILE).unwrap()
        );
        assert!(sizes[CLASSIFIER_FILE] > 0);
    }

    #[test]
    fn test_round_trip_predictions() {
        let store = ModelStore::new(Box::new(MemoryStorage::new()));
        let (catalog, bundle) = trained();
        store.persist(&bundle).unwrap();

        let loaded = store.load_for(&catalog).unwrap();
        for text in ["Hi", "See you later", "", "random words", "good bye"] {
            assert_eq!(loaded.predict(text).unwrap(), bundle.predict(text).unwrap());
        }
        assert_eq!(loaded.metadata(), bundle.metadata());
    }

    #[test]
    fn test_half_written_pair_is_not_found() {
        let storage = MemoryStorage::new();
        let store = ModelStore::new(Box::new(storage.clone()));
        let (_, bundle) = trained();
        store.persist(&bundle).unwrap();

        storage.delete_file(CLASSIFIER_FILE).unwrap();
        assert!(matches!(store.load(), Err(GuidebotError::NotFound(_))));
    }

    #[test]
    fn test_garbage_is_corrupt() {
        let storage = MemoryStorage::new();
        let store = ModelStore::new(Box::new(storage.clone()));
        let (_, bundle) = trained();
        store.persist(&bundle).unwrap();

        storage.put(VECTORIZER_FILE, b"not json at all").unwrap();
        assert!(matches!(store.load(), Err(GuidebotError::Corrupt(_))));

        storage.put(VECTORIZER_FILE, &[0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(store.load(), Err(GuidebotError::Corrupt(_))));
    }

    #[test]
    fn test_mixed_pair_is_corrupt() {
        let storage = MemoryStorage::new();
        let store = ModelStore::new(Box::new(storage.clone()));
        let (catalog, bundle) = trained();
        store.persist(&bundle).unwrap();
        let old_classifier = storage.get(CLASSIFIER_FILE).unwrap();

        let mut intents = catalog.intents().to_vec();
        intents[0].patterns.push("Greetings everyone".to_string());
        let bigger = IntentCatalog::new(intents).unwrap();
        let retrained = ModelBundle::train(&bigger, &TrainingConfig::default()).unwrap();
        store.persist(&retrained).unwrap();

        storage.put(CLASSIFIER_FILE, &old_classifier).unwrap();
        assert!(matches!(store.load(), Err(GuidebotError::Corrupt(_))));
    }

    #[test]
    fn test_stale_model_for_catalog() {
        let store = ModelStore::new(Box::new(MemoryStorage::new()));
        let (catalog, bundle) = trained();
        store.persist(&bundle).unwrap();

        let mut intents = catalog.intents().to_vec();
        intents[1].responses.push("Later!".to_string());
        let same_patterns = IntentCatalog::new(intents).unwrap();
        assert!(store.load_for(&same_patterns).is_ok());

        let mut intents = catalog.intents().to_vec();
        intents[1].patterns.push("Farewell".to_string());
        let new_patterns = IntentCatalog::new(intents).unwrap();
        assert!(matches!(
            store.load_for(&new_patterns),
            Err(GuidebotError::Corrupt(_))
        ));
    }

    #[test]
    fn test_clear() {
        let store = ModelStore::new(Box::new(MemoryStorage::new()));
        let (_, bundle) = trained();
        store.persist(&bundle).unwrap();
        store.clear().unwrap();
        assert!(!store.exists());
    }
}
