//! Model lifecycle: how a servable model bundle comes into existence.
//!
//! ```text
//! Uninitialized ─▶ Loading ─▶ Ready
//!                     │
//!                     ▼
//!                 Training ─▶ Ready
//!                     │
//!                     ▼
//!                   Fatal
//! ```
//!
//! `Ready` is the only state a bundle is handed out from. `Fatal` is
//! terminal: the caller must abort startup instead of serving.

use std::fmt;

use log::{debug, error, info, warn};
use serde::Serialize;

use crate::catalog::IntentCatalog;
use crate::config::TrainingConfig;
use crate::error::{GuidebotError, Result};
use crate::ml::bundle::ModelBundle;
use crate::model_store::ModelStore;

/// State of the model lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    Uninitialized,
    Loading,
    Training,
    Ready,
    Fatal,
}

impl ModelState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: ModelState) -> bool {
        use ModelState::*;
        matches!(
            (self, next),
            (Uninitialized, Loading)
                | (Uninitialized, Training)
                | (Loading, Ready)
                | (Loading, Training)
                | (Training, Ready)
                | (Training, Fatal)
                | (Ready, Training)
        )
    }

    /// Whether inference may be served in this state.
    pub fn is_servable(self) -> bool {
        self == ModelState::Ready
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelState::Uninitialized => "uninitialized",
            ModelState::Loading => "loading",
            ModelState::Training => "training",
            ModelState::Ready => "ready",
            ModelState::Fatal => "fatal",
        };
        f.write_str(name)
    }
}

/// Where a ready bundle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelOrigin {
    /// Read from the model store.
    Loaded,
    /// Freshly trained from the catalog.
    Trained,
}

impl fmt::Display for ModelOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelOrigin::Loaded => f.write_str("loaded"),
            ModelOrigin::Trained => f.write_str("trained"),
        }
    }
}

/// Tracks the lifecycle state and drives loading and training.
#[derive(Debug, Clone)]
pub struct ModelLifecycle {
    state: ModelState,
    history: Vec<ModelState>,
}

impl Default for ModelLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelLifecycle {
    pub fn new() -> Self {
        ModelLifecycle {
            state: ModelState::Uninitialized,
            history: vec![ModelState::Uninitialized],
        }
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    /// Every state visited so far, starting with `Uninitialized`.
    pub fn history(&self) -> &[ModelState] {
        &self.history
    }

    /// Move to `next`, rejecting illegal transitions.
    pub fn transition(&mut self, next: ModelState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(GuidebotError::internal(format!(
                "illegal model state transition {} -> {}",
                self.state, next
            )));
        }
        info!("Model state: {} -> {}", self.state, next);
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// Load the stored model for `catalog`, or train and persist a new one
    /// when no usable model is stored.
    ///
    /// Training failure moves the lifecycle to `Fatal` and returns
    /// [`GuidebotError::ModelUnavailable`]. A persist failure after a
    /// successful fit is only logged: the fresh bundle is still returned.
    pub fn load_or_train(
        &mut self,
        catalog: &IntentCatalog,
        store: &ModelStore,
        training: &TrainingConfig,
    ) -> Result<(ModelBundle, ModelOrigin)> {
        self.transition(ModelState::Loading)?;

        match store.load_for(catalog) {
            Ok(bundle) => {
                self.transition(ModelState::Ready)?;
                Ok((bundle, ModelOrigin::Loaded))
            }
            Err(e) => {
                if matches!(e, GuidebotError::NotFound(_)) {
                    info!("No stored model ({e}); training a new one");
                } else if e.is_unusable_model() {
                    warn!("Stored model is unusable ({e}); retraining");
                } else {
                    warn!("Loading stored model failed unexpectedly ({e}); retraining");
                }
                let bundle =
                    self.train_and_persist(catalog, store, training, PersistPolicy::BestEffort)?;
                Ok((bundle, ModelOrigin::Trained))
            }
        }
    }

    /// Train a new model from `catalog` and persist it, replacing any stored
    /// model.
    ///
    /// Unlike [`load_or_train`](Self::load_or_train), a persist failure is an
    /// error here: the lifecycle ends in `Fatal` and the storage error is
    /// returned.
    pub fn retrain(
        &mut self,
        catalog: &IntentCatalog,
        store: &ModelStore,
        training: &TrainingConfig,
    ) -> Result<ModelBundle> {
        self.train_and_persist(catalog, store, training, PersistPolicy::Required)
    }

    /// Train a model that is served from memory only, for when no model
    /// store can be opened.
    pub fn train_uncached(
        &mut self,
        catalog: &IntentCatalog,
        training: &TrainingConfig,
    ) -> Result<ModelBundle> {
        let bundle = self.fit(catalog, training)?;
        self.transition(ModelState::Ready)?;
        Ok(bundle)
    }

    fn train_and_persist(
        &mut self,
        catalog: &IntentCatalog,
        store: &ModelStore,
        training: &TrainingConfig,
        policy: PersistPolicy,
    ) -> Result<ModelBundle> {
        let bundle = self.fit(catalog, training)?;

        match (store.persist(&bundle), policy) {
            (Ok(()), _) => debug!("Stored freshly trained model"),
            (Err(e), PersistPolicy::BestEffort) => {
                warn!("Trained model could not be persisted, serving it anyway: {e}")
            }
            (Err(e), PersistPolicy::Required) => {
                error!("Trained model could not be persisted: {e}");
                self.transition(ModelState::Fatal)?;
                return Err(e);
            }
        }

        self.transition(ModelState::Ready)?;
        Ok(bundle)
    }

    fn fit(&mut self, catalog: &IntentCatalog, training: &TrainingConfig) -> Result<ModelBundle> {
        self.transition(ModelState::Training)?;

        match ModelBundle::train(catalog, training) {
            Ok(bundle) => Ok(bundle),
            Err(e) => {
                error!("Training failed: {e}");
                self.transition(ModelState::Fatal)?;
                Err(GuidebotError::model_unavailable(format!(
                    "training failed: {e}"
                )))
            }
        }
    }
}

/// Whether a persist failure after training is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PersistPolicy {
    BestEffort,
    Required,
}

/// Run the lifecycle once from `Uninitialized`.
pub fn load_or_train(
    catalog: &IntentCatalog,
    store: &ModelStore,
    training: &TrainingConfig,
) -> Result<(ModelBundle, ModelOrigin)> {
    ModelLifecycle::new().load_or_train(catalog, store, training)
}

/// Train and persist from `Uninitialized`, ignoring any stored model.
/// Fails if the new model cannot be stored.
pub fn retrain(
    catalog: &IntentCatalog,
    store: &ModelStore,
    training: &TrainingConfig,
) -> Result<ModelBundle> {
    ModelLifecycle::new().retrain(catalog, store, training)
}
