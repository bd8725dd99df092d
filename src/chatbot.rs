//! The serving boundary: utterance in, canned reply out.
//!
//! A [`Chatbot`] is an immutable pair of catalog and model bundle behind
//! `Arc`s. It can be cloned freely and shared across threads; every request
//! is a pure function of the bundle and the input text.
//!
//! ```
//! use std::sync::Arc;
//! use guidebot::catalog::IntentCatalog;
//! use guidebot::chatbot::{Chatbot, InferenceRequest};
//! use guidebot::config::TrainingConfig;
//! use guidebot::ml::ModelBundle;
//!
//! let catalog = IntentCatalog::builtin().unwrap();
//! let bundle = ModelBundle::train(&catalog, &TrainingConfig::default()).unwrap();
//! let bot = Chatbot::new(Arc::new(catalog), Arc::new(bundle));
//!
//! let outcome = bot.handle(&InferenceRequest::new("Hi"));
//! assert!(outcome.is_ok());
//! ```

use std::sync::Arc;

use log::{debug, error, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::IntentCatalog;
use crate::config::ChatbotConfig;
use crate::error::{GuidebotError, Result};
use crate::lifecycle::{ModelLifecycle, ModelOrigin};
use crate::ml::bundle::{Classification, ModelBundle};
use crate::model_store::ModelStore;
use crate::response::ResponseSelector;

/// An inference request from the (authenticated) caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// The user's utterance. A missing message is treated as empty.
    #[serde(default)]
    pub message: String,
}

impl InferenceRequest {
    pub fn new<S: Into<String>>(message: S) -> Self {
        InferenceRequest {
            message: message.into(),
        }
    }

    /// Parse a request from JSON. Malformed input is an input error.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GuidebotError::input(format!("malformed inference request: {e}")))
    }
}

/// Outcome status, mirroring what the web layer turns into an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InferenceStatus {
    Ok,
    BadRequest,
    ServerFault,
}

impl InferenceStatus {
    pub fn http_code(self) -> u16 {
        match self {
            InferenceStatus::Ok => 200,
            InferenceStatus::BadRequest => 400,
            InferenceStatus::ServerFault => 500,
        }
    }
}

/// Body of an inference outcome: `{"response": …}` or `{"error": …}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InferenceBody {
    Response { response: String },
    Error { error: String },
}

/// Result of handling one inference request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceOutcome {
    pub status: InferenceStatus,
    pub body: InferenceBody,
}

impl InferenceOutcome {
    pub fn response<S: Into<String>>(response: S) -> Self {
        InferenceOutcome {
            status: InferenceStatus::Ok,
            body: InferenceBody::Response {
                response: response.into(),
            },
        }
    }

    pub fn error<S: Into<String>>(status: InferenceStatus, error: S) -> Self {
        InferenceOutcome {
            status,
            body: InferenceBody::Error {
                error: error.into(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == InferenceStatus::Ok
    }

    /// The reply text, if the request succeeded.
    pub fn reply(&self) -> Option<&str> {
        match &self.body {
            InferenceBody::Response { response } => Some(response),
            InferenceBody::Error { .. } => None,
        }
    }

    /// Serialize the body as a single JSON line.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.body)?)
    }
}

/// Immutable chatbot: catalog, trained model and response selector.
#[derive(Debug, Clone)]
pub struct Chatbot {
    catalog: Arc<IntentCatalog>,
    bundle: Arc<ModelBundle>,
    selector: ResponseSelector,
}

impl Chatbot {
    pub fn new(catalog: Arc<IntentCatalog>, bundle: Arc<ModelBundle>) -> Self {
        Chatbot {
            catalog,
            bundle,
            selector: ResponseSelector::new(),
        }
    }

    pub fn with_selector(mut self, selector: ResponseSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Build a ready chatbot from configuration: read the catalog, then load
    /// the stored model or train one.
    ///
    /// When the model directory cannot be opened the model is trained and
    /// served without being stored. Catalog and training failures are
    /// startup failures and must not be served around.
    pub fn initialize(config: &ChatbotConfig) -> Result<(Self, ModelOrigin)> {
        config.validate()?;

        let catalog = match &config.catalog_path {
            Some(path) => IntentCatalog::from_file(path)?,
            None => IntentCatalog::builtin()?,
        };
        let mut lifecycle = ModelLifecycle::new();
        let (bundle, origin) = match ModelStore::open(&config.model_dir) {
            Ok(store) => lifecycle.load_or_train(&catalog, &store, &config.training)?,
            Err(e) => {
                warn!(
                    "Model store at {} is unusable ({e}); serving an uncached model",
                    config.model_dir.display()
                );
                let bundle = lifecycle.train_uncached(&catalog, &config.training)?;
                (bundle, ModelOrigin::Trained)
            }
        };

        Ok((Self::new(Arc::new(catalog), Arc::new(bundle)), origin))
    }

    pub fn catalog(&self) -> &IntentCatalog {
        &self.catalog
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    /// Classify an utterance, reporting per-label scores.
    pub fn classify(&self, text: &str) -> Result<Classification> {
        self.bundle
            .classify(text)
            .map_err(|e| GuidebotError::inference(e.to_string()))
    }

    /// Reply to an utterance using the thread-local RNG.
    pub fn reply(&self, text: &str) -> Result<String> {
        self.reply_with_rng(text, &mut rand::rng())
    }

    /// Reply to an utterance using the given RNG.
    pub fn reply_with_rng<R: Rng + ?Sized>(&self, text: &str, rng: &mut R) -> Result<String> {
        self.respond_with_rng(text, rng).map(|(_, reply)| reply)
    }

    /// Predict the tag of an utterance and pick a reply for it, returning
    /// both.
    pub fn respond_with_rng<R: Rng + ?Sized>(
        &self,
        text: &str,
        rng: &mut R,
    ) -> Result<(String, String)> {
        let tag = self
            .bundle
            .predict(text)
            .map_err(|e| GuidebotError::inference(e.to_string()))?;
        debug!("Classified {text:?} as '{tag}'");
        let reply = self.selector.select_or_fallback(&self.catalog, &tag, rng);
        Ok((tag, reply))
    }

    /// Handle one inference request. Never panics and never fails: faults
    /// become an error outcome.
    pub fn handle(&self, request: &InferenceRequest) -> InferenceOutcome {
        self.handle_with_rng(request, &mut rand::rng())
    }

    pub fn handle_with_rng<R: Rng + ?Sized>(
        &self,
        request: &InferenceRequest,
        rng: &mut R,
    ) -> InferenceOutcome {
        match self.reply_with_rng(&request.message, rng) {
            Ok(reply) => InferenceOutcome::response(reply),
            Err(e) => {
                error!("Inference request failed: {e}");
                InferenceOutcome::error(InferenceStatus::ServerFault, e.to_string())
            }
        }
    }

    /// Handle a raw JSON request line.
    pub fn handle_json<R: Rng + ?Sized>(&self, json: &str, rng: &mut R) -> InferenceOutcome {
        match InferenceRequest::from_json(json) {
            Ok(request) => self.handle_with_rng(&request, rng),
            Err(e) => {
                debug!("Rejected request: {e}");
                InferenceOutcome::error(InferenceStatus::BadRequest, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn bot() -> Chatbot {
        let catalog = IntentCatalog::builtin().unwrap();
        let bundle = ModelBundle::train(&catalog, &TrainingConfig::default()).unwrap();
        Chatbot::new(Arc::new(catalog), Arc::new(bundle))
    }

    #[test]
    fn test_reply_scenarios() {
        let bot = bot();
        let mut rng = StdRng::seed_from_u64(5);

        let greeting = bot.catalog().get("greeting").unwrap().responses.clone();
        let farewell = bot.catalog().get("farewell").unwrap().responses.clone();

        assert_eq!(bot.classify("Hi").unwrap().tag, "greeting");
        assert!(greeting.contains(&bot.reply_with_rng("Hi", &mut rng).unwrap()));

        assert_eq!(bot.classify("See you later").unwrap().tag, "farewell");
        assert!(farewell.contains(&bot.reply_with_rng("See you later", &mut rng).unwrap()));

        assert!(!bot.reply("").unwrap().is_empty());
    }

    #[test]
    fn test_handle_outcomes() {
        let bot = bot();
        let mut rng = StdRng::seed_from_u64(9);

        let outcome = bot.handle_with_rng(&InferenceRequest::new(""), &mut rng);
        assert!(outcome.is_ok());
        assert_eq!(outcome.status.http_code(), 200);
        assert!(outcome.reply().is_some());

        let json = bot.handle_json(r#"{"message": "Bye"}"#, &mut rng).to_json().unwrap();
        assert!(json.starts_with(r#"{"response":"#));

        let bad = bot.handle_json("{oops", &mut rng);
        assert_eq!(bad.status, InferenceStatus::BadRequest);
        assert!(bad.to_json().unwrap().starts_with(r#"{"error":"#));
        assert!(bad.reply().is_none());

        let missing = bot.handle_json("{}", &mut rng);
        assert!(missing.is_ok());
    }

    #[test]
    fn test_unknown_tag_gets_fallback() {
        let trained_on = IntentCatalog::builtin().unwrap();
        let bundle = ModelBundle::train(&trained_on, &TrainingConfig::default()).unwrap();

        let mut intents = trained_on.intents().to_vec();
        intents.retain(|intent| intent.tag != "greeting");
        let drifted = IntentCatalog::new(intents).unwrap();

        let bot = Chatbot::new(Arc::new(drifted), Arc::new(bundle));
        let outcome = bot.handle(&InferenceRequest::new("Hello"));
        assert!(outcome.is_ok());
        assert_eq!(
            outcome.reply(),
            Some("I'm still learning. Can you rephrase that?")
        );
    }

    #[test]
    fn test_chatbot_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Chatbot>();

        let bot = bot();
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let bot = bot.clone();
                std::thread::spawn(move || {
                    let mut rng = StdRng::seed_from_u64(i);
                    bot.reply_with_rng("See you later", &mut rng).unwrap()
                })
            })
            .collect();
        for handle in handles {
            let reply = handle.join().unwrap();
            assert!(bot.catalog().get("farewell").unwrap().responses.contains(&reply));
        }
    }

    #[test]
    fn test_respond_returns_tag_and_reply() {
        let bot = bot();
        let mut rng = StdRng::seed_from_u64(3);

        let (tag, reply) = bot.respond_with_rng("Talk to you later", &mut rng).unwrap();
        assert_eq!(tag, "farewell");
        assert!(bot.catalog().get("farewell").unwrap().responses.contains(&reply));

        let mut a = StdRng::seed_from_u64(21);
        let mut b = StdRng::seed_from_u64(21);
        assert_eq!(
            bot.respond_with_rng("Hi", &mut a).unwrap().1,
            bot.reply_with_rng("Hi", &mut b).unwrap()
        );
    }

    #[test]
    fn test_initialize_without_usable_model_dir_serves_uncached() {
        let dir = tempfile::TempDir::new().unwrap();
        let not_a_dir = dir.path().join("model");
        std::fs::write(&not_a_dir, b"plain file").unwrap();
        let config = ChatbotConfig::default().with_model_dir(&not_a_dir);

        let (bot, origin) = Chatbot::initialize(&config).unwrap();
        assert_eq!(origin, ModelOrigin::Trained);
        assert_eq!(bot.classify("See you later").unwrap().tag, "farewell");
        assert!(not_a_dir.is_file());
    }

    #[test]
    fn test_initialize_trains_then_loads() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ChatbotConfig::default().with_model_dir(dir.path().join("model"));

        let (bot, origin) = Chatbot::initialize(&config).unwrap();
        assert_eq!(origin, ModelOrigin::Trained);
        assert_eq!(bot.classify("Hello").unwrap().tag, "greeting");

        let (_, origin) = Chatbot::initialize(&config).unwrap();
        assert_eq!(origin, ModelOrigin::Loaded);
    }
}
