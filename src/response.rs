//! Response selection for a predicted intent.
//!
//! Replies are drawn uniformly at random from the intent's response list.
//! The random source is a parameter, so tests can pass a seeded RNG.
//!
//! ```
//! use guidebot::catalog::IntentCatalog;
//! use guidebot::response::ResponseSelector;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let catalog = IntentCatalog::builtin().unwrap();
//! let selector = ResponseSelector::new();
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! let reply = selector.select(&catalog, "farewell", &mut rng).unwrap();
//! assert!(catalog.get("farewell").unwrap().responses.contains(&reply));
//! ```

use log::error;
use rand::Rng;
use rand::seq::IndexedRandom;

use crate::catalog::{FALLBACK_RESPONSE, IntentCatalog};
use crate::error::{GuidebotError, Result};

/// Picks a canned reply for a tag.
#[derive(Debug, Clone)]
pub struct ResponseSelector {
    fallback: String,
}

impl Default for ResponseSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSelector {
    /// Selector with the standard "didn't understand" fallback.
    pub fn new() -> Self {
        Self::with_fallback(FALLBACK_RESPONSE)
    }

    pub fn with_fallback<S: Into<String>>(fallback: S) -> Self {
        ResponseSelector {
            fallback: fallback.into(),
        }
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Choose one of the responses of `tag`.
    ///
    /// Fails with [`GuidebotError::UnknownTag`] when the catalog has no such
    /// intent.
    pub fn select<R: Rng + ?Sized>(
        &self,
        catalog: &IntentCatalog,
        tag: &str,
        rng: &mut R,
    ) -> Result<String> {
        let intent = catalog
            .get(tag)
            .ok_or_else(|| GuidebotError::unknown_tag(tag))?;

        intent
            .responses
            .choose(rng)
            .cloned()
            .ok_or_else(|| GuidebotError::internal(format!("intent '{tag}' has no responses")))
    }

    /// Like [`select`](Self::select), but an unknown tag is logged as a
    /// consistency fault and answered with the fallback reply.
    pub fn select_or_fallback<R: Rng + ?Sized>(
        &self,
        catalog: &IntentCatalog,
        tag: &str,
        rng: &mut R,
    ) -> String {
        match self.select(catalog, tag, rng) {
            Ok(reply) => reply,
            Err(e) => {
                error!("Predicted tag has no usable intent: {e}");
                self.fallback.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_select_stays_in_response_set() {
        let catalog = IntentCatalog::builtin().unwrap();
        let selector = ResponseSelector::new();
        let mut rng = StdRng::seed_from_u64(7);

        for intent in catalog.intents() {
            for _ in 0..50 {
                let reply = selector.select(&catalog, &intent.tag, &mut rng).unwrap();
                assert!(intent.responses.contains(&reply));
            }
        }
    }

    #[test]
    fn test_every_response_is_reachable() {
        let catalog = IntentCatalog::builtin().unwrap();
        let selector = ResponseSelector::new();
        let mut rng = StdRng::seed_from_u64(2024);

        for intent in catalog.intents() {
            let seen: HashSet<String> = (0..300)
                .map(|_| selector.select(&catalog, &intent.tag, &mut rng).unwrap())
                .collect();
            assert_eq!(seen.len(), intent.responses.len(), "{}", intent.tag);
        }
    }

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let catalog = IntentCatalog::builtin().unwrap();
        let selector = ResponseSelector::new();

        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..10)
                .map(|_| selector.select(&catalog, "greeting", &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(11), draw(11));
    }

    #[test]
    fn test_unknown_tag() {
        let catalog = IntentCatalog::builtin().unwrap();
        let selector = ResponseSelector::new();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(matches!(
            selector.select(&catalog, "weather", &mut rng),
            Err(GuidebotError::UnknownTag(_))
        ));
        assert_eq!(
            selector.select_or_fallback(&catalog, "weather", &mut rng),
            "I'm still learning. Can you rephrase that?"
        );
        assert_eq!(
            ResponseSelector::with_fallback("?").select_or_fallback(&catalog, "x", &mut rng),
            "?"
        );
    }

    #[test]
    fn test_thread_rng_works_unsized() {
        let catalog = IntentCatalog::builtin().unwrap();
        let selector = ResponseSelector::new();
        let rng: &mut dyn rand::RngCore = &mut rand::rng();
        let reply = selector.select(&catalog, "greeting", rng).unwrap();
        assert!(!reply.is_empty());
    }
}
