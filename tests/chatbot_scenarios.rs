use std::collections::HashSet;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;

use guidebot::catalog::{FALLBACK_RESPONSE, Intent, IntentCatalog};
use guidebot::chatbot::{Chatbot, InferenceRequest, InferenceStatus};
use guidebot::config::TrainingConfig;
use guidebot::error::{GuidebotError, Result};
use guidebot::ml::ModelBundle;
use guidebot::normalizer::normalize;

const GREETING_REPLIES: [&str; 3] = [
    "Hello! Welcome to CareerGuide Pro!",
    "Good to see you!",
    "Hi there, how can I help?",
];
const FAREWELL_REPLIES: [&str; 3] = [
    "Goodbye! Come back anytime!",
    "See you soon!",
    "Have a great day!",
];

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn builtin_bot() -> Result<Chatbot> {
    let catalog = IntentCatalog::builtin()?;
    let bundle = ModelBundle::train(&catalog, &TrainingConfig::default())?;
    Ok(Chatbot::new(Arc::new(catalog), Arc::new(bundle)))
}

fn three_intent_catalog() -> Result<IntentCatalog> {
    let mut intents = IntentCatalog::builtin()?.intents().to_vec();
    intents.push(Intent::new(
        "thanks",
        strings(&["Thanks", "Thank you", "That is helpful", "Thanks a lot"]),
        strings(&["Happy to help!", "Any time!"]),
    ));
    IntentCatalog::new(intents)
}

#[test]
fn greeting_and_farewell_scenarios() -> Result<()> {
    let bot = builtin_bot()?;
    let mut rng = StdRng::seed_from_u64(2024);

    assert_eq!(bot.classify("Hi")?.tag, "greeting");
    let reply = bot.reply_with_rng("Hi", &mut rng)?;
    assert!(GREETING_REPLIES.contains(&reply.as_str()));

    assert_eq!(bot.classify("See you later")?.tag, "farewell");
    let reply = bot.reply_with_rng("See you later", &mut rng)?;
    assert!(FAREWELL_REPLIES.contains(&reply.as_str()));
    Ok(())
}

#[test]
fn empty_and_junk_input_still_get_a_reply() -> Result<()> {
    let bot = builtin_bot()?;
    let known: HashSet<&str> = GREETING_REPLIES
        .iter()
        .chain(FAREWELL_REPLIES.iter())
        .copied()
        .collect();

    for input in ["", "   ", "?!?", "42 1337", "the and of", "xyzzy plugh"] {
        let outcome = bot.handle(&InferenceRequest::new(input));
        assert_eq!(outcome.status, InferenceStatus::Ok, "input {input:?}");
        let reply = outcome.reply().unwrap_or_default();
        assert!(known.contains(reply), "input {input:?} got {reply:?}");
    }
    Ok(())
}

#[test]
fn training_set_is_self_consistent() -> Result<()> {
    for catalog in [IntentCatalog::builtin()?, three_intent_catalog()?] {
        let bundle = ModelBundle::train(&catalog, &TrainingConfig::default())?;
        for intent in catalog.intents() {
            for pattern in &intent.patterns {
                assert_eq!(
                    bundle.predict(pattern)?,
                    intent.tag,
                    "pattern {pattern:?} (normalized {:?})",
                    normalize(pattern)
                );
            }
        }
    }
    Ok(())
}

#[test]
fn every_response_is_reachable() -> Result<()> {
    let bot = builtin_bot()?;
    let mut rng = StdRng::seed_from_u64(7);

    let seen: HashSet<String> = (0..200)
        .map(|_| bot.reply_with_rng("Bye", &mut rng))
        .collect::<Result<_>>()?;
    assert_eq!(seen.len(), FAREWELL_REPLIES.len());
    Ok(())
}

#[test]
fn seeded_replies_are_reproducible() -> Result<()> {
    let bot = builtin_bot()?;
    let run = |seed| -> Result<Vec<String>> {
        let mut rng = StdRng::seed_from_u64(seed);
        ["Hi", "Bye", "Hello", "Talk to you later"]
            .iter()
            .map(|message| bot.reply_with_rng(message, &mut rng))
            .collect()
    };
    assert_eq!(run(99)?, run(99)?);
    Ok(())
}

#[test]
fn scores_follow_sorted_label_order() -> Result<()> {
    let catalog = three_intent_catalog()?;
    let bundle = ModelBundle::train(&catalog, &TrainingConfig::default())?;

    let classification = bundle.classify("Thanks a lot!")?;
    let labels: Vec<&str> = classification
        .scores
        .iter()
        .map(|score| score.label.as_str())
        .collect();
    assert_eq!(labels, vec!["farewell", "greeting", "thanks"]);
    assert_eq!(classification.tag, "thanks");
    assert_eq!(classification.normalized, "thank lot");

    let best = classification
        .scores
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|score| score.label.clone());
    assert_eq!(best.as_deref(), Some("thanks"));
    Ok(())
}

#[test]
fn catalog_drift_falls_back_instead_of_failing() -> Result<()> {
    let bundle = ModelBundle::train(&three_intent_catalog()?, &TrainingConfig::default())?;
    let bot = Chatbot::new(Arc::new(IntentCatalog::builtin()?), Arc::new(bundle));

    let outcome = bot.handle(&InferenceRequest::new("Thank you"));
    assert!(outcome.is_ok());
    assert_eq!(outcome.reply(), Some(FALLBACK_RESPONSE));
    Ok(())
}

#[test]
fn single_intent_catalog_cannot_be_trained() -> Result<()> {
    let catalog = IntentCatalog::new(vec![Intent::new(
        "greeting",
        strings(&["Hi", "Hello"]),
        strings(&["Hello!"]),
    )])?;

    let result = ModelBundle::train(&catalog, &TrainingConfig::default());
    assert!(matches!(result, Err(GuidebotError::Training(_))));
    Ok(())
}
