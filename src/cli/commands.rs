//! Command implementations for the guidebot CLI.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::catalog::IntentCatalog;
use crate::chatbot::{Chatbot, InferenceOutcome, InferenceRequest, InferenceStatus};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::ChatbotConfig;
use crate::error::Result;
use crate::lifecycle::ModelLifecycle;
use crate::model_store::ModelStore;

/// Words that end an interactive chat.
const QUIT_WORDS: [&str; 2] = ["quit", "exit"];

/// Execute a CLI command.
pub fn execute_command(args: GuidebotArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    debug!("Effective configuration: {config:?}");

    match &args.command {
        Command::Train(train_args) => train(train_args, config, &args),
        Command::Classify(classify_args) => classify(classify_args, &config, &args),
        Command::Reply(reply_args) => reply(reply_args, &config, &args),
        Command::Chat => chat(&config, &args),
        Command::Serve => serve(&config),
        Command::Inspect => inspect(&config, &args),
    }
}

/// Merge the configuration file (if any) with command line overrides.
pub fn resolve_config(args: &GuidebotArgs) -> Result<ChatbotConfig> {
    let mut config = match &args.config {
        Some(path) => ChatbotConfig::from_file(path)?,
        None => ChatbotConfig::default(),
    };

    if let Some(model_dir) = &args.model_dir {
        config.model_dir = model_dir.clone();
    }
    if let Some(catalog) = &args.catalog {
        config.catalog_path = Some(catalog.clone());
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }

    config.validate()?;
    Ok(config)
}

/// RNG for response selection: seeded when configured, OS-seeded otherwise.
pub fn response_rng(config: &ChatbotConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn load_catalog(config: &ChatbotConfig) -> Result<IntentCatalog> {
    match &config.catalog_path {
        Some(path) => IntentCatalog::from_file(path),
        None => IntentCatalog::builtin(),
    }
}

/// Train a model and store it.
fn train(args: &TrainArgs, mut config: ChatbotConfig, cli_args: &GuidebotArgs) -> Result<()> {
    if let Some(c) = args.c {
        config.training.c = c;
    }
    if let Some(max_iterations) = args.max_iterations {
        config.training.max_iterations = max_iterations;
    }
    if let Some(tolerance) = args.tolerance {
        config.training.tolerance = tolerance;
    }
    config.validate()?;

    let start_time = Instant::now();
    let catalog = load_catalog(&config)?;
    let store = ModelStore::open(&config.model_dir)?;

    let bundle = ModelLifecycle::new().retrain(&catalog, &store, &config.training)?;
    info!("Model trained after {:?}", start_time.elapsed());

    let metadata = bundle.metadata();
    let result = TrainingResult {
        model_dir: config.model_dir.display().to_string(),
        labels: bundle.labels().to_vec(),
        vocabulary_size: bundle.vectorizer().vocabulary_size(),
        training_examples: metadata.training_examples,
        iterations: metadata.iterations.clone(),
        duration_ms: start_time.elapsed().as_millis() as u64,
    };
    output_result(&result, cli_args)
}

/// Classify one message.
fn classify(args: &ClassifyArgs, config: &ChatbotConfig, cli_args: &GuidebotArgs) -> Result<()> {
    let (bot, _) = Chatbot::initialize(config)?;
    let classification = bot.classify(&args.message)?;

    match cli_args.output_format {
        OutputFormat::Human => print!("{}", ClassificationDisplay(&classification)),
        OutputFormat::Json => println!("{}", to_json(&classification, cli_args.pretty)?),
    }
    Ok(())
}

/// Reply to one message.
fn reply(args: &ReplyArgs, config: &ChatbotConfig, cli_args: &GuidebotArgs) -> Result<()> {
    let (bot, _) = Chatbot::initialize(config)?;
    let mut rng = response_rng(config);

    let (tag, response) = bot.respond_with_rng(&args.message, &mut rng)?;
    let result = ReplyResult {
        message: args.message.clone(),
        tag,
        response,
    };
    output_result(&result, cli_args)
}

/// Interactive chat on the terminal.
fn chat(config: &ChatbotConfig, cli_args: &GuidebotArgs) -> Result<()> {
    let (bot, _) = Chatbot::initialize(config)?;
    let mut rng = response_rng(config);

    if cli_args.verbosity() > 0 {
        println!("Guidebot is ready. Type \"quit\" to leave.");
    }
    let stdin = io::stdin();
    let stdout = io::stdout();
    chat_session(&bot, stdin.lock(), stdout.lock(), &mut rng, true)
}

/// Run a chat session over arbitrary input and output streams.
pub fn chat_session<R, W, G>(
    bot: &Chatbot,
    mut input: R,
    mut output: W,
    rng: &mut G,
    prompt: bool,
) -> Result<()>
where
    R: BufRead,
    W: Write,
    G: Rng + ?Sized,
{
    let mut buf = Vec::new();
    loop {
        if prompt {
            write!(output, "You: ")?;
            output.flush()?;
        }
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let message = line.trim();
        if QUIT_WORDS.contains(&message.to_lowercase().as_str()) {
            break;
        }

        let outcome = bot.handle_with_rng(&InferenceRequest::new(message), rng);
        match outcome.reply() {
            Some(reply) => writeln!(output, "Bot: {reply}")?,
            None => writeln!(output, "Bot: {}", outcome.to_json()?)?,
        }
    }
    Ok(())
}

/// Answer JSON inference requests from stdin, one JSON reply per line.
fn serve(config: &ChatbotConfig) -> Result<()> {
    let (bot, origin) = Chatbot::initialize(config)?;
    info!("Serving with {origin} model from {}", config.model_dir.display());

    let mut rng = response_rng(config);
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve_lines(&bot, stdin.lock(), stdout.lock(), &mut rng)
}

/// Serve newline-delimited JSON requests. Blank lines are skipped.
///
/// A line that is not valid UTF-8 is answered with an error object like any
/// other malformed request. Only failures of the streams themselves end the
/// loop.
pub fn serve_lines<R, W, G>(bot: &Chatbot, mut input: R, mut output: W, rng: &mut G) -> Result<()>
where
    R: BufRead,
    W: Write,
    G: Rng + ?Sized,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            break;
        }

        let outcome = match std::str::from_utf8(&buf) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => bot.handle_json(line.trim(), rng),
            Err(e) => InferenceOutcome::error(
                InferenceStatus::BadRequest,
                format!("request is not valid UTF-8: {e}"),
            ),
        };
        debug!("Request answered with status {}", outcome.status.http_code());
        writeln!(output, "{}", outcome.to_json()?)?;
        output.flush()?;
    }
    Ok(())
}

/// Describe the stored model, or report why there is no usable one.
fn inspect(config: &ChatbotConfig, cli_args: &GuidebotArgs) -> Result<()> {
    let model_dir = config.model_dir.display().to_string();
    let store = ModelStore::open(&config.model_dir)?;

    match store.load() {
        Ok(bundle) => {
            let summary = ModelSummary::from_bundle(model_dir, &bundle, store.artifact_sizes()?);
            output_result(&summary, cli_args)
        }
        Err(e) if e.is_unusable_model() => {
            let report = MissingModel {
                model_dir,
                error: e.to_string(),
            };
            output_result(&report, cli_args)
        }
        Err(e) => Err(e),
    }
}
