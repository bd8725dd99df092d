//! Output formatting for CLI commands.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cli::args::{GuidebotArgs, OutputFormat};
use crate::error::Result;
use crate::ml::bundle::{Classification, ModelBundle};

/// Result structure for training.
#[derive(Debug, Serialize)]
pub struct TrainingResult {
    pub model_dir: String,
    pub labels: Vec<String>,
    pub vocabulary_size: usize,
    pub training_examples: usize,
    pub iterations: BTreeMap<String, usize>,
    pub duration_ms: u64,
}

/// Result structure for a single reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyResult {
    pub message: String,
    pub tag: String,
    pub response: String,
}

/// Report for a model directory without a usable model.
#[derive(Debug, Serialize, Deserialize)]
pub struct MissingModel {
    pub model_dir: String,
    pub error: String,
}

impl fmt::Display for MissingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No usable model in {}: {}", self.model_dir, self.error)
    }
}

/// Description of a stored model.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelSummary {
    pub model_dir: String,
    pub format_version: u32,
    pub labels: Vec<String>,
    pub vocabulary_size: usize,
    pub vocabulary_fingerprint: u32,
    pub trained_at: DateTime<Utc>,
    pub training_examples: usize,
    pub corpus_fingerprint: u32,
    pub c: f64,
    pub iterations: BTreeMap<String, usize>,
    pub artifact_bytes: BTreeMap<String, u64>,
}

impl ModelSummary {
    pub fn from_bundle(
        model_dir: String,
        bundle: &ModelBundle,
        artifact_bytes: BTreeMap<String, u64>,
    ) -> Self {
        let (vectorizer, classifier) = bundle.to_artifacts();
        ModelSummary {
            model_dir,
            format_version: classifier.format_version,
            labels: classifier.labels,
            vocabulary_size: vectorizer.vocabulary.len(),
            vocabulary_fingerprint: classifier.vocabulary_fingerprint,
            trained_at: classifier.metadata.trained_at,
            training_examples: classifier.metadata.training_examples,
            corpus_fingerprint: classifier.metadata.corpus_fingerprint,
            c: classifier.c,
            iterations: classifier.metadata.iterations,
            artifact_bytes,
        }
    }
}

impl fmt::Display for TrainingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trained model in {}", self.model_dir)?;
        writeln!(f, "Labels: {}", self.labels.join(", "))?;
        writeln!(f, "Vocabulary: {} terms", self.vocabulary_size)?;
        writeln!(f, "Training examples: {}", self.training_examples)?;
        for (label, iterations) in &self.iterations {
            writeln!(f, "  {label}: {iterations} iterations")?;
        }
        write!(f, "Time: {}ms", self.duration_ms)
    }
}

impl fmt::Display for ReplyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.response)
    }
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model: {}", self.model_dir)?;
        writeln!(f, "Format version: {}", self.format_version)?;
        writeln!(f, "Labels: {}", self.labels.join(", "))?;
        writeln!(
            f,
            "Vocabulary: {} terms (fingerprint {:08x})",
            self.vocabulary_size, self.vocabulary_fingerprint
        )?;
        writeln!(f, "Trained at: {}", self.trained_at.to_rfc3339())?;
        writeln!(
            f,
            "Training examples: {} (corpus fingerprint {:08x})",
            self.training_examples, self.corpus_fingerprint
        )?;
        writeln!(f, "Artifacts:")?;
        for (name, bytes) in &self.artifact_bytes {
            writeln!(f, "  {name}: {bytes} bytes")?;
        }
        write!(f, "C: {}", self.c)
    }
}

/// Human rendering of a classification, best label first.
pub struct ClassificationDisplay<'a>(pub &'a Classification);

impl fmt::Display for ClassificationDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let classification = self.0;
        writeln!(f, "Intent: {}", classification.tag)?;
        writeln!(f, "Normalized: {:?}", classification.normalized)?;

        let mut scores = classification.scores.clone();
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        for score in scores {
            writeln!(f, "  {:<20} {:>9.4}", score.label, score.score)?;
        }
        Ok(())
    }
}

/// Render a JSON value, honoring `--pretty`.
pub fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + fmt::Display>(result: &T, args: &GuidebotArgs) -> Result<()> {
    println!("{}", render(result, args)?);
    Ok(())
}

/// Render a result in the specified format.
pub fn render<T: Serialize + fmt::Display>(result: &T, args: &GuidebotArgs) -> Result<String> {
    match args.output_format {
        OutputFormat::Human => Ok(result.to_string().trim_end().to_string()),
        OutputFormat::Json => to_json(result, args.pretty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::bundle::LabelScore;
    use clap::Parser;

    fn args(format: &str) -> GuidebotArgs {
        GuidebotArgs::try_parse_from(["guidebot", "--format", format, "inspect"]).unwrap()
    }

    #[test]
    fn test_render_reply() {
        let reply = ReplyResult {
            message: "Hi".to_string(),
            tag: "greeting".to_string(),
            response: "Hello!".to_string(),
        };

        assert_eq!(render(&reply, &args("human")).unwrap(), "Hello!");
        assert_eq!(
            render(&reply, &args("json")).unwrap(),
            r#"{"message":"Hi","tag":"greeting","response":"Hello!"}"#
        );
    }

    #[test]
    fn test_classification_display_orders_scores() {
        let classification = Classification {
            tag: "farewell".to_string(),
            normalized: "bye".to_string(),
            scores: vec![
                LabelScore {
                    label: "farewell".to_string(),
                    score: 1.5,
                },
                LabelScore {
                    label: "greeting".to_string(),
                    score: -0.5,
                },
            ],
        };

        let text = ClassificationDisplay(&classification).to_string();
        assert!(text.starts_with("Intent: farewell\n"));
        let farewell = text.find("farewell  ").unwrap();
        let greeting = text.find("greeting").unwrap();
        assert!(farewell < greeting);
    }

    #[test]
    fn test_pretty_json() {
        let value = serde_json::json!({"a": 1});
        assert_eq!(to_json(&value, false).unwrap(), r#"{"a":1}"#);
        assert!(to_json(&value, true).unwrap().contains('\n'));
    }
}
