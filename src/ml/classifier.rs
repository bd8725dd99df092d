//! One-vs-rest L2-regularized logistic regression.
//!
//! Each label gets its own binary model, trained by minimizing
//!
//! ```text
//! f(w) = ½‖w‖² + C Σᵢ log(1 + exp(−yᵢ w·xᵢ))
//! ```
//!
//! where `xᵢ` carries an extra constant feature for the bias (so the bias
//! is regularized too). The optimizer is a truncated Newton method: the
//! Newton system is solved approximately with conjugate gradients using
//! Hessian-vector products, followed by a backtracking line search.

use std::collections::BTreeSet;

use log::debug;

use crate::config::TrainingConfig;
use crate::error::{GuidebotError, Result};

const CG_RELATIVE_TOLERANCE: f64 = 0.1;
const ARMIJO_SUFFICIENT_DECREASE: f64 = 1e-4;
const MAX_LINE_SEARCH_STEPS: usize = 30;

/// Fitted one-vs-rest logistic regression model.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegressionClassifier {
    /// Class labels in lexicographic order.
    labels: Vec<String>,
    /// One weight vector per label.
    weights: Vec<Vec<f64>>,
    /// One bias per label.
    biases: Vec<f64>,
    /// Hyperparameters used for training.
    config: TrainingConfig,
    /// Newton iterations used per label.
    iterations: Vec<usize>,
}

impl LogisticRegressionClassifier {
    /// Train one binary model per distinct label.
    ///
    /// Fails when there are fewer than two distinct labels, when vectors and
    /// labels disagree in count, or when vectors differ in dimension.
    pub fn fit(vectors: &[Vec<f64>], labels: &[String], config: &TrainingConfig) -> Result<Self> {
        config.validate()?;

        if vectors.is_empty() {
            return Err(GuidebotError::training("no training vectors"));
        }
        if vectors.len() != labels.len() {
            return Err(GuidebotError::training(format!(
                "{} training vectors but {} labels",
                vectors.len(),
                labels.len()
            )));
        }
        let dimension = vectors[0].len();
        if vectors.iter().any(|v| v.len() != dimension) {
            return Err(GuidebotError::training(
                "training vectors have inconsistent dimensions",
            ));
        }

        let classes: Vec<String> = labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if classes.len() < 2 {
            return Err(GuidebotError::training(format!(
                "need at least 2 distinct labels, got {}",
                classes.len()
            )));
        }

        let augmented: Vec<Vec<f64>> = vectors
            .iter()
            .map(|v| {
                let mut row = Vec::with_capacity(dimension + 1);
                row.extend_from_slice(v);
                row.push(1.0);
                row
            })
            .collect();

        let mut weights = Vec::with_capacity(classes.len());
        let mut biases = Vec::with_capacity(classes.len());
        let mut iterations = Vec::with_capacity(classes.len());

        for class in &classes {
            let targets: Vec<f64> = labels
                .iter()
                .map(|label| if label == class { 1.0 } else { -1.0 })
                .collect();

            let problem = BinaryProblem {
                rows: &augmented,
                targets: &targets,
                c: config.c,
            };
            let (mut w, iters) = problem.minimize(config.max_iterations, config.tolerance);
            let bias = w.pop().unwrap_or(0.0);

            debug!("Trained label '{class}' in {iters} Newton iterations");
            weights.push(w);
            biases.push(bias);
            iterations.push(iters);
        }

        Ok(LogisticRegressionClassifier {
            labels: classes,
            weights,
            biases,
            config: config.clone(),
            iterations,
        })
    }

    /// Assemble a classifier from stored parameters, checking that they are
    /// consistent with each other and with `dimension`.
    pub fn from_parts(
        labels: Vec<String>,
        weights: Vec<Vec<f64>>,
        biases: Vec<f64>,
        config: TrainingConfig,
        dimension: usize,
    ) -> Result<Self> {
        if labels.len() < 2 {
            return Err(GuidebotError::corrupt("classifier needs at least 2 labels"));
        }
        if labels.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(GuidebotError::corrupt(
                "classifier labels are not sorted or have duplicates",
            ));
        }
        if weights.len() != labels.len() || biases.len() != labels.len() {
            return Err(GuidebotError::corrupt(format!(
                "{} labels, {} weight vectors, {} biases",
                labels.len(),
                weights.len(),
                biases.len()
            )));
        }
        if weights.iter().any(|w| w.len() != dimension) {
            return Err(GuidebotError::corrupt(format!(
                "weight vectors do not match feature dimension {dimension}"
            )));
        }
        let all_finite = weights.iter().flatten().chain(biases.iter()).all(|v| v.is_finite());
        if !all_finite {
            return Err(GuidebotError::corrupt("classifier has non-finite parameters"));
        }
        config
            .validate()
            .map_err(|e| GuidebotError::corrupt(format!("classifier hyperparameters: {e}")))?;

        Ok(LogisticRegressionClassifier {
            iterations: vec![0; labels.len()],
            labels,
            weights,
            biases,
            config,
        })
    }

    /// Score every label, in label order.
    pub fn decision_scores(&self, vector: &[f64]) -> Result<Vec<f64>> {
        if vector.len() != self.dimension() {
            return Err(GuidebotError::invalid_argument(format!(
                "feature vector has dimension {} (expected {})",
                vector.len(),
                self.dimension()
            )));
        }

        Ok(self
            .weights
            .iter()
            .zip(&self.biases)
            .map(|(w, b)| dot(w, vector) + b)
            .collect())
    }

    /// Predict the highest-scoring label.
    ///
    /// Labels are scanned in lexicographic order and only a strictly higher
    /// score replaces the current best, so ties go to the smallest tag.
    pub fn predict(&self, vector: &[f64]) -> Result<&str> {
        let scores = self.decision_scores(vector)?;
        Ok(self.labels[best_index(&scores)].as_str())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Newton iterations per label from the last fit (zeros when loaded).
    pub fn iterations(&self) -> &[usize] {
        &self.iterations
    }

    /// Feature dimension (excluding the bias).
    pub fn dimension(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    pub(crate) fn set_iterations(&mut self, iterations: Vec<usize>) {
        if iterations.len() == self.labels.len() {
            self.iterations = iterations;
        }
    }
}

/// Index of the first maximum.
pub(crate) fn best_index(scores: &[f64]) -> usize {
    let mut best = 0;
    for (idx, score) in scores.iter().enumerate().skip(1) {
        if *score > scores[best] {
            best = idx;
        }
    }
    best
}

/// One binary subproblem with targets in {−1, +1}.
struct BinaryProblem<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [f64],
    c: f64,
}

impl BinaryProblem<'_> {
    fn dimension(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Margins yᵢ w·xᵢ.
    fn margins(&self, w: &[f64]) -> Vec<f64> {
        self.rows
            .iter()
            .zip(self.targets)
            .map(|(x, y)| y * dot(w, x))
            .collect()
    }

    fn objective(&self, w: &[f64], margins: &[f64]) -> f64 {
        let loss: f64 = margins.iter().map(|m| log1p_exp_neg(*m)).sum();
        0.5 * dot(w, w) + self.c * loss
    }

    fn gradient(&self, w: &[f64], margins: &[f64]) -> Vec<f64> {
        let mut grad = w.to_vec();
        for ((x, y), m) in self.rows.iter().zip(self.targets).zip(margins) {
            let coef = self.c * (sigmoid(*m) - 1.0) * y;
            axpy(coef, x, &mut grad);
        }
        grad
    }

    /// Hessian-vector product `v + C Σ Dᵢ xᵢ (xᵢ·v)`.
    fn hessian_product(&self, curvature: &[f64], v: &[f64]) -> Vec<f64> {
        let mut out = v.to_vec();
        for (x, d) in self.rows.iter().zip(curvature) {
            let coef = self.c * d * dot(x, v);
            axpy(coef, x, &mut out);
        }
        out
    }

    /// Approximately solve `H s = −g` with conjugate gradients.
    fn newton_direction(&self, curvature: &[f64], grad: &[f64], grad_norm: f64) -> Vec<f64> {
        let dim = grad.len();
        let mut step = vec![0.0; dim];
        let mut residual: Vec<f64> = grad.iter().map(|g| -g).collect();
        let mut direction = residual.clone();
        let mut rr = dot(&residual, &residual);

        for _ in 0..dim.max(10) {
            if rr.sqrt() <= CG_RELATIVE_TOLERANCE * grad_norm {
                break;
            }
            let hd = self.hessian_product(curvature, &direction);
            let curv = dot(&direction, &hd);
            if curv <= 0.0 {
                break;
            }
            let alpha = rr / curv;
            axpy(alpha, &direction, &mut step);
            axpy(-alpha, &hd, &mut residual);
            let rr_next = dot(&residual, &residual);
            let beta = rr_next / rr;
            for (d, r) in direction.iter_mut().zip(&residual) {
                *d = r + beta * *d;
            }
            rr = rr_next;
        }

        step
    }

    /// Run truncated Newton from `w = 0`. Returns the solution and the
    /// number of Newton steps taken.
    fn minimize(&self, max_iterations: usize, tolerance: f64) -> (Vec<f64>, usize) {
        let mut w = vec![0.0; self.dimension()];
        let mut margins = self.margins(&w);
        let mut value = self.objective(&w, &margins);
        let initial_norm = norm(&self.gradient(&w, &margins));

        if initial_norm == 0.0 {
            return (w, 0);
        }

        let mut iterations = 0;
        while iterations < max_iterations {
            let grad = self.gradient(&w, &margins);
            let grad_norm = norm(&grad);
            if grad_norm <= tolerance * initial_norm {
                break;
            }

            let curvature: Vec<f64> = margins
                .iter()
                .map(|m| {
                    let s = sigmoid(*m);
                    s * (1.0 - s)
                })
                .collect();
            let step = self.newton_direction(&curvature, &grad, grad_norm);
            let slope = dot(&grad, &step);
            if slope >= 0.0 {
                break;
            }

            let mut scale = 1.0;
            let mut accepted = None;
            for _ in 0..MAX_LINE_SEARCH_STEPS {
                let candidate: Vec<f64> =
                    w.iter().zip(&step).map(|(wi, si)| wi + scale * si).collect();
                let candidate_margins = self.margins(&candidate);
                let candidate_value = self.objective(&candidate, &candidate_margins);
                if candidate_value <= value + ARMIJO_SUFFICIENT_DECREASE * scale * slope {
                    accepted = Some((candidate, candidate_margins, candidate_value));
                    break;
                }
                scale *= 0.5;
            }

            let Some((next, next_margins, next_value)) = accepted else {
                break;
            };
            w = next;
            margins = next_margins;
            value = next_value;
            iterations += 1;
        }

        (w, iterations)
    }
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

/// Numerically stable logistic function.
fn sigmoid(t: f64) -> f64 {
    if t >= 0.0 {
        1.0 / (1.0 + (-t).exp())
    } else {
        let e = t.exp();
        e / (1.0 + e)
    }
}

/// `log(1 + exp(−m))` without overflow.
fn log1p_exp_neg(m: f64) -> f64 {
    if m > 0.0 {
        (-m).exp().ln_1p()
    } else {
        -m + m.exp().ln_1p()
    }
}
