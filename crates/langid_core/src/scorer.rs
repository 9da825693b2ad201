use serde::Deserialize;
use thiserror::Error;

use crate::encode::{EncodedInput, UNKNOWN_ID};

/// What a score vector means, which decides whether a confidence can be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    /// Unnormalised decision margin; only the order is meaningful.
    Margin,
    /// Probability per class, summing to 1.
    Probability,
}

#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("{scorer} scorer cannot consume {input} input")]
    InputMismatch {
        scorer: &'static str,
        input: &'static str,
    },
    #[error("feature width {actual} does not match model width {expected}")]
    WidthMismatch { expected: usize, actual: usize },
    #[error("model is malformed: {0}")]
    Malformed(String),
}

/// A fitted classifier turning one encoded input into one score per class.
///
/// Scores are returned in class-index order.
pub trait Scorer: Send + Sync {
    fn kind(&self) -> ScoreKind;

    fn num_classes(&self) -> usize;

    /// Width of the encoded input this scorer was fitted on.
    fn input_width(&self) -> usize;

    fn score(&self, input: &EncodedInput) -> Result<Vec<f64>, ScoreError>;

    fn score_batch(&self, inputs: &[EncodedInput]) -> Result<Vec<Vec<f64>>, ScoreError> {
        inputs.iter().map(|input| self.score(input)).collect()
    }
}

/// Dense layer weights, one row per output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl DenseLayer {
    fn validate(&self, input_width: usize) -> Result<(), ScoreError> {
        if self.weights.is_empty() {
            return Err(ScoreError::Malformed("dense layer has no rows".into()));
        }
        if self.weights.len() != self.bias.len() {
            return Err(ScoreError::Malformed(format!(
                "{} weight rows but {} biases",
                self.weights.len(),
                self.bias.len()
            )));
        }
        if let Some(row) = self.weights.iter().find(|row| row.len() != input_width) {
            return Err(ScoreError::WidthMismatch {
                expected: input_width,
                actual: row.len(),
            });
        }
        Ok(())
    }

    fn apply(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.bias)
            .map(|(row, bias)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + bias)
            .collect()
    }
}

/// Linear model over count/tf-idf features producing decision margins.
///
/// A single coefficient row is a binary model: it scores class 1, and class 0 gets the negation.
#[derive(Debug, Clone)]
pub struct LinearScorer {
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    width: usize,
}

impl LinearScorer {
    pub fn new(coef: Vec<Vec<f64>>, intercept: Vec<f64>) -> Result<Self, ScoreError> {
        let width = coef.first().map(Vec::len).unwrap_or(0);
        let layer = DenseLayer {
            weights: coef,
            bias: intercept,
        };
        layer.validate(width)?;
        Ok(Self {
            coef: layer.weights,
            intercept: layer.bias,
            width,
        })
    }
}

impl Scorer for LinearScorer {
    fn kind(&self) -> ScoreKind {
        ScoreKind::Margin
    }

    fn num_classes(&self) -> usize {
        if self.coef.len() == 1 {
            2
        } else {
            self.coef.len()
        }
    }

    fn input_width(&self) -> usize {
        self.width
    }

    fn score(&self, input: &EncodedInput) -> Result<Vec<f64>, ScoreError> {
        let EncodedInput::Counts(features) = input else {
            return Err(ScoreError::InputMismatch {
                scorer: "linear",
                input: "sequence",
            });
        };
        if features.dim != self.width {
            return Err(ScoreError::WidthMismatch {
                expected: self.width,
                actual: features.dim,
            });
        }
        let margins: Vec<f64> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, bias)| features.dot(row) + bias)
            .collect();
        if margins.len() == 1 {
            return Ok(vec![-margins[0], margins[0]]);
        }
        Ok(margins)
    }
}

/// Embedding-bag network over padded id sequences producing softmax probabilities.
///
/// Non-padding ids are embedded and averaged, then passed through one dense layer.
#[derive(Debug, Clone)]
pub struct SequenceScorer {
    embedding: Vec<Vec<f64>>,
    output: DenseLayer,
}

impl SequenceScorer {
    pub fn new(embedding: Vec<Vec<f64>>, output: DenseLayer) -> Result<Self, ScoreError> {
        let dim = embedding
            .first()
            .map(Vec::len)
            .ok_or_else(|| ScoreError::Malformed("embedding table is empty".into()))?;
        if let Some(row) = embedding.iter().find(|row| row.len() != dim) {
            return Err(ScoreError::Malformed(format!(
                "embedding rows differ in width ({} vs {dim})",
                row.len()
            )));
        }
        output.validate(dim)?;
        Ok(Self { embedding, output })
    }

    fn pooled(&self, ids: &[usize]) -> Vec<f64> {
        let dim = self.embedding[0].len();
        let mut sum = vec![0.0; dim];
        let mut seen = 0usize;
        for id in ids.iter().filter(|id| **id != UNKNOWN_ID) {
            // Ids past the table are treated like padding.
            if let Some(row) = self.embedding.get(*id) {
                for (acc, value) in sum.iter_mut().zip(row) {
                    *acc += value;
                }
                seen += 1;
            }
        }
        if seen > 0 {
            for value in &mut sum {
                *value /= seen as f64;
            }
        }
        sum
    }
}

impl Scorer for SequenceScorer {
    fn kind(&self) -> ScoreKind {
        ScoreKind::Probability
    }

    fn num_classes(&self) -> usize {
        self.output.weights.len()
    }

    fn input_width(&self) -> usize {
        self.embedding.len()
    }

    fn score(&self, input: &EncodedInput) -> Result<Vec<f64>, ScoreError> {
        let EncodedInput::Sequence(ids) = input else {
            return Err(ScoreError::InputMismatch {
                scorer: "sequence",
                input: "counts",
            });
        };
        Ok(softmax(&self.output.apply(&self.pooled(ids))))
    }
}

pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|v| (v - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|v| v / total).collect()
}
