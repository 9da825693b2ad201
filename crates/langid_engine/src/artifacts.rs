//! Loading of the fitted vocabulary, classifier and label artifacts.
//!
//! All three live as JSON files in one model directory and are checked against each
//! other before any input is classified.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use langid_core::{
    DenseLayer, EncodeError, Encoder, EncoderShape, LinearScorer, ScoreError, Scorer,
    SequenceScorer,
};
use langid_logging::langid_info;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

pub const VECTORIZER_FILE: &str = "vectorizer.json";
pub const MODEL_FILE: &str = "model.json";
pub const ENCODER_FILE: &str = "encoder.json";

/// Which classifier family a deployment loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    /// Sparse linear model over token counts.
    #[default]
    Linear,
    /// Embedding network over padded id sequences.
    Sequence,
}

impl ScorerKind {
    fn name(self) -> &'static str {
        match self {
            ScorerKind::Linear => "linear",
            ScorerKind::Sequence => "sequence",
        }
    }
}

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact {0:?} does not exist")]
    Missing(PathBuf),
    #[error("cannot read artifact {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("artifact {path:?} is malformed: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("vocabulary is unusable: {0}")]
    Encoder(#[from] EncodeError),
    #[error("classifier is unusable: {0}")]
    Scorer(#[from] ScoreError),
    #[error("configured {expected} scorer but model file holds a {found} model")]
    KindMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("{scorer} scorer needs a {needed} vocabulary")]
    ShapeMismatch {
        scorer: &'static str,
        needed: &'static str,
    },
    #[error("vocabulary spans {vocabulary} columns but the classifier expects {model}")]
    WidthMismatch { vocabulary: usize, model: usize },
    #[error("{labels} class labels for a classifier with {scores} outputs")]
    ClassCountMismatch { labels: usize, scores: usize },
}

#[derive(Debug, Deserialize)]
struct VectorizerArtifact {
    vocabulary: HashMap<String, usize>,
    shape: EncoderShape,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ModelArtifact {
    Linear {
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
    },
    Sequence {
        embedding: Vec<Vec<f64>>,
        output: DenseLayer,
    },
}

#[derive(Debug, Deserialize)]
struct LabelArtifact {
    classes: Vec<String>,
}

/// Fitted encoder, classifier and class labels that belong together.
pub struct ModelArtifacts {
    pub encoder: Encoder,
    pub scorer: Box<dyn Scorer>,
    pub classes: Vec<String>,
}

impl std::fmt::Debug for ModelArtifacts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifacts")
            .field("encoder", &self.encoder)
            .field("scorer_kind", &self.scorer.kind())
            .field("classes", &self.classes)
            .finish()
    }
}

pub fn load_artifacts(dir: &Path, kind: ScorerKind) -> Result<ModelArtifacts, ArtifactError> {
    let vectorizer: VectorizerArtifact = read_json(&dir.join(VECTORIZER_FILE))?;
    let model: ModelArtifact = read_json(&dir.join(MODEL_FILE))?;
    let labels: LabelArtifact = read_json(&dir.join(ENCODER_FILE))?;

    let encoder = Encoder::new(vectorizer.vocabulary, vectorizer.shape)?;
    let scorer = build_scorer(model, kind, &encoder)?;
    if labels.classes.len() != scorer.num_classes() {
        return Err(ArtifactError::ClassCountMismatch {
            labels: labels.classes.len(),
            scores: scorer.num_classes(),
        });
    }

    langid_info!(
        "Loaded {} model with {} classes from {:?}",
        kind.name(),
        labels.classes.len(),
        dir
    );
    Ok(ModelArtifacts {
        encoder,
        scorer,
        classes: labels.classes,
    })
}

fn build_scorer(
    model: ModelArtifact,
    kind: ScorerKind,
    encoder: &Encoder,
) -> Result<Box<dyn Scorer>, ArtifactError> {
    let found = match &model {
        ModelArtifact::Linear { .. } => ScorerKind::Linear,
        ModelArtifact::Sequence { .. } => ScorerKind::Sequence,
    };
    if found != kind {
        return Err(ArtifactError::KindMismatch {
            expected: kind.name(),
            found: found.name(),
        });
    }

    match model {
        ModelArtifact::Linear { coef, intercept } => {
            if !matches!(encoder.shape(), EncoderShape::Counts { .. }) {
                return Err(ArtifactError::ShapeMismatch {
                    scorer: "linear",
                    needed: "counts",
                });
            }
            let scorer = LinearScorer::new(coef, intercept)?;
            if scorer.input_width() != encoder.dim() {
                return Err(ArtifactError::WidthMismatch {
                    vocabulary: encoder.dim(),
                    model: scorer.input_width(),
                });
            }
            Ok(Box::new(scorer))
        }
        ModelArtifact::Sequence { embedding, output } => {
            if !matches!(encoder.shape(), EncoderShape::Sequence { .. }) {
                return Err(ArtifactError::ShapeMismatch {
                    scorer: "sequence",
                    needed: "sequence",
                });
            }
            let scorer = SequenceScorer::new(embedding, output)?;
            // every vocabulary id must have an embedding row
            if scorer.input_width() < encoder.dim() {
                return Err(ArtifactError::WidthMismatch {
                    vocabulary: encoder.dim(),
                    model: scorer.input_width(),
                });
            }
            Ok(Box::new(scorer))
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::Missing(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
