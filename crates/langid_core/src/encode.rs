use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

/// Id reserved for padding and out-of-vocabulary tokens in index sequences.
pub const UNKNOWN_ID: usize = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PadSide {
    Pre,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncateSide {
    Pre,
    Post,
}

/// Which numeric representation a fitted vocabulary produces.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EncoderShape {
    /// Bag of tokens sized to the vocabulary, optionally idf-weighted and l2-normalised.
    Counts {
        #[serde(default)]
        idf: Option<Vec<f64>>,
        #[serde(default)]
        l2_normalize: bool,
    },
    /// Token ids padded or truncated to `max_len`.
    Sequence {
        max_len: usize,
        pad_side: PadSide,
        truncate_side: TruncateSide,
    },
}

/// Sparse feature vector with entries sorted by column.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseVector {
    pub dim: usize,
    pub entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn dot(&self, dense: &[f64]) -> f64 {
        self.entries
            .iter()
            .filter_map(|(col, value)| dense.get(*col).map(|w| w * value))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EncodedInput {
    Counts(SparseVector),
    Sequence(Vec<usize>),
}

#[derive(Debug, Error, PartialEq)]
pub enum EncodeError {
    #[error("vocabulary is empty")]
    EmptyVocabulary,
    #[error("token {token:?} uses id 0, which is reserved for unknown tokens")]
    ReservedId { token: String },
    #[error("idf has {actual} weights but the vocabulary has {expected} columns")]
    IdfLength { expected: usize, actual: usize },
    #[error("sequence length must be at least 1")]
    ZeroLength,
}

/// Maps token sequences onto the representation a fitted classifier expects.
#[derive(Debug, Clone)]
pub struct Encoder {
    vocabulary: HashMap<String, usize>,
    shape: EncoderShape,
    dim: usize,
}

impl Encoder {
    pub fn new(vocabulary: HashMap<String, usize>, shape: EncoderShape) -> Result<Self, EncodeError> {
        if vocabulary.is_empty() {
            return Err(EncodeError::EmptyVocabulary);
        }
        let dim = vocabulary.values().max().map_or(0, |max| max + 1);
        match &shape {
            EncoderShape::Counts { idf: Some(idf), .. } if idf.len() != dim => {
                return Err(EncodeError::IdfLength {
                    expected: dim,
                    actual: idf.len(),
                });
            }
            EncoderShape::Counts { .. } => {}
            EncoderShape::Sequence { max_len, .. } => {
                if *max_len == 0 {
                    return Err(EncodeError::ZeroLength);
                }
                if let Some((token, _)) = vocabulary.iter().find(|(_, id)| **id == UNKNOWN_ID) {
                    return Err(EncodeError::ReservedId {
                        token: token.clone(),
                    });
                }
            }
        }
        Ok(Self {
            vocabulary,
            shape,
            dim,
        })
    }

    pub fn shape(&self) -> &EncoderShape {
        &self.shape
    }

    /// Number of feature columns (counts) or embedding rows needed (sequence).
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn transform(&self, tokens: &[String]) -> EncodedInput {
        match &self.shape {
            EncoderShape::Counts { idf, l2_normalize } => {
                EncodedInput::Counts(self.count_vector(tokens, idf.as_deref(), *l2_normalize))
            }
            EncoderShape::Sequence {
                max_len,
                pad_side,
                truncate_side,
            } => {
                let ids: Vec<usize> = tokens
                    .iter()
                    .map(|token| self.vocabulary.get(token).copied().unwrap_or(UNKNOWN_ID))
                    .collect();
                EncodedInput::Sequence(fit_length(ids, *max_len, *pad_side, *truncate_side))
            }
        }
    }

    pub fn transform_batch(&self, batch: &[Vec<String>]) -> Vec<EncodedInput> {
        batch.iter().map(|tokens| self.transform(tokens)).collect()
    }

    fn count_vector(&self, tokens: &[String], idf: Option<&[f64]>, l2_normalize: bool) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokens {
            // Unseen tokens are dropped.
            if let Some(col) = self.vocabulary.get(token) {
                *counts.entry(*col).or_insert(0.0) += 1.0;
            }
        }
        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(col, count)| {
                let weight = idf.and_then(|idf| idf.get(col)).copied().unwrap_or(1.0);
                (col, count * weight)
            })
            .collect();
        entries.sort_by_key(|(col, _)| *col);

        if l2_normalize {
            let norm = entries.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, value) in &mut entries {
                    *value /= norm;
                }
            }
        }
        SparseVector {
            dim: self.dim,
            entries,
        }
    }
}

fn fit_length(mut ids: Vec<usize>, len: usize, pad: PadSide, truncate: TruncateSide) -> Vec<usize> {
    if ids.len() > len {
        match truncate {
            TruncateSide::Pre => {
                ids.drain(..ids.len() - len);
            }
            TruncateSide::Post => ids.truncate(len),
        }
    }
    let missing = len - ids.len();
    match pad {
        PadSide::Post => ids.extend(std::iter::repeat(UNKNOWN_ID).take(missing)),
        PadSide::Pre => {
            ids.splice(0..0, std::iter::repeat(UNKNOWN_ID).take(missing));
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vocab(pairs: &[(&str, usize)]) -> HashMap<String, usize> {
        pairs.iter().map(|(t, id)| (t.to_string(), *id)).collect()
    }

    fn toks(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn counts_drop_unseen_tokens() {
        let encoder = Encoder::new(
            vocab(&[("a", 0), ("b", 1), ("c", 2)]),
            EncoderShape::Counts {
                idf: None,
                l2_normalize: false,
            },
        )
        .unwrap();
        let encoded = encoder.transform(&toks(&["b", "a", "b", "zzz"]));
        assert_eq!(
            encoded,
            EncodedInput::Counts(SparseVector {
                dim: 3,
                entries: vec![(0, 1.0), (1, 2.0)],
            })
        );
    }

    #[test]
    fn counts_apply_idf_and_l2() {
        let encoder = Encoder::new(
            vocab(&[("a", 0), ("b", 1)]),
            EncoderShape::Counts {
                idf: Some(vec![3.0, 2.0]),
                l2_normalize: true,
            },
        )
        .unwrap();
        let EncodedInput::Counts(vector) = encoder.transform(&toks(&["a", "b", "b"])) else {
            panic!("expected counts");
        };
        // raw weights (3, 4) -> norm 5
        assert_eq!(vector.entries, vec![(0, 0.6), (1, 0.8)]);
    }

    #[test]
    fn idf_width_must_match_vocabulary() {
        let err = Encoder::new(
            vocab(&[("a", 0), ("b", 1)]),
            EncoderShape::Counts {
                idf: Some(vec![1.0]),
                l2_normalize: false,
            },
        )
        .unwrap_err();
        assert_eq!(err, EncodeError::IdfLength { expected: 2, actual: 1 });
    }

    #[test]
    fn sequence_vocabulary_cannot_use_reserved_id() {
        let err = Encoder::new(
            vocab(&[("a", 0)]),
            EncoderShape::Sequence {
                max_len: 4,
                pad_side: PadSide::Post,
                truncate_side: TruncateSide::Post,
            },
        )
        .unwrap_err();
        assert_eq!(err, EncodeError::ReservedId { token: "a".into() });
    }

    #[test]
    fn fit_length_pads_and_truncates_on_requested_side() {
        assert_eq!(fit_length(vec![1, 2], 4, PadSide::Post, TruncateSide::Post), vec![1, 2, 0, 0]);
        assert_eq!(fit_length(vec![1, 2], 4, PadSide::Pre, TruncateSide::Post), vec![0, 0, 1, 2]);
        assert_eq!(fit_length(vec![1, 2, 3], 2, PadSide::Post, TruncateSide::Pre), vec![2, 3]);
        assert_eq!(fit_length(vec![1, 2, 3], 2, PadSide::Post, TruncateSide::Post), vec![1, 2]);
        assert_eq!(fit_length(vec![], 3, PadSide::Pre, TruncateSide::Pre), vec![0, 0, 0]);
    }

    #[test]
    fn shape_deserializes_from_tagged_json() {
        let shape: EncoderShape = serde_json::from_str(
            r#"{"kind":"sequence","max_len":10,"pad_side":"post","truncate_side":"pre"}"#,
        )
        .unwrap();
        assert_eq!(
            shape,
            EncoderShape::Sequence {
                max_len: 10,
                pad_side: PadSide::Post,
                truncate_side: TruncateSide::Pre,
            }
        );
        let bad = serde_json::from_str::<EncoderShape>(
            r#"{"kind":"sequence","max_len":10,"pad_side":"middle","truncate_side":"pre"}"#,
        );
        assert!(bad.is_err());
    }
}
