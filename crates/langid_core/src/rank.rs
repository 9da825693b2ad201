use std::cmp::Ordering;

use thiserror::Error;

use crate::scorer::ScoreKind;

#[derive(Debug, Clone, PartialEq)]
pub struct RankedLabel {
    pub label: String,
    pub score: f64,
    /// Probability as a percentage rounded to two decimals; only for probability scores.
    pub confidence_percent: Option<f64>,
}

/// Ranked labels for one classified file.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionEntry {
    pub filename: String,
    pub ranked_labels: Vec<RankedLabel>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankError {
    #[error("top_n must be at least 1")]
    InvalidTopN,
    #[error("{scores} scores but {labels} class labels")]
    LabelCountMismatch { scores: usize, labels: usize },
}

/// Order class indices by descending score and keep the first `top_n`.
///
/// Ties keep ascending class index; NaN scores sort last.
pub fn rank(
    scores: &[f64],
    labels: &[String],
    top_n: usize,
    kind: ScoreKind,
) -> Result<Vec<RankedLabel>, RankError> {
    if top_n == 0 {
        return Err(RankError::InvalidTopN);
    }
    if scores.is_empty() {
        return Ok(Vec::new());
    }
    if scores.len() != labels.len() {
        return Err(RankError::LabelCountMismatch {
            scores: scores.len(),
            labels: labels.len(),
        });
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| descending(scores[a], scores[b]));

    Ok(order
        .into_iter()
        .take(top_n)
        .map(|idx| RankedLabel {
            label: labels[idx].clone(),
            score: scores[idx],
            confidence_percent: match kind {
                ScoreKind::Probability => Some(percent(scores[idx])),
                ScoreKind::Margin => None,
            },
        })
        .collect())
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        // 0.0 and -0.0 compare equal here
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

fn percent(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn names(ranked: &[RankedLabel]) -> Vec<&str> {
        ranked.iter().map(|r| r.label.as_str()).collect()
    }

    #[test]
    fn ranks_by_descending_score() {
        let ranked = rank(
            &[0.1, 2.5, -1.0, 0.7],
            &labels(&["C", "Go", "Perl", "Python"]),
            3,
            ScoreKind::Margin,
        )
        .unwrap();
        assert_eq!(names(&ranked), vec!["Go", "Python", "C"]);
        assert!(ranked.iter().all(|r| r.confidence_percent.is_none()));
    }

    #[test]
    fn ties_keep_class_order() {
        let ranked = rank(&[1.0, 3.0, 3.0, 1.0], &labels(&["a", "b", "c", "d"]), 4, ScoreKind::Margin)
            .unwrap();
        assert_eq!(names(&ranked), vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn signed_zeros_tie_by_class_index() {
        let ranked = rank(&[-0.0, 0.0, -1.0], &labels(&["a", "b", "c"]), 3, ScoreKind::Margin)
            .unwrap();
        assert_eq!(names(&ranked), vec!["a", "b", "c"]);
    }

    #[test]
    fn top_n_past_class_count_returns_all() {
        let ranked = rank(&[0.2, 0.8], &labels(&["a", "b"]), 10, ScoreKind::Margin).unwrap();
        assert_eq!(names(&ranked), vec!["b", "a"]);
    }

    #[test]
    fn empty_scores_give_empty_ranking() {
        assert_eq!(rank(&[], &[], 3, ScoreKind::Margin), Ok(Vec::new()));
    }

    #[test]
    fn zero_top_n_is_rejected() {
        assert_eq!(
            rank(&[1.0], &labels(&["a"]), 0, ScoreKind::Margin),
            Err(RankError::InvalidTopN)
        );
        assert_eq!(rank(&[], &[], 0, ScoreKind::Margin), Err(RankError::InvalidTopN));
    }

    #[test]
    fn label_count_must_match() {
        assert_eq!(
            rank(&[1.0, 2.0], &labels(&["a"]), 1, ScoreKind::Margin),
            Err(RankError::LabelCountMismatch { scores: 2, labels: 1 })
        );
    }

    #[test]
    fn probabilities_carry_rounded_percentages() {
        let ranked = rank(
            &[0.123456, 0.876544],
            &labels(&["C", "Rust"]),
            2,
            ScoreKind::Probability,
        )
        .unwrap();
        assert_eq!(ranked[0].confidence_percent, Some(87.65));
        assert_eq!(ranked[1].confidence_percent, Some(12.35));
    }

    #[test]
    fn nan_scores_sort_last() {
        let ranked = rank(&[f64::NAN, 0.5, -3.0], &labels(&["x", "y", "z"]), 3, ScoreKind::Margin)
            .unwrap();
        assert_eq!(names(&ranked), vec!["y", "z", "x"]);
    }
}
