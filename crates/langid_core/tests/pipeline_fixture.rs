use std::collections::HashMap;

use langid_core::{
    mark_line_breaks, rank, EncodedInput, Encoder, EncoderShape, LinearScorer, Normalizer,
    NormalizerConfig, PadSide, ScoreKind, Scorer, TruncateSide,
};
use pretty_assertions::assert_eq;

const SOURCE: &str = "def f(x):\n  return x+1\n";

fn fixture_vocabulary() -> HashMap<String, usize> {
    [
        ("def", 1),
        ("f", 2),
        ("x", 3),
        ("(", 4),
        (")", 5),
        (":", 6),
        ("return", 7),
        ("+", 8),
        ("1", 9),
    ]
    .into_iter()
    .map(|(token, id)| (token.to_string(), id))
    .collect()
}

fn sequence_encoder(pad_side: PadSide, truncate_side: TruncateSide) -> Encoder {
    Encoder::new(
        fixture_vocabulary(),
        EncoderShape::Sequence {
            max_len: 10,
            pad_side,
            truncate_side,
        },
    )
    .unwrap()
}

#[test]
fn source_file_normalizes_to_expected_tokens() {
    let tokens = Normalizer::default().normalize(&mark_line_breaks(SOURCE));
    assert_eq!(
        tokens,
        vec!["def", "f", "(", "x", ")", ":", "\n", "return", "x", "+", "1"]
    );
}

#[test]
fn punctuated_line_break_token_is_not_stable() {
    let config = NormalizerConfig {
        line_break_token: "<br>".to_string(),
        ..NormalizerConfig::default()
    };
    assert!(config.validate().is_err());

    let normalizer = Normalizer::new(config);
    let tokens = normalizer.normalize(&mark_line_breaks(SOURCE));
    assert_eq!(
        tokens,
        vec!["def", "f", "(", "x", ")", ":", "<br>", "return", "x", "+", "1"]
    );
    // a second pass splits the token apart
    let again = normalizer.normalize(&tokens.join(" "));
    assert_eq!(&again[6..9], &["<", "br", ">"]);
    assert_ne!(again, tokens);
}

#[test]
fn post_padding_with_post_truncation_keeps_the_head() {
    let tokens = Normalizer::default().normalize(&mark_line_breaks(SOURCE));
    let encoded = sequence_encoder(PadSide::Post, TruncateSide::Post).transform(&tokens);
    assert_eq!(encoded, EncodedInput::Sequence(vec![1, 2, 4, 3, 5, 6, 0, 7, 3, 8]));
}

#[test]
fn post_padding_with_pre_truncation_keeps_the_tail() {
    let tokens = Normalizer::default().normalize(&mark_line_breaks(SOURCE));
    let encoded = sequence_encoder(PadSide::Post, TruncateSide::Pre).transform(&tokens);
    assert_eq!(encoded, EncodedInput::Sequence(vec![2, 4, 3, 5, 6, 0, 7, 3, 8, 9]));
}

#[test]
fn short_input_is_padded_on_the_configured_side() {
    let tokens = Normalizer::default().normalize("x+1");
    let post = sequence_encoder(PadSide::Post, TruncateSide::Post).transform(&tokens);
    let pre = sequence_encoder(PadSide::Pre, TruncateSide::Post).transform(&tokens);
    assert_eq!(post, EncodedInput::Sequence(vec![3, 8, 9, 0, 0, 0, 0, 0, 0, 0]));
    assert_eq!(pre, EncodedInput::Sequence(vec![0, 0, 0, 0, 0, 0, 0, 3, 8, 9]));
}

#[test]
fn counts_through_linear_scorer_to_ranking() {
    let mut vocabulary = fixture_vocabulary();
    vocabulary.insert("<pad>".to_string(), 0);
    let encoder = Encoder::new(
        vocabulary,
        EncoderShape::Counts {
            idf: None,
            l2_normalize: false,
        },
    )
    .unwrap();
    // class 0 likes "def", class 1 likes "+"
    let mut python = vec![0.0; 10];
    python[1] = 1.0;
    let mut c = vec![0.0; 10];
    c[8] = 0.5;
    let scorer = LinearScorer::new(vec![c, python], vec![0.0, 0.0]).unwrap();

    let tokens = Normalizer::default().normalize(&mark_line_breaks(SOURCE));
    let scores = scorer.score(&encoder.transform(&tokens)).unwrap();
    let ranked = rank(
        &scores,
        &["C".to_string(), "Python".to_string()],
        1,
        scorer.kind(),
    )
    .unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].label, "Python");
    assert_eq!(scorer.kind(), ScoreKind::Margin);
}
