use std::sync::Once;

use langid_core::{mark_line_breaks, Normalizer, COMMA_SENTINEL};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(langid_logging::initialize_for_tests);
}

const SAMPLES: &[&str] = &[
    "",
    "   ",
    "plain words only",
    "def f(x):\n  return x+1\n",
    "#include <stdio.h>\nint main(void) { printf(\"hi\\n\"); return 0; }",
    "a br br b",
    "br leading and trailing br",
    "x  =  [1,2,3]  ;;",
    "tabs\tand\r\nwindows\r\nlines",
    "if x:\n\t\treturn y\n",
    "caf\u{e9} \u{1F600} emoji",
    "!@#$%^&&^%$#@!",
    "let v = vec![1!@#$%^&&^%$#@! 2];",
    "<br> tags <span>stay</span> punctuated",
];

#[test]
fn normalization_is_idempotent_on_rejoined_tokens() {
    init_logging();
    let normalizer = Normalizer::default();
    for sample in SAMPLES {
        for text in [sample.to_string(), mark_line_breaks(sample)] {
            let once = normalizer.normalize(&text);
            let twice = normalizer.normalize(&once.join(" "));
            assert_eq!(twice, once, "input {text:?}");
        }
    }
}

#[test]
fn alphanumeric_text_splits_on_whitespace() {
    let normalizer = Normalizer::default();
    for text in [
        "hello world",
        "a1 b2 c3",
        "single",
        "x y z 0 9 abc DEF",
        "hello\tworld",
        "\t\tindented  twice",
        "cr\rlf\nvt\x0bff\x0cend",
    ] {
        let expected: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        assert_eq!(normalizer.normalize(text), expected);
    }
}

#[test]
fn punctuation_is_never_glued_to_words() {
    let normalizer = Normalizer::default();
    for sample in SAMPLES {
        for token in normalizer.normalize(sample) {
            if token.chars().any(|ch| ch.is_ascii_punctuation()) {
                assert_eq!(token.chars().count(), 1, "token {token:?} from {sample:?}");
            }
        }
    }
}

#[test]
fn tokens_are_never_empty_or_contain_spaces() {
    let normalizer = Normalizer::default();
    for sample in SAMPLES {
        for token in normalizer.normalize(&mark_line_breaks(sample)) {
            assert!(!token.is_empty());
            assert!(!token.contains(' '));
        }
    }
}

#[test]
fn corpus_rows_and_files_normalize_alike() {
    let normalizer = Normalizer::default();
    let from_corpus = format!("print(a{COMMA_SENTINEL} b) br print(c)");
    let from_file = mark_line_breaks("print(a, b)\nprint(c)\n");
    assert_eq!(normalizer.normalize(&from_corpus), normalizer.normalize(&from_file));
}
