//! Langid core: pure normalization, encoding, scoring and ranking.
mod encode;
mod normalize;
mod rank;
mod registry;
mod scorer;
mod snippet;

pub use encode::{
    EncodeError, EncodedInput, Encoder, EncoderShape, PadSide, SparseVector, TruncateSide,
    UNKNOWN_ID,
};
pub use normalize::{
    is_printable, mark_line_breaks, Normalizer, NormalizerConfig, NormalizerError,
    NormalizerMode, TokenSequence, BREAK_MARKER, COMMA_SENTINEL, DEFAULT_LINE_BREAK_TOKEN,
};
pub use rank::{rank, PredictionEntry, RankError, RankedLabel};
pub use registry::LanguageRegistry;
pub use scorer::{softmax, DenseLayer, LinearScorer, ScoreError, ScoreKind, Scorer, SequenceScorer};
pub use snippet::{
    escape_commas, heading_label, is_output_caption, BlockVerdict, HarvestEvent, HarvestSummary,
    LabeledSnippet, EDIT_SUFFIX, OUTPUT_CAPTION_MAX_LEN,
};
