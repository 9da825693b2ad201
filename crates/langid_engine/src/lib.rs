//! Langid engine: harvesting, corpus IO and model-backed prediction.
mod artifacts;
mod corpus;
mod decode;
mod export;
mod extract;
mod fetch;
mod harvest;
mod index;
mod persist;
mod predict;
mod registry;
mod types;

pub use artifacts::{
    load_artifacts, ArtifactError, ModelArtifacts, ScorerKind, ENCODER_FILE, MODEL_FILE,
    VECTORIZER_FILE,
};
pub use corpus::{
    encode_record, parse_corpus, read_corpus, CorpusError, CorpusWriter, CORPUS_HEADER,
};
pub use decode::{decode_page, DecodeError, DecodedPage};
pub use export::{export_token_lines, ExportError, ExportSummary};
pub use extract::{
    extract_snippets_from_html, ExtractError, PageExtraction, CONTENT_CONTAINER,
    HIGHLIGHT_CLASS_MARKER,
};
pub use fetch::{fetch_with_retry, FetchSettings, Fetcher, ReqwestFetcher, RetryPolicy};
pub use harvest::{HarvestError, HarvestSettings, Harvester, PageError};
pub use index::{resolve_task_url, task_paths_from_html, INDEX_CONTAINER};
pub use persist::{ensure_output_dir, parent_dir, AtomicFileWriter, PersistError};
pub use predict::{
    list_input_files, render_report, PredictError, PredictionReport, Predictor, INPUT_EXTENSION,
};
pub use registry::{load_registry, RegistryError};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
