use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use langid_core::Normalizer;
use langid_logging::langid_info;
use serde_json::json;

use crate::corpus::{read_corpus, CorpusError};
use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub rows: usize,
    pub total_tokens: u64,
    /// Rows per language label.
    pub labels: BTreeMap<String, usize>,
    pub output_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("corpus error: {0}")]
    Corpus(#[from] CorpusError),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Normalize every corpus row and write one `{language, tokens}` JSON object per line.
pub fn export_token_lines(
    corpus_path: &Path,
    output_path: &Path,
    normalizer: &Normalizer,
) -> Result<ExportSummary, ExportError> {
    let snippets = read_corpus(corpus_path)?;

    let mut buffer = String::new();
    let mut total_tokens: u64 = 0;
    let mut labels: BTreeMap<String, usize> = BTreeMap::new();
    for snippet in &snippets {
        let tokens = normalizer.normalize(&snippet.raw_text);
        total_tokens += tokens.len() as u64;
        *labels.entry(snippet.label.clone()).or_default() += 1;
        let line = json!({
            "language": snippet.label,
            "tokens": tokens,
        });
        buffer.push_str(&line.to_string());
        buffer.push('\n');
    }

    let written = AtomicFileWriter::new(output_path.to_path_buf()).write(&buffer)?;
    langid_info!(
        "Exported {} rows ({} tokens, {} languages) to {:?}",
        snippets.len(),
        total_tokens,
        labels.len(),
        written
    );

    Ok(ExportSummary {
        rows: snippets.len(),
        total_tokens,
        labels,
        output_path: written,
    })
}
