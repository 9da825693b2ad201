use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use langid_core::{
    mark_line_breaks, rank, Normalizer, PredictionEntry, RankError, ScoreError, TokenSequence,
};
use langid_logging::{langid_info, langid_warn};
use thiserror::Error;

use crate::artifacts::ModelArtifacts;

/// Extension of the files picked up from the input directory.
pub const INPUT_EXTENSION: &str = "txt";

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("invalid configuration: {0}")]
    Config(#[from] RankError),
    #[error("cannot list input directory {path:?}: {source}")]
    InputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("classifier failed: {0}")]
    Score(#[from] ScoreError),
}

/// Outcome of classifying a directory of snippets.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionReport {
    pub entries: Vec<PredictionEntry>,
    /// Files that could not be read, with the reason.
    pub skipped: Vec<(String, String)>,
    pub elapsed: Duration,
}

/// Normalize -> encode -> score -> rank for files on disk.
#[derive(Debug)]
pub struct Predictor {
    normalizer: Normalizer,
    artifacts: ModelArtifacts,
    top_n: usize,
}

impl Predictor {
    /// Rejects `top_n == 0` before any input is touched.
    pub fn new(
        artifacts: ModelArtifacts,
        normalizer: Normalizer,
        top_n: usize,
    ) -> Result<Self, PredictError> {
        if top_n == 0 {
            return Err(PredictError::Config(RankError::InvalidTopN));
        }
        Ok(Self {
            normalizer,
            artifacts,
            top_n,
        })
    }

    /// Token sequence for raw file bytes, lines joined by the break marker.
    pub fn prepare(&self, raw: &[u8]) -> TokenSequence {
        let text = String::from_utf8_lossy(raw);
        self.normalizer.normalize(&mark_line_breaks(&text))
    }

    pub fn predict_batch(
        &self,
        named_tokens: Vec<(String, TokenSequence)>,
    ) -> Result<Vec<PredictionEntry>, PredictError> {
        let (filenames, sequences): (Vec<String>, Vec<TokenSequence>) =
            named_tokens.into_iter().unzip();
        let encoded = self.artifacts.encoder.transform_batch(&sequences);
        let scores = self.artifacts.scorer.score_batch(&encoded)?;
        let kind = self.artifacts.scorer.kind();

        filenames
            .into_iter()
            .zip(scores)
            .map(|(filename, row)| {
                let ranked_labels = rank(&row, &self.artifacts.classes, self.top_n, kind)?;
                Ok(PredictionEntry {
                    filename,
                    ranked_labels,
                })
            })
            .collect()
    }

    pub fn predict_bytes(&self, filename: &str, raw: &[u8]) -> Result<PredictionEntry, PredictError> {
        let mut entries = self.predict_batch(vec![(filename.to_string(), self.prepare(raw))])?;
        Ok(entries.remove(0))
    }

    /// Classify every input file; unreadable files are reported as skipped.
    pub fn predict_dir(&self, dir: &Path) -> Result<PredictionReport, PredictError> {
        let started = Instant::now();
        let files = list_input_files(dir)?;
        langid_info!("{} .{} files detected in {:?}", files.len(), INPUT_EXTENSION, dir);

        let mut skipped = Vec::new();
        let mut batch = Vec::with_capacity(files.len());
        for path in files {
            let filename = display_name(&path);
            match fs::read(&path) {
                Ok(raw) => batch.push((filename, self.prepare(&raw))),
                Err(err) => {
                    langid_warn!("Skipping unreadable input {:?}: {}", path, err);
                    skipped.push((filename, err.to_string()));
                }
            }
        }

        langid_info!("Making top {} predictions for each snippet", self.top_n);
        let entries = self.predict_batch(batch)?;
        Ok(PredictionReport {
            entries,
            skipped,
            elapsed: started.elapsed(),
        })
    }
}

/// `*.txt` files directly inside `dir`, sorted by name.
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>, PredictError> {
    let read = fs::read_dir(dir).map_err(|source| PredictError::InputDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = read
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some(INPUT_EXTENSION))
        .collect();
    files.sort();
    Ok(files)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Console report: one block per file followed by a timing summary.
pub fn render_report(report: &PredictionReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Results:");
    let _ = writeln!(out, "------------");
    for entry in &report.entries {
        let _ = writeln!(out, "Filename: {}", entry.filename);
        let _ = writeln!(out, "Prediction: {}", format_labels(entry));
        let _ = writeln!(out, "***********");
    }
    for (filename, reason) in &report.skipped {
        let _ = writeln!(out, "Skipped: {filename} ({reason})");
    }
    let _ = writeln!(
        out,
        "Time summary: {} predictions made in {:.4} seconds",
        report.entries.len(),
        report.elapsed.as_secs_f64()
    );
    out
}

fn format_labels(entry: &PredictionEntry) -> String {
    if entry.ranked_labels.is_empty() {
        return "(none)".to_string();
    }
    entry
        .ranked_labels
        .iter()
        .map(|ranked| match ranked.confidence_percent {
            Some(percent) => format!("{} ({percent:.2}%)", ranked.label),
            None => ranked.label.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use langid_core::RankedLabel;
    use pretty_assertions::assert_eq;

    #[test]
    fn report_lists_labels_and_confidences() {
        let report = PredictionReport {
            entries: vec![
                PredictionEntry {
                    filename: "a.txt".into(),
                    ranked_labels: vec![
                        RankedLabel {
                            label: "Rust".into(),
                            score: 0.9,
                            confidence_percent: Some(90.0),
                        },
                        RankedLabel {
                            label: "C".into(),
                            score: 0.1,
                            confidence_percent: Some(10.0),
                        },
                    ],
                },
                PredictionEntry {
                    filename: "b.txt".into(),
                    ranked_labels: vec![],
                },
            ],
            skipped: vec![("c.txt".into(), "denied".into())],
            elapsed: Duration::from_millis(1500),
        };
        assert_eq!(
            render_report(&report),
            "Results:\n------------\n\
             Filename: a.txt\nPrediction: Rust (90.00%), C (10.00%)\n***********\n\
             Filename: b.txt\nPrediction: (none)\n***********\n\
             Skipped: c.txt (denied)\n\
             Time summary: 2 predictions made in 1.5000 seconds\n"
        );
    }
}
