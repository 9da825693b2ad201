use std::path::PathBuf;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use langid_core::{HarvestEvent, HarvestSummary, LabeledSnippet, LanguageRegistry};
use langid_logging::{langid_debug, langid_info, langid_warn};
use thiserror::Error;
use tokio::sync::mpsc;
use url::Url;

use crate::corpus::CorpusWriter;
use crate::decode::{decode_page, DecodeError};
use crate::extract::{extract_snippets_from_html, ExtractError, PageExtraction};
use crate::fetch::{fetch_with_retry, FetchSettings, Fetcher};
use crate::index::{resolve_task_url, task_paths_from_html};
use crate::persist::PersistError;
use crate::FetchError;

const PROGRESS_EVERY: usize = 100;
const ROW_QUEUE_DEPTH: usize = 1024;

#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub main_url: String,
    pub tasks_url: String,
    pub output_file: PathBuf,
    pub workers: usize,
    pub fetch: FetchSettings,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            main_url: "http://www.rosettacode.org".to_string(),
            tasks_url: "http://www.rosettacode.org/wiki/Category:Programming_Tasks".to_string(),
            output_file: PathBuf::from("RosettaCodeData.csv"),
            workers: 8,
            fetch: FetchSettings::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("invalid site url {url}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("cannot write corpus: {0}")]
    Persist(#[from] PersistError),
    #[error("corpus writer stopped unexpectedly: {0}")]
    Writer(String),
}

/// Why one page produced no rows.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("cannot resolve task path {0}")]
    Unresolvable(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("parser task failed: {0}")]
    Join(String),
}

/// Crawls the task index and writes labeled snippets to the corpus file.
pub struct Harvester {
    settings: HarvestSettings,
    base: Url,
    registry: Arc<LanguageRegistry>,
    fetcher: Arc<dyn Fetcher>,
}

impl Harvester {
    pub fn new(
        settings: HarvestSettings,
        registry: LanguageRegistry,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, HarvestError> {
        if settings.workers == 0 {
            return Err(HarvestError::NoWorkers);
        }
        let base = Url::parse(&settings.main_url).map_err(|err| HarvestError::InvalidUrl {
            url: settings.main_url.clone(),
            message: err.to_string(),
        })?;
        Ok(Self {
            settings,
            base,
            registry: Arc::new(registry),
            fetcher,
        })
    }

    /// Task link targets from the index page; empty if the page cannot be fetched or parsed.
    pub async fn list_task_paths(&self) -> Vec<String> {
        match self.fetch_text(&self.settings.tasks_url).await {
            Ok(html) => {
                let paths = task_paths_from_html(&html);
                if paths.is_empty() {
                    langid_warn!("No task links found on {}", self.settings.tasks_url);
                }
                paths
            }
            Err(err) => {
                langid_warn!("Index page {} unavailable: {}", self.settings.tasks_url, err);
                Vec::new()
            }
        }
    }

    /// Snippets from one task page; any page-level failure yields none.
    pub async fn extract_snippets(&self, task_path: &str) -> Vec<LabeledSnippet> {
        match self.scan_task(task_path).await {
            Ok(page) => page.snippets,
            Err(err) => {
                langid_debug!("Skipping {}: {}", task_path, err);
                Vec::new()
            }
        }
    }

    /// Recreate the corpus file and fill it from every task page.
    pub async fn run(&self) -> Result<HarvestSummary, HarvestError> {
        langid_info!("Registered {} languages", self.registry.len());
        let writer = CorpusWriter::create(&self.settings.output_file)?;

        langid_info!("Obtaining task paths from {}", self.settings.tasks_url);
        let paths = self.list_task_paths().await;
        langid_info!("Scraping {} tasks with {} workers", paths.len(), self.settings.workers);

        let (row_tx, row_rx) = mpsc::channel::<LabeledSnippet>(ROW_QUEUE_DEPTH);
        let writer_task = tokio::task::spawn_blocking(move || write_rows(writer, row_rx));

        let summary = stream::iter(paths)
            .map(|path| {
                let row_tx = row_tx.clone();
                async move { self.harvest_task(&path, row_tx).await }
            })
            .buffer_unordered(self.settings.workers)
            .fold(HarvestSummary::default(), |mut summary, event| async move {
                summary.apply(&event);
                summary
            })
            .await;
        drop(row_tx);

        let written = writer_task
            .await
            .map_err(|err| HarvestError::Writer(err.to_string()))??;
        if written != summary.snippets {
            langid_warn!(
                "Corpus holds {} rows but {} snippets were extracted",
                written,
                summary.snippets
            );
        }
        langid_info!(
            "Completed: {} snippets from {} tasks ({} tasks failed)",
            summary.snippets,
            summary.tasks,
            summary.failed_tasks
        );
        Ok(summary)
    }

    async fn harvest_task(&self, path: &str, row_tx: mpsc::Sender<LabeledSnippet>) -> HarvestEvent {
        match self.scan_task(path).await {
            Ok(page) => {
                for snippet in page.snippets {
                    if row_tx.send(snippet).await.is_err() {
                        langid_warn!("Corpus writer closed; dropping rows from {}", path);
                        break;
                    }
                }
                HarvestEvent::PageScanned {
                    verdicts: page.verdicts,
                }
            }
            Err(err) => {
                langid_debug!("Skipping {}: {}", path, err);
                HarvestEvent::PageFailed
            }
        }
    }

    async fn scan_task(&self, task_path: &str) -> Result<PageExtraction, PageError> {
        let url = resolve_task_url(&self.base, task_path)
            .ok_or_else(|| PageError::Unresolvable(task_path.to_string()))?;
        let html = self.fetch_text(url.as_str()).await?;
        let registry = Arc::clone(&self.registry);
        // scraper documents are not Send, so parsing runs to completion on a blocking thread
        let page = tokio::task::spawn_blocking(move || extract_snippets_from_html(&html, &registry))
            .await
            .map_err(|err| PageError::Join(err.to_string()))??;
        Ok(page)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, PageError> {
        let output = fetch_with_retry(self.fetcher.as_ref(), url, &self.settings.fetch.retry).await?;
        let meta = &output.metadata;
        if meta.final_url != meta.original_url {
            langid_debug!("{} redirected to {}", meta.original_url, meta.final_url);
        }
        let decoded = decode_page(&output.bytes, meta.content_type.as_deref())?;
        langid_debug!(
            "decoded {} bytes from {} as {}",
            meta.byte_len,
            meta.final_url,
            decoded.encoding_label
        );
        Ok(decoded.text)
    }
}

/// Single consumer of extracted rows; owns the corpus file for the whole run.
fn write_rows(
    mut writer: CorpusWriter,
    mut row_rx: mpsc::Receiver<LabeledSnippet>,
) -> Result<usize, PersistError> {
    while let Some(snippet) = row_rx.blocking_recv() {
        writer.append(&snippet)?;
        if writer.rows() % PROGRESS_EVERY == 0 {
            langid_info!("{} snippets written to {:?}", writer.rows(), writer.path());
        }
    }
    writer.finish()
}
