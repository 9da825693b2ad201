//! `langid.ron` loading and validation.
//!
//! Every field has a default, so a missing default file or a partial file is fine.
//! Command-line flags are applied on top by `main` before validation.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use langid_core::NormalizerConfig;
use langid_engine::{FetchSettings, HarvestSettings, RetryPolicy, ScorerKind};
use langid_logging::LogSettings;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "langid.ron";

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct LangidConfig {
    pub harvest: HarvestConfig,
    pub predict: PredictConfig,
    pub normalizer: NormalizerConfig,
    pub logging: LogSettings,
    /// File the settings were read from; `None` when only defaults apply.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub main_url: String,
    pub tasks_url: String,
    pub languages_path: PathBuf,
    pub output_file: PathBuf,
    pub workers: usize,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub user_agent: Option<String>,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        let site = HarvestSettings::default();
        let fetch = site.fetch;
        Self {
            main_url: site.main_url,
            tasks_url: site.tasks_url,
            languages_path: PathBuf::from("./languages.json"),
            output_file: site.output_file,
            workers: site.workers,
            connect_timeout_secs: fetch.connect_timeout.as_secs(),
            request_timeout_secs: fetch.request_timeout.as_secs(),
            redirect_limit: fetch.redirect_limit,
            max_bytes: fetch.max_bytes,
            max_retries: fetch.retry.max_retries,
            retry_backoff_ms: millis(fetch.retry.base_delay),
            user_agent: None,
        }
    }
}

impl HarvestConfig {
    pub fn fetch_settings(&self) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                base_delay: Duration::from_millis(self.retry_backoff_ms),
            },
            allowed_content_types: defaults.allowed_content_types,
        }
    }

    pub fn harvest_settings(&self) -> HarvestSettings {
        HarvestSettings {
            main_url: self.main_url.clone(),
            tasks_url: self.tasks_url.clone(),
            output_file: self.output_file.clone(),
            workers: self.workers,
            fetch: self.fetch_settings(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PredictConfig {
    pub input_dir: PathBuf,
    pub model_dir: PathBuf,
    pub top_n: usize,
    pub scorer: ScorerKind,
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./Snippets"),
            model_dir: PathBuf::from("./model"),
            top_n: 1,
            scorer: ScorerKind::Linear,
        }
    }
}

impl LangidConfig {
    /// Read the config file.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let mut config = Self::parse(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        config.source = Some(path);
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Reject settings that would only fail later, after work has started.
    pub fn validate(&self) -> Result<()> {
        if self.predict.top_n == 0 {
            bail!("predict.top_n must be at least 1");
        }
        if self.harvest.workers == 0 {
            bail!("harvest.workers must be at least 1");
        }
        if self.harvest.max_bytes == 0 {
            bail!("harvest.max_bytes must be positive");
        }
        if self.harvest.request_timeout_secs == 0 {
            bail!("harvest.request_timeout_secs must be positive");
        }
        self.normalizer
            .validate()
            .context("invalid normalizer.line_break_token")?;
        Ok(())
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
