mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use langid_core::{HarvestSummary, Normalizer};
use langid_engine::{
    export_token_lines, load_artifacts, load_registry, render_report, Harvester, Predictor,
    ReqwestFetcher, ScorerKind,
};
use langid_logging::{langid_error, langid_info, LogLevel};

use crate::config::{LangidConfig, DEFAULT_CONFIG_FILE};

#[derive(Debug, Parser)]
#[command(name = "langid")]
#[command(version)]
#[command(about = "Guess the programming language of source snippets", long_about = None)]
struct Cli {
    /// RON configuration file (default: ./langid.ron if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log per-page and per-file details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scrape labeled code snippets into a CSV corpus
    Harvest {
        #[arg(long)]
        workers: Option<usize>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// JSON file listing the languages to keep
        #[arg(long)]
        languages: Option<PathBuf>,
        #[arg(long)]
        max_retries: Option<u32>,
    },
    /// Rank likely languages for every .txt file in a directory
    Predict {
        #[arg(long)]
        input_dir: Option<PathBuf>,
        #[arg(long)]
        model_dir: Option<PathBuf>,
        /// Number of labels to report per file
        #[arg(long)]
        top: Option<usize>,
        #[arg(long, value_enum)]
        scorer: Option<ScorerArg>,
    },
    /// Normalize a corpus into JSON lines for training
    Tokenize {
        #[arg(long)]
        corpus: Option<PathBuf>,
        #[arg(long, default_value = "tokens.jsonl")]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ScorerArg {
    Linear,
    Sequence,
}

impl From<ScorerArg> for ScorerKind {
    fn from(arg: ScorerArg) -> Self {
        match arg {
            ScorerArg::Linear => ScorerKind::Linear,
            ScorerArg::Sequence => ScorerKind::Sequence,
        }
    }
}

impl Cli {
    /// Fold command-line overrides into the file configuration.
    fn apply_overrides(&self, config: &mut LangidConfig) {
        if self.verbose {
            config.logging.level = LogLevel::Debug;
        }
        match &self.command {
            Commands::Harvest {
                workers,
                output,
                languages,
                max_retries,
            } => {
                if let Some(workers) = workers {
                    config.harvest.workers = *workers;
                }
                if let Some(output) = output {
                    config.harvest.output_file = output.clone();
                }
                if let Some(languages) = languages {
                    config.harvest.languages_path = languages.clone();
                }
                if let Some(max_retries) = max_retries {
                    config.harvest.max_retries = *max_retries;
                }
            }
            Commands::Predict {
                input_dir,
                model_dir,
                top,
                scorer,
            } => {
                if let Some(input_dir) = input_dir {
                    config.predict.input_dir = input_dir.clone();
                }
                if let Some(model_dir) = model_dir {
                    config.predict.model_dir = model_dir.clone();
                }
                if let Some(top) = top {
                    config.predict.top_n = *top;
                }
                if let Some(scorer) = scorer {
                    config.predict.scorer = (*scorer).into();
                }
            }
            Commands::Tokenize { corpus, .. } => {
                if let Some(corpus) = corpus {
                    config.harvest.output_file = corpus.clone();
                }
            }
        }
    }
}

fn harvest_command(config: &LangidConfig) -> Result<()> {
    let registry = load_registry(&config.harvest.languages_path)
        .context("cannot load the language registry")?;
    let settings = config.harvest.harvest_settings();
    let fetcher = ReqwestFetcher::new(settings.fetch.clone()).context("cannot build HTTP client")?;
    let harvester = Harvester::new(settings, registry, Arc::new(fetcher))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("cannot start async runtime")?;
    let summary = runtime.block_on(harvester.run())?;
    print_summary(&summary, config);
    Ok(())
}

fn print_summary(summary: &HarvestSummary, config: &LangidConfig) {
    println!(
        "Wrote {} snippets from {} tasks to {}",
        summary.snippets,
        summary.tasks,
        config.harvest.output_file.display()
    );
    println!(
        "Skipped: {} failed tasks, {} unregistered blocks, {} output blocks, {} unmatched blocks",
        summary.failed_tasks,
        summary.skipped_unregistered,
        summary.skipped_output,
        summary.skipped_mismatch
    );
}

fn predict_command(config: &LangidConfig) -> Result<()> {
    let predict = &config.predict;
    let artifacts = load_artifacts(&predict.model_dir, predict.scorer)
        .with_context(|| format!("cannot load model from {}", predict.model_dir.display()))?;
    let predictor = Predictor::new(
        artifacts,
        Normalizer::new(config.normalizer.clone()),
        predict.top_n,
    )?;
    let report = predictor
        .predict_dir(&predict.input_dir)
        .context("prediction failed")?;
    print!("{}", render_report(&report));
    Ok(())
}

fn tokenize_command(config: &LangidConfig, output: &Path) -> Result<()> {
    let normalizer = Normalizer::new(config.normalizer.clone());
    let summary = export_token_lines(&config.harvest.output_file, output, &normalizer)
        .with_context(|| {
            format!(
                "cannot tokenize corpus {}",
                config.harvest.output_file.display()
            )
        })?;
    println!(
        "Wrote {} rows ({} tokens, {} languages) to {}",
        summary.rows,
        summary.total_tokens,
        summary.labels.len(),
        summary.output_path.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = LangidConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    langid_logging::initialize(&config.logging);
    langid_info!("langid {} starting", env!("CARGO_PKG_VERSION"));
    match &config.source {
        Some(path) => langid_info!("Loaded configuration from {:?}", path),
        None => langid_info!("No {} found, using defaults", DEFAULT_CONFIG_FILE),
    }

    let result = match &cli.command {
        Commands::Harvest { .. } => harvest_command(&config),
        Commands::Predict { .. } => predict_command(&config),
        Commands::Tokenize { output, .. } => tokenize_command(&config, output),
    };
    if let Err(err) = &result {
        langid_error!("{:#}", err);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn predict_flags_override_file_values() {
        let cli = Cli::try_parse_from([
            "langid",
            "predict",
            "--top",
            "3",
            "--scorer",
            "sequence",
            "--model-dir",
            "models/nn",
        ])
        .unwrap();
        let mut config = LangidConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.predict.top_n, 3);
        assert_eq!(config.predict.scorer, ScorerKind::Sequence);
        assert_eq!(config.predict.model_dir, PathBuf::from("models/nn"));
        assert_eq!(config.predict.input_dir, PathBuf::from("./Snippets"));
    }

    #[test]
    fn zero_top_is_caught_by_validation() {
        let cli = Cli::try_parse_from(["langid", "predict", "--top", "0"]).unwrap();
        let mut config = LangidConfig::default();
        cli.apply_overrides(&mut config);
        assert!(config.validate().is_err());
    }

    #[test]
    fn harvest_flags_and_verbose_apply() {
        let cli = Cli::try_parse_from([
            "langid",
            "harvest",
            "--workers",
            "2",
            "--output",
            "out.csv",
            "-v",
        ])
        .unwrap();
        let mut config = LangidConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.harvest.workers, 2);
        assert_eq!(config.harvest.output_file, PathBuf::from("out.csv"));
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn unknown_scorer_flag_is_rejected() {
        assert!(Cli::try_parse_from(["langid", "predict", "--scorer", "forest"]).is_err());
    }
}
