#![deny(missing_docs)]
//! Shared logging utilities for the langid workspace.
//!
//! This crate provides the `langid_*` logging macros used across the codebase,
//! the explicit process-start logger initialisation and a minimal test
//! initializer for the global logger.

use std::fs::File;
use std::path::PathBuf;

use log::LevelFilter;
use serde::Deserialize;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! langid_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! langid_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! langid_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! langid_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! langid_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogDestination {
    /// Write to the configured log file only.
    File,
    /// Write to the terminal (stderr for warnings, stdout otherwise).
    #[default]
    Terminal,
    /// Write to both file and terminal.
    Both,
}

/// Verbosity of the global logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Logging disabled.
    Off,
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Progress messages.
    #[default]
    Info,
    /// Per-page and per-file details.
    Debug,
    /// Everything.
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Logger configuration handed over once at process start.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Maximum level emitted by this workspace's crates.
    pub level: LogLevel,
    /// Where records go.
    pub destination: LogDestination,
    /// Log file used by `File` and `Both` destinations.
    pub file_path: PathBuf,
    /// Maximum level emitted by third-party crates (HTTP stack, HTML parser).
    pub dependency_level: LogLevel,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            destination: LogDestination::Terminal,
            file_path: PathBuf::from("./langid.log"),
            dependency_level: LogLevel::Warn,
        }
    }
}

/// Third-party targets logged at `LogSettings::dependency_level` instead of `level`.
const DEPENDENCY_TARGETS: &[&str] = &[
    "reqwest", "hyper", "hyper_util", "rustls", "html5ever", "selectors", "h2",
];

/// Which targets one installed logger accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    All,
    Workspace,
    Dependencies,
}

/// Loggers to install per destination, each with its own level.
///
/// simplelog filters by target prefix, so a dependency level that differs from the main
/// level needs a second logger that only accepts the dependency targets.
fn routes(settings: &LogSettings) -> Vec<(LevelFilter, Scope)> {
    let level = LevelFilter::from(settings.level);
    let dependency_level = LevelFilter::from(settings.dependency_level);
    if dependency_level == level {
        return vec![(level, Scope::All)];
    }
    let mut routes = vec![(level, Scope::Workspace)];
    if dependency_level != LevelFilter::Off {
        routes.push((dependency_level, Scope::Dependencies));
    }
    routes
}

fn build_config(scope: Scope) -> Config {
    let mut builder = ConfigBuilder::new();
    builder
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error);
    for target in DEPENDENCY_TARGETS {
        match scope {
            Scope::All => {}
            Scope::Workspace => {
                builder.add_filter_ignore_str(target);
            }
            Scope::Dependencies => {
                builder.add_filter_allow_str(target);
            }
        }
    }
    builder.build()
}

/// Initialize the global logger from explicit settings.
///
/// Dependency noise is filtered here rather than through environment variables.
/// Returns `false` if a logger was already installed.
pub fn initialize(settings: &LogSettings) -> bool {
    let to_terminal = matches!(
        settings.destination,
        LogDestination::Terminal | LogDestination::Both
    );
    let to_file = matches!(
        settings.destination,
        LogDestination::File | LogDestination::Both
    );
    let file = if to_file {
        create_log_file(settings)
    } else {
        None
    };
    if settings.destination == LogDestination::File && file.is_none() {
        return false;
    }

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    for (level, scope) in routes(settings) {
        if to_terminal {
            loggers.push(TermLogger::new(
                level,
                build_config(scope),
                TerminalMode::Mixed,
                ColorChoice::Auto,
            ));
        }
        if let Some(file) = &file {
            match file.try_clone() {
                Ok(handle) => loggers.push(WriteLogger::new(level, build_config(scope), handle)),
                Err(err) => eprintln!(
                    "Warning: Could not share log file {:?}: {}",
                    settings.file_path, err
                ),
            }
        }
    }

    CombinedLogger::init(loggers).is_ok()
}

fn create_log_file(settings: &LogSettings) -> Option<File> {
    match File::create(&settings.file_path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!(
                "Warning: Could not create log file at {:?}: {}",
                settings.file_path, err
            );
            None
        }
    }
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
