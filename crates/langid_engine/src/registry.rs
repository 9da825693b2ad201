use std::fs;
use std::path::{Path, PathBuf};

use langid_core::LanguageRegistry;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("cannot read language list {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("language list {path:?} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("language list {0:?} is empty")]
    Empty(PathBuf),
}

#[derive(Debug, Deserialize)]
struct LanguageFile {
    languages: Vec<String>,
}

/// Load the registry from a `{"languages": [...]}` JSON file.
pub fn load_registry(path: &Path) -> Result<LanguageRegistry, RegistryError> {
    let text = fs::read_to_string(path).map_err(|source| RegistryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: LanguageFile = serde_json::from_str(&text).map_err(|source| RegistryError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let registry = LanguageRegistry::from_names(file.languages);
    if registry.is_empty() {
        return Err(RegistryError::Empty(path.to_path_buf()));
    }
    Ok(registry)
}
