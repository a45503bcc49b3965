//! Loading and persisting the configuration document.
//!
//! The store searches an ordered list of candidate paths (environment
//! override, per-user config directory, home dotfile, project file) and
//! loads the first one that exists. Persisting rewrites the whole document
//! to the exact path it was loaded from; no partial writes are attempted.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use ortho_config::ConfigDiscovery;
use thiserror::Error;

use crate::document::Document;

const APP_NAME: &str = "remex";
const CONFIG_ENV_VAR: &str = "REMEX_CONFIG_PATH";
const CONFIG_FILE_NAME: &str = "remex.json";
const DOTFILE_NAME: &str = ".remex.json";
const PROJECT_FILE_NAME: &str = "remex.json";

/// Errors raised while loading or persisting the configuration file.
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    /// Raised when no candidate configuration file exists. A default file is
    /// never synthesized.
    #[error("no configuration file found; checked {candidates}")]
    NotFound {
        /// Comma-separated list of the paths that were checked.
        candidates: String,
    },
    /// Raised when file system operations fail.
    #[error("failed to access {path}: {message}")]
    Io {
        /// Path that could not be accessed.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
    /// Raised when parsing or rendering JSON content fails.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// Path that could not be parsed.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
    /// Raised when a candidate path has no filename component.
    #[error("invalid configuration path {path}: {message}")]
    InvalidPath {
        /// Path that was rejected.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
}

/// Reads and writes `remex.json` using `OrthoConfig`'s discovery search
/// order.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    discovery: ConfigDiscovery,
}

impl ConfigStore {
    /// Builds a config store using the standard remex discovery settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            discovery: ConfigDiscovery::builder(APP_NAME)
                .env_var(CONFIG_ENV_VAR)
                .config_file_name(CONFIG_FILE_NAME)
                .dotfile_name(DOTFILE_NAME)
                .project_file_name(PROJECT_FILE_NAME)
                .build(),
        }
    }

    /// Builds a config store using an explicit discovery configuration.
    #[must_use]
    pub const fn with_discovery(discovery: ConfigDiscovery) -> Self {
        Self { discovery }
    }

    /// Loads the first existing candidate and returns it with its path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::NotFound`] when no candidate exists, or
    /// [`ConfigStoreError::Io`]/[`ConfigStoreError::Parse`] when the file
    /// cannot be read or decoded.
    pub fn load(&self) -> Result<(Document, Utf8PathBuf), ConfigStoreError> {
        let candidates = self.discovery.utf8_candidates();

        for candidate in &candidates {
            if path_exists(candidate)? {
                let contents = read_config(candidate)?;
                let document = serde_json::from_str(&contents).map_err(|err| {
                    ConfigStoreError::Parse {
                        path: candidate.clone(),
                        message: err.to_string(),
                    }
                })?;
                return Ok((document, candidate.clone()));
            }
        }

        let listed: Vec<&str> = candidates.iter().map(|candidate| candidate.as_str()).collect();
        Err(ConfigStoreError::NotFound {
            candidates: listed.join(", "),
        })
    }

    /// Serializes the full document back to `path`, overwriting it.
    ///
    /// The output is pretty-printed JSON with non-ASCII characters preserved.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::Io`] when the write fails.
    pub fn persist(&self, path: &Utf8Path, document: &Document) -> Result<(), ConfigStoreError> {
        let rendered =
            serde_json::to_string_pretty(document).map_err(|err| ConfigStoreError::Parse {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        write_config(path, &rendered)
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

fn split_path(path: &Utf8Path) -> Result<(&Utf8Path, &str), ConfigStoreError> {
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| ConfigStoreError::InvalidPath {
            path: path.to_path_buf(),
            message: String::from("configuration file path is missing a filename"),
        })?;
    Ok((parent, file_name))
}

fn path_exists(path: &Utf8Path) -> Result<bool, ConfigStoreError> {
    let (parent, file_name) = split_path(path)?;

    match Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir
            .try_exists(file_name)
            .map_err(|err| ConfigStoreError::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(ConfigStoreError::Io {
            path: parent.to_path_buf(),
            message: err.to_string(),
        }),
    }
}

fn read_config(path: &Utf8Path) -> Result<String, ConfigStoreError> {
    let (parent, file_name) = split_path(path)?;

    let dir =
        Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| ConfigStoreError::Io {
            path: parent.to_path_buf(),
            message: err.to_string(),
        })?;

    dir.read_to_string(file_name)
        .map_err(|err| ConfigStoreError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

fn write_config(path: &Utf8Path, rendered: &str) -> Result<(), ConfigStoreError> {
    let (parent, file_name) = split_path(path)?;
    Dir::create_ambient_dir_all(parent, ambient_authority()).map_err(|err| {
        ConfigStoreError::Io {
            path: parent.to_path_buf(),
            message: err.to_string(),
        }
    })?;

    let dir =
        Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| ConfigStoreError::Io {
            path: parent.to_path_buf(),
            message: err.to_string(),
        })?;

    dir.write(file_name, rendered)
        .map_err(|err| ConfigStoreError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}
