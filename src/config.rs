//! Run configuration and persisted user settings.

use crate::error::{RedactorError, RedactorResult};
use crate::redaction::RedactionMode;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default name of the sanitized output file.
pub const DEFAULT_OUTPUT_FILENAME: &str = "anonymized_document.pdf";

/// Default name of the term file inside the config directory.
pub const TERMS_FILENAME: &str = "redaction_terms.json";

/// The inputs of a single redaction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub input: PathBuf,
    pub output_folder: PathBuf,
    pub output_filename: String,
    pub mode: RedactionMode,
}

impl RunConfig {
    pub fn new(
        input: impl Into<PathBuf>,
        output_folder: impl Into<PathBuf>,
        output_filename: impl Into<String>,
        mode: RedactionMode,
    ) -> Self {
        Self {
            input: input.into(),
            output_folder: output_folder.into(),
            output_filename: output_filename.into(),
            mode,
        }
    }

    /// Where the sanitized document is written.
    pub fn output_path(&self) -> PathBuf {
        self.output_folder.join(&self.output_filename)
    }

    /// Checks the configuration before any file is touched.
    ///
    /// The output filename must be a bare file name and the output path must
    /// not be the input document.
    pub fn validate(&self) -> RedactorResult<()> {
        let name = self.output_filename.trim();
        if name.is_empty() {
            return Err(RedactorError::InvalidInput {
                parameter: "output_filename".to_string(),
                reason: "Output filename is empty".to_string(),
            });
        }
        if Path::new(name).file_name().and_then(|n| n.to_str()) != Some(name) {
            return Err(RedactorError::InvalidInput {
                parameter: "output_filename".to_string(),
                reason: format!("'{}' is not a plain file name", name),
            });
        }
        if same_file(&self.input, &self.output_path()) {
            return Err(RedactorError::InvalidInput {
                parameter: "output".to_string(),
                reason: "Output would overwrite the input document".to_string(),
            });
        }
        Ok(())
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// User settings, stored as TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_folder: Option<PathBuf>,

    #[serde(default = "default_output_filename")]
    pub output_filename: String,

    #[serde(default)]
    pub mode: RedactionMode,

    /// Term file; the config directory's `redaction_terms.json` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_file: Option<PathBuf>,

    /// Replace an existing output file without asking.
    #[serde(default)]
    pub overwrite: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_folder: None,
            output_filename: default_output_filename(),
            mode: RedactionMode::default(),
            terms_file: None,
            overwrite: false,
        }
    }
}

fn default_output_filename() -> String {
    DEFAULT_OUTPUT_FILENAME.to_string()
}

/// Errors raised while reading or writing the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{}': {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("settings file '{}' is not valid: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to write settings file '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Settings {
    /// Loads settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Writes settings to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let content = toml::to_string_pretty(self)?;
        let write_error = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(path, content).map_err(write_error)
    }

    /// Per-user configuration directory.
    pub fn config_dir() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("org", "anonymizer", "anonymizer") {
            dirs.config_dir().to_path_buf()
        } else {
            PathBuf::from(".anonymizer")
        }
    }

    /// Default settings file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Term file in effect for these settings.
    pub fn terms_path(&self) -> PathBuf {
        self.terms_file
            .clone()
            .unwrap_or_else(|| Self::config_dir().join(TERMS_FILENAME))
    }
}
