//! # Error Handling
//!
//! This module defines the centralized error type for the `pipeline-reuse`
//! library. It uses `thiserror` to describe every failure mode the engine can
//! report while rewriting pipeline documents.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant carries enough context (file
//!   path, catalog reference) for an operator to find the offending document.
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Two situations are deliberately *not* errors and never produce a value of
//! this type: files whose document kind is unknown, and local steps that have
//! no counterpart in the catalog.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Main error type for pipeline-reuse operations
#[derive(Error, Debug)]
pub enum Error {
    /// A document does not have the shape a transformation requires, for
    /// example a flattened PipelineRun with more than one embedded task.
    #[error("Structural error: {message}")]
    Structural { message: String },

    /// A `uses:` reference or legacy step URL could not be parsed.
    #[error("Invalid reference '{reference}': {message}")]
    Reference { reference: String, message: String },

    /// Catalog content could not be fetched or parsed.
    #[error("Catalog fetch error for {reference}: {message}")]
    CatalogFetch { reference: String, message: String },

    /// The content resolver found no file at the requested location.
    #[error("Not found: {host}/{owner}/{repo}/{path}@{revision}")]
    NotFound {
        host: String,
        owner: String,
        repo: String,
        path: String,
        revision: String,
    },

    /// A step explicitly requested by the user does not exist in the catalog.
    #[error("Step '{step}' not found in catalog task {reference}")]
    CatalogStepNotFound { step: String, reference: String },

    /// A generated document failed target-schema validation.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The configuration file is invalid.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An error occurred while executing a Git command.
    #[error("Git command failed for {url}: {command} - {stderr}")]
    GitCommand {
        command: String,
        url: String,
        stderr: String,
    },

    /// Any error that happened while processing a specific file.
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl Error {
    /// Attach a file path to this error, unless it already carries one.
    pub fn in_file(self, path: &Path) -> Error {
        match self {
            Error::File { .. } => self,
            other => Error::File {
                path: path.to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    pub fn structural(message: impl Into<String>) -> Error {
        Error::Structural {
            message: message.into(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
