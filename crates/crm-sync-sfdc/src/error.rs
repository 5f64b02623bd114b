//! Error types for crm-sync-sfdc.

use std::path::PathBuf;

use crm_sync_core::CoreError;

/// Result type alias using [`SfdcError`].
pub type SfdcResult<T> = Result<T, SfdcError>;

/// Errors raised while talking to Salesforce or generating SFDX metadata.
#[derive(Debug, thiserror::Error)]
pub enum SfdcError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response.
    #[error("unexpected response status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The SOAP login was rejected or its response was unreadable.
    #[error("login failed: {0}")]
    Login(String),

    /// Required connection properties are missing, or a filesystem error
    /// surfaced from shared helpers.
    #[error(transparent)]
    Environment(#[from] CoreError),

    /// A metadata template could not be read.
    #[error("unable to read template {}: {source}", path.display())]
    Template {
        /// Template path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Filesystem error at a known path.
    #[error("filesystem error at {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding or decoding failed.
    #[error("serialisation error: {0}")]
    Serialisation(String),

    /// The `sf` CLI failed.
    #[error("sf command failed: {0}")]
    Command(String),
}

impl SfdcError {
    /// Create an I/O error bound to a path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a command error.
    #[must_use]
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }
}

impl From<serde_json::Error> for SfdcError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialisation(err.to_string())
    }
}
