//! Error types for crm-sync-b2c.

use std::path::PathBuf;

use crm_sync_core::CoreError;

use crate::pipeline::Stage;

/// Result type alias using [`B2cError`].
pub type B2cResult<T> = Result<T, B2cError>;

/// Errors raised by the B2C Commerce client and archive helpers.
#[derive(Debug, thiserror::Error)]
pub enum B2cError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote answered with a non-success status.
    #[error("unexpected response status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, kept verbatim for diagnostics.
        body: String,
    },

    /// Required connection properties are missing.
    #[error(transparent)]
    Environment(#[from] CoreError),

    /// A response could not be decoded.
    #[error("unable to decode response: {0}")]
    Decode(String),

    /// A deploy receipt carried no usable version identifier.
    #[error("deploy response carries no version identifier")]
    MissingVersion,

    /// The expected version was absent from the remote listing.
    #[error("version '{0}' not found in response")]
    VersionNotFound(String),

    /// The version was found but the remote does not report it active.
    #[error("version '{0}' is not active")]
    Inactive(String),

    /// An import job execution did not finish within the polling budget.
    #[error("job execution '{execution}' still {status} after {attempts} polls")]
    JobTimeout {
        /// Execution id.
        execution: String,
        /// Last reported execution status.
        status: String,
        /// Polls made.
        attempts: u32,
    },

    /// There was nothing to archive.
    #[error("nothing to archive at {}", path.display())]
    EmptySource {
        /// Source directory.
        path: PathBuf,
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

    /// Zip encoding failure.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl B2cError {
    /// Create a decode error.
    #[must_use]
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an I/O error bound to a path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Upstream HTTP status and body, when the remote produced one.
    #[must_use]
    pub fn upstream(&self) -> Option<(u16, &str)> {
        match self {
            Self::Status { status, body } => Some((*status, body.as_str())),
            Self::Http(err) => err.status().map(|s| (s.as_u16(), "")),
            _ => None,
        }
    }
}

/// A deployment pipeline failure, tagged with the stage that failed.
///
/// Stages completed before the failing one are not rolled back.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Connection properties needed to resolve the archive are missing.
    #[error("unable to resolve the deployment environment: {0}")]
    Environment(#[source] CoreError),

    /// The archive does not exist on disk.
    #[error("unable to find the deployment archive at {}", path.display())]
    ArtifactNotFound {
        /// Resolved archive path.
        path: PathBuf,
    },

    #[error("unable to authenticate against the B2C Commerce instance: {0}")]
    Authentication(#[source] B2cError),

    #[error("unable to deploy the archive to the B2C Commerce instance: {0}")]
    DeploymentTransport(#[source] B2cError),

    #[error("unable to activate the deployed version: {0}")]
    Activation(#[source] B2cError),

    #[error("unable to verify the activated version: {0}")]
    Verification(#[source] B2cError),
}

impl StageError {
    /// The stage at which the pipeline stopped.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Environment(_) | Self::ArtifactNotFound { .. } => Stage::Locate,
            Self::Authentication(_) => Stage::Authenticate,
            Self::DeploymentTransport(_) => Stage::Deploy,
            Self::Activation(_) => Stage::Activate,
            Self::Verification(_) => Stage::Verify,
        }
    }

    /// Upstream HTTP status and body, when available.
    #[must_use]
    pub fn upstream(&self) -> Option<(u16, &str)> {
        match self {
            Self::Authentication(e)
            | Self::DeploymentTransport(e)
            | Self::Activation(e)
            | Self::Verification(e) => e.upstream(),
            Self::Environment(_) | Self::ArtifactNotFound { .. } => None,
        }
    }
}
