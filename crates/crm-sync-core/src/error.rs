//! Error types for crm-sync-core.

use std::path::PathBuf;

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while loading configuration or resolving an environment.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Configuration could not be loaded or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The environment definition lacks properties required by a command.
    #[error("invalid environment definition; missing: {}", missing.join(", "))]
    InvalidEnvironment {
        /// Names of the missing properties, in declaration order.
        missing: Vec<&'static str>,
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
}

impl CoreError {
    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an I/O error bound to a path.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<figment::Error> for CoreError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}
