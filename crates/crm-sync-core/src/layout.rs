//! File-system naming conventions for deployable archives.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::PathsConfig;
use crate::error::{CoreError, CoreResult};

/// What an archive carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactScope {
    /// Cartridge code, deployed as a code version.
    Code,
    /// Site-import metadata, deployed through the import job.
    Data,
}

impl ArtifactScope {
    /// Suffix used in archive names.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Data => "data",
        }
    }

    /// Directory below the B2C label that holds this scope's sources and archives.
    #[must_use]
    pub fn path_element(self, paths: &PathsConfig) -> &str {
        match self {
            Self::Code => &paths.cartridge_path_label,
            Self::Data => &paths.metadata_path_label,
        }
    }
}

impl fmt::Display for ArtifactScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ArtifactScope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "code" => Ok(Self::Code),
            "data" => Ok(Self::Data),
            other => Err(CoreError::config(format!(
                "unknown artifact scope '{other}' (expected 'code' or 'data')"
            ))),
        }
    }
}

/// `<instance>-<label>.zip`
#[must_use]
pub fn deploy_archive_name(instance_name: &str, scope: ArtifactScope) -> String {
    format!("{instance_name}-{}.zip", scope.label())
}

/// Directory receiving the archive: `<deployRoot>/<b2cLabel>/<pathElement>`.
#[must_use]
pub fn deploy_path(paths: &PathsConfig, scope: ArtifactScope) -> PathBuf {
    paths
        .deploy_root
        .join(&paths.b2c_label)
        .join(scope.path_element(paths))
}

/// Directory archived for a scope: `<sourceRoot>/<b2cLabel>/<pathElement>`.
#[must_use]
pub fn source_path(paths: &PathsConfig, scope: ArtifactScope) -> PathBuf {
    paths
        .source_root
        .join(&paths.b2c_label)
        .join(scope.path_element(paths))
}

/// Full path of the archive for an instance.
#[must_use]
pub fn archive_path(paths: &PathsConfig, instance_name: &str, scope: ArtifactScope) -> PathBuf {
    deploy_path(paths, scope).join(deploy_archive_name(instance_name, scope))
}

/// Create a directory and its parents if missing.
pub fn ensure_dir(path: &Path) -> CoreResult<()> {
    std::fs::create_dir_all(path).map_err(|e| CoreError::io(path, e))
}
