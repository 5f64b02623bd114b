//! Locating and building deployable archives.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use crm_sync_core::layout::{self, ArtifactScope};
use crm_sync_core::{B2cConnection, PathsConfig};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{B2cError, B2cResult, StageError};

/// A deployable archive resolved from naming conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReference {
    pub scope: ArtifactScope,
    /// Directory element below the B2C label (`cartridges`, `meta`).
    pub path_element: String,
    /// `<instance>-<label>.zip`
    pub archive_name: String,
    pub resolved_path: PathBuf,
}

impl ArtifactReference {
    /// Compute where the archive for `instance_name` lives.
    #[must_use]
    pub fn resolve(paths: &PathsConfig, instance_name: &str, scope: ArtifactScope) -> Self {
        let archive_name = layout::deploy_archive_name(instance_name, scope);
        Self {
            scope,
            path_element: scope.path_element(paths).to_owned(),
            resolved_path: layout::deploy_path(paths, scope).join(&archive_name),
            archive_name,
        }
    }

    /// Archive name without the `.zip` suffix.
    #[must_use]
    pub fn stem(&self) -> &str {
        self.archive_name
            .strip_suffix(".zip")
            .unwrap_or(&self.archive_name)
    }
}

/// Resolve the archive for the connection's instance and check it exists.
pub fn locate(
    paths: &PathsConfig,
    connection: &B2cConnection,
    scope: ArtifactScope,
) -> Result<ArtifactReference, StageError> {
    let instance_name = connection.instance_name().map_err(StageError::Environment)?;
    let reference = ArtifactReference::resolve(paths, instance_name, scope);

    if !reference.resolved_path.is_file() {
        return Err(StageError::ArtifactNotFound {
            path: reference.resolved_path,
        });
    }

    debug!(path = %reference.resolved_path.display(), "archive located");
    Ok(reference)
}

/// Outcome of building an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub file_count: usize,
    pub bytes: u64,
}

/// Build the archive for a scope from `<sourceRoot>/<b2cLabel>/<pathElement>`.
///
/// Code archives nest every entry under the code-version folder so the
/// instance unpacks them as a code version. Data archives nest under the
/// archive stem, the layout the site-import job expects.
pub fn create_archive(
    paths: &PathsConfig,
    connection: &B2cConnection,
    scope: ArtifactScope,
) -> B2cResult<ArchiveSummary> {
    let instance_name = connection.instance_name()?;
    let reference = ArtifactReference::resolve(paths, instance_name, scope);
    let root = match scope {
        ArtifactScope::Code => connection.code_version()?.to_owned(),
        ArtifactScope::Data => reference.stem().to_owned(),
    };

    let source = layout::source_path(paths, scope);
    let files = collect_files(&source)?;
    if files.is_empty() {
        return Err(B2cError::EmptySource { path: source });
    }

    let target_dir = layout::deploy_path(paths, scope);
    layout::ensure_dir(&target_dir)?;

    let file = File::create(&reference.resolved_path)
        .map_err(|e| B2cError::io(&reference.resolved_path, e))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for relative in &files {
        let entry = format!("{root}/{}", entry_name(relative));
        let full = source.join(relative);
        writer.start_file(entry, options)?;
        let mut input = File::open(&full).map_err(|e| B2cError::io(&full, e))?;
        io::copy(&mut input, &mut writer).map_err(|e| B2cError::io(&full, e))?;
    }
    writer.finish()?;

    let bytes = std::fs::metadata(&reference.resolved_path)
        .map_err(|e| B2cError::io(&reference.resolved_path, e))?
        .len();

    info!(
        path = %reference.resolved_path.display(),
        files = files.len(),
        bytes,
        "archive created"
    );

    Ok(ArchiveSummary {
        path: reference.resolved_path,
        file_count: files.len(),
        bytes,
    })
}

/// Regular files below `root`, relative to it, in a stable order.
fn collect_files(root: &Path) -> B2cResult<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(B2cError::EmptySource {
            path: root.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| B2cError::io(root, io::Error::from(e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

/// Zip entries always use `/` separators.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
