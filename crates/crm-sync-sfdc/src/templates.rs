//! SFDX metadata templates.
//!
//! Templates live under `<templates>/<folder>/template.<kind><ext>` and carry
//! `{{PLACEHOLDER}}` markers. Rendered instances are written to
//! `<dx base>/<deploy path>/<folder>/`.

use std::path::PathBuf;

use crm_sync_core::layout;
use crm_sync_core::DxPathsConfig;

use crate::error::{SfdcError, SfdcResult};

/// Reads templates and writes rendered metadata for one SFDX project.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    templates_dir: PathBuf,
    package_dir: PathBuf,
    meta_extension: String,
}

impl TemplateSet {
    #[must_use]
    pub fn new(dx: &DxPathsConfig) -> Self {
        Self {
            templates_dir: dx.templates.clone(),
            package_dir: dx.package_dir(),
            meta_extension: dx.meta_extension.clone(),
        }
    }

    /// Metadata file extension (e.g. `-meta.xml`).
    #[must_use]
    pub fn meta_extension(&self) -> &str {
        &self.meta_extension
    }

    /// Directory rendered files of `folder` are written to.
    #[must_use]
    pub fn output_dir(&self, folder: &str) -> PathBuf {
        self.package_dir.join(folder)
    }

    /// Read `template.<kind><ext>` from `folder`.
    pub fn load(&self, folder: &str, kind: &str) -> SfdcResult<String> {
        let path = self
            .templates_dir
            .join(folder)
            .join(format!("template.{kind}{}", self.meta_extension));
        std::fs::read_to_string(&path).map_err(|source| SfdcError::Template { path, source })
    }

    /// Write a rendered instance, creating the folder when missing.
    pub fn write(&self, folder: &str, file_name: &str, contents: &str) -> SfdcResult<PathBuf> {
        let dir = self.output_dir(folder);
        layout::ensure_dir(&dir)?;
        let path = dir.join(file_name);
        std::fs::write(&path, contents).map_err(|e| SfdcError::io(&path, e))?;
        Ok(path)
    }
}

/// Replace every `{{KEY}}` marker with its value.
#[must_use]
pub fn render(template: &str, replacements: &[(&str, &str)]) -> String {
    replacements
        .iter()
        .fold(template.to_owned(), |acc, (key, value)| {
            acc.replace(&format!("{{{{{key}}}}}"), value)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_replaces_every_marker() {
        let rendered = render(
            "<a>{{SITEID}}</a><b>{{SITEID}}</b><c>{{OTHER}}</c>",
            &[("SITEID", "RefArch")],
        );
        assert_eq!(rendered, "<a>RefArch</a><b>RefArch</b><c>{{OTHER}}</c>");
    }

    #[test]
    fn load_and_write_use_configured_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let dx = DxPathsConfig {
            base: dir.path().join("src/sfdc"),
            templates: dir.path().join("templates"),
            ..DxPathsConfig::default()
        };
        std::fs::create_dir_all(dir.path().join("templates/cspTrustedSites")).unwrap();
        std::fs::write(
            dir.path().join("templates/cspTrustedSites/template.cspTrustedSite-meta.xml"),
            "<url>{{B2CHOSTNAME}}</url>",
        )
        .unwrap();

        let set = TemplateSet::new(&dx);
        let template = set.load("cspTrustedSites", "cspTrustedSite").unwrap();
        let path = set.write("cspTrustedSites", "x.cspTrustedSite-meta.xml", &template).unwrap();
        assert!(path.starts_with(dir.path().join("src/sfdc/base/main/default/cspTrustedSites")));
    }

    #[test]
    fn missing_template_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let dx = DxPathsConfig {
            templates: dir.path().to_path_buf(),
            ..DxPathsConfig::default()
        };
        let err = TemplateSet::new(&dx).load("connectedApps", "connectedApp").unwrap_err();
        assert!(matches!(err, SfdcError::Template { .. }));
    }
}
