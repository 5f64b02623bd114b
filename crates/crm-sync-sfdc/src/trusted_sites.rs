//! CSP trusted-site metadata for the B2C Commerce instance.

use std::path::PathBuf;

use crm_sync_core::{EnvironmentDefinition, Requirement};
use tracing::info;

use crate::error::SfdcResult;
use crate::templates::{self, TemplateSet};

const FOLDER: &str = "cspTrustedSites";
const KIND: &str = "cspTrustedSite";

/// Render `<instance>.cspTrustedSite<ext>` from the trusted-site template.
pub fn create_trusted_site(
    templates: &TemplateSet,
    env: &EnvironmentDefinition,
) -> SfdcResult<PathBuf> {
    env.validate(&[Requirement::B2cInstanceName])?;
    let host_name = env.b2c.host()?;
    let instance_name = env.b2c.instance_name()?;

    let template = templates.load(FOLDER, KIND)?;
    let contents = templates::render(
        &template,
        &[("B2CHOSTNAME", host_name), ("INSTANCENAME", instance_name)],
    );

    let file_name = format!("{instance_name}.{KIND}{}", templates.meta_extension());
    let path = templates.write(FOLDER, &file_name, &contents)?;

    info!(path = %path.display(), "trusted site rendered");
    Ok(path)
}
