//! `crm-sync sf ...`

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use clap::Subcommand;
use crm_sync_b2c::{verify, OcapiClient};
use crm_sync_core::Requirement;
use crm_sync_sfdc::{
    create_connected_apps, create_trusted_site, deploy_source, run_instance_setup,
    SalesforceClient, TemplateSet,
};
use tracing::warn;

use super::Context;
use crate::output::{print_table, FailedSiteRow, PropertyRow};

#[derive(Debug, Subcommand)]
pub enum SfCommand {
    /// Generate connected-app metadata for every verified storefront site
    ConnectedAppsCreate,

    /// Generate the CSP trusted site for the B2C Commerce instance
    TrustedSitesCreate,

    /// Deploy the SFDX project with the sf CLI
    OrgDeploy {
        /// Source directory to deploy (defaults to the SFDX base directory)
        #[arg(long)]
        source_dir: Option<PathBuf>,
    },

    /// Run the B2CInstanceSetup Flow in the org
    InstanceSetup,
}

impl SfCommand {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ConnectedAppsCreate => "sf connected-apps-create",
            Self::TrustedSitesCreate => "sf trusted-sites-create",
            Self::OrgDeploy { .. } => "sf org-deploy",
            Self::InstanceSetup => "sf instance-setup",
        }
    }
}

pub async fn run(command: SfCommand, ctx: &Context) -> Result<()> {
    match command {
        SfCommand::ConnectedAppsCreate => connected_apps_create(ctx).await,
        SfCommand::TrustedSitesCreate => trusted_sites_create(ctx),
        SfCommand::OrgDeploy { source_dir } => org_deploy(ctx, source_dir).await,
        SfCommand::InstanceSetup => instance_setup(ctx).await,
    }
}

async fn connected_apps_create(ctx: &Context) -> Result<()> {
    ctx.env.validate(&[Requirement::B2cInstanceName])?;
    let instance_name = ctx.env.b2c.instance_name()?;

    let client = OcapiClient::for_connection(&ctx.config.b2c, &ctx.env.b2c)
        .context("failed to create the B2C Commerce client")?;
    let (_, sites) = verify::verify_sites(&client, &ctx.env).await?;
    for failure in &sites.failed {
        warn!(site_id = %failure.site_id, "site skipped; no connected app generated");
    }
    if !sites.failed.is_empty() {
        print_table("Skipped sites", sites.failed.iter().map(FailedSiteRow::from).collect());
    }

    let site_ids: Vec<String> = sites.verified.iter().map(|s| s.id.clone()).collect();
    if site_ids.is_empty() {
        warn!("no storefront site could be verified; writing an empty credential file");
    }

    let paths = &ctx.config.paths;
    let report = create_connected_apps(
        &TemplateSet::new(&paths.dx),
        &paths.dx.config,
        &paths.connected_app_file_name,
        instance_name,
        &ctx.config.sf.sync_permset_name,
        &site_ids,
    )?;

    print_table(
        "Connected apps",
        report
            .apps
            .iter()
            .map(|app| PropertyRow::new(app.site_id.clone(), app.file_path.display().to_string()))
            .collect(),
    );
    println!("Credentials written to {}", report.credentials_path.display());
    Ok(())
}

fn trusted_sites_create(ctx: &Context) -> Result<()> {
    let path = create_trusted_site(&TemplateSet::new(&ctx.config.paths.dx), &ctx.env)?;
    println!("Trusted site written to {}", path.display());
    Ok(())
}

async fn org_deploy(ctx: &Context, source_dir: Option<PathBuf>) -> Result<()> {
    let source_dir = source_dir.unwrap_or_else(|| ctx.config.paths.dx.base.clone());
    if !source_dir.exists() {
        bail!("source directory {} does not exist", source_dir.display());
    }

    let summary = deploy_source(
        &ctx.config.sf.sf_binary,
        &source_dir,
        ctx.env.sf.scratch_org_username.as_deref(),
    )
    .await?;

    print_table(
        "Org deploy",
        vec![
            PropertyRow::new("Source", source_dir.display().to_string()),
            PropertyRow::new("Deploy ID", summary.deploy_id.unwrap_or_default()),
            PropertyRow::new("Components", summary.component_count.to_string()),
            PropertyRow::new("Duration", format!("{:.1}s", summary.duration_secs)),
        ],
    );
    Ok(())
}

async fn instance_setup(ctx: &Context) -> Result<()> {
    let client = SalesforceClient::new(&ctx.config.sf)?;
    let outcome = run_instance_setup(&client, &ctx.env).await?;

    print_table(
        "Instance setup",
        vec![PropertyRow::new("Success", outcome.is_success.to_string())],
    );
    if !outcome.is_success {
        bail!("instance setup flow failed: {}", outcome.errors.join("; "));
    }
    Ok(())
}
