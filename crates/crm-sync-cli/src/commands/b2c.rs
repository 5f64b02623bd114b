//! `crm-sync b2c ...`

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use clap::Subcommand;
use crm_sync_b2c::{archive, cartridges, ocapi_config, oobo, verify, OcapiClient, Pipeline};
use crm_sync_core::{ArtifactScope, Requirement};
use crm_sync_sfdc::{sync_oobo_customers, OoboCustomer, SalesforceClient};
use tracing::warn;

use super::Context;
use crate::output::{
    print_table, FailedSiteRow, OoboRow, OoboSiteRow, PropertyRow, RemovalRow, SiteRow,
    VersionRow,
};

#[derive(Debug, Subcommand)]
pub enum B2cCommand {
    /// Verify credentials, storefront sites and the code version
    Verify,

    /// List the code versions on the instance
    CodeVersions,

    /// Build the deployable archive for a scope
    Zip {
        /// Artifact scope (code or data)
        scope: ArtifactScope,
    },

    /// Deploy, activate and verify the archive for a scope
    Deploy {
        /// Artifact scope (code or data)
        scope: ArtifactScope,
    },

    /// Retrieve the OCAPI configuration of the API client and audit it
    OcapiGet,

    /// Remove the crm-sync cartridges from every verified site
    CartridgesRemove,

    /// Create order-on-behalf-of customers, record them in site preferences
    /// and link them to the org's storefront records
    OoboCustomersCreate,
}

impl B2cCommand {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Verify => "b2c verify",
            Self::CodeVersions => "b2c code-versions",
            Self::Zip { .. } => "b2c zip",
            Self::Deploy { .. } => "b2c deploy",
            Self::OcapiGet => "b2c ocapi-get",
            Self::CartridgesRemove => "b2c cartridges-remove",
            Self::OoboCustomersCreate => "b2c oobo-customers-create",
        }
    }
}

pub async fn run(command: B2cCommand, ctx: &Context) -> Result<()> {
    match command {
        B2cCommand::Verify => verify_environment(ctx).await,
        B2cCommand::CodeVersions => code_versions(ctx).await,
        B2cCommand::Zip { scope } => zip(ctx, scope),
        B2cCommand::Deploy { scope } => deploy(ctx, scope).await,
        B2cCommand::OcapiGet => ocapi_get(ctx).await,
        B2cCommand::CartridgesRemove => cartridges_remove(ctx).await,
        B2cCommand::OoboCustomersCreate => oobo_customers_create(ctx).await,
    }
}

fn client(ctx: &Context) -> Result<OcapiClient> {
    OcapiClient::for_connection(&ctx.config.b2c, &ctx.env.b2c)
        .context("failed to create the B2C Commerce client")
}

async fn verify_environment(ctx: &Context) -> Result<()> {
    let client = client(ctx)?;
    let outcome = verify::verify_environment(&client, &ctx.env).await?;

    print_table(
        "Authentication",
        vec![PropertyRow::new("Access token", outcome.token_preview.clone())],
    );
    print_table(
        "Verified sites",
        outcome.sites.verified.iter().map(SiteRow::from).collect(),
    );
    print_table(
        "Failed sites",
        outcome.sites.failed.iter().map(FailedSiteRow::from).collect(),
    );
    print_table(
        "Code version",
        outcome.code_version.iter().map(VersionRow::from).collect(),
    );

    if !outcome.sites.all_verified() {
        bail!(
            "{} of {} sites could not be verified",
            outcome.sites.failed.len(),
            ctx.env.b2c.site_ids.len()
        );
    }
    if outcome.code_version.is_none() {
        bail!(
            "code version {} does not exist on the instance",
            ctx.env.b2c.code_version()?
        );
    }
    Ok(())
}

async fn code_versions(ctx: &Context) -> Result<()> {
    let client = client(ctx)?;
    let versions = verify::list_code_versions(&client, &ctx.env).await?;
    print_table("Code versions", versions.iter().map(VersionRow::from).collect());
    Ok(())
}

fn zip(ctx: &Context, scope: ArtifactScope) -> Result<()> {
    let summary = archive::create_archive(&ctx.config.paths, &ctx.env.b2c, scope)
        .with_context(|| format!("failed to build the {scope} archive"))?;

    print_table(
        "Archive",
        vec![
            PropertyRow::new("Path", summary.path.display().to_string()),
            PropertyRow::new("Files", summary.file_count.to_string()),
            PropertyRow::new("Bytes", summary.bytes.to_string()),
        ],
    );
    Ok(())
}

async fn deploy(ctx: &Context, scope: ArtifactScope) -> Result<()> {
    let client = client(ctx)?;
    let pipeline = Pipeline::new(Arc::new(client), ctx.config.paths.clone());
    let result = pipeline.run(&ctx.env, scope).await?;

    let display = result.output_display();
    print_table(
        "Deployment",
        vec![
            PropertyRow::new("Scope", scope.to_string()),
            PropertyRow::new("Archive", result.archive().archive_name.clone()),
            PropertyRow::new("Access token", display.auth_token),
            PropertyRow::new("Activation", result.activation().id.clone()),
        ],
    );
    print_table("Version", vec![VersionRow::from(&display.version)]);
    Ok(())
}

async fn ocapi_get(ctx: &Context) -> Result<()> {
    let client = client(ctx)?;
    let report = ocapi_config::fetch_ocapi_config(&client, &ctx.env, &ctx.config.paths.dx.config)
        .await?;

    if let Some(fault) = &report.fault {
        print_table(
            "OCAPI configuration fault",
            vec![
                PropertyRow::new("Status", fault.status.to_string()),
                PropertyRow::new("Fault", fault.fault_type.clone()),
                PropertyRow::new("Message", fault.message.clone()),
            ],
        );
        bail!("the OCAPI configuration could not be retrieved");
    }

    print_table("Global settings", pair_rows(&report.global));
    print_table("Site settings", pair_rows(&report.sites));
    if let Some(path) = &report.audit_path {
        println!("Audit written to {}", path.display());
    }
    Ok(())
}

fn pair_rows(pairs: &[(String, String)]) -> Vec<PropertyRow> {
    pairs
        .iter()
        .map(|(key, value)| PropertyRow::new(key.clone(), value.clone()))
        .collect()
}

async fn cartridges_remove(ctx: &Context) -> Result<()> {
    let client = client(ctx)?;
    let (token, sites) = verify::verify_sites(&client, &ctx.env).await?;
    report_failed_sites(&sites.failed);

    let results = cartridges::remove_cartridges(
        &client,
        &token,
        &sites.verified,
        &ctx.config.b2c.managed_cartridges,
    )
    .await;

    let failures = results
        .iter()
        .filter(|r| matches!(r.outcome, cartridges::RemovalOutcome::Failed(_)))
        .count();
    print_table("Cartridge removal", results.iter().map(RemovalRow::from).collect());

    if failures > 0 {
        bail!("{failures} cartridge removals failed");
    }
    Ok(())
}

async fn oobo_customers_create(ctx: &Context) -> Result<()> {
    ctx.env.validate(&[Requirement::SfLogin, Requirement::SfHost])?;

    let client = client(ctx)?;
    let (token, sites) = verify::verify_sites(&client, &ctx.env).await?;
    report_failed_sites(&sites.failed);

    let registrations =
        oobo::register_customers(&client, &token, &sites.verified, &ctx.config.b2c.oobo).await?;
    print_table(
        "OOBO customers",
        registrations.iter().map(OoboRow::from).collect(),
    );

    let customers: Vec<OoboCustomer> = registrations
        .iter()
        .map(|r| OoboCustomer {
            site_id: r.site_id.clone(),
            customer_list_id: r.customer_list_id.clone(),
            customer_no: r.customer_no.clone(),
        })
        .collect();
    let sf_client = SalesforceClient::new(&ctx.config.sf)?;
    let updates =
        sync_oobo_customers(&sf_client, &ctx.env, &ctx.config.sf.oobo, &customers).await?;

    for update in updates.iter().filter(|u| u.unable_to_verify) {
        warn!(
            site_id = %update.site_id,
            customer_no = %update.customer_no,
            "unable to verify the Salesforce customer profile; consider deleting and re-creating this OOBO customer"
        );
    }
    print_table(
        "Storefront records",
        updates.iter().map(OoboSiteRow::from).collect(),
    );
    Ok(())
}

fn report_failed_sites(failed: &[crm_sync_b2c::sites::SiteFailure]) {
    for failure in failed {
        warn!(site_id = %failure.site_id, status = ?failure.status, "site skipped");
    }
    if !failed.is_empty() {
        print_table("Skipped sites", failed.iter().map(FailedSiteRow::from).collect());
    }
}
