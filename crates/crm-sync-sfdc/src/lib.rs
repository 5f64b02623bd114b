//! Salesforce side of crm-sync.
//!
//! Logs in to the org, runs the instance setup Flow, links OOBO customers
//! to storefront records, renders SFDX metadata (connected apps and CSP
//! trusted sites) from templates and deploys the generated project with the
//! `sf` CLI.

pub mod api;
pub mod connected_apps;
pub mod error;
pub mod flow;
pub mod oobo;
pub mod org_deploy;
pub mod templates;
pub mod trusted_sites;

pub use api::{SalesforceClient, SfSession};
pub use connected_apps::{create_connected_apps, ConnectedAppReport};
pub use error::{SfdcError, SfdcResult};
pub use flow::{run_instance_setup, FlowOutcome};
pub use oobo::{sync_oobo_customers, OoboCustomer, OoboSiteUpdate};
pub use org_deploy::{deploy_source, DeploySummary};
pub use templates::TemplateSet;
pub use trusted_sites::create_trusted_site;
