//! Shared foundations for crm-sync.
//!
//! This crate holds the pieces every other crm-sync crate depends on:
//!
//! - **Configuration**: a statically-typed [`CrmSyncConfig`] loaded once per
//!   invocation from defaults, `crm-sync.toml` and `CRM_SYNC_*` variables
//! - **Environment**: the resolved [`EnvironmentDefinition`] describing the
//!   B2C Commerce instance and Salesforce org a command targets
//! - **Layout**: naming conventions for deployable archives and generated
//!   metadata on the local filesystem
//! - **Secrets**: a redacting [`SecretValue`] wrapper for credentials

pub mod config;
pub mod environment;
pub mod error;
pub mod layout;
pub mod secret;

pub use config::{
    B2cConfig, CrmSyncConfig, DxPathsConfig, OoboConfig, PathsConfig, SfConfig, SfOoboConfig,
};
pub use environment::{
    B2cConnection, EnvironmentDefinition, EnvironmentSettings, Requirement, ScratchOrgOptions,
    SfConnection,
};
pub use error::{CoreError, CoreResult};
pub use layout::ArtifactScope;
pub use secret::SecretValue;
