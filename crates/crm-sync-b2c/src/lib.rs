//! B2C Commerce integration for crm-sync.
//!
//! The centrepiece is the deployment [`pipeline`], which sequences
//! locate, authenticate, deploy, activate and verify against a
//! [`CommerceApi`]. The remaining modules cover the provisioning steps
//! that surround a deployment:
//!
//! - [`archive`]: build and locate `<instance>-code.zip` / `<instance>-data.zip`
//! - [`verify`]: check credentials, storefront sites and the code version
//! - [`ocapi_config`]: fetch and audit the API client's OCAPI settings
//! - [`cartridges`]: remove crm-sync cartridges from site cartridge paths
//! - [`oobo`]: register order-on-behalf-of customers

pub mod api;
pub mod archive;
pub mod cartridges;
pub mod error;
pub mod ocapi_config;
pub mod oobo;
pub mod pipeline;
pub mod sites;
pub mod verify;
pub mod version;

pub use api::{AuthToken, CommerceApi, Credentials, MockCommerceApi, OcapiClient};
pub use archive::{ArchiveSummary, ArtifactReference};
pub use error::{B2cError, B2cResult, StageError};
pub use pipeline::{DeploymentResult, Pipeline, PipelineState, Stage};
pub use sites::{SiteRecord, SiteVerification};
pub use version::VersionSummary;
