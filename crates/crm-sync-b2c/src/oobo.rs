//! Order-on-behalf-of (OOBO) customer registration.
//!
//! Each storefront gets one synthetic customer that agents place orders
//! for. Its customer number is written to a site preference so the
//! storefront can find it.

use crm_sync_core::OoboConfig;
use serde_json::{json, Value};
use tracing::info;

use crate::api::{AuthToken, OcapiClient};
use crate::error::B2cResult;
use crate::sites::SiteRecord;

/// Registration result for one site.
#[derive(Debug, Clone)]
pub struct OoboRegistration {
    pub site_id: String,
    pub customer_list_id: String,
    pub customer_no: String,
    /// The customer already existed and was left untouched.
    pub exists: bool,
    pub profile: Value,
}

/// `<prefix><siteId>`
#[must_use]
pub fn customer_no(config: &OoboConfig, site_id: &str) -> String {
    format!("{}{site_id}", config.customer_no_prefix)
}

/// Profile sent when creating the customer.
#[must_use]
pub fn customer_profile(config: &OoboConfig, site_id: &str) -> Value {
    let customer_no = customer_no(config, site_id);
    let email = format!("{}@{}", customer_no.to_ascii_lowercase(), config.email_domain);
    json!({
        "customer_no": customer_no,
        "last_name": config.last_name,
        "email": email,
        "login": email,
    })
}

/// Ensure every site has its OOBO customer, then record the customer
/// number in the site preference.
pub async fn register_customers(
    client: &OcapiClient,
    token: &AuthToken,
    sites: &[SiteRecord],
    config: &OoboConfig,
) -> B2cResult<Vec<OoboRegistration>> {
    let mut registrations = Vec::with_capacity(sites.len());

    for site in sites {
        let list_id = site.customer_list_id();
        let customer_no = customer_no(config, &site.id);

        let (exists, profile) = match client.get_customer(token, list_id, &customer_no).await? {
            Some(profile) => (true, profile),
            None => {
                let body = customer_profile(config, &site.id);
                let profile = client
                    .create_customer(token, list_id, &customer_no, &body)
                    .await?;
                (false, profile)
            }
        };

        client
            .update_site_preference(
                token,
                &site.id,
                &config.preference_group,
                &config.instance_type,
                &config.preference_attribute,
                &customer_no,
            )
            .await?;

        info!(
            site_id = %site.id,
            customer_list = %list_id,
            customer_no = %customer_no,
            exists,
            "OOBO customer registered"
        );

        registrations.push(OoboRegistration {
            site_id: site.id.clone(),
            customer_list_id: list_id.to_owned(),
            customer_no,
            exists,
            profile,
        });
    }

    Ok(registrations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_uses_site_scoped_identity() {
        let config = OoboConfig::default();
        let profile = customer_profile(&config, "RefArch");
        assert_eq!(profile["customer_no"], "OOBO-RefArch");
        assert_eq!(profile["email"], "oobo-refarch@oobo.b2ccrmsync.invalid");
        assert_eq!(profile["login"], profile["email"]);
    }
}
