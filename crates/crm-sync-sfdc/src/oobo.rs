//! Links the B2C OOBO customers to the org's storefront records.
//!
//! Every registered OOBO customer should have a synchronised customer
//! profile in the org. The storefront record of its site is then pointed at
//! that profile and customer number.

use crm_sync_core::{EnvironmentDefinition, Requirement, SfOoboConfig};
use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::api::{soql_literal, SalesforceClient, SfSession};
use crate::error::SfdcResult;

/// A customer registered on the B2C side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OoboCustomer {
    pub site_id: String,
    pub customer_list_id: String,
    pub customer_no: String,
}

/// What happened to the storefront record of one site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OoboSiteUpdate {
    pub site_id: String,
    pub customer_no: String,
    /// Id of the matching customer profile, when one exists.
    pub contact_id: Option<String>,
    /// No customer profile in the org matches the B2C customer.
    pub unable_to_verify: bool,
    pub site_record_id: Option<String>,
    pub updated: bool,
}

/// Log in with the configured user and update the storefront records of
/// the org host.
pub async fn sync_oobo_customers(
    client: &SalesforceClient,
    env: &EnvironmentDefinition,
    config: &SfOoboConfig,
    customers: &[OoboCustomer],
) -> SfdcResult<Vec<OoboSiteUpdate>> {
    env.validate(&[Requirement::SfLogin, Requirement::SfHost])?;

    let sf = &env.sf;
    let session = client
        .login(
            sf.login_url()?,
            sf.username()?,
            sf.password()?,
            sf.security_token()?,
        )
        .await?;

    let instance_url = format!("https://{}", sf.host()?);
    update_oobo_sites(client, &instance_url, &session, config, customers).await
}

/// Look up each customer's profile and storefront record, then write the
/// customer number and profile lookup to the storefront record.
///
/// A missing profile is reported, not fatal; the storefront record still
/// receives the customer number. A missing storefront record leaves
/// nothing to update.
pub async fn update_oobo_sites(
    client: &SalesforceClient,
    instance_url: &str,
    session: &SfSession,
    config: &SfOoboConfig,
    customers: &[OoboCustomer],
) -> SfdcResult<Vec<OoboSiteUpdate>> {
    let mut updates = Vec::with_capacity(customers.len());

    for customer in customers {
        let contact_id = first_id(
            client
                .query(instance_url, session, &contact_query(config, customer))
                .await?,
        );
        if contact_id.is_none() {
            warn!(
                site_id = %customer.site_id,
                customer_no = %customer.customer_no,
                "no customer profile in the org matches the OOBO customer"
            );
        }

        let site_record_id = first_id(
            client
                .query(instance_url, session, &site_query(config, &customer.site_id))
                .await?,
        );

        let updated = match site_record_id.as_deref() {
            Some(record_id) => {
                let mut fields = Map::new();
                fields.insert(
                    config.site_customer_no_field.clone(),
                    json!(customer.customer_no),
                );
                fields.insert(config.site_contact_field.clone(), json!(contact_id));
                client
                    .update_record(
                        instance_url,
                        session,
                        &config.site_object,
                        record_id,
                        &Value::Object(fields),
                    )
                    .await?;
                info!(
                    site_id = %customer.site_id,
                    record_id,
                    customer_no = %customer.customer_no,
                    "storefront record linked to OOBO customer"
                );
                true
            }
            None => {
                warn!(site_id = %customer.site_id, "no storefront record in the org");
                false
            }
        };

        updates.push(OoboSiteUpdate {
            site_id: customer.site_id.clone(),
            customer_no: customer.customer_no.clone(),
            unable_to_verify: contact_id.is_none(),
            contact_id,
            site_record_id,
            updated,
        });
    }

    Ok(updates)
}

fn contact_query(config: &SfOoboConfig, customer: &OoboCustomer) -> String {
    format!(
        "SELECT Id FROM {} WHERE {} = {} AND {} = {} LIMIT 1",
        config.contact_object,
        config.customer_no_field,
        soql_literal(&customer.customer_no),
        config.customer_list_field,
        soql_literal(&customer.customer_list_id),
    )
}

fn site_query(config: &SfOoboConfig, site_id: &str) -> String {
    format!(
        "SELECT Id FROM {} WHERE {} = {} LIMIT 1",
        config.site_object,
        config.site_id_field,
        soql_literal(site_id),
    )
}

fn first_id(records: Vec<Value>) -> Option<String> {
    records
        .into_iter()
        .next()
        .and_then(|r| r.get("Id").and_then(Value::as_str).map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_query_matches_customer_and_list() {
        let customer = OoboCustomer {
            site_id: "RefArch".into(),
            customer_list_id: "RefArch".into(),
            customer_no: "OOBO-RefArch".into(),
        };
        assert_eq!(
            contact_query(&SfOoboConfig::default(), &customer),
            "SELECT Id FROM Contact WHERE B2C_Customer_No__c = 'OOBO-RefArch' \
             AND B2C_CustomerList_ID__c = 'RefArch' LIMIT 1"
        );
        assert_eq!(
            site_query(&SfOoboConfig::default(), "RefArch"),
            "SELECT Id FROM B2C_Site__c WHERE Name = 'RefArch' LIMIT 1"
        );
    }
}
