//! Table rows printed by the commands.

use crm_sync_b2c::cartridges::CartridgeRemoval;
use crm_sync_b2c::oobo::OoboRegistration;
use crm_sync_b2c::sites::{SiteFailure, SiteRecord};
use crm_sync_b2c::VersionSummary;
use crm_sync_sfdc::OoboSiteUpdate;
use tabled::{Table, Tabled};

#[derive(Tabled)]
pub struct PropertyRow {
    #[tabled(rename = "Property")]
    pub property: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl PropertyRow {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

#[derive(Tabled)]
pub struct VersionRow {
    #[tabled(rename = "Code Version")]
    pub id: String,
    #[tabled(rename = "Active")]
    pub active: bool,
    #[tabled(rename = "Last Modified")]
    pub last_modification_time: String,
    #[tabled(rename = "Compatibility")]
    pub compatibility_mode: String,
}

impl From<&VersionSummary> for VersionRow {
    fn from(summary: &VersionSummary) -> Self {
        Self {
            id: summary.id.clone(),
            active: summary.active,
            last_modification_time: summary
                .last_modification_time
                .clone()
                .unwrap_or_default(),
            compatibility_mode: summary.compatibility_mode.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
pub struct SiteRow {
    #[tabled(rename = "Site ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Customer List")]
    pub customer_list: String,
}

impl From<&SiteRecord> for SiteRow {
    fn from(site: &SiteRecord) -> Self {
        Self {
            id: site.id.clone(),
            name: site.name().to_owned(),
            status: site.storefront_status.clone().unwrap_or_default(),
            customer_list: site.customer_list_id().to_owned(),
        }
    }
}

#[derive(Tabled)]
pub struct FailedSiteRow {
    #[tabled(rename = "Site ID")]
    pub id: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Reason")]
    pub message: String,
}

impl From<&SiteFailure> for FailedSiteRow {
    fn from(failure: &SiteFailure) -> Self {
        Self {
            id: failure.site_id.clone(),
            status: failure.status.map(|s| s.to_string()).unwrap_or_default(),
            message: failure.message.clone(),
        }
    }
}

#[derive(Tabled)]
pub struct RemovalRow {
    #[tabled(rename = "Site ID")]
    pub site_id: String,
    #[tabled(rename = "Cartridge")]
    pub cartridge: String,
    #[tabled(rename = "Outcome")]
    pub outcome: String,
}

impl From<&CartridgeRemoval> for RemovalRow {
    fn from(removal: &CartridgeRemoval) -> Self {
        Self {
            site_id: removal.site_id.clone(),
            cartridge: removal.cartridge.clone(),
            outcome: removal.outcome.to_string(),
        }
    }
}

#[derive(Tabled)]
pub struct OoboRow {
    #[tabled(rename = "Site ID")]
    pub site_id: String,
    #[tabled(rename = "Customer List")]
    pub customer_list_id: String,
    #[tabled(rename = "Customer No")]
    pub customer_no: String,
    #[tabled(rename = "Result")]
    pub result: &'static str,
}

impl From<&OoboRegistration> for OoboRow {
    fn from(registration: &OoboRegistration) -> Self {
        Self {
            site_id: registration.site_id.clone(),
            customer_list_id: registration.customer_list_id.clone(),
            customer_no: registration.customer_no.clone(),
            result: if registration.exists { "exists" } else { "created" },
        }
    }
}

#[derive(Tabled)]
pub struct OoboSiteRow {
    #[tabled(rename = "Site ID")]
    pub site_id: String,
    #[tabled(rename = "Customer No")]
    pub customer_no: String,
    #[tabled(rename = "Customer Profile")]
    pub contact_id: String,
    #[tabled(rename = "Site Record")]
    pub site_record_id: String,
    #[tabled(rename = "Result")]
    pub result: &'static str,
}

impl From<&OoboSiteUpdate> for OoboSiteRow {
    fn from(update: &OoboSiteUpdate) -> Self {
        Self {
            site_id: update.site_id.clone(),
            customer_no: update.customer_no.clone(),
            contact_id: update.contact_id.clone().unwrap_or_else(|| "(unverified)".to_owned()),
            site_record_id: update.site_record_id.clone().unwrap_or_default(),
            result: if update.updated { "updated" } else { "no site record" },
        }
    }
}

/// Print a titled table, or a placeholder line when there are no rows.
pub fn print_table<T: Tabled>(title: &str, rows: Vec<T>) {
    println!("{title}");
    if rows.is_empty() {
        println!("  (none)");
    } else {
        println!("{}", Table::new(rows));
    }
    println!();
}
