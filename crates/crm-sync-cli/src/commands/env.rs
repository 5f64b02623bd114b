//! `crm-sync env`

use anyhow::Result;

use super::Context;
use crate::output::{print_table, PropertyRow};

/// Print the resolved environment definition with secrets masked.
pub fn run(ctx: &Context) -> Result<()> {
    let rows = ctx
        .env
        .display_rows()
        .into_iter()
        .map(|(name, value)| PropertyRow::new(name, value))
        .collect();

    print_table("Environment definition", rows);
    Ok(())
}
