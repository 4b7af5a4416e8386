//! `roster tenants`

use anyhow::Result;
use roster_tenant::Dialect;
use std::path::Path;
use tabled::{Table, Tabled};

use crate::output;

#[derive(Tabled)]
struct TenantRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Database")]
    dialect: String,
    #[tabled(rename = "Default")]
    default: String,
}

pub async fn run(config_path: &Path) -> Result<()> {
    let registry = super::load_registry(config_path)?;
    let directory = registry.directory();

    let rows: Vec<TenantRow> = directory
        .summaries()
        .into_iter()
        .map(|summary| {
            let dialect = directory
                .database_url(&summary.id)
                .ok()
                .and_then(|url| Dialect::from_url(url).ok())
                .map(|d| d.as_str().to_string())
                .unwrap_or_else(|| "unsupported".to_string());
            TenantRow {
                default: if &summary.id == directory.default_tenant() {
                    "yes".to_string()
                } else {
                    String::new()
                },
                id: summary.id.to_string(),
                name: summary.display_name,
                dialect,
            }
        })
        .collect();

    if rows.is_empty() {
        output::failure("No tenants configured");
        return Ok(());
    }

    println!("{}", Table::new(rows));
    output::key_value("Tenants", &directory.len().to_string());
    Ok(())
}
