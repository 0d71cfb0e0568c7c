//! Service health command

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use crate::client::ApiClient;
use crate::output::{
    color_status, print_json, print_success, print_table, print_warning, OutputFormat,
};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

/// Show overall service health and per-model components
pub async fn show_health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health = client.health().await?;

    if format == OutputFormat::Json {
        return print_json(&health);
    }

    println!("{}", "Service Health".bold());
    println!("{}", "=".repeat(40));
    println!("Status: {}", color_status(&health.status));
    println!(
        "Ready:  {}",
        color_status(if health.ready { "ready" } else { "not ready" })
    );
    println!();

    let mut rows: Vec<ComponentRow> = health
        .components
        .iter()
        .map(|(name, component)| ComponentRow {
            name: name.clone(),
            status: color_status(&component.status),
            message: component.message.clone().unwrap_or_default(),
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    print_table(&rows);
    println!();

    if health.ready {
        print_success("Both models loaded and serving");
    } else {
        print_warning("Service is not ready to serve predictions");
    }

    Ok(())
}
