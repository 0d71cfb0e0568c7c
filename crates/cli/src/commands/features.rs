//! Schema inspection: the ordered features a loaded model expects

use anyhow::Result;
use colored::Colorize;
use tabled::Tabled;

use super::Slot;
use crate::client::ApiClient;
use crate::output::{print_info, print_json, print_table, short_checksum, OutputFormat};

#[derive(Tabled)]
struct FeatureRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Feature")]
    name: String,
}

#[derive(Tabled)]
struct LabelRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Label")]
    label: String,
}

/// Print the expected feature names of a slot's loaded artifact
pub async fn show_features(client: &ApiClient, slot: Slot, format: OutputFormat) -> Result<()> {
    let info = client.model_info(slot.as_str()).await?;

    if format == OutputFormat::Json {
        return print_json(&info);
    }

    println!("{} {}", "Model:".bold(), info.slot.cyan());
    println!("Version:  {}", info.version);
    println!("Checksum: {}", short_checksum(&info.checksum));
    println!("Input:    {}", info.input_dtype);
    println!();

    let rows: Vec<FeatureRow> = info
        .feature_names
        .iter()
        .enumerate()
        .map(|(i, name)| FeatureRow {
            position: i + 1,
            name: name.clone(),
        })
        .collect();
    print_table(&rows);
    println!("\nTotal: {} features", rows.len());

    if !info.class_labels.is_empty() {
        println!();
        print_info("Class labels");
        let labels: Vec<LabelRow> = info
            .class_labels
            .iter()
            .map(|(code, label)| LabelRow {
                code: code.clone(),
                label: label.clone(),
            })
            .collect();
        print_table(&labels);
    }

    Ok(())
}
