//! Prediction CLI commands

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde_json::{json, Value};
use std::path::Path;

use super::Slot;
use crate::client::{ApiClient, FeatureMap};
use crate::output::{print_json, print_warning, OutputFormat};

/// Build a request payload from an optional JSON file and `NAME=VALUE` pairs.
///
/// Pairs override entries from the file.
pub fn build_payload(input: Option<&Path>, fields: &[String]) -> Result<FeatureMap> {
    let mut payload = match input {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            match serde_json::from_str::<Value>(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
            {
                Value::Object(map) => map,
                _ => bail!("{} must contain a JSON object", path.display()),
            }
        }
        None => FeatureMap::new(),
    };

    for field in fields {
        let (name, value) = parse_field(field)?;
        payload.insert(name, value);
    }

    Ok(payload)
}

/// Parse `NAME=VALUE`; the value becomes a number, a boolean or a string
pub fn parse_field(field: &str) -> Result<(String, Value)> {
    let (name, raw) = field
        .split_once('=')
        .with_context(|| format!("Expected NAME=VALUE, got '{}'", field))?;

    let name = name.trim();
    if name.is_empty() {
        bail!("Feature name missing in '{}'", field);
    }

    let raw = raw.trim();
    let value = if let Ok(i) = raw.parse::<i64>() {
        json!(i)
    } else if let Some(f) = raw.parse::<f64>().ok().filter(|f| f.is_finite()) {
        json!(f)
    } else if raw.eq_ignore_ascii_case("true") {
        Value::Bool(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Value::Bool(false)
    } else {
        Value::String(raw.to_string())
    };

    Ok((name.to_string(), value))
}

/// Map key under which a congestion code appears in `class_labels`
fn label_key(code: &Value) -> Option<String> {
    match code {
        Value::Number(n) => n
            .as_i64()
            .map(|i| i.to_string())
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| (f as i64).to_string())),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Run a prediction and print the result
pub async fn predict(
    client: &ApiClient,
    slot: Slot,
    input: Option<&Path>,
    fields: &[String],
    format: OutputFormat,
) -> Result<()> {
    let payload = build_payload(input, fields)?;
    if payload.is_empty() {
        print_warning("Sending an empty payload; the service will report every missing feature");
    }

    match slot {
        Slot::Speed => {
            let result = client.predict_speed(&payload).await?;
            match format {
                OutputFormat::Json => print_json(&result)?,
                OutputFormat::Table => {
                    println!(
                        "{} {}",
                        "Predicted speed:".bold(),
                        format!("{:.2}", result.predicted_speed).cyan()
                    );
                }
            }
        }
        Slot::Congestion => {
            let result = client.predict_congestion(&payload).await?;

            // Labels are informational; a failed lookup still prints the code
            let label = match label_key(&result.predicted_congestion) {
                Some(key) => client
                    .model_info(Slot::Congestion.as_str())
                    .await
                    .ok()
                    .and_then(|info| info.class_labels.get(&key).cloned()),
                None => None,
            };

            match format {
                OutputFormat::Json => {
                    let mut body = json!({ "predicted_congestion": result.predicted_congestion });
                    if let Some(label) = &label {
                        body["label"] = json!(label);
                    }
                    print_json(&body)?;
                }
                OutputFormat::Table => {
                    let code = display_value(&result.predicted_congestion);
                    match label {
                        Some(label) => println!(
                            "{} {} ({})",
                            "Predicted congestion:".bold(),
                            code.cyan(),
                            label
                        ),
                        None => println!("{} {}", "Predicted congestion:".bold(), code.cyan()),
                    }
                }
            }
        }
    }

    Ok(())
}
