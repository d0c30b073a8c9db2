//! Result rendering
//!
//! Human output prints one line per item (failures to stderr); JSON output
//! prints a single pretty array with one object per input token.

use std::fmt::Display;
use std::io::Write;

use anyhow::Result;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ItemError;
use crate::executor::BatchOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

fn item_error_message(error: &ItemError) -> String {
    match error {
        ItemError::Remote { source, .. } => crate::api::format_api_error(source),
        ItemError::Wait { source, .. } => source.to_string(),
        ItemError::Aborted { reason, .. } => format!("task aborted: {reason}"),
    }
}

/// JSON document for a batch outcome
pub fn outcome_json<T: Serialize>(outcome: &BatchOutcome<T>) -> Result<Value> {
    let mut items = Vec::with_capacity(outcome.len());
    for item in &outcome.items {
        let value = match &item.result {
            Ok(result) => {
                let result = serde_json::to_value(result)?;
                json!({ "token": item.token, "uuid": item.uuid, "result": result })
            }
            Err(error) => json!({
                "token": item.token,
                "uuid": item.uuid,
                "error": item_error_message(error),
            }),
        };
        items.push(value);
    }
    Ok(Value::Array(items))
}

/// Write a batch outcome
pub fn render_outcome<T: Serialize>(
    outcome: &BatchOutcome<T>,
    format: OutputFormat,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(&outcome_json(outcome)?)?)?;
        }
        OutputFormat::Human => {
            for item in &outcome.items {
                match &item.result {
                    Ok(_) => writeln!(out, "{} ({}): ok", item.token, item.uuid)?,
                    Err(e) => writeln!(
                        err,
                        "{} ({}): {}",
                        item.token,
                        item.uuid,
                        item_error_message(e)
                    )?,
                }
            }
        }
    }
    Ok(())
}

/// Write records returned by `show`
pub fn render_records<T: Serialize + Display>(
    records: &[T],
    format: OutputFormat,
    out: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(records)?)?,
        OutputFormat::Human => {
            for record in records {
                writeln!(out, "{record}")?;
            }
        }
    }
    Ok(())
}
