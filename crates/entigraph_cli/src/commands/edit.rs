//! Edit command implementation.

use entigraph_core::{
    load_document, EntityLabel, GraphModel, JsonDocument, OrderingKey, Persistent,
};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use tracing::info;

/// Options for the edit command.
#[derive(Debug, Clone, Default)]
pub struct EditOptions {
    /// Roll the transaction back instead of committing.
    pub rollback: bool,
    /// Write the committed document back to its file.
    pub save: bool,
    /// Output format (text, json).
    pub format: String,
}

/// Edit result.
#[derive(Debug, Serialize)]
pub struct EditResult {
    /// Entity label.
    pub label: u64,
    /// Property name.
    pub property: String,
    /// Value before the edit.
    pub old: Option<Value>,
    /// Value written by the edit.
    pub new: Value,
    /// Transaction outcome (committed, rolled back).
    pub outcome: String,
    /// Value after the transaction finished.
    pub current: Option<Value>,
    /// Whether the document file was rewritten.
    pub saved: bool,
}

/// Runs the edit command.
pub fn run(
    path: &Path,
    label: u64,
    property: &str,
    raw_value: &str,
    options: &EditOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = edit(path, label, property, parse_value(raw_value), options)?;

    match options.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Interprets a command-line value as JSON, falling back to a string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

/// Sets `property` of entity `label` in the document at `path`.
pub fn edit(
    path: &Path,
    label: u64,
    property: &str,
    value: Value,
    options: &EditOptions,
) -> Result<EditResult, Box<dyn std::error::Error>> {
    let model = GraphModel::in_memory();
    let records = load_document(&model, JsonDocument::from_path(path)?)?;
    let record = records
        .iter()
        .find(|record| record.label() == EntityLabel::new(label))
        .ok_or_else(|| format!("No entity with label {} in {:?}", label, path))?;

    model.begin()?;
    let old = match record.set(property, value.clone(), OrderingKey::default()) {
        Ok(old) => old,
        Err(e) => {
            model.rollback()?;
            return Err(e.into());
        }
    };

    let outcome = if options.rollback {
        let txid = model.rollback()?;
        info!(%txid, entity = label, property, "edit rolled back");
        "rolled back"
    } else {
        let txid = model.commit()?;
        info!(%txid, entity = label, property, "edit committed");
        "committed"
    };

    let saved = options.save && !options.rollback;
    if saved {
        JsonDocument::from_records(&records)?.write_to_path(path)?;
    }

    Ok(EditResult {
        label,
        property: property.to_owned(),
        old,
        new: value,
        outcome: outcome.to_owned(),
        current: record.get(property)?,
        saved,
    })
}

fn print_text_output(result: &EditResult) {
    let show = |value: &Option<Value>| {
        value
            .as_ref()
            .map_or_else(|| "(unset)".to_owned(), Value::to_string)
    };

    println!("Entity #{} {}", result.label, result.property);
    println!("  old: {}", show(&result.old));
    println!("  new: {}", result.new);
    println!("Transaction {}", result.outcome);
    if result.outcome != "committed" {
        println!("  restored: {}", show(&result.current));
    }
    if result.saved {
        println!("Document saved");
    }
}
