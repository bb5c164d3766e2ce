//! Inspect command implementation.

use entigraph_core::{load_document, GraphModel, JsonDocument, Persistent, StatsSnapshot};
use serde::Serialize;
use std::path::Path;

/// Document inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Document path.
    pub path: String,
    /// Number of entities.
    pub entity_count: usize,
    /// Number of entities activated by this run.
    pub activated: usize,
    /// Per-entity details, in label order.
    pub entities: Vec<EntitySummary>,
    /// Model counters after the run.
    pub stats: StatsSummary,
}

/// One entity of the document.
#[derive(Debug, Serialize)]
pub struct EntitySummary {
    /// Entity label.
    pub label: u64,
    /// Entity kind.
    pub kind: String,
    /// Activation status name.
    pub status: String,
    /// Number of properties, when loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_count: Option<usize>,
}

/// Activation counters.
#[derive(Debug, Serialize)]
pub struct StatsSummary {
    /// Read activations.
    pub read_activations: u64,
    /// Write activations.
    pub write_activations: u64,
    /// Declined activations.
    pub activations_declined: u64,
}

impl From<StatsSnapshot> for StatsSummary {
    fn from(stats: StatsSnapshot) -> Self {
        Self {
            read_activations: stats.read_activations,
            write_activations: stats.write_activations,
            activations_declined: stats.activations_declined,
        }
    }
}

/// Runs the inspect command.
pub fn run(path: &Path, activate: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path, activate)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

/// Loads the document at `path` and summarizes its entities.
pub fn inspect(path: &Path, activate: bool) -> Result<InspectResult, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("No document found at {:?}", path).into());
    }

    let model = GraphModel::in_memory();
    let mut records = load_document(&model, JsonDocument::from_path(path)?)?;
    records.sort_by_key(|record| record.label());

    let activated = if activate {
        model.activate_all(false)?
    } else {
        0
    };

    let mut entities = Vec::with_capacity(records.len());
    for record in &records {
        let status = record.activation_status()?;
        // Reading properties would activate the record.
        let property_count = if status.is_activated() {
            Some(record.properties()?.len())
        } else {
            None
        };
        entities.push(EntitySummary {
            label: record.label().as_u64(),
            kind: record.kind().to_owned(),
            status: format!("{:?}", status),
            property_count,
        });
    }

    Ok(InspectResult {
        path: path.display().to_string(),
        entity_count: records.len(),
        activated,
        entities,
        stats: model.stats().into(),
    })
}

fn print_text_output(result: &InspectResult) {
    println!("EntiGraph Document Inspection");
    println!("=============================");
    println!();
    println!("Path: {}", result.path);
    println!("Entities: {}", result.entity_count);
    if result.activated > 0 {
        println!("Activated: {}", result.activated);
    }

    if !result.entities.is_empty() {
        println!();
        println!("{:>10}  {:<16}  {:<20}  Properties", "Label", "Kind", "Status");
        for entity in &result.entities {
            let count = entity
                .property_count
                .map_or_else(|| "-".to_owned(), |n| n.to_string());
            println!(
                "{:>10}  {:<16}  {:<20}  {}",
                entity.label, entity.kind, entity.status, count
            );
        }
    }

    println!();
    println!("Read activations: {}", result.stats.read_activations);
    println!("Write activations: {}", result.stats.write_activations);
    if result.stats.activations_declined > 0 {
        println!("Declined: {}", result.stats.activations_declined);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC: &str = r#"{
        "entities": [
            { "label": 9, "kind": "person", "properties": { "Name": "B" } },
            { "label": 2, "kind": "person", "properties": { "Name": "A", "Age": 3 } }
        ]
    }"#;

    fn document() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();
        file
    }

    #[test]
    fn inspect_without_activation_loads_nothing() {
        let file = document();
        let result = inspect(file.path(), false).unwrap();

        assert_eq!(result.entity_count, 2);
        assert_eq!(result.activated, 0);
        assert_eq!(result.entities[0].label, 2);
        assert_eq!(result.entities[0].status, "NotActivated");
        assert!(result.entities[0].property_count.is_none());
        assert_eq!(result.stats.read_activations, 0);
    }

    #[test]
    fn inspect_with_activation() {
        let file = document();
        let result = inspect(file.path(), true).unwrap();

        assert_eq!(result.activated, 2);
        assert_eq!(result.entities[0].status, "ActivatedRead");
        assert_eq!(result.entities[0].property_count, Some(2));
        assert_eq!(result.entities[1].property_count, Some(1));
        assert_eq!(result.stats.read_activations, 2);
    }

    #[test]
    fn missing_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(inspect(&dir.path().join("absent.json"), false).is_err());
    }
}
