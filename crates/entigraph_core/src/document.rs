//! JSON document source and the generic `Record` entity kind.
//!
//! A document lists entities by label with their kind and properties:
//!
//! ```json
//! {
//!   "entities": [
//!     { "label": 7, "kind": "person", "properties": { "Name": "X" } }
//!   ]
//! }
//! ```
//!
//! [`load_document`] registers one lazily activated [`Record`] per entry.
//! A record's properties are copied out of the document the first time the
//! record is activated.

use crate::entity::{ensure_activated, ActivationMode, EntityCore, Persistent};
use crate::error::{CoreError, CoreResult};
use crate::model::GraphModel;
use crate::types::{EntityLabel, OrderingKey};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Property values of one record, keyed by property name.
pub type Properties = BTreeMap<String, Value>;

/// One entity entry of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordData {
    /// Entity label.
    pub label: u64,
    /// Entity kind name.
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Property values.
    #[serde(default)]
    pub properties: Properties,
}

fn default_kind() -> String {
    "record".to_owned()
}

/// A serialized graph of entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonDocument {
    /// Entity entries.
    pub entities: Vec<RecordData>,
}

impl JsonDocument {
    /// Parses a document from a string.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses a document from a reader.
    pub fn from_reader(reader: impl Read) -> CoreResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Reads and parses a document file.
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Serializes the document as pretty-printed JSON.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the document to `path`, replacing any existing file.
    pub fn write_to_path(&self, path: &Path) -> CoreResult<()> {
        let mut file = File::create(path)?;
        file.write_all(self.to_json()?.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }

    /// Captures the current state of `records`, activating each for read.
    pub fn from_records(records: &[Arc<Record>]) -> CoreResult<Self> {
        let entities = records
            .iter()
            .map(|record| record.to_data())
            .collect::<CoreResult<Vec<_>>>()?;
        Ok(Self { entities })
    }
}

/// Document entries indexed by label, shared by all records of a load.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    records: HashMap<EntityLabel, RecordData>,
}

impl DocumentIndex {
    /// Indexes a document.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateLabel` if two entries share a label.
    pub fn new(document: JsonDocument) -> CoreResult<Self> {
        let mut records = HashMap::with_capacity(document.entities.len());
        for data in document.entities {
            let label = EntityLabel::new(data.label);
            if records.insert(label, data).is_some() {
                return Err(CoreError::DuplicateLabel { label });
            }
        }
        Ok(Self { records })
    }

    /// Returns the entry for `label`.
    pub fn get(&self, label: EntityLabel) -> Option<&RecordData> {
        self.records.get(&label)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the document had no entries.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A generic entity whose properties come from a [`JsonDocument`].
#[derive(Debug)]
pub struct Record {
    core: EntityCore,
    kind: String,
    source: Arc<DocumentIndex>,
    properties: RwLock<Option<Properties>>,
}

/// Setter payload: property name and value (`None` removes the property).
type Assignment = (String, Option<Value>);

impl Record {
    /// Creates a record backed by `source`.
    pub fn new(
        model: &Arc<GraphModel>,
        label: EntityLabel,
        kind: impl Into<String>,
        source: Arc<DocumentIndex>,
    ) -> Arc<Self> {
        Arc::new(Self {
            core: EntityCore::new(model, label, false),
            kind: kind.into(),
            source,
            properties: RwLock::new(None),
        })
    }

    /// Returns a property value, activating the record for read first.
    pub fn get(&self, name: &str) -> CoreResult<Option<Value>> {
        ensure_activated(self, false)?;
        Ok(self
            .properties
            .read()
            .as_ref()
            .and_then(|p| p.get(name).cloned()))
    }

    /// Returns all properties, activating the record for read first.
    pub fn properties(&self) -> CoreResult<Properties> {
        ensure_activated(self, false)?;
        Ok(self.properties.read().clone().unwrap_or_default())
    }

    /// Returns the record as a document entry, activating it for read first.
    pub fn to_data(&self) -> CoreResult<RecordData> {
        Ok(RecordData {
            label: self.core.label().as_u64(),
            kind: self.kind.clone(),
            properties: self.properties()?,
        })
    }

    /// Sets a property through the transactional protocol.
    ///
    /// Returns the previous value.
    pub fn set(
        self: &Arc<Self>,
        name: &str,
        value: Value,
        ordering: OrderingKey,
    ) -> CoreResult<Option<Value>> {
        let old = self.get(name)?;
        self.set_value(
            Self::assign,
            (name.to_owned(), old.clone()),
            (name.to_owned(), Some(value)),
            name,
            ordering,
        )?;
        Ok(old)
    }

    /// Removes a property through the transactional protocol.
    pub fn remove(self: &Arc<Self>, name: &str, ordering: OrderingKey) -> CoreResult<Option<Value>> {
        let old = self.get(name)?;
        if old.is_some() {
            self.set_value(
                Self::assign,
                (name.to_owned(), old.clone()),
                (name.to_owned(), None),
                name,
                ordering,
            )?;
        }
        Ok(old)
    }

    fn assign(&self, (name, value): Assignment) {
        let mut guard = self.properties.write();
        let properties = guard.get_or_insert_with(Properties::new);
        match value {
            Some(value) => {
                properties.insert(name, value);
            }
            None => {
                properties.remove(&name);
            }
        }
    }
}

impl Persistent for Record {
    fn core(&self) -> &EntityCore {
        &self.core
    }

    fn materialize(&self, mode: ActivationMode) -> CoreResult<()> {
        let mut properties = self.properties.write();
        if properties.is_some() {
            // Already loaded for read; write activation needs nothing more.
            return Ok(());
        }

        let label = self.core.label();
        let data = self
            .source
            .get(label)
            .ok_or_else(|| CoreError::materialization(label, "no entry in document"))?;
        debug!(entity = %label, ?mode, count = data.properties.len(), "loading record properties");
        *properties = Some(data.properties.clone());
        Ok(())
    }

    fn kind(&self) -> &str {
        &self.kind
    }
}

/// Registers one lazily activated [`Record`] per document entry.
///
/// Records are returned in document order. Loading is all or nothing: a
/// label already in `model` fails the load before anything is registered,
/// and a failed registration discards the records registered before it.
pub fn load_document(model: &Arc<GraphModel>, document: JsonDocument) -> CoreResult<Vec<Arc<Record>>> {
    let entries: Vec<(EntityLabel, String)> = document
        .entities
        .iter()
        .map(|d| (EntityLabel::new(d.label), d.kind.clone()))
        .collect();
    let source = Arc::new(DocumentIndex::new(document)?);
    if let Some((label, _)) = entries.iter().find(|(label, _)| model.contains(*label)) {
        return Err(CoreError::DuplicateLabel { label: *label });
    }

    let mut records: Vec<Arc<Record>> = Vec::with_capacity(entries.len());
    for (label, kind) in entries {
        let record = Record::new(model, label, kind, Arc::clone(&source));
        if let Err(e) = model.register(Arc::clone(&record) as Arc<dyn Persistent>) {
            // Registration can fail after insertion when activating on register.
            if model
                .get(label)
                .is_some_and(|found| Arc::as_ptr(&found).cast::<()>() == Arc::as_ptr(&record).cast::<()>())
            {
                records.push(record);
            }
            for loaded in &records {
                if let Err(discard) = model.discard(loaded.label()) {
                    warn!(entity = %loaded.label(), error = %discard, "could not discard record");
                }
            }
            return Err(e);
        }
        records.push(record);
    }
    debug!(count = records.len(), "document loaded");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::entity::ActivationStatus;
    use serde_json::json;

    const DOC: &str = r#"{
        "entities": [
            { "label": 7, "kind": "person", "properties": { "Name": "X", "Age": 30 } },
            { "label": 8, "properties": {} }
        ]
    }"#;

    #[test]
    fn parse_document() {
        let doc = JsonDocument::from_json(DOC).unwrap();
        assert_eq!(doc.entities.len(), 2);
        assert_eq!(doc.entities[0].kind, "person");
        assert_eq!(doc.entities[1].kind, "record");
    }

    #[test]
    fn parse_error_is_reported() {
        let err = JsonDocument::from_json("{ not json").unwrap_err();
        assert!(matches!(err, CoreError::Json(_)));
    }

    #[test]
    fn duplicate_labels_rejected() {
        let doc = JsonDocument::from_json(
            r#"{ "entities": [ { "label": 1 }, { "label": 1 } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            DocumentIndex::new(doc),
            Err(CoreError::DuplicateLabel { .. })
        ));
    }

    #[test]
    fn records_load_lazily() {
        let model = GraphModel::in_memory();
        let records = load_document(&model, JsonDocument::from_json(DOC).unwrap()).unwrap();
        let person = &records[0];

        assert_eq!(model.len(), 2);
        assert_eq!(person.kind(), "person");
        assert_eq!(
            person.activation_status().unwrap(),
            ActivationStatus::NotActivated
        );

        assert_eq!(person.get("Name").unwrap(), Some(json!("X")));
        assert_eq!(
            person.activation_status().unwrap(),
            ActivationStatus::ActivatedRead
        );
        assert_eq!(model.stats().read_activations, 1);
    }

    #[test]
    fn set_and_rollback() {
        let model = GraphModel::in_memory();
        let records = load_document(&model, JsonDocument::from_json(DOC).unwrap()).unwrap();
        let person = Arc::clone(&records[0]);

        model.begin().unwrap();
        let old = person.set("Name", json!("Y"), OrderingKey::new(1)).unwrap();
        assert_eq!(old, Some(json!("X")));
        assert_eq!(person.get("Name").unwrap(), Some(json!("Y")));

        model.rollback().unwrap();
        assert_eq!(person.get("Name").unwrap(), Some(json!("X")));
    }

    #[test]
    fn new_property_is_removed_on_undo() {
        let model = GraphModel::in_memory();
        let records = load_document(&model, JsonDocument::from_json(DOC).unwrap()).unwrap();
        let empty = Arc::clone(&records[1]);

        model
            .transaction(|_| empty.set("Note", json!("hi"), OrderingKey::new(0)))
            .unwrap();
        assert_eq!(empty.properties().unwrap().len(), 1);

        model.undo().unwrap();
        assert!(empty.properties().unwrap().is_empty());
    }

    #[test]
    fn remove_property() {
        let model = GraphModel::new(ModelConfig::new().transactional(false));
        let records = load_document(&model, JsonDocument::from_json(DOC).unwrap()).unwrap();
        let person = &records[0];

        assert_eq!(
            person.remove("Age", OrderingKey::new(2)).unwrap(),
            Some(json!(30))
        );
        assert_eq!(person.get("Age").unwrap(), None);
        assert_eq!(person.remove("Age", OrderingKey::new(2)).unwrap(), None);
    }

    #[test]
    fn missing_entry_declines_activation() {
        let model = GraphModel::in_memory();
        let source = Arc::new(DocumentIndex::default());
        let orphan = Record::new(&model, EntityLabel::new(99), "record", source);

        let err = orphan.get("Name").unwrap_err();
        assert!(matches!(err, CoreError::ActivationDeclined { .. }));
        assert_eq!(model.stats().activations_declined, 1);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();

        let doc = JsonDocument::from_path(file.path()).unwrap();
        assert_eq!(doc.entities[0].properties["Age"], json!(30));

        let round = JsonDocument::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(round, doc);
    }

    #[test]
    fn save_committed_state() {
        let model = GraphModel::in_memory();
        let records = load_document(&model, JsonDocument::from_json(DOC).unwrap()).unwrap();
        model
            .transaction(|_| records[0].set("Name", json!("Y"), OrderingKey::new(1)))
            .unwrap();

        let file = tempfile::NamedTempFile::new().unwrap();
        JsonDocument::from_records(&records)
            .unwrap()
            .write_to_path(file.path())
            .unwrap();

        let saved = JsonDocument::from_path(file.path()).unwrap();
        assert_eq!(saved.entities.len(), 2);
        assert_eq!(saved.entities[0].kind, "person");
        assert_eq!(saved.entities[0].properties["Name"], json!("Y"));
        assert_eq!(saved.entities[0].properties["Age"], json!(30));
    }

    #[test]
    fn load_with_taken_label_registers_nothing() {
        let model = GraphModel::in_memory();
        let taken = Record::new(&model, EntityLabel::new(8), "record", Arc::default());
        model.register(taken as Arc<dyn Persistent>).unwrap();

        let err = load_document(&model, JsonDocument::from_json(DOC).unwrap()).unwrap_err();

        assert!(matches!(
            err,
            CoreError::DuplicateLabel { label } if label == EntityLabel::new(8)
        ));
        assert_eq!(model.len(), 1);
        assert!(!model.contains(EntityLabel::new(7)));
    }
}
