//! Collection definition files
//!
//! Describes collections (and optional seed records) in YAML or JSON so the
//! binary can build a schema without compiling collection code:
//!
//! ```yaml
//! collections:
//!   - identity: user
//!     attributes:
//!       id: { type: integer, primaryKey: true }
//!       firstName: { type: string }
//!       articles: { collection: article, via: author }
//!     records:
//!       - { id: 1, firstName: Sam }
//! ```

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{AttributeRule, Collection, MemoryCollection, Record};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionsFile {
    pub collections: Vec<CollectionDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDefinition {
    pub identity: String,
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeRule>,
    #[serde(default)]
    pub records: Vec<Record>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl CollectionsFile {
    /// Load a definition file, picking the format from its extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration(format!("failed to read {}: {}", path.display(), e))
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml(&contents),
            Some("json") => Self::from_json(&contents),
            other => Err(Error::configuration(format!(
                "unsupported definition file extension {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents)
            .map_err(|e| Error::configuration(format!("invalid collection definitions: {}", e)))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| Error::configuration(format!("invalid collection definitions: {}", e)))
    }

    /// Materialize every definition as an in-memory collection
    pub fn into_collections(self) -> Vec<Arc<dyn Collection>> {
        self.collections
            .into_iter()
            .map(|def| Arc::new(def.into_memory_collection()) as Arc<dyn Collection>)
            .collect()
    }
}

impl CollectionDefinition {
    pub fn into_memory_collection(self) -> MemoryCollection {
        let collection = self
            .attributes
            .into_iter()
            .fold(
                MemoryCollection::new(self.identity).with_primary_key(self.primary_key),
                |c, (name, rule)| c.attribute(name, rule),
            );
        collection.with_records(self.records)
    }
}
