//! Collection contract consumed by the schema builder
//!
//! A collection is an externally owned data-model definition: an identity,
//! an ordered set of attribute rules, a primary key, and a store that can
//! answer `find_one`/`find`/`count`. The adapter only reads the metadata and
//! delegates every query to the store.

pub mod definition;
pub mod memory;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use definition::{CollectionDefinition, CollectionsFile};
pub use memory::MemoryCollection;

/// A stored record: attribute name to JSON value, in attribute order
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Per-attribute metadata.
///
/// Deserializes from the shapes used in definition files:
///
/// ```yaml
/// id: { type: integer, primaryKey: true }
/// author: { model: user }
/// articles: { collection: article, via: author }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeRule {
    /// Inverse side of a relation; `via` names the attribute on the other
    /// collection that points back here
    HasMany { collection: String, via: String },
    /// Holds (or resolves to) an identifier into `model`
    BelongsTo { model: String },
    Scalar(ScalarAttribute),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScalarAttribute {
    /// Primitive type tag (`string`, `integer`, `boolean`, `float`, `json`)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    pub required: bool,
    pub unique: bool,
    pub primary_key: bool,
}

impl AttributeRule {
    pub fn scalar(type_tag: impl Into<String>) -> Self {
        AttributeRule::Scalar(ScalarAttribute {
            type_tag: Some(type_tag.into()),
            ..Default::default()
        })
    }

    pub fn belongs_to(model: impl Into<String>) -> Self {
        AttributeRule::BelongsTo {
            model: model.into(),
        }
    }

    pub fn has_many(collection: impl Into<String>, via: impl Into<String>) -> Self {
        AttributeRule::HasMany {
            collection: collection.into(),
            via: via.into(),
        }
    }

    /// Mark a scalar attribute as required. No effect on relations.
    pub fn required(mut self) -> Self {
        if let AttributeRule::Scalar(ref mut s) = self {
            s.required = true;
        }
        self
    }

    /// Mark a scalar attribute as unique. No effect on relations.
    pub fn unique(mut self) -> Self {
        if let AttributeRule::Scalar(ref mut s) = self {
            s.unique = true;
        }
        self
    }

    /// Mark a scalar attribute as the primary key. No effect on relations.
    pub fn primary_key(mut self) -> Self {
        if let AttributeRule::Scalar(ref mut s) = self {
            s.primary_key = true;
        }
        self
    }

    /// Identity of the collection this rule points at, if it is a relation
    pub fn target(&self) -> Option<&str> {
        match self {
            AttributeRule::BelongsTo { model } => Some(model),
            AttributeRule::HasMany { collection, .. } => Some(collection),
            AttributeRule::Scalar(_) => None,
        }
    }
}

/// Query criteria handed to a collection's store.
///
/// Serializes in the familiar `{ where, limit, skip, sort }` shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
    #[serde(rename = "where")]
    pub filter: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// Ask the store to pre-expand relation attributes
    pub populate: bool,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition to the `where` mapping
    pub fn with(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.filter.insert(key.into(), value);
        self
    }

    pub fn populated(mut self) -> Self {
        self.populate = true;
        self
    }
}

/// An ORM collection the adapter can expose.
///
/// Store operations may be slow or remote; failures are reported as
/// `anyhow::Error` and surface unchanged as per-field query errors.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Unique name of this collection within one build
    fn identity(&self) -> &str;

    /// Attribute rules in declaration order
    fn attributes(&self) -> &IndexMap<String, AttributeRule>;

    /// Name of the primary-key attribute
    fn primary_key(&self) -> &str;

    async fn find_one(&self, criteria: Criteria) -> anyhow::Result<Option<Record>>;

    async fn find(&self, criteria: Criteria) -> anyhow::Result<Vec<Record>>;

    async fn count(&self, criteria: Criteria) -> anyhow::Result<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_attribute_rules_from_yaml() {
        let attrs: IndexMap<String, AttributeRule> = serde_yaml::from_str(
            r#"
id: { type: integer, primaryKey: true }
email: { type: string, unique: true, required: true }
author: { model: user }
articles: { collection: article, via: author }
notes: {}
"#,
        )
        .unwrap();

        let names: Vec<_> = attrs.keys().map(String::as_str).collect();
        assert_eq!(names, ["id", "email", "author", "articles", "notes"]);

        assert_eq!(attrs["id"], AttributeRule::scalar("integer").primary_key());
        assert_eq!(
            attrs["email"],
            AttributeRule::scalar("string").unique().required()
        );
        assert_eq!(attrs["author"], AttributeRule::belongs_to("user"));
        assert_eq!(attrs["articles"], AttributeRule::has_many("article", "author"));
        assert_eq!(
            attrs["notes"],
            AttributeRule::Scalar(ScalarAttribute::default())
        );
    }

    #[test]
    fn test_modifiers_ignore_relations() {
        let rule = AttributeRule::belongs_to("user").required().unique();
        assert_eq!(rule, AttributeRule::belongs_to("user"));
        assert_eq!(rule.target(), Some("user"));
        assert_eq!(AttributeRule::scalar("string").target(), None);
    }

    #[test]
    fn test_criteria_serializes_as_where_clause() {
        let criteria = Criteria::new().with("author", json!(1)).populated();
        assert_eq!(
            serde_json::to_value(&criteria).unwrap(),
            json!({ "where": { "author": 1 }, "populate": true })
        );
    }
}
