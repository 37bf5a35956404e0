//! Relation resolution
//!
//! Relation fields never talk to a store directly; they build criteria and
//! hand them to the related collection's query field. Resolution only needs a
//! parent record and the query registry, so it works the same whether the
//! store returned relations pre-populated or as bare foreign keys.

use serde_json::Value as JsonValue;
use tracing::debug;

use super::registry::QueryRegistry;
use crate::collection::{Criteria, Record};
use crate::error::{Error, Result};

/// A to-one relation from a parent attribute to another collection
#[derive(Debug, Clone)]
pub struct BelongsToLink {
    /// Attribute on the parent holding the reference
    pub attribute: String,
    /// Singular query field of the referenced collection
    pub target_query: String,
    pub target_primary_key: String,
    pub parent_primary_key: String,
}

/// A to-many relation: records of another collection pointing back here
#[derive(Debug, Clone)]
pub struct HasManyLink {
    /// Plural query field of the referenced collection
    pub target_query: String,
    /// Attribute on the referenced collection that holds our primary key
    pub via: String,
    pub parent_primary_key: String,
}

/// Work out which identifier a belongs-to attribute refers to.
///
/// Tried in order:
/// 1. the attribute holds a populated record: its primary-key value
/// 2. the parent carries a flat attribute named like the target's primary
///    key (skipped when that name is the parent's own primary key, since it
///    then identifies the parent itself)
/// 3. the attribute's raw value as a scalar identifier
pub fn foreign_identifier(parent: &Record, link: &BelongsToLink) -> Option<JsonValue> {
    let raw = parent.get(&link.attribute).filter(|v| !v.is_null());

    if let Some(JsonValue::Object(populated)) = raw
        && let Some(id) = populated.get(&link.target_primary_key).filter(|v| !v.is_null())
    {
        return Some(id.clone());
    }

    if link.target_primary_key != link.parent_primary_key
        && let Some(id) = parent.get(&link.target_primary_key).filter(|v| !v.is_null())
    {
        return Some(id.clone());
    }

    raw.filter(|v| !v.is_object() && !v.is_array()).cloned()
}

pub async fn resolve_belongs_to(
    queries: &QueryRegistry,
    link: &BelongsToLink,
    parent: &Record,
) -> Result<Option<Record>> {
    let Some(id) = foreign_identifier(parent, link) else {
        return Ok(None);
    };

    let field = queries.get(&link.target_query).ok_or_else(|| {
        Error::Schema(format!("query field `{}` is not registered", link.target_query))
    })?;

    debug!(
        attribute = %link.attribute,
        target = %link.target_query,
        id = %id,
        "Resolving belongs-to relation"
    );

    let criteria = Criteria::new()
        .with(link.target_primary_key.clone(), id)
        .populated();
    field.find_one(criteria).await
}

pub async fn resolve_has_many(
    queries: &QueryRegistry,
    link: &HasManyLink,
    parent: &Record,
) -> Result<Vec<Record>> {
    let Some(id) = parent
        .get(&link.parent_primary_key)
        .filter(|v| !v.is_null())
    else {
        return Ok(Vec::new());
    };

    let field = queries.get(&link.target_query).ok_or_else(|| {
        Error::Schema(format!("query field `{}` is not registered", link.target_query))
    })?;

    debug!(
        via = %link.via,
        target = %link.target_query,
        id = %id,
        "Resolving has-many relation"
    );

    let criteria = Criteria::new()
        .with(link.via.to_lowercase(), id.clone())
        .populated();
    field.find(criteria).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: JsonValue) -> Record {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn author_link(target_pk: &str) -> BelongsToLink {
        BelongsToLink {
            attribute: "author".to_string(),
            target_query: "user".to_string(),
            target_primary_key: target_pk.to_string(),
            parent_primary_key: "id".to_string(),
        }
    }

    #[test]
    fn test_populated_record() {
        let parent = record(json!({ "id": 10, "author": { "id": 1, "name": "Sam" } }));
        assert_eq!(foreign_identifier(&parent, &author_link("id")), Some(json!(1)));
    }

    #[test]
    fn test_flat_identifier_under_target_primary_key() {
        let parent = record(json!({ "id": 10, "userId": 1 }));
        assert_eq!(
            foreign_identifier(&parent, &author_link("userId")),
            Some(json!(1))
        );
    }

    #[test]
    fn test_bare_scalar() {
        let parent = record(json!({ "id": 10, "author": 1 }));
        assert_eq!(foreign_identifier(&parent, &author_link("id")), Some(json!(1)));

        let parent = record(json!({ "id": 10, "author": "u-1" }));
        assert_eq!(
            foreign_identifier(&parent, &author_link("id")),
            Some(json!("u-1"))
        );
    }

    #[test]
    fn test_own_primary_key_is_not_mistaken_for_reference() {
        let parent = record(json!({ "id": 10 }));
        assert_eq!(foreign_identifier(&parent, &author_link("id")), None);

        let parent = record(json!({ "id": 10, "author": null }));
        assert_eq!(foreign_identifier(&parent, &author_link("id")), None);
    }

    #[test]
    fn test_populated_record_without_key_falls_through() {
        let parent = record(json!({ "id": 10, "userId": 3, "author": { "name": "Sam" } }));
        assert_eq!(
            foreign_identifier(&parent, &author_link("userId")),
            Some(json!(3))
        );

        let parent = record(json!({ "id": 10, "author": { "name": "Sam" } }));
        assert_eq!(foreign_identifier(&parent, &author_link("id")), None);
    }

    #[tokio::test]
    async fn test_unregistered_target_is_an_error() {
        let queries = QueryRegistry::default();
        let parent = record(json!({ "id": 10, "author": 1 }));
        assert!(
            resolve_belongs_to(&queries, &author_link("id"), &parent)
                .await
                .is_err()
        );

        let link = HasManyLink {
            target_query: "articles".to_string(),
            via: "author".to_string(),
            parent_primary_key: "id".to_string(),
        };
        assert!(resolve_has_many(&queries, &link, &parent).await.is_err());

        // no primary key on the parent: nothing to look up
        let orphan = record(json!({ "name": "x" }));
        assert!(
            resolve_has_many(&queries, &link, &orphan)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
