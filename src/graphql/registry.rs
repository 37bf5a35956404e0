//! Build-scoped registries
//!
//! Every schema build creates its own collection set, type registry and
//! query-field registry. Nothing here is global; two builds never share state.

use std::sync::Arc;

use async_graphql::dynamic::Object;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use super::queries::QueryField;
use crate::collection::Collection;
use crate::error::{Error, Result};

/// Name of the root query type
pub const QUERY_ROOT: &str = "Query";

/// Query fields as seen by relation resolvers.
///
/// Relation fields are built before the query fields exist, so they hold
/// this handle and read it only when a query executes. The assembler fills
/// it exactly once, after every query field is registered.
pub type QueryRegistryHandle = Arc<OnceCell<QueryRegistry>>;

/// The input collections, looked up by case-insensitive identity
pub struct CollectionSet {
    collections: IndexMap<String, Arc<dyn Collection>>,
}

impl std::fmt::Debug for CollectionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionSet")
            .field("collections", &self.collections.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CollectionSet {
    /// Index collections by identity, rejecting empty and duplicate identities
    pub fn new(collections: &[Arc<dyn Collection>]) -> Result<Self> {
        let mut indexed = IndexMap::with_capacity(collections.len());
        for collection in collections {
            let identity = collection.identity();
            if identity.trim().is_empty() {
                return Err(Error::configuration("collection identity must not be empty"));
            }
            if indexed
                .insert(identity.to_lowercase(), collection.clone())
                .is_some()
            {
                return Err(Error::configuration(format!(
                    "duplicate collection identity `{}`",
                    identity
                )));
            }
        }
        Ok(Self {
            collections: indexed,
        })
    }

    pub fn get(&self, identity: &str) -> Option<&Arc<dyn Collection>> {
        self.collections.get(&identity.to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Collection>> {
        self.collections.values()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

/// Output types keyed by type name, in build order
#[derive(Default)]
pub struct TypeRegistry {
    types: IndexMap<String, Object>,
    uses_json: bool,
}

impl TypeRegistry {
    pub fn register(&mut self, name: String, object: Object) {
        self.types.insert(name, object);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Record that some output field is typed with the `JSON` scalar
    pub fn mark_json(&mut self) {
        self.uses_json = true;
    }

    pub fn uses_json(&self) -> bool {
        self.uses_json
    }

    pub fn into_objects(self) -> impl Iterator<Item = Object> {
        self.types.into_values()
    }
}

/// Query fields keyed by field name (`user`, `users`, ...)
#[derive(Default)]
pub struct QueryRegistry {
    fields: IndexMap<String, Arc<QueryField>>,
}

impl QueryRegistry {
    /// Add a field, refusing names another collection already took
    /// (`user` plural and `users` singular are both `users`)
    pub fn register(&mut self, field: QueryField) -> Result<()> {
        if let Some(existing) = self.fields.get(field.name()) {
            return Err(Error::configuration(format!(
                "query field `{}` of collection `{}` clashes with the one built for collection `{}`",
                field.name(),
                field.collection().identity(),
                existing.collection().identity()
            )));
        }
        self.fields.insert(field.name().to_string(), Arc::new(field));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<QueryField>> {
        self.fields.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<QueryField>> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build the root query object exposing exactly the registered fields
    pub fn root_object(&self) -> Object {
        self.fields
            .values()
            .fold(Object::new(QUERY_ROOT), |root, field| {
                root.field(field.to_field())
            })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::collection::MemoryCollection;
    use crate::graphql::queries::build_query_fields;

    fn collections(names: &[&str]) -> Vec<Arc<dyn Collection>> {
        names
            .iter()
            .map(|n| Arc::new(MemoryCollection::new(*n)) as Arc<dyn Collection>)
            .collect()
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let set = CollectionSet::new(&collections(&["User", "article"])).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.get("user").unwrap().identity(), "User");
        assert_eq!(set.get("ARTICLE").unwrap().identity(), "article");
        assert!(set.get("comment").is_none());
    }

    #[test]
    fn test_query_field_names_must_not_clash() {
        let mut registry = QueryRegistry::default();
        let mut sets = collections(&["user", "users"]).into_iter();

        let user = sets.next().unwrap();
        build_query_fields(&user, false, &mut registry).unwrap();
        let users = sets.next().unwrap();
        assert_matches!(
            build_query_fields(&users, false, &mut registry),
            Err(Error::Configuration(msg)) if msg.contains("`users`") && msg.contains("`user`")
        );
        assert_eq!(registry.get("users").unwrap().collection().identity(), "user");
    }

    #[test]
    fn test_duplicate_identity_is_rejected() {
        assert_matches!(
            CollectionSet::new(&collections(&["user", "User"])),
            Err(Error::Configuration(msg)) if msg.contains("duplicate")
        );
        assert_matches!(
            CollectionSet::new(&collections(&[" "])),
            Err(Error::Configuration(_))
        );
    }
}
