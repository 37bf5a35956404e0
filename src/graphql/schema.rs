//! Schema assembly
//!
//! Every call to [`build`] starts from empty registries: output types first,
//! then query fields, then the root object. The resulting [`GraphSchema`] is
//! immutable and cheap to clone.

use std::sync::Arc;

use async_graphql::dynamic::{Object, Schema};
use async_graphql::{Request, Response};
use tracing::{info, info_span};

use super::queries::{QueryField, build_query_fields};
use super::registry::{
    CollectionSet, QUERY_ROOT, QueryRegistry, QueryRegistryHandle, TypeRegistry,
};
use super::scalars::{JSON_SCALAR, RawFilterScalar};
use super::types::{build_type, type_name};
use crate::config::AdapterConfig;
use crate::error::{Error, Result};

/// A built schema together with the query fields it exposes
#[derive(Clone)]
pub struct GraphSchema {
    schema: Schema,
    queries: QueryRegistryHandle,
}

impl std::fmt::Debug for GraphSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphSchema").finish_non_exhaustive()
    }
}

impl GraphSchema {
    /// Run a query against the schema
    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        self.schema.execute(request).await
    }

    /// Schema definition language for the whole schema
    pub fn sdl(&self) -> String {
        self.schema.sdl()
    }

    /// The underlying executable schema, for handing to a transport
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    fn registry(&self) -> Option<&QueryRegistry> {
        self.queries.get()
    }

    /// Root query field names in registration order
    pub fn query_field_names(&self) -> Vec<String> {
        self.registry()
            .map(|r| r.names().map(String::from).collect())
            .unwrap_or_default()
    }

    /// Argument names of one root query field, in declaration order
    pub fn argument_names(&self, field: &str) -> Option<Vec<String>> {
        self.query_field(field).map(|f| f.argument_names())
    }

    pub fn query_field(&self, name: &str) -> Option<&Arc<QueryField>> {
        self.registry().and_then(|r| r.get(name))
    }
}

/// Build a schema from the configured collections
pub fn build(config: &AdapterConfig) -> Result<GraphSchema> {
    let span = info_span!(
        "build_schema",
        collections = config.collections.len(),
        expose_query_language = config.expose_query_language
    );
    let _enter = span.enter();

    if config.collections.is_empty() {
        return Err(Error::configuration("at least one collection is required"));
    }

    let collections = CollectionSet::new(&config.collections)?;
    for collection in collections.iter() {
        let name = type_name(collection.identity());
        if name == QUERY_ROOT || name == JSON_SCALAR {
            return Err(Error::configuration(format!(
                "collection `{}` clashes with the built-in type `{}`",
                collection.identity(),
                name
            )));
        }
    }

    let handle = QueryRegistryHandle::default();
    let mut types = TypeRegistry::default();
    for collection in collections.iter() {
        build_type(collection, &collections, &handle, &mut types)?;
    }

    let mut queries = QueryRegistry::default();
    for collection in collections.iter() {
        build_query_fields(collection, config.expose_query_language, &mut queries)?;
    }

    let root = queries.root_object();
    let field_count = queries.len();
    if handle.set(queries).is_err() {
        return Err(Error::Schema("query fields were registered twice".to_string()));
    }

    let type_count = types.len();
    let with_json = config.expose_query_language || types.uses_json();

    let mut builder = Schema::build(QUERY_ROOT, None, None)
        .register(root)
        .extension(async_graphql::extensions::Tracing);
    if with_json {
        builder = builder.register(RawFilterScalar::definition());
    }
    let schema = types
        .into_objects()
        .fold(builder, |builder, object| builder.register(object))
        .finish()
        .map_err(|e| Error::Schema(e.to_string()))?;

    info!(
        types = type_count,
        query_fields = field_count,
        json_scalar = with_json,
        "Schema built"
    );

    Ok(GraphSchema {
        schema,
        queries: handle,
    })
}

/// Mutations are not generated; asking for a mutation root always fails
pub fn mutation_root(_config: &AdapterConfig) -> Result<Object> {
    Err(Error::Unsupported("mutations"))
}
