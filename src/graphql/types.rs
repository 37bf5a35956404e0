//! Output types
//!
//! One object type per collection, named after the capitalized identity.
//! Scalar attributes read straight off the parent record; relation attributes
//! resolve through the other collection's query fields, looked up by name
//! when the field executes.

use std::sync::Arc;

use async_graphql::dynamic::{Field, FieldFuture, FieldValue, Object, TypeRef};
use tracing::debug;

use super::queries::{plural_name, singular_name};
use super::registry::{CollectionSet, QueryRegistry, QueryRegistryHandle, TypeRegistry};
use super::relations::{BelongsToLink, HasManyLink, resolve_belongs_to, resolve_has_many};
use super::scalars::{ScalarKind, to_scalar};
use crate::collection::{AttributeRule, Collection, Record};
use crate::error::{Error, Result};

/// Output type name for a collection (`user` -> `User`)
pub fn type_name(identity: &str) -> String {
    let mut chars = identity.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// How one attribute is exposed on its collection's output type
#[derive(Debug, Clone)]
pub enum FieldShape {
    Scalar { kind: ScalarKind, required: bool },
    BelongsTo { link: BelongsToLink, type_name: String },
    HasMany { link: HasManyLink, type_name: String },
}

impl FieldShape {
    pub fn type_ref(&self) -> TypeRef {
        match self {
            FieldShape::Scalar { kind, required } => kind.type_ref(*required),
            FieldShape::BelongsTo { type_name, .. } => TypeRef::named(type_name),
            FieldShape::HasMany { type_name, .. } => TypeRef::named_nn_list_nn(type_name),
        }
    }
}

/// Classify one attribute, resolving relation targets against the input set
pub fn classify(
    collection: &dyn Collection,
    attribute: &str,
    rule: &AttributeRule,
    collections: &CollectionSet,
) -> Result<FieldShape> {
    let target = |identity: &str| {
        collections
            .get(identity)
            .ok_or_else(|| Error::UnknownCollectionReference {
                collection: collection.identity().to_string(),
                attribute: attribute.to_string(),
                target: identity.to_string(),
            })
    };

    let shape = match rule {
        AttributeRule::Scalar(attr) => FieldShape::Scalar {
            kind: to_scalar(attr.type_tag.as_deref()),
            required: attr.required,
        },
        AttributeRule::BelongsTo { model } => {
            let target = target(model)?;
            FieldShape::BelongsTo {
                link: BelongsToLink {
                    attribute: attribute.to_string(),
                    target_query: singular_name(target.identity()),
                    target_primary_key: target.primary_key().to_string(),
                    parent_primary_key: collection.primary_key().to_string(),
                },
                type_name: type_name(target.identity()),
            }
        }
        AttributeRule::HasMany {
            collection: other,
            via,
        } => {
            let target = target(other)?;
            FieldShape::HasMany {
                link: HasManyLink {
                    target_query: plural_name(target.identity()),
                    via: via.clone(),
                    parent_primary_key: collection.primary_key().to_string(),
                },
                type_name: type_name(target.identity()),
            }
        }
    };
    Ok(shape)
}

fn registry(queries: &QueryRegistryHandle) -> Result<&QueryRegistry> {
    queries
        .get()
        .ok_or_else(|| Error::Schema("query fields have not been built".to_string()))
}

fn output_field(name: String, shape: FieldShape, queries: &QueryRegistryHandle) -> Field {
    let type_ref = shape.type_ref();
    let queries = queries.clone();
    let attribute = name.clone();

    Field::new(name, type_ref, move |ctx| {
        let shape = shape.clone();
        let queries = queries.clone();
        let attribute = attribute.clone();
        FieldFuture::new(async move {
            let parent = ctx.parent_value.try_downcast_ref::<Record>()?;
            match shape {
                FieldShape::Scalar { kind, .. } => Ok(parent
                    .get(&attribute)
                    .and_then(|v| kind.coerce(v))
                    .map(FieldValue::value)),
                FieldShape::BelongsTo { link, .. } => {
                    let record = resolve_belongs_to(registry(&queries)?, &link, parent).await?;
                    Ok(record.map(FieldValue::owned_any))
                }
                FieldShape::HasMany { link, .. } => {
                    let records = resolve_has_many(registry(&queries)?, &link, parent).await?;
                    Ok(Some(FieldValue::list(
                        records.into_iter().map(FieldValue::owned_any),
                    )))
                }
            }
        })
    })
}

/// Build the output type for one collection and register it.
///
/// Relation targets must be present in `collections`; the query fields they
/// resolve through only need to exist by the time a query runs.
pub fn build_type(
    collection: &Arc<dyn Collection>,
    collections: &CollectionSet,
    queries: &QueryRegistryHandle,
    types: &mut TypeRegistry,
) -> Result<()> {
    let name = type_name(collection.identity());
    let mut object = Object::new(name.clone());

    for (attribute, rule) in collection.attributes() {
        let shape = classify(collection.as_ref(), attribute, rule, collections)?;
        if let FieldShape::Scalar {
            kind: ScalarKind::Json,
            ..
        } = shape
        {
            types.mark_json();
        }
        object = object.field(output_field(attribute.clone(), shape, queries));
    }

    debug!(
        collection = %collection.identity(),
        type_name = %name,
        fields = collection.attributes().len(),
        "Built output type"
    );

    types.register(name, object);
    Ok(())
}
