//! Query entry points
//!
//! Each collection gets two root fields: a singular `x(...)` lookup taking
//! only identifying attributes, and a plural `xs(...)` search taking
//! pagination, sort, the remaining attributes and (optionally) a raw `where`
//! filter.

use std::sync::Arc;

use async_graphql::dynamic::{Field, FieldFuture, FieldValue, InputValue, TypeRef};
use async_graphql::Value;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::filters::is_absent;
use super::literal::literal_kind;
use super::registry::QueryRegistry;
use super::scalars::{RawFilterScalar, ScalarKind, to_scalar};
use super::types::type_name;
use crate::collection::{AttributeRule, Collection, Criteria, Record};
use crate::error::{Error, Result};

/// Argument names owned by the plural field itself
pub const RESERVED_ARGUMENTS: [&str; 4] = ["limit", "skip", "sort", "where"];

/// Name of the singular field for a collection (`User` -> `user`)
pub fn singular_name(identity: &str) -> String {
    identity.to_lowercase()
}

/// Name of the plural field for a collection (`User` -> `users`)
pub fn plural_name(identity: &str) -> String {
    format!("{}s", identity.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    One,
    Many,
}

/// An argument accepted by a query field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// Equality filter on an attribute
    Attribute { name: String, kind: ScalarKind },
    Limit,
    Skip,
    Sort,
    /// Raw filter expression merged into the `where` criteria
    Where,
}

impl Argument {
    pub fn name(&self) -> &str {
        match self {
            Argument::Attribute { name, .. } => name,
            Argument::Limit => "limit",
            Argument::Skip => "skip",
            Argument::Sort => "sort",
            Argument::Where => "where",
        }
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            Argument::Attribute { kind, .. } => *kind,
            Argument::Limit | Argument::Skip => ScalarKind::Integer,
            Argument::Sort => ScalarKind::String,
            Argument::Where => ScalarKind::Json,
        }
    }

    fn input_value(&self) -> InputValue {
        InputValue::new(self.name(), TypeRef::named(self.kind().type_name()))
    }
}

/// Attributes split by how they can be queried
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ArgumentPartition {
    /// Primary key and unique attributes, for the singular field
    pub identifying: Vec<Argument>,
    /// Everything else, for the plural field
    pub filterable: Vec<Argument>,
}

/// Split scalar attributes into identifying and filterable arguments,
/// keeping declaration order. Relations are not queryable arguments.
///
/// A filterable attribute named like a built-in plural argument (`limit`,
/// `skip`, `sort`, `where`) is dropped with a warning; it stays readable on
/// the output type but cannot be filtered on individually.
pub fn partition_arguments(collection: &dyn Collection) -> ArgumentPartition {
    let mut partition = ArgumentPartition::default();

    for (name, rule) in collection.attributes() {
        let AttributeRule::Scalar(attr) = rule else {
            continue;
        };
        let argument = Argument::Attribute {
            name: name.clone(),
            kind: to_scalar(attr.type_tag.as_deref()),
        };

        if attr.primary_key || attr.unique || name == collection.primary_key() {
            partition.identifying.push(argument);
        } else if RESERVED_ARGUMENTS.contains(&name.as_str()) {
            warn!(
                collection = %collection.identity(),
                attribute = %name,
                "Attribute collides with a built-in argument and is not exposed as a filter"
            );
        } else {
            partition.filterable.push(argument);
        }
    }

    partition
}

/// A root query field bound to one collection
pub struct QueryField {
    name: String,
    type_name: String,
    cardinality: Cardinality,
    arguments: Vec<Argument>,
    collection: Arc<dyn Collection>,
}

impl QueryField {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn argument_names(&self) -> Vec<String> {
        self.arguments.iter().map(|a| a.name().to_string()).collect()
    }

    pub fn collection(&self) -> &Arc<dyn Collection> {
        &self.collection
    }

    pub fn type_ref(&self) -> TypeRef {
        match self.cardinality {
            Cardinality::One => TypeRef::named(&self.type_name),
            Cardinality::Many => TypeRef::named_nn_list_nn(&self.type_name),
        }
    }

    /// Turn supplied argument values into store criteria.
    ///
    /// The raw `where` filter is applied first so individual attribute
    /// arguments override keys it also sets. Absent values are skipped.
    pub fn build_criteria<'v>(
        &self,
        args: impl IntoIterator<Item = (&'v str, &'v Value)>,
    ) -> Result<Criteria> {
        let supplied: Vec<(&str, &Value)> = args.into_iter().collect();
        let lookup = |name: &str| {
            supplied
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| *v)
        };

        let mut criteria = Criteria::new().populated();

        if let Some(raw) = self
            .arguments
            .iter()
            .find(|a| **a == Argument::Where)
            .and_then(|a| lookup(a.name()))
            .filter(|v| !is_absent(ScalarKind::Json, Some(*v)))
        {
            match RawFilterScalar::to_json(raw)? {
                JsonValue::Object(filter) => criteria.filter.extend(filter),
                _ => {
                    return Err(Error::InvalidArgument {
                        argument: "where".to_string(),
                        reason: format!("expected an object, found {}", literal_kind(raw)),
                    });
                }
            }
        }

        for argument in &self.arguments {
            let Some(value) = lookup(argument.name())
                .filter(|v| !is_absent(argument.kind(), Some(*v)))
            else {
                continue;
            };

            match argument {
                Argument::Limit => criteria.limit = integer_argument("limit", value)?,
                Argument::Skip => criteria.skip = integer_argument("skip", value)?,
                Argument::Sort => {
                    if let Value::String(sort) = value {
                        criteria.sort = Some(sort.clone());
                    }
                }
                Argument::Where => {}
                Argument::Attribute { name, .. } => {
                    criteria
                        .filter
                        .insert(name.clone(), argument_to_json(name, value)?);
                }
            }
        }

        Ok(criteria)
    }

    /// Run this field's store operation
    pub async fn resolve(&self, criteria: Criteria) -> Result<Resolved> {
        match self.cardinality {
            Cardinality::One => self.find_one(criteria).await.map(Resolved::One),
            Cardinality::Many => self.find(criteria).await.map(Resolved::Many),
        }
    }

    pub async fn find_one(&self, criteria: Criteria) -> Result<Option<Record>> {
        debug!(field = %self.name, criteria = ?criteria, "Delegating to find_one");
        Ok(self.collection.find_one(criteria).await?)
    }

    pub async fn find(&self, criteria: Criteria) -> Result<Vec<Record>> {
        debug!(field = %self.name, criteria = ?criteria, "Delegating to find");
        Ok(self.collection.find(criteria).await?)
    }

    /// Executable field definition for the root query object
    pub fn to_field(self: &Arc<Self>) -> Field {
        let query = self.clone();
        let field = Field::new(self.name.clone(), self.type_ref(), move |ctx| {
            let query = query.clone();
            FieldFuture::new(async move {
                let args = ctx.args.as_index_map();
                let criteria = query.build_criteria(args.iter().map(|(k, v)| (k.as_str(), v)))?;
                match query.resolve(criteria).await? {
                    Resolved::One(record) => Ok(record.map(FieldValue::owned_any)),
                    Resolved::Many(records) => Ok(Some(FieldValue::list(
                        records.into_iter().map(FieldValue::owned_any),
                    ))),
                }
            })
        })
        .description(match self.cardinality {
            Cardinality::One => format!("Find one `{}` by a unique attribute", self.type_name),
            Cardinality::Many => format!("Search `{}` records", self.type_name),
        });

        self.arguments
            .iter()
            .fold(field, |field, arg| field.argument(arg.input_value()))
    }
}

/// Outcome of a query field's store operation
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    One(Option<Record>),
    Many(Vec<Record>),
}

fn integer_argument(name: &str, value: &Value) -> Result<Option<i64>> {
    match value {
        Value::Number(n) => n.as_i64().map(Some).ok_or_else(|| Error::InvalidArgument {
            argument: name.to_string(),
            reason: format!("expected an integer, found {}", n),
        }),
        other => Err(Error::InvalidArgument {
            argument: name.to_string(),
            reason: format!("expected an integer, found {}", literal_kind(other)),
        }),
    }
}

fn argument_to_json(name: &str, value: &Value) -> Result<JsonValue> {
    RawFilterScalar::to_json(value).map_err(|e| match e {
        Error::InvalidArgument { reason, .. } => Error::InvalidArgument {
            argument: name.to_string(),
            reason,
        },
        other => other,
    })
}

/// Register the singular and plural query fields for one collection
pub fn build_query_fields(
    collection: &Arc<dyn Collection>,
    expose_query_language: bool,
    registry: &mut QueryRegistry,
) -> Result<()> {
    let identity = collection.identity();
    let ArgumentPartition {
        identifying,
        filterable,
    } = partition_arguments(collection.as_ref());

    let singular = QueryField {
        name: singular_name(identity),
        type_name: type_name(identity),
        cardinality: Cardinality::One,
        arguments: identifying,
        collection: collection.clone(),
    };

    let mut arguments = vec![Argument::Limit, Argument::Skip, Argument::Sort];
    arguments.extend(filterable);
    if expose_query_language {
        arguments.push(Argument::Where);
    }
    let plural = QueryField {
        name: plural_name(identity),
        type_name: type_name(identity),
        cardinality: Cardinality::Many,
        arguments,
        collection: collection.clone(),
    };

    debug!(
        collection = %identity,
        singular = %singular.name,
        singular_args = ?singular.argument_names(),
        plural = %plural.name,
        plural_args = ?plural.argument_names(),
        "Built query fields"
    );

    registry.register(singular)?;
    registry.register(plural)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use async_graphql::{Name, value};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::collection::MemoryCollection;

    fn users() -> Arc<dyn Collection> {
        Arc::new(
            MemoryCollection::new("User")
                .attribute("id", AttributeRule::scalar("integer").primary_key())
                .attribute("email", AttributeRule::scalar("string").unique())
                .attribute("firstName", AttributeRule::scalar("string"))
                .attribute("age", AttributeRule::scalar("integer"))
                .attribute("sort", AttributeRule::scalar("string"))
                .attribute("profile", AttributeRule::scalar("json"))
                .attribute("team", AttributeRule::belongs_to("team"))
                .attribute("articles", AttributeRule::has_many("article", "author")),
        )
    }

    fn registry(expose: bool) -> QueryRegistry {
        let mut registry = QueryRegistry::default();
        build_query_fields(&users(), expose, &mut registry).unwrap();
        registry
    }

    #[test]
    fn test_field_names() {
        assert_eq!(singular_name("User"), "user");
        assert_eq!(plural_name("BlogPost"), "blogposts");
        let names: Vec<_> = registry(false).names().map(String::from).collect();
        assert_eq!(names, ["user", "users"]);
    }

    #[test]
    fn test_partition() {
        let partition = partition_arguments(users().as_ref());
        let identifying: Vec<_> = partition.identifying.iter().map(Argument::name).collect();
        let filterable: Vec<_> = partition.filterable.iter().map(Argument::name).collect();
        assert_eq!(identifying, ["id", "email"]);
        // `sort` collides with the built-in argument; relations are skipped
        assert_eq!(filterable, ["firstName", "age", "profile"]);
    }

    #[test]
    fn test_declared_primary_key_is_identifying_without_flag() {
        let tags: Arc<dyn Collection> = Arc::new(
            MemoryCollection::new("tag")
                .with_primary_key("slug")
                .attribute("slug", AttributeRule::scalar("string"))
                .attribute("label", AttributeRule::scalar("string")),
        );
        let partition = partition_arguments(tags.as_ref());
        assert_eq!(partition.identifying.len(), 1);
        assert_eq!(partition.identifying[0].name(), "slug");
        assert_eq!(partition.filterable[0].name(), "label");
    }

    #[test]
    fn test_plural_arguments() {
        let registry = registry(false);
        assert_eq!(
            registry.get("users").unwrap().argument_names(),
            ["limit", "skip", "sort", "firstName", "age", "profile"]
        );
        assert_eq!(registry.get("user").unwrap().argument_names(), ["id", "email"]);

        let registry = self::registry(true);
        let plural = registry.get("users").unwrap();
        assert_eq!(plural.arguments().last(), Some(&Argument::Where));
        assert_eq!(Argument::Where.kind(), ScalarKind::Json);
        assert!(!registry.get("user").unwrap().arguments().contains(&Argument::Where));
    }

    #[test]
    fn test_type_refs() {
        let registry = registry(false);
        assert_eq!(registry.get("user").unwrap().type_ref().to_string(), "User");
        assert_eq!(registry.get("users").unwrap().type_ref().to_string(), "[User!]!");
        assert_eq!(registry.get("users").unwrap().cardinality(), Cardinality::Many);
    }

    #[test]
    fn test_build_criteria() {
        let registry = registry(true);
        let plural = registry.get("users").unwrap();

        let limit = value!(10);
        let sort = value!("age DESC");
        let name = value!("Sam");
        let empty = value!("");
        let age = value!(0);
        let raw = Value::Object(
            [
                (Name::new("firstName"), value!("Overridden")),
                (Name::new("status"), Value::Enum(Name::new("ACTIVE"))),
            ]
            .into_iter()
            .collect(),
        );

        let criteria = plural
            .build_criteria([
                ("limit", &limit),
                ("sort", &sort),
                ("firstName", &name),
                ("email", &empty),
                ("age", &age),
                ("where", &raw),
            ])
            .unwrap();

        assert_eq!(criteria.limit, Some(10));
        assert_eq!(criteria.skip, None);
        assert_eq!(criteria.sort.as_deref(), Some("age DESC"));
        assert!(criteria.populate);
        assert_eq!(
            JsonValue::Object(criteria.filter),
            json!({ "firstName": "Sam", "status": "ACTIVE", "age": 0 })
        );
    }

    #[test]
    fn test_empty_string_argument_is_pruned() {
        let registry = registry(false);
        let plural = registry.get("users").unwrap();
        let empty = value!("");
        let criteria = plural.build_criteria([("firstName", &empty)]).unwrap();
        assert!(criteria.filter.is_empty());
    }

    #[test]
    fn test_undeclared_arguments_are_ignored() {
        let registry = registry(false);
        let singular = registry.get("user").unwrap();
        let name = value!("Sam");
        let id = value!(1);
        let criteria = singular
            .build_criteria([("firstName", &name), ("id", &id)])
            .unwrap();
        assert_eq!(JsonValue::Object(criteria.filter), json!({ "id": 1 }));
    }

    #[test]
    fn test_json_arguments_keep_null_and_wide_integers() {
        let registry = registry(true);
        let plural = registry.get("users").unwrap();
        let profile =
            Value::from_json(json!({ "bio": null, "followers": 5_000_000_000i64 })).unwrap();
        let raw = Value::from_json(json!({ "team": null })).unwrap();

        let criteria = plural
            .build_criteria([("profile", &profile), ("where", &raw)])
            .unwrap();
        assert_eq!(
            JsonValue::Object(criteria.filter),
            json!({
                "team": null,
                "profile": { "bio": null, "followers": 5_000_000_000i64 }
            })
        );
    }

    #[test]
    fn test_where_must_be_an_object() {
        let registry = registry(true);
        let plural = registry.get("users").unwrap();
        let raw = value!([1, 2]);
        assert_matches!(
            plural.build_criteria([("where", &raw)]),
            Err(Error::InvalidArgument { argument, .. }) if argument == "where"
        );
    }

    #[tokio::test]
    async fn test_resolve_without_schema() {
        let collection = Arc::new(
            MemoryCollection::new("User")
                .attribute("id", AttributeRule::scalar("integer").primary_key())
                .attribute("firstName", AttributeRule::scalar("string"))
                .with_records([
                    json!({ "id": 1, "firstName": "Sam" }),
                    json!({ "id": 2, "firstName": "Alex" }),
                ]
                .into_iter()
                .filter_map(|v| v.as_object().cloned())),
        ) as Arc<dyn Collection>;
        let mut registry = QueryRegistry::default();
        build_query_fields(&collection, false, &mut registry).unwrap();

        let id = value!(2);
        let singular = registry.get("user").unwrap();
        let criteria = singular.build_criteria([("id", &id)]).unwrap();
        assert_matches!(
            singular.resolve(criteria).await.unwrap(),
            Resolved::One(Some(r)) if r["firstName"] == json!("Alex")
        );

        let plural = registry.get("users").unwrap();
        assert_matches!(
            plural.resolve(Criteria::new()).await.unwrap(),
            Resolved::Many(records) if records.len() == 2
        );
    }
}
