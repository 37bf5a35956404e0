//! GraphQL schema synthesis
//!
//! Turns a set of collections into an executable async-graphql dynamic
//! schema: one output type per collection, a singular and a plural root
//! query field per collection, and relation fields that resolve through
//! those query fields.
//!
//! ```rust,ignore
//! let schema = graphql::build(&AdapterConfig::new(collections))?;
//! let response = schema.execute("{ users(firstName: \"Sam\") { id } }").await;
//! ```

pub mod filters;
pub mod literal;
pub mod queries;
pub mod registry;
pub mod relations;
pub mod scalars;
mod schema;
pub mod types;

pub use literal::parse_literal;
pub use queries::{Argument, Cardinality, QueryField, Resolved, plural_name, singular_name};
pub use scalars::{JSON_SCALAR, RawFilterScalar, ScalarKind, to_scalar};
pub use schema::{GraphSchema, build, mutation_root};
pub use types::type_name;
