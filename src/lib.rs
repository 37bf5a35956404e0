//! Collection GraphQL - expose ORM collections as a GraphQL schema
//!
//! Collections describe their attributes and relations; this crate builds
//! the matching object types, singular and plural query fields, and
//! relation resolvers, and delegates every lookup back to the collection's
//! store.

pub mod collection;
pub mod config;
pub mod error;
pub mod graphql;

pub use collection::{AttributeRule, Collection, Criteria, MemoryCollection, Record};
pub use config::AdapterConfig;
pub use error::{Error, Result};
pub use graphql::{GraphSchema, build};
