//! Error types for schema building and query resolution

use std::fmt;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Syntax-node kinds a raw filter literal can be made of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Int,
    Float,
    Boolean,
    String,
    Enum,
    List,
    Object,
    Null,
    Binary,
}

impl fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LiteralKind::Int => "IntValue",
            LiteralKind::Float => "FloatValue",
            LiteralKind::Boolean => "BooleanValue",
            LiteralKind::String => "StringValue",
            LiteralKind::Enum => "EnumValue",
            LiteralKind::List => "ListValue",
            LiteralKind::Object => "ObjectValue",
            LiteralKind::Null => "NullValue",
            LiteralKind::Binary => "BinaryValue",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing/empty collections, duplicate identities, unreadable definition files
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A relation names a collection absent from the input set
    #[error(
        "attribute `{attribute}` of collection `{collection}` references unknown collection `{target}`"
    )]
    UnknownCollectionReference {
        collection: String,
        attribute: String,
        target: String,
    },

    #[error("unsupported literal kind: {0}")]
    UnsupportedLiteralKind(LiteralKind),

    /// Integer literal outside the 32-bit GraphQL `Int` range
    #[error("Int cannot represent non 32-bit signed integer value: {0}")]
    InvalidIntLiteral(String),

    /// An argument value the store criteria cannot be built from
    #[error("invalid value for argument `{argument}`: {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// Failure surfaced by a collection's find/findOne/count
    #[error(transparent)]
    StoreOperation(#[from] anyhow::Error),

    #[error("{0} are not supported")]
    Unsupported(&'static str),

    /// The executor rejected the assembled schema
    #[error("schema assembly failed: {0}")]
    Schema(String),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }
}
