//! Scalar mapping for collection attributes
//!
//! Attribute type tags map onto the built-in GraphQL scalars, plus a
//! free-form `JSON` scalar used both for `json` attributes and for the raw
//! `where` filter argument.

use async_graphql::Value;
use async_graphql::dynamic::{Scalar, TypeRef};
use serde_json::{Number, Value as JsonValue};

use super::literal;
use crate::error::{Error, Result};

/// Name of the free-form scalar
pub const JSON_SCALAR: &str = "JSON";

/// GraphQL scalar an attribute is exposed as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    String,
    Integer,
    Boolean,
    Float,
    Json,
}

/// Map a primitive attribute type tag to its scalar.
///
/// Matching is case-insensitive; unknown or missing tags fall back to
/// `String`.
pub fn to_scalar(type_tag: Option<&str>) -> ScalarKind {
    let Some(tag) = type_tag else {
        return ScalarKind::String;
    };
    match tag.to_ascii_lowercase().as_str() {
        "integer" => ScalarKind::Integer,
        "boolean" => ScalarKind::Boolean,
        "float" => ScalarKind::Float,
        "json" => ScalarKind::Json,
        _ => ScalarKind::String,
    }
}

impl ScalarKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ScalarKind::String => TypeRef::STRING,
            ScalarKind::Integer => TypeRef::INT,
            ScalarKind::Boolean => TypeRef::BOOLEAN,
            ScalarKind::Float => TypeRef::FLOAT,
            ScalarKind::Json => JSON_SCALAR,
        }
    }

    /// Type reference for an output field, non-null when `required`
    pub fn type_ref(self, required: bool) -> TypeRef {
        if required {
            TypeRef::named_nn(self.type_name())
        } else {
            TypeRef::named(self.type_name())
        }
    }

    /// Convert a stored value into this scalar's output value.
    ///
    /// Returns `None` for null and for values that cannot represent the
    /// scalar (e.g. an object stored under an `integer` attribute, or an
    /// integer outside the 32-bit range of GraphQL `Int`).
    pub fn coerce(self, value: &JsonValue) -> Option<Value> {
        match (self, value) {
            (_, JsonValue::Null) => None,
            (ScalarKind::Json, v) => Value::from_json(v.clone()).ok(),

            (ScalarKind::String, JsonValue::String(s)) => Some(Value::String(s.clone())),
            // numbers, booleans and nested values are rendered as JSON text
            (ScalarKind::String, v) => Some(Value::String(v.to_string())),

            (ScalarKind::Integer, JsonValue::Number(n)) => n
                .as_i64()
                .and_then(|i| i32::try_from(i).ok())
                .or_else(|| n.as_f64().and_then(whole_i32))
                .map(|i| Value::Number(Number::from(i))),
            (ScalarKind::Integer, JsonValue::String(s)) => {
                s.trim().parse::<i32>().ok().map(|i| Value::Number(Number::from(i)))
            }

            (ScalarKind::Float, JsonValue::Number(n)) => {
                n.as_f64().and_then(Number::from_f64).map(Value::Number)
            }
            (ScalarKind::Float, JsonValue::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number),

            (ScalarKind::Boolean, JsonValue::Bool(b)) => Some(Value::Boolean(*b)),
            (ScalarKind::Boolean, JsonValue::String(s)) => match s.as_str() {
                "true" => Some(Value::Boolean(true)),
                "false" => Some(Value::Boolean(false)),
                _ => None,
            },

            _ => None,
        }
    }
}

/// A float holding a whole number that fits GraphQL `Int`
fn whole_i32(f: f64) -> Option<i32> {
    (f.fract() == 0.0 && f >= f64::from(i32::MIN) && f <= f64::from(i32::MAX)).then(|| f as i32)
}

/// The free-form scalar behind the raw `where` filter.
///
/// Output and variable values pass through untouched. Argument values reach
/// resolvers already merged with variables, so they are converted with the
/// total [`RawFilterScalar::to_json`]; the strict literal rules stay
/// available as [`RawFilterScalar::parse_literal`].
pub struct RawFilterScalar;

impl RawFilterScalar {
    pub fn serialize(value: JsonValue) -> JsonValue {
        value
    }

    pub fn parse_value(value: JsonValue) -> JsonValue {
        value
    }

    pub fn parse_literal(node: &Value) -> Result<JsonValue> {
        literal::parse_literal(node)
    }

    /// Convert a resolved argument value, keeping `null` and every integer
    /// as given. Enum names become strings.
    pub fn to_json(value: &Value) -> Result<JsonValue> {
        value
            .clone()
            .into_json()
            .map(Self::parse_value)
            .map_err(|e| Error::InvalidArgument {
                argument: JSON_SCALAR.to_string(),
                reason: e.to_string(),
            })
    }

    /// Scalar definition registered on the schema; any value is accepted
    pub fn definition() -> Scalar {
        Scalar::new(JSON_SCALAR).description(
            "Free-form JSON value. As an argument it accepts nested objects, lists, \
             numbers, strings, booleans, null and enum names.",
        )
    }
}
