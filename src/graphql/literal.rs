//! Raw filter literal parsing
//!
//! Converts an argument literal (as parsed from query text) into a native
//! JSON value. Scalars follow GraphQL's own `Int`/`Float`/`Boolean`/`String`
//! literal rules, enum names become strings, lists and objects are converted
//! element by element keeping source order.
//!
//! Nesting is walked with an explicit stack, so arbitrarily deep literals
//! cannot exhaust the call stack.

use async_graphql::indexmap::map::Iter as FieldIter;
use async_graphql::{Name, Value};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, LiteralKind, Result};

/// Classify a literal node
pub fn literal_kind(node: &Value) -> LiteralKind {
    match node {
        Value::Number(n) if n.is_f64() => LiteralKind::Float,
        Value::Number(_) => LiteralKind::Int,
        Value::Boolean(_) => LiteralKind::Boolean,
        Value::String(_) => LiteralKind::String,
        Value::Enum(_) => LiteralKind::Enum,
        Value::List(_) => LiteralKind::List,
        Value::Object(_) => LiteralKind::Object,
        Value::Null => LiteralKind::Null,
        Value::Binary(_) => LiteralKind::Binary,
    }
}

/// Partially built list or object waiting for its remaining children
enum Frame<'a> {
    List {
        items: std::slice::Iter<'a, Value>,
        out: Vec<JsonValue>,
    },
    Object {
        fields: FieldIter<'a, Name, Value>,
        key: String,
        out: Map<String, JsonValue>,
    },
}

impl<'a> Frame<'a> {
    fn push(&mut self, value: JsonValue) {
        match self {
            Frame::List { out, .. } => out.push(value),
            Frame::Object { key, out, .. } => {
                out.insert(std::mem::take(key), value);
            }
        }
    }

    fn next_child(&mut self) -> Option<&'a Value> {
        match self {
            Frame::List { items, .. } => items.next(),
            Frame::Object { fields, key, .. } => fields.next().map(|(name, value)| {
                *key = name.to_string();
                value
            }),
        }
    }

    fn finish(self) -> JsonValue {
        match self {
            Frame::List { out, .. } => JsonValue::Array(out),
            Frame::Object { out, .. } => JsonValue::Object(out),
        }
    }
}

/// Convert a literal node into a native value.
///
/// Fails with [`Error::UnsupportedLiteralKind`] on `null` and binary nodes,
/// and with [`Error::InvalidIntLiteral`] on integers outside the 32-bit range.
pub fn parse_literal(node: &Value) -> Result<JsonValue> {
    let mut stack: Vec<Frame<'_>> = Vec::new();
    let mut pending = Some(node);

    loop {
        let mut finished = match pending.take() {
            Some(Value::List(items)) => {
                stack.push(Frame::List {
                    items: items.iter(),
                    out: Vec::with_capacity(items.len()),
                });
                None
            }
            Some(Value::Object(fields)) => {
                stack.push(Frame::Object {
                    fields: fields.iter(),
                    key: String::new(),
                    out: Map::with_capacity(fields.len()),
                });
                None
            }
            Some(leaf) => Some(parse_scalar(leaf)?),
            None => None,
        };

        // Hand finished values to their parents until some frame still has
        // a child left to visit.
        loop {
            let Some(frame) = stack.last_mut() else {
                return Ok(finished.unwrap_or(JsonValue::Null));
            };
            if let Some(value) = finished.take() {
                frame.push(value);
            }
            if let Some(child) = frame.next_child() {
                pending = Some(child);
                break;
            }
            finished = stack.pop().map(Frame::finish);
        }
    }
}

fn parse_scalar(node: &Value) -> Result<JsonValue> {
    let kind = literal_kind(node);
    match (kind, node) {
        (LiteralKind::Int, Value::Number(n)) => parse_int(n),
        (LiteralKind::Float, Value::Number(n)) => n
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(JsonValue::Number)
            .ok_or(Error::UnsupportedLiteralKind(kind)),
        (LiteralKind::Boolean, Value::Boolean(b)) => Ok(JsonValue::Bool(*b)),
        (LiteralKind::String, Value::String(s)) => Ok(JsonValue::String(s.clone())),
        (LiteralKind::Enum, Value::Enum(name)) => Ok(JsonValue::String(name.to_string())),
        _ => Err(Error::UnsupportedLiteralKind(kind)),
    }
}

/// GraphQL `Int` is a signed 32-bit integer
fn parse_int(n: &serde_json::Number) -> Result<JsonValue> {
    n.as_i64()
        .and_then(|i| i32::try_from(i).ok())
        .map(JsonValue::from)
        .ok_or_else(|| Error::InvalidIntLiteral(n.to_string()))
}
