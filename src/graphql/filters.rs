//! Argument pruning rules
//!
//! Query arguments only reach the store's criteria when they carry a value.
//! What counts as "no value" is decided per scalar:
//!
//! - every scalar: missing or `null`
//! - `String`: the empty string
//! - `JSON`: an empty list or an empty object
//!
//! `Int`, `Float` and `Boolean` values are always kept; `0` and `false` are
//! real filter values.

use async_graphql::Value;

use super::scalars::ScalarKind;

/// Check if an argument value should be left out of the criteria
pub fn is_absent(kind: ScalarKind, value: Option<&Value>) -> bool {
    let Some(value) = value else {
        return true;
    };
    match (kind, value) {
        (_, Value::Null) => true,
        (ScalarKind::String, Value::String(s)) => s.is_empty(),
        (ScalarKind::Json, Value::List(items)) => items.is_empty(),
        (ScalarKind::Json, Value::Object(fields)) => fields.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use async_graphql::value;

    use super::*;

    #[test]
    fn test_missing_and_null_are_absent_for_every_kind() {
        for kind in [
            ScalarKind::String,
            ScalarKind::Integer,
            ScalarKind::Boolean,
            ScalarKind::Float,
            ScalarKind::Json,
        ] {
            assert!(is_absent(kind, None));
            assert!(is_absent(kind, Some(&Value::Null)));
        }
    }

    #[test]
    fn test_empty_string_only_absent_for_strings() {
        assert!(is_absent(ScalarKind::String, Some(&value!(""))));
        assert!(!is_absent(ScalarKind::String, Some(&value!(" "))));
        assert!(!is_absent(ScalarKind::Json, Some(&value!(""))));
    }

    #[test]
    fn test_empty_containers_absent_for_json() {
        assert!(is_absent(ScalarKind::Json, Some(&value!([]))));
        assert!(is_absent(ScalarKind::Json, Some(&value!({}))));
        assert!(!is_absent(ScalarKind::Json, Some(&value!({ "a": 1 }))));
    }

    #[test]
    fn test_zero_and_false_are_kept() {
        assert!(!is_absent(ScalarKind::Integer, Some(&value!(0))));
        assert!(!is_absent(ScalarKind::Float, Some(&value!(0.0))));
        assert!(!is_absent(ScalarKind::Boolean, Some(&value!(false))));
    }
}
