//! In-memory collection store
//!
//! Holds records in a vector behind a lock and answers criteria with
//! equality filtering, multi-key sorting, and skip/limit paging. Used by the
//! binary for definition files with seed data and by the test suite.

use std::cmp::Ordering;

use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use super::{AttributeRule, Collection, Criteria, Record};

pub struct MemoryCollection {
    identity: String,
    primary_key: String,
    attributes: IndexMap<String, AttributeRule>,
    records: RwLock<Vec<Record>>,
}

impl MemoryCollection {
    /// Create an empty collection whose primary key is `id`
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            primary_key: "id".to_string(),
            attributes: IndexMap::new(),
            records: RwLock::new(Vec::new()),
        }
    }

    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }

    /// Declare an attribute; declaration order is preserved
    pub fn attribute(mut self, name: impl Into<String>, rule: AttributeRule) -> Self {
        self.attributes.insert(name.into(), rule);
        self
    }

    pub fn with_records(self, records: impl IntoIterator<Item = Record>) -> Self {
        self.records.write().extend(records);
        self
    }

    pub fn insert(&self, record: Record) {
        self.records.write().push(record);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn select(&self, criteria: &Criteria) -> Vec<Record> {
        let records = self.records.read();
        let mut selected: Vec<Record> = records
            .iter()
            .filter(|r| matches_filter(r, &criteria.filter))
            .cloned()
            .collect();
        drop(records);

        if let Some(ref sort) = criteria.sort {
            let keys = parse_sort(sort);
            selected.sort_by(|a, b| {
                keys.iter()
                    .map(|(field, descending)| {
                        let ord = compare_values(
                            a.get(field).unwrap_or(&Value::Null),
                            b.get(field).unwrap_or(&Value::Null),
                        );
                        if *descending { ord.reverse() } else { ord }
                    })
                    .find(|ord| ord.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        let skip = criteria.skip.unwrap_or(0).max(0) as usize;
        let limit = criteria
            .limit
            .filter(|l| *l >= 0)
            .map(|l| l as usize)
            .unwrap_or(usize::MAX);

        selected.into_iter().skip(skip).take(limit).collect()
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn attributes(&self) -> &IndexMap<String, AttributeRule> {
        &self.attributes
    }

    fn primary_key(&self) -> &str {
        &self.primary_key
    }

    async fn find_one(&self, criteria: Criteria) -> anyhow::Result<Option<Record>> {
        debug!(collection = %self.identity, criteria = ?criteria.filter, "find_one");
        Ok(self.select(&criteria).into_iter().next())
    }

    async fn find(&self, criteria: Criteria) -> anyhow::Result<Vec<Record>> {
        debug!(collection = %self.identity, criteria = ?criteria.filter, "find");
        Ok(self.select(&criteria))
    }

    async fn count(&self, criteria: Criteria) -> anyhow::Result<u64> {
        let records = self.records.read();
        Ok(records
            .iter()
            .filter(|r| matches_filter(r, &criteria.filter))
            .count() as u64)
    }
}

/// Every filter entry must match; a list value means "any of"
fn matches_filter(record: &Record, filter: &Record) -> bool {
    filter.iter().all(|(key, expected)| {
        let actual = record.get(key).unwrap_or(&Value::Null);
        match expected {
            Value::Array(options) if !actual.is_array() => {
                options.iter().any(|o| values_equal(actual, o))
            }
            _ => values_equal(actual, expected),
        }
    })
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Parse `"name DESC, id"` into `[("name", true), ("id", false)]`
fn parse_sort(sort: &str) -> Vec<(String, bool)> {
    sort.split(',')
        .filter_map(|part| {
            let mut tokens = part.split_whitespace();
            let field = tokens.next()?;
            let descending = tokens
                .next()
                .is_some_and(|dir| dir.eq_ignore_ascii_case("desc"));
            Some((field.to_string(), descending))
        })
        .collect()
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
