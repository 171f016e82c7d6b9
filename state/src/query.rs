//! Typed rich-query selectors
//!
//! A [`Selector`] is a conjunction of field conditions evaluated against JSON
//! documents. It renders to the document store's native selector syntax,
//! e.g. `{"selector":{"docType":"transaction","donor_id":"u1"}}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Operator {
    /// Native selector operator name
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Ne => "$ne",
            Operator::Gt => "$gt",
            Operator::Gte => "$gte",
            Operator::Lt => "$lt",
            Operator::Lte => "$lte",
        }
    }
}

/// Single field condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Field name; dotted paths address nested objects
    pub field: String,
    pub op: Operator,
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn matches(&self, document: &Value) -> bool {
        let Some(actual) = lookup(document, &self.field) else {
            return false;
        };
        match self.op {
            Operator::Eq => values_equal(actual, &self.value),
            Operator::Ne => !values_equal(actual, &self.value),
            Operator::Gt => compare(actual, &self.value) == Some(Ordering::Greater),
            Operator::Gte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Lt => compare(actual, &self.value) == Some(Ordering::Less),
            Operator::Lte => matches!(
                compare(actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

/// Conjunction of conditions; an empty selector matches every document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selector {
    pub conditions: Vec<Condition>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector on the `docType` discriminator
    pub fn doc_type(doc_type: &str) -> Self {
        Self::new().eq("docType", doc_type)
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Operator::Eq, value)
    }

    pub fn with(mut self, field: impl Into<String>, op: Operator, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::new(field, op, value));
        self
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(document))
    }

    /// Native query document
    pub fn to_query(&self) -> Value {
        let mut fields: Map<String, Value> = Map::new();
        for condition in &self.conditions {
            let rendered = Value::Object(Map::from_iter([(
                condition.op.as_str().to_string(),
                condition.value.clone(),
            )]));
            match fields.get_mut(&condition.field) {
                None if condition.op == Operator::Eq => {
                    fields.insert(condition.field.clone(), condition.value.clone());
                }
                None => {
                    fields.insert(condition.field.clone(), rendered);
                }
                Some(existing) => {
                    // promote a bare equality to operator form before merging
                    if !is_operator_object(existing) {
                        *existing = Value::Object(Map::from_iter([(
                            Operator::Eq.as_str().to_string(),
                            existing.clone(),
                        )]));
                    }
                    if let (Value::Object(target), Value::Object(extra)) = (existing, rendered) {
                        target.extend(extra);
                    }
                }
            }
        }
        serde_json::json!({ "selector": Value::Object(fields) })
    }

    pub fn to_query_string(&self) -> String {
        self.to_query().to_string()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

fn is_operator_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
