//! Structural filters
//!
//! A [`Filter`] is a flat map from property name to a primitive
//! [`FilterValue`]. A subscription may carry one as its *required* filter and
//! an emit may supply one as its *match* filter. The subscription fires when
//! every required key is present in the match filter with an equal value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Primitive value a filter key can hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl PartialEq for FilterValue {
    fn eq(&self, other: &Self) -> bool {
        use FilterValue::*;

        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (Int(a), Int(b)) => a == b,
            (Float(a), Float(b)) => a == b,
            // Numbers compare by value regardless of representation
            (Int(a), Float(b)) | (Float(b), Int(a)) => (*a as f64) == *b,
            (Str(a), Str(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serde_json::to_string(self).map_err(|_| fmt::Error)?)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        FilterValue::Int(value.into())
    }
}

impl From<u32> for FilterValue {
    fn from(value: u32) -> Self {
        FilterValue::Int(value.into())
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Float(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Str(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Str(value)
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FilterValue::Null)
    }
}

/// Flat key/value filter.
///
/// An empty filter is still a filter: a subscription registered with `{}`
/// requires the emit to supply *some* filter, and matches any of them.
///
/// # Examples
///
/// ```
/// use medi_bus::Filter;
///
/// let required = Filter::new().with("region", "eu");
/// let offered = Filter::new().with("region", "eu").with("tier", 2);
///
/// assert!(required.matches(&offered));
/// assert!(!offered.matches(&required));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(BTreeMap<String, FilterValue>);

impl Filter {
    /// Create an empty filter
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key/value pair
    pub fn with(mut self, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert a key/value pair, returning the previous value
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FilterValue>,
    ) -> Option<FilterValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Subset match: every key of `self` must exist in `candidate` with an
    /// equal value. Extra keys in `candidate` are ignored.
    pub fn matches(&self, candidate: &Filter) -> bool {
        self.0
            .iter()
            .all(|(key, value)| candidate.0.get(key).is_some_and(|other| other == value))
    }

    /// Build a filter from a JSON object of primitives.
    pub fn from_json(value: &Value) -> Result<Self, FilterError> {
        let Value::Object(map) = value else {
            return Err(FilterError::NotAnObject(json_kind(value)));
        };

        let mut filter = Filter::new();
        for (key, value) in map {
            let value = match value {
                Value::Null => FilterValue::Null,
                Value::Bool(b) => FilterValue::Bool(*b),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => FilterValue::Int(i),
                    None => FilterValue::Float(n.as_f64().unwrap_or(f64::NAN)),
                },
                Value::String(s) => FilterValue::Str(s.clone()),
                Value::Array(_) | Value::Object(_) => {
                    return Err(FilterError::Nested(key.clone()));
                }
            };
            filter.0.insert(key.clone(), value);
        }

        Ok(filter)
    }
}

impl<K, V> FromIterator<(K, V)> for Filter
where
    K: Into<String>,
    V: Into<FilterValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Renders as compact JSON.
impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serde_json::to_string(self).map_err(|_| fmt::Error)?)
    }
}

/// Renders an optional filter for log lines (`null` when absent).
pub(crate) struct DisplayFilter<'a>(pub Option<&'a Filter>);

impl fmt::Display for DisplayFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(filter) => filter.fmt(f),
            None => write!(f, "null"),
        }
    }
}

/// Filter construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("Filter must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Filter key \"{0}\" holds a nested value")]
    Nested(String),
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
