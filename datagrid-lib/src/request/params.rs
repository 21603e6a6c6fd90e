//! Request parameter values and their bracket-notation flattening.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// A value in the outbound request payload.
///
/// Lists and maps nest arbitrarily; they are flattened into bracket-suffixed
/// keys (`key[]`, `key[sub]`) when turned into [`FlatParams`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Null,
    Text(String),
    List(Vec<ParamValue>),
    Map(Vec<(String, ParamValue)>),
    /// File contents; never encoded into a query string.
    Binary(Vec<u8>),
}

impl ParamValue {
    /// Builds a map value from string pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ParamValue>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// JSON form used for signatures. Map keys come out sorted.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null | Self::Binary(_) => Value::Null,
            Self::Text(text) => Value::String(text.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Text(value.to_string())
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One flattened parameter: a single value, or several for a repeated key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FlatValue {
    One(String),
    Many(Vec<String>),
}

impl FlatValue {
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::One(value) => vec![value.as_str()],
            Self::Many(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// Flat string parameters, keyed by bracket-notation key.
///
/// # Example
///
/// ```
/// use datagrid_lib::request::{FlatParams, ParamValue};
///
/// let mut params = FlatParams::new();
/// params.append_value("sort", &ParamValue::map([("orderBy", "name"), ("type", "asc")]));
/// params.append_value("ids", &ParamValue::from(vec!["1", "2"]));
///
/// assert_eq!(
///     params.to_query_string(),
///     "ids%5B%5D=1&ids%5B%5D=2&sort%5BorderBy%5D=name&sort%5Btype%5D=asc"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlatParams(BTreeMap<String, FlatValue>);

impl FlatParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a string under a key. A repeated key collects its values.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let value = value.into();
        let key = key.into();
        match self.0.remove(&key) {
            None => {
                self.0.insert(key, FlatValue::One(value));
            }
            Some(FlatValue::One(first)) => {
                self.0.insert(key, FlatValue::Many(vec![first, value]));
            }
            Some(FlatValue::Many(mut values)) => {
                values.push(value);
                self.0.insert(key, FlatValue::Many(values));
            }
        }
    }

    /// Flattens a nested value under a key.
    ///
    /// Null, empty-string and binary leaves are skipped.
    pub fn append_value(&mut self, key: &str, value: &ParamValue) {
        match value {
            ParamValue::Null | ParamValue::Binary(_) => {}
            ParamValue::Text(text) if text.is_empty() => {}
            ParamValue::Text(text) => self.append(key, text.as_str()),
            ParamValue::List(items) => {
                let nested = format!("{key}[]");
                for item in items {
                    self.append_value(&nested, item);
                }
            }
            ParamValue::Map(entries) => {
                for (sub, item) in entries {
                    self.append_value(&format!("{key}[{sub}]"), item);
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&FlatValue> {
        self.0.get(key)
    }

    /// The single value under a key, or the first of several.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.values().first().copied())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlatValue)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Every key/value pair, repeated keys expanded.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.0
            .iter()
            .flat_map(|(key, value)| value.values().into_iter().map(move |v| (key.as_str(), v)))
            .collect()
    }

    /// Form-urlencoded query string, without a leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.pairs() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}
