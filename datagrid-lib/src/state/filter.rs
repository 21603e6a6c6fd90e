//! Column filter values

use serde::Deserialize;
use serde::Serialize;

/// The value of one active column filter.
///
/// Single-value kinds (text, number, date, select) hold one string; the
/// multi-value and range kinds hold a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    One(String),
    Many(Vec<String>),
}

impl FilterValue {
    /// A filter with nothing in it is treated as not set.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(value) => value.is_empty(),
            Self::Many(values) => values.iter().all(String::is_empty),
        }
    }

    /// Flattens the value to the single string sent to the server.
    pub fn joined(&self, delimiter: &str) -> String {
        match self {
            Self::One(value) => value.clone(),
            Self::Many(values) => values.join(delimiter),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(FilterValue::from("").is_empty());
        assert!(FilterValue::Many(Vec::new()).is_empty());
        assert!(FilterValue::from(vec!["", ""]).is_empty());
        assert!(!FilterValue::from(vec!["", "x"]).is_empty());
    }

    #[test]
    fn test_joined() {
        assert_eq!(FilterValue::from("active").joined(","), "active");
        assert_eq!(
            FilterValue::from(vec!["2024-01-01", "2024-01-31"]).joined(","),
            "2024-01-01,2024-01-31"
        );
    }

    #[test]
    fn test_untagged_json() {
        let one: FilterValue = serde_json::from_str(r#""a""#).unwrap();
        let many: FilterValue = serde_json::from_str(r#"["a","b"]"#).unwrap();
        assert_eq!(one, FilterValue::from("a"));
        assert_eq!(many, FilterValue::from(vec!["a", "b"]));
    }
}
