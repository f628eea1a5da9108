//! Structured key-value attributes attached to log records.

use serde::Serialize;
use std::fmt;

/// The value half of an [`Attr`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// A string.
    String(String),
    /// A list of strings.
    Strings(Vec<String>),
    /// A signed integer.
    Int(i64),
    /// A boolean.
    Bool(bool),
    /// A float.
    Float64(f64),
    /// Anything serializable, already converted to JSON.
    Any(serde_json::Value),
}

impl AttrValue {
    /// Converts the value to JSON.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Strings(v) => serde_json::Value::Array(
                v.iter().cloned().map(serde_json::Value::String).collect(),
            ),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Float64(f) => serde_json::Value::from(*f),
            Self::Any(v) => v.clone(),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Strings(v) => write!(f, "[{}]", v.join(" ")),
            Self::Int(i) => write!(f, "{i}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Float64(x) => write!(f, "{x}"),
            Self::Any(v) => write!(f, "{v}"),
        }
    }
}

/// A key-value pair attached to a log record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attr {
    /// The key, qualified by group names once bound to a logger.
    pub key: String,
    /// The value.
    pub value: AttrValue,
}

impl Attr {
    /// Creates an attribute.
    #[must_use]
    pub fn new(key: impl Into<String>, value: AttrValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// Returns a copy with the key prefixed by `groups`, joined with dots.
    #[must_use]
    pub(crate) fn qualified(&self, groups: &[String]) -> Self {
        if groups.is_empty() {
            return self.clone();
        }
        Self {
            key: format!("{}.{}", groups.join("."), self.key),
            value: self.value.clone(),
        }
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Creates a string attribute.
pub fn string(key: impl Into<String>, value: impl Into<String>) -> Attr {
    Attr::new(key, AttrValue::String(value.into()))
}

/// Creates a string-list attribute.
pub fn strings<I, S>(key: impl Into<String>, values: I) -> Attr
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Attr::new(
        key,
        AttrValue::Strings(values.into_iter().map(Into::into).collect()),
    )
}

/// Creates an integer attribute.
pub fn int(key: impl Into<String>, value: impl Into<i64>) -> Attr {
    Attr::new(key, AttrValue::Int(value.into()))
}

/// Creates a boolean attribute.
pub fn bool(key: impl Into<String>, value: bool) -> Attr {
    Attr::new(key, AttrValue::Bool(value))
}

/// Creates a float attribute.
pub fn float64(key: impl Into<String>, value: f64) -> Attr {
    Attr::new(key, AttrValue::Float64(value))
}

/// Creates an attribute from any serializable value.
///
/// If serialization fails the attribute holds the error message instead.
pub fn any<T>(key: impl Into<String>, value: &T) -> Attr
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(value)
        .unwrap_or_else(|e| serde_json::Value::String(format!("!ERROR: {e}")));
    Attr::new(key, AttrValue::Any(value))
}
