//! The `Unit` type.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The unit of a metric value.
///
/// Serialized as its full name. Names without a variant of their own come
/// back as [`Unit::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Unit {
    /// Dimensionless.
    #[default]
    None,
    /// Bytes.
    Bytes,
    /// Bits.
    Bits,
    /// Any other unit, by name.
    Other(Cow<'static, str>),
}

impl Unit {
    /// Creates a named unit without allocating.
    #[must_use]
    pub const fn other(name: &'static str) -> Self {
        Self::Other(Cow::Borrowed(name))
    }

    /// Returns the full unit name (`"bytes"`), empty for [`Unit::None`].
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::None => "",
            Self::Bytes => "bytes",
            Self::Bits => "bits",
            Self::Other(name) => name.as_ref(),
        }
    }

    /// Returns the short symbol (`"B"`, `"b"`).
    ///
    /// Units without a known symbol return an empty string.
    #[must_use]
    pub const fn short(&self) -> &'static str {
        match self {
            Self::Bytes => "B",
            Self::Bits => "b",
            Self::None | Self::Other(_) => "",
        }
    }

    /// Returns the symbol used when formatting values: the short symbol when
    /// one exists, else the full name.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Other(name) => name.as_ref(),
            _ => self.short(),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Unit {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl From<Unit> for String {
    fn from(unit: Unit) -> Self {
        match unit {
            Unit::Other(name) => name.into_owned(),
            known => known.name().to_string(),
        }
    }
}

impl From<String> for Unit {
    fn from(s: String) -> Self {
        match s.as_str() {
            "" | "none" => Self::None,
            "bytes" | "B" => Self::Bytes,
            "bits" | "b" => Self::Bits,
            _ => Self::Other(Cow::Owned(s)),
        }
    }
}
