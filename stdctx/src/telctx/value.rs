//! Metric values and the traits that restrict what can be recorded.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A recorded metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// A signed integer.
    Int(i64),
    /// An unsigned integer.
    Uint(u64),
    /// A float.
    Float(f64),
    /// A string. Only valid for gauges.
    Str(String),
}

impl MetricValue {
    /// Returns true for every variant except [`MetricValue::Str`].
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        !matches!(self, Self::Str(_))
    }

    /// Returns the value as a float, if numeric.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Uint(u) => Some(*u as f64),
            Self::Float(f) => Some(*f),
            Self::Str(_) => None,
        }
    }

    /// Adds two numeric values.
    ///
    /// Integers stay integers (saturating); unsigned only when both sides are
    /// unsigned. Any float makes the result a float. Strings yield `None`.
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Str(_), _) | (_, Self::Str(_)) => None,
            (Self::Uint(a), Self::Uint(b)) => Some(Self::Uint(a.saturating_add(*b))),
            (Self::Int(_) | Self::Uint(_), Self::Int(_) | Self::Uint(_)) => {
                let sum = self.as_i128() + other.as_i128();
                let saturated = if sum < 0 { i64::MIN } else { i64::MAX };
                Some(Self::Int(i64::try_from(sum).unwrap_or(saturated)))
            }
            _ => Some(Self::Float(self.as_f64()? + other.as_f64()?)),
        }
    }

    fn as_i128(&self) -> i128 {
        match self {
            Self::Int(i) => i128::from(*i),
            Self::Uint(u) => i128::from(*u),
            Self::Float(_) | Self::Str(_) => 0,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Uint(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Numeric types that a counter can be incremented by.
pub trait Incrementable: Into<MetricValue> + sealed::Sealed {}

/// Types that a gauge can be set to: every [`Incrementable`] plus strings.
pub trait Markable: Into<MetricValue> + sealed::Sealed {}

macro_rules! impl_metric_value {
    ($variant:ident as $target:ty: $($t:ty),+) => {
        $(
            impl From<$t> for MetricValue {
                #[allow(clippy::cast_lossless)]
                fn from(x: $t) -> Self {
                    Self::$variant(x as $target)
                }
            }
            impl sealed::Sealed for $t {}
            impl Incrementable for $t {}
            impl Markable for $t {}
        )+
    };
}

impl_metric_value!(Int as i64: i8, i16, i32, i64, isize);
impl_metric_value!(Uint as u64: u8, u16, u32, u64, usize);
impl_metric_value!(Float as f64: f32, f64);

impl From<String> for MetricValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for MetricValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl sealed::Sealed for String {}
impl Markable for String {}
impl sealed::Sealed for &str {}
impl Markable for &str {}
