//! Units attached to metrics, and SI formatting of metric values.

mod prefix;
mod unit;

pub use prefix::{fmt_f64, si_prefix};
pub use unit::Unit;
