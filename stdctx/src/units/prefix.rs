//! SI prefixes.

use super::Unit;

/// Prefixes from 10^-12 to 10^18, in steps of 10^3.
const PREFIXES: [&str; 11] = ["p", "n", "µ", "m", "", "k", "M", "G", "T", "P", "E"];

/// Index of the empty prefix in [`PREFIXES`].
const BASE: i32 = 4;

/// Scales `x` into `[1, 1000)` and returns the scaled value with its SI prefix.
///
/// Zero, NaN and infinities are returned unchanged with no prefix. Values
/// beyond the prefix table stay outside `[1, 1000)`.
#[must_use]
pub fn si_prefix(x: f64) -> (f64, &'static str) {
    if x == 0.0 || !x.is_finite() {
        return (x, "");
    }

    #[allow(clippy::cast_possible_truncation)]
    let mut exp = (x.abs().log10() / 3.0).floor() as i32;
    exp = exp.clamp(-BASE, PREFIXES.len() as i32 - 1 - BASE);

    let mut scaled = scale(x, exp);
    // log10 rounding can land one step off near exact powers of 1000.
    if scaled.abs() >= 1000.0 && exp < PREFIXES.len() as i32 - 1 - BASE {
        exp += 1;
        scaled = scale(x, exp);
    } else if scaled.abs() < 1.0 && exp > -BASE {
        exp -= 1;
        scaled = scale(x, exp);
    }

    #[allow(clippy::cast_sign_loss)]
    let prefix = PREFIXES[(exp + BASE) as usize];
    (scaled, prefix)
}

fn scale(x: f64, exp: i32) -> f64 {
    if exp >= 0 {
        x / 1000f64.powi(exp)
    } else {
        x * 1000f64.powi(-exp)
    }
}

/// Formats `x` with an SI prefix and the unit symbol.
///
/// Whole numbers that need no prefix print without decimals (`"10B"`);
/// everything else prints with two (`"1.50kB"`). NaN and infinities print
/// as-is (`"infB"`).
///
/// The suffix is [`Unit::symbol`], so bytes print as `B` rather than the
/// full name `bytes`.
#[must_use]
pub fn fmt_f64(x: f64, unit: &Unit) -> String {
    if !x.is_finite() {
        return format!("{x}{}", unit.symbol());
    }
    let (scaled, prefix) = si_prefix(x);
    if prefix.is_empty() && scaled.round() == scaled {
        #[allow(clippy::cast_possible_truncation)]
        let whole = scaled as i64;
        return format!("{whole}{}", unit.symbol());
    }
    format!("{scaled:.2}{prefix}{}", unit.symbol())
}
