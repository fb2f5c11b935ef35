//! Math native implementations
//!
//! Provides the Rust-side handlers for `std:math` native calls.
//! All functions operate on f64 values.

use rand::Rng;

/// Absolute value
pub fn abs(x: f64) -> f64 {
    x.abs()
}

/// Sign of number (-1, 0, or 1)
pub fn sign(x: f64) -> f64 {
    x.signum()
}

/// Round down to nearest integer
pub fn floor(x: f64) -> f64 {
    x.floor()
}

/// Round up to nearest integer
pub fn ceil(x: f64) -> f64 {
    x.ceil()
}

/// Round to nearest integer
pub fn round(x: f64) -> f64 {
    x.round()
}

/// Truncate decimal part
pub fn trunc(x: f64) -> f64 {
    x.trunc()
}

/// Minimum of two numbers
pub fn min(a: f64, b: f64) -> f64 {
    a.min(b)
}

/// Maximum of two numbers
pub fn max(a: f64, b: f64) -> f64 {
    a.max(b)
}

/// Raise base to power exp
pub fn pow(base: f64, exp: f64) -> f64 {
    base.powf(exp)
}

/// Square root
pub fn sqrt(x: f64) -> f64 {
    x.sqrt()
}

/// Sine
pub fn sin(x: f64) -> f64 {
    x.sin()
}

/// Cosine
pub fn cos(x: f64) -> f64 {
    x.cos()
}

/// Tangent
pub fn tan(x: f64) -> f64 {
    x.tan()
}

/// Arcsine
pub fn asin(x: f64) -> f64 {
    x.asin()
}

/// Arccosine
pub fn acos(x: f64) -> f64 {
    x.acos()
}

/// Arctangent
pub fn atan(x: f64) -> f64 {
    x.atan()
}

/// Two-argument arctangent
pub fn atan2(y: f64, x: f64) -> f64 {
    y.atan2(x)
}

/// e raised to the power x
pub fn exp(x: f64) -> f64 {
    x.exp()
}

/// Natural logarithm (base e)
pub fn log(x: f64) -> f64 {
    x.ln()
}

/// Base-10 logarithm
pub fn log10(x: f64) -> f64 {
    x.log10()
}

/// Random number in [0, 1)
pub fn random() -> f64 {
    rand::thread_rng().gen::<f64>()
}

/// Pi constant
pub fn pi() -> f64 {
    std::f64::consts::PI
}

/// Euler's number constant
pub fn e() -> f64 {
    std::f64::consts::E
}
