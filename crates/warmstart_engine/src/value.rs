//! Runtime values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A script value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// The absence of a value.
    Undefined,
    /// A boolean.
    Bool(bool),
    /// An IEEE-754 double.
    Number(f64),
    /// A string.
    Str(String),
}

impl Value {
    /// Converts to a number: booleans become 0/1, strings are parsed after
    /// trimming (empty is 0, unparsable is NaN), `undefined` is NaN.
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::Str(s) => {
                let t = s.trim();
                if t.is_empty() {
                    0.0
                } else {
                    t.parse().unwrap_or(f64::NAN)
                }
            }
        }
    }

    /// Converts to a 32-bit integer with wrap-around, NaN and infinities
    /// becoming 0.
    pub fn to_int32(&self) -> i32 {
        let n = self.to_number();
        if !n.is_finite() {
            return 0;
        }
        let m = n.trunc().rem_euclid(4_294_967_296.0);
        if m >= 2_147_483_648.0 {
            (m - 4_294_967_296.0) as i32
        } else {
            m as i32
        }
    }

    /// Truthiness: `undefined`, `false`, `0`, NaN and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
        }
    }

    /// Name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => fmt_number(*n, f),
            Value::Str(s) => f.write_str(s),
        }
    }
}

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == n.trunc() && n.abs() < 1e21 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{n}")
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_coercions() {
        assert_eq!(Value::Bool(true).to_number(), 1.0);
        assert_eq!(Value::Str(" 12.5 ".into()).to_number(), 12.5);
        assert_eq!(Value::Str(String::new()).to_number(), 0.0);
        assert!(Value::Str("abc".into()).to_number().is_nan());
        assert!(Value::Undefined.to_number().is_nan());
    }

    #[test]
    fn int32_conversion() {
        assert_eq!(Value::Number(4.0).to_int32(), 4);
        assert_eq!(Value::Number(-3.7).to_int32(), -3);
        assert_eq!(Value::Number(4_294_967_296.0 + 5.0).to_int32(), 5);
        assert_eq!(Value::Number(2_147_483_648.0).to_int32(), i32::MIN);
        assert_eq!(Value::Number(f64::NAN).to_int32(), 0);
        assert_eq!(Value::Number(f64::INFINITY).to_int32(), 0);
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::Str("0".into()).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
    }

    #[test]
    fn display() {
        assert_eq!(Value::Number(4.0).to_string(), "4");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Str("hi".into()).to_string(), "hi");
        assert_eq!(Value::Undefined.to_string(), "undefined");
    }

    #[test]
    fn serde_roundtrip() {
        let v = Value::Str("cached".into());
        let json = serde_json::to_string(&v).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }
}
