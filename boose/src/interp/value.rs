//! Runtime values for the interpreter

use serde::Serialize;
use std::fmt;

/// Tolerance for integrality and equality checks
pub const EPSILON: f64 = 1e-6;

/// Runtime value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// 64-bit integer
    Int(i64),
    /// 64-bit floating point
    Real(f64),
    /// Quoted literal; only meaningful where text is concatenated
    Text(String),
}

impl Value {
    /// Build a numeric value, narrowing to `Int` when `x` is a whole number
    pub fn narrow(x: f64) -> Value {
        let rounded = x.round();
        if (x - rounded).abs() < EPSILON && rounded.abs() < i64::MAX as f64 {
            Value::Int(rounded as i64)
        } else {
            Value::Real(x)
        }
    }

    /// Numeric view of the value
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Real(x) => Some(*x),
            Value::Text(_) => None,
        }
    }

    /// Integer view, accepting reals within [`EPSILON`] of a whole number
    pub fn as_whole(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Real(x) => match Value::narrow(*x) {
                Value::Int(n) => Some(n),
                _ => None,
            },
            Value::Text(_) => None,
        }
    }

    /// Truthiness for a bare condition: magnitude above [`EPSILON`]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Real(x) => x.abs() > EPSILON,
            Value::Text(s) => !s.is_empty(),
        }
    }

    /// Text spliced into an expression in place of a variable name.
    ///
    /// Must parse back to the same number, so reals never use exponent form.
    pub fn substitution_text(&self) -> String {
        match self {
            Value::Int(n) => n.to_string(),
            Value::Real(x) => x.to_string(),
            Value::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    /// Reals always carry a fractional part (`3.0`), integers never do.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Real(x) if x.is_finite() && x.fract() == 0.0 => write!(f, "{x:.1}"),
            Value::Real(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Element type of an array, fixed at declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Int,
    Real,
}

impl ElementKind {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "int" => Some(ElementKind::Int),
            "real" => Some(ElementKind::Real),
            _ => None,
        }
    }

    pub fn zero(self) -> Value {
        match self {
            ElementKind::Int => Value::Int(0),
            ElementKind::Real => Value::Real(0.0),
        }
    }

    /// Convert a value to this kind. Reals stored into `int` slots round
    /// half to even. Text has no numeric form and yields `None`.
    pub fn coerce(self, value: &Value) -> Option<Value> {
        let x = value.as_f64()?;
        Some(match self {
            ElementKind::Int => Value::Int(x.round_ties_even() as i64),
            ElementKind::Real => Value::Real(x),
        })
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Int => f.write_str("int"),
            ElementKind::Real => f.write_str("real"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrow() {
        assert_eq!(Value::narrow(4.0), Value::Int(4));
        assert_eq!(Value::narrow(3.9999999), Value::Int(4));
        assert_eq!(Value::narrow(-2.0000001), Value::Int(-2));
        assert_eq!(Value::narrow(2.5), Value::Real(2.5));
    }

    #[test]
    fn test_display_keeps_real_decimal() {
        assert_eq!(Value::Real(3.0).to_string(), "3.0");
        assert_eq!(Value::Real(2.5).to_string(), "2.5");
        assert_eq!(Value::Int(3).to_string(), "3");
        assert_eq!(Value::Text("hi".into()).to_string(), "hi");
    }

    #[test]
    fn test_substitution_text_parses_back() {
        for x in [0.1, -7.25, 1e-7, 123456.5] {
            let text = Value::Real(x).substitution_text();
            assert!(!text.contains('e'), "{text}");
            assert_eq!(text.parse::<f64>().unwrap(), x);
        }
    }

    #[test]
    fn test_truthiness() {
        assert!(Value::Int(1).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Real(1e-9).is_truthy());
        assert!(Value::Real(-0.5).is_truthy());
    }

    #[test]
    fn test_as_whole() {
        assert_eq!(Value::Int(7).as_whole(), Some(7));
        assert_eq!(Value::Real(2.0000001).as_whole(), Some(2));
        assert_eq!(Value::Real(2.5).as_whole(), None);
        assert_eq!(Value::Text("2".into()).as_whole(), None);
    }

    #[test]
    fn test_element_kind_coerce() {
        assert_eq!(ElementKind::Int.coerce(&Value::Real(2.5)), Some(Value::Int(2)));
        assert_eq!(ElementKind::Int.coerce(&Value::Real(3.7)), Some(Value::Int(4)));
        assert_eq!(ElementKind::Real.coerce(&Value::Int(3)), Some(Value::Real(3.0)));
        assert_eq!(ElementKind::Real.coerce(&Value::Text("x".into())), None);
        assert_eq!(ElementKind::parse("real"), Some(ElementKind::Real));
        assert_eq!(ElementKind::parse("float"), None);
    }
}
