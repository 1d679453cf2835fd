//! Condition evaluation for `while` and `if`

use super::eval::{EvalMode, evaluate, parse_number};
use super::scope::Scope;
use super::value::{EPSILON, Value};
use crate::error::EvalError;

/// Comparison operators in the order they are looked for
const OPERATORS: [&str; 6] = [">=", "<=", ">", "<", "==", "!="];

/// Evaluate a condition to a boolean.
///
/// The first operator of [`OPERATORS`] found in the text splits it into two
/// operands. Without an operator (or when the split does not give exactly two
/// operands) the whole text is evaluated and is true when its magnitude
/// exceeds [`EPSILON`]. Evaluation failures are pushed to `errors` and the
/// failing operand takes its fallback value.
pub fn evaluate_condition(
    text: &str,
    scope: &Scope,
    mode: EvalMode,
    errors: &mut Vec<EvalError>,
) -> bool {
    let text = text.trim();
    if let Some(op) = OPERATORS.into_iter().find(|op| text.contains(op)) {
        let parts: Vec<&str> = text.split(op).collect();
        if let [left, right] = parts.as_slice() {
            let left = operand(left, scope, mode, errors);
            let right = operand(right, scope, mode, errors);
            return compare(left, op, right);
        }
    }
    value_of(text, scope, mode, errors).is_truthy()
}

fn compare(left: f64, op: &str, right: f64) -> bool {
    match op {
        ">=" => left >= right,
        "<=" => left <= right,
        ">" => left > right,
        "<" => left < right,
        "==" => (left - right).abs() < EPSILON,
        _ => (left - right).abs() >= EPSILON,
    }
}

/// Numeric operand: a plain literal, otherwise a full expression
fn operand(text: &str, scope: &Scope, mode: EvalMode, errors: &mut Vec<EvalError>) -> f64 {
    if let Some(x) = parse_number(text) {
        return x;
    }
    match value_of(text, scope, mode, errors) {
        Value::Text(s) => {
            errors.push(EvalError::NotNumeric(s));
            0.0
        }
        value => value.as_f64().unwrap_or(0.0),
    }
}

fn value_of(text: &str, scope: &Scope, mode: EvalMode, errors: &mut Vec<EvalError>) -> Value {
    evaluate(text, scope, mode).unwrap_or_else(|err| {
        let fallback = err.fallback();
        errors.push(err);
        fallback
    })
}
