//! Expression evaluation
//!
//! Two evaluators share one entry point, [`evaluate`]:
//!
//! * [`EvalMode::Legacy`] substitutes variable values into the text and then
//!   splits on a single operator. `-` and `+` are tried before `*` and `/`,
//!   the first occurrence wins and each side must be a plain number. A `-` or
//!   `+` at the start or right after another operator is a sign, so `-5+-4`
//!   splits at the `+`. There is no precedence and no multi-term arithmetic: `a+b+c` evaluates to `a`.
//! * [`EvalMode::Precedence`] tokenizes with the [`lexer`](crate::lexer) and
//!   runs a recursive-descent parser with the usual precedence rules.
//!
//! Both narrow whole-number results to [`Value::Int`].

use super::scope::Scope;
use super::value::{EPSILON, Value};
use crate::ast::Span;
use crate::error::EvalError;
use crate::lexer::{Token, tokenize};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// Which arithmetic evaluator to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalMode {
    /// Textual substitution and a single left-most operator split
    #[default]
    Legacy,
    /// Tokenized recursive descent with `* /` binding tighter than `+ -`
    Precedence,
}

impl FromStr for EvalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(EvalMode::Legacy),
            "precedence" => Ok(EvalMode::Precedence),
            other => Err(format!(
                "unknown evaluation mode '{other}', expected 'legacy' or 'precedence'"
            )),
        }
    }
}

/// Evaluate `text` against the variables of `scope`.
///
/// A quoted literal yields [`Value::Text`]. Failures carry a
/// [`fallback`](EvalError::fallback) value for the caller to continue with.
pub fn evaluate(text: &str, scope: &Scope, mode: EvalMode) -> Result<Value, EvalError> {
    let text = text.trim();
    if let Some(inner) = unquote(text) {
        return Ok(Value::Text(inner.to_string()));
    }
    match mode {
        EvalMode::Legacy => evaluate_legacy(text, scope),
        EvalMode::Precedence => evaluate_precedence(text, scope),
    }
}

/// Contents of a `"..."` literal
pub fn unquote(text: &str) -> Option<&str> {
    text.strip_prefix('"')?.strip_suffix('"')
}

/// Parse a plain numeric literal. Non-finite spellings such as `inf` are rejected.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|x| x.is_finite())
}

/// Replace every variable of `scope` that appears as a whole word in `text`
/// with its value. Longer names are substituted first.
pub fn substitute_variables(text: &str, scope: &Scope) -> String {
    let mut names: Vec<&String> = scope.keys().collect();
    names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let mut result = text.to_string();
    for name in names {
        if let Some(value) = scope.get(name.as_str()) {
            result = replace_word(&result, name, &value.substitution_text());
        }
    }
    result
}

/// Replace whole-word occurrences of `word`. Word characters are ASCII
/// alphanumerics and `_`.
pub fn replace_word(text: &str, word: &str, replacement: &str) -> String {
    if word.is_empty() {
        return text.to_string();
    }
    let is_word_byte = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let bytes = text.as_bytes();

    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    for (start, _) in text.match_indices(word) {
        if start < last {
            continue;
        }
        let end = start + word.len();
        let before_ok = start == 0 || !is_word_byte(bytes[start - 1]);
        let after_ok = end == bytes.len() || !is_word_byte(bytes[end]);
        if before_ok && after_ok {
            result.push_str(&text[last..start]);
            result.push_str(replacement);
            last = end;
        }
    }
    result.push_str(&text[last..]);
    result
}

fn evaluate_legacy(text: &str, scope: &Scope) -> Result<Value, EvalError> {
    let substituted = substitute_variables(text, scope);
    let compact: String = substituted.chars().filter(|c| !c.is_whitespace()).collect();

    for op in ['-', '+', '*', '/'] {
        let Some(at) = find_operator(&compact, op) else {
            continue;
        };
        let left = parse_number(&compact[..at]).unwrap_or(0.0);
        let right = parse_number(&compact[at + 1..]).unwrap_or(0.0);
        let result = match op {
            '-' => left - right,
            '+' => left + right,
            '*' => left * right,
            _ => {
                if right.abs() < EPSILON {
                    return Err(EvalError::DivisionByZero(text.to_string()));
                }
                left / right
            }
        };
        return Ok(Value::narrow(result));
    }

    parse_number(&compact)
        .map(Value::narrow)
        .ok_or_else(|| EvalError::Unparsable(text.to_string()))
}

/// Byte offset of the first `op` that acts as a binary operator. A `-` or
/// `+` at the start or right after another operator is a sign.
fn find_operator(text: &str, op: char) -> Option<usize> {
    let mut prev: Option<char> = None;
    for (at, c) in text.char_indices() {
        let is_sign = matches!(c, '-' | '+') && prev.is_none_or(|p| "+-*/".contains(p));
        if c == op && !is_sign {
            return Some(at);
        }
        prev = Some(c);
    }
    None
}

fn evaluate_precedence(text: &str, scope: &Scope) -> Result<Value, EvalError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(EvalError::Unparsable(text.to_string()));
    }
    let mut parser = ExprParser {
        tokens: &tokens,
        pos: 0,
        scope,
        text,
    };
    let value = parser.expr()?;
    if parser.pos != tokens.len() {
        return Err(parser.unparsable());
    }
    Ok(Value::narrow(value))
}

/// Recursive-descent parser over expression tokens
///
/// ```text
/// expr    := term (('+' | '-') term)*
/// term    := unary (('*' | '/') unary)*
/// unary   := ('-' | '+') unary | primary
/// primary := number | ident | '(' expr ')'
/// ```
struct ExprParser<'a> {
    tokens: &'a [(Token, Span)],
    pos: usize,
    scope: &'a Scope,
    text: &'a str,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tokens = self.tokens;
        let token = tokens.get(self.pos).map(|(t, _)| t);
        self.pos += 1;
        token
    }

    fn unparsable(&self) -> EvalError {
        EvalError::Unparsable(self.text.to_string())
    }

    fn expr(&mut self) -> Result<f64, EvalError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            let mut value = self.term()?;
            loop {
                match self.peek() {
                    Some(Token::Plus) => {
                        self.pos += 1;
                        value += self.term()?;
                    }
                    Some(Token::Minus) => {
                        self.pos += 1;
                        value -= self.term()?;
                    }
                    _ => return Ok(value),
                }
            }
        })
    }

    fn term(&mut self) -> Result<f64, EvalError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    if divisor.abs() < EPSILON {
                        return Err(EvalError::DivisionByZero(self.text.to_string()));
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, EvalError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, EvalError> {
        let scope = self.scope;
        match self.advance().cloned() {
            Some(Token::IntLit(n)) => Ok(n as f64),
            Some(Token::RealLit(x)) => Ok(x),
            Some(Token::Ident(name)) => match scope.get(&name) {
                Some(value) => value
                    .as_f64()
                    .ok_or_else(|| EvalError::NotNumeric(value.to_string())),
                None => Err(EvalError::UnknownVariable(name)),
            },
            Some(Token::LParen) => {
                let value = self.expr()?;
                if matches!(self.advance(), Some(Token::RParen)) {
                    Ok(value)
                } else {
                    Err(self.unparsable())
                }
            }
            Some(Token::TextLit(s)) => Err(EvalError::NotNumeric(s)),
            _ => Err(self.unparsable()),
        }
    }
}
