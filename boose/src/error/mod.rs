//! Error types
//!
//! Nothing in this taxonomy is fatal to the interpreter: each failure is
//! turned into a [`Diagnostic`](crate::diagnostic::Diagnostic), the offending
//! construct is skipped (or a default value substituted) and execution goes
//! on. Only [`CanvasError`](crate::canvas::CanvasError) escapes a run.

use crate::ast::BlockKind;
use crate::interp::Value;
use serde::Serialize;
use thiserror::Error;

/// Broad category of an error, as shown to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Parse,
    Evaluation,
    Bounds,
    Resolution,
    Canvas,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Evaluation => "evaluation",
            ErrorKind::Bounds => "bounds",
            ErrorKind::Resolution => "resolution",
            ErrorKind::Canvas => "canvas",
        };
        f.write_str(name)
    }
}

/// Malformed program text. The construct is skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("malformed {what}: '{text}'")]
    Malformed { what: &'static str, text: String },

    #[error("missing '{}' for {kind} block", .kind.closing())]
    MissingTerminator { kind: BlockKind },

    #[error("missing condition after '{kind}'")]
    MissingCondition { kind: BlockKind },

    #[error("array size must be positive, got {0}")]
    InvalidSize(i64),

    #[error("array size {size} exceeds the limit of {limit} elements")]
    ArrayTooLarge { size: i64, limit: usize },

    #[error("invalid array type '{0}', expected 'int' or 'real'")]
    InvalidKind(String),

    #[error("missing 'to' keyword in for statement: '{0}'")]
    MissingTo(String),

    #[error("for loop step cannot be zero")]
    ZeroStep,

    #[error("'{command}' expects {expected} argument(s), got {got}")]
    MissingArguments {
        command: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("'{command}' argument '{text}' is not an integer")]
    NonIntegerArgument { command: &'static str, text: String },

    #[error("'else' without a matching 'if'")]
    StrayElse,
}

impl ParseError {
    pub fn malformed(what: &'static str, text: impl Into<String>) -> Self {
        Self::Malformed {
            what,
            text: text.into(),
        }
    }
}

/// Expression that could not be evaluated. Recovered with [`EvalError::fallback`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("could not evaluate expression '{0}'")]
    Unparsable(String),

    #[error("division by zero in '{0}'")]
    DivisionByZero(String),

    #[error("'{0}' is not a number")]
    NotNumeric(String),

    #[error("value {0} is not a whole number")]
    NotIntegral(f64),

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("unexpected character at offset {offset} in '{text}'")]
    UnexpectedCharacter { text: String, offset: usize },
}

impl EvalError {
    /// Value substituted for the failed expression
    pub fn fallback(&self) -> Value {
        match self {
            EvalError::NotIntegral(_) => Value::Int(0),
            _ => Value::Real(0.0),
        }
    }
}

/// Array access outside the declared length. The read or write is skipped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundsError {
    #[error("index {index} out of bounds for array '{array}' (size: {len})")]
    IndexOutOfRange {
        array: String,
        index: i64,
        len: usize,
    },

    #[error("index '{0}' is not a whole number")]
    NonIntegralIndex(String),
}

/// A name that does not resolve to anything callable or declared
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    #[error("method '{0}' not found")]
    UnknownMethod(String),

    #[error("method '{name}' expects {expected} parameter(s), got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("unknown command: '{0}'")]
    UnknownCommand(String),

    #[error("array '{0}' not found")]
    UnknownArray(String),

    #[error("call to '{name}' exceeds the maximum call depth of {limit}")]
    CallDepthExceeded { name: String, limit: usize },
}

/// Any recoverable interpreter error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Bounds(#[from] BoundsError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

impl InterpError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InterpError::Parse(_) => ErrorKind::Parse,
            InterpError::Eval(_) => ErrorKind::Evaluation,
            InterpError::Bounds(_) => ErrorKind::Bounds,
            InterpError::Resolution(_) => ErrorKind::Resolution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_terminator_message() {
        let err = ParseError::MissingTerminator {
            kind: BlockKind::While,
        };
        assert_eq!(err.to_string(), "missing 'end while' for while block");
    }

    #[test]
    fn test_malformed_message() {
        let err = ParseError::malformed("declaration", "int");
        assert_eq!(err.to_string(), "malformed declaration: 'int'");
    }

    #[test]
    fn test_eval_fallbacks() {
        assert_eq!(
            EvalError::DivisionByZero("1/0".into()).fallback(),
            Value::Real(0.0)
        );
        assert_eq!(EvalError::Unparsable("x".into()).fallback(), Value::Real(0.0));
        assert_eq!(EvalError::NotIntegral(2.5).fallback(), Value::Int(0));
    }

    #[test]
    fn test_interp_error_kind() {
        let err: InterpError = BoundsError::IndexOutOfRange {
            array: "a".into(),
            index: 7,
            len: 3,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Bounds);
        assert_eq!(err.to_string(), "index 7 out of bounds for array 'a' (size: 3)");

        let err: InterpError = ResolutionError::UnknownMethod("foo".into()).into();
        assert_eq!(err.kind(), ErrorKind::Resolution);
        assert!(err.to_string().contains("foo"));
    }
}
