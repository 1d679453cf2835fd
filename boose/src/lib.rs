//! BOOSE interpreter library
//!
//! Line-oriented drawing language with typed variables, arrays, loops,
//! conditionals and methods. Drawing goes through the [`canvas::Canvas`]
//! trait and feedback through a [`diagnostic::DiagnosticSink`].

pub mod ast;
pub mod canvas;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod extract;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod repl;

pub use ast::Span;
pub use canvas::{Canvas, CanvasError, TraceCanvas};
pub use config::Config;
pub use diagnostic::{Diagnostic, DiagnosticSink, Severity};
pub use interp::{Interpreter, Value};
