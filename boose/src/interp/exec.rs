//! Statement execution
//!
//! [`Interpreter`] owns the program state between runs; an [`Executor`]
//! borrows that state together with the host's canvas and diagnostic sink
//! for the duration of one run and walks the statement tree.

use super::call::CallFrame;
use super::cond::evaluate_condition;
use super::eval::{evaluate, unquote};
use super::store::ProgramStore;
use super::value::{EPSILON, Value};
use crate::ast::{Command, DrawOp, ForHeader, Program, Span, Spanned, Stmt};
use crate::canvas::{Canvas, CanvasError};
use crate::config::Config;
use crate::diagnostic::{Diagnostic, DiagnosticSink};
use crate::error::{BoundsError, EvalError, InterpError, ParseError, ResolutionError};
use crate::parser::parse_program;
use std::rc::Rc;

const STACK_RED_ZONE: usize = 128 * 1024; // 128KB remaining triggers growth
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024; // Grow by 4MB each time

/// BOOSE interpreter
#[derive(Debug)]
pub struct Interpreter {
    store: ProgramStore,
    config: Config,
}

impl Interpreter {
    pub fn new(config: Config) -> Self {
        Self {
            store: ProgramStore::new(config.scope_mode),
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &ProgramStore {
        &self.store
    }

    /// Value of a variable in the active scope
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.store.get_variable(name)
    }

    /// Forget all variables, arrays and methods
    pub fn reset(&mut self) {
        self.store.reset();
    }

    /// Reset all state, then parse and execute `source`.
    ///
    /// Parse problems and recovered runtime errors go to `sink`; the canvas
    /// is left as the host gave it. Only a canvas failure ends the run early.
    pub fn run_program(
        &mut self,
        source: &str,
        canvas: &mut dyn Canvas,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), CanvasError> {
        self.store.reset();
        let parsed = parse_program(source);
        for diagnostic in parsed.diagnostics {
            sink.report(diagnostic);
        }
        self.execute(&parsed.program, canvas, sink)
    }

    /// Execute an already parsed program on top of the current state
    pub fn execute(
        &mut self,
        program: &Program,
        canvas: &mut dyn Canvas,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<(), CanvasError> {
        let mut executor = Executor {
            store: &mut self.store,
            config: &self.config,
            canvas,
            sink,
            frames: Vec::new(),
        };
        let result = executor.exec_block(&program.stmts);
        if let Err(err) = &result {
            tracing::error!(error = %err, "run stopped by canvas error");
        }
        result
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Source location of the statement being executed
#[derive(Debug, Clone, Copy)]
pub(super) struct Loc {
    line: usize,
    span: Span,
}

impl Loc {
    fn of<T>(node: &Spanned<T>) -> Self {
        Self {
            line: node.line,
            span: node.span,
        }
    }
}

/// State borrowed for one run
pub(super) struct Executor<'a> {
    pub(super) store: &'a mut ProgramStore,
    pub(super) config: &'a Config,
    canvas: &'a mut dyn Canvas,
    sink: &'a mut dyn DiagnosticSink,
    /// Methods currently executing, innermost last
    pub(super) frames: Vec<CallFrame>,
}

impl Executor<'_> {
    pub(super) fn exec_block(&mut self, stmts: &[Spanned<Stmt>]) -> Result<(), CanvasError> {
        for stmt in stmts {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<(), CanvasError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.exec_stmt_inner(stmt))
    }

    fn exec_stmt_inner(&mut self, stmt: &Spanned<Stmt>) -> Result<(), CanvasError> {
        let loc = Loc::of(stmt);
        tracing::trace!(line = stmt.line, "processing");

        match &stmt.node {
            Stmt::While { cond, body } => self.exec_while(cond, body, loc),
            Stmt::For { header, body } => self.exec_for(header, body, loc),
            Stmt::If {
                cond,
                then_body,
                else_body,
            } => {
                if self.condition(cond, loc) {
                    self.exec_block(then_body)
                } else if let Some(else_body) = else_body {
                    self.exec_block(else_body)
                } else {
                    Ok(())
                }
            }
            Stmt::Method(def) => {
                tracing::debug!(method = %def.name, params = def.params.len(), "register method");
                self.note(
                    format!(
                        "method {} registered with {} parameter(s)",
                        def.name,
                        def.params.len()
                    ),
                    loc,
                );
                self.store.register_method(Rc::new(def.clone()));
                Ok(())
            }
            Stmt::Call { name, args } => self.call_method(name, args, loc),
            Stmt::Command(command) => self.exec_command(command, loc),
        }
    }

    fn exec_while(&mut self, cond: &str, body: &[Spanned<Stmt>], loc: Loc) -> Result<(), CanvasError> {
        let mut iterations = 0;
        loop {
            if !self.condition(cond, loc) {
                break;
            }
            if iterations == self.config.max_iterations {
                self.warn(
                    format!("while loop stopped after {iterations} iterations"),
                    loc,
                );
                break;
            }
            iterations += 1;
            self.exec_block(body)?;
        }
        tracing::debug!(line = loc.line, iterations, "while loop finished");
        Ok(())
    }

    fn exec_for(&mut self, header: &ForHeader, body: &[Spanned<Stmt>], loc: Loc) -> Result<(), CanvasError> {
        let start = self.number(&header.start, loc);
        let end = self.number(&header.end, loc);
        let step = match &header.step {
            Some(step) => self.number(step, loc),
            None => 1.0,
        };
        if step.abs() < EPSILON {
            self.report(ParseError::ZeroStep, loc);
            return Ok(());
        }

        let mut counter = start;
        let mut iterations = 0;
        while (step > 0.0 && counter <= end) || (step < 0.0 && counter >= end) {
            if iterations == self.config.max_iterations {
                self.warn(
                    format!("for loop stopped after {iterations} iterations"),
                    loc,
                );
                break;
            }
            iterations += 1;
            self.store.set_variable(&header.var, Value::narrow(counter));
            self.exec_block(body)?;
            counter += step;
        }
        self.store.remove_variable(&header.var);
        tracing::debug!(line = loc.line, var = %header.var, iterations, "for loop finished");
        Ok(())
    }

    fn exec_command(&mut self, command: &Command, loc: Loc) -> Result<(), CanvasError> {
        match command {
            Command::DeclareInt { name, init } => {
                let value = match init {
                    Some(expr) => match self.numeric_or_skip(expr, loc) {
                        Some(value) => value,
                        None => return Ok(()),
                    },
                    None => Value::Int(0),
                };
                let value = match value.as_whole() {
                    Some(n) => Value::Int(n),
                    None => {
                        self.report(EvalError::NotIntegral(value.as_f64().unwrap_or(0.0)), loc);
                        Value::Int(0)
                    }
                };
                self.note(format!("int {name} = {value}"), loc);
                self.store.set_variable(name, value);
            }
            Command::DeclareReal { name, init } => {
                let value = match init {
                    Some(expr) => match self.numeric_or_skip(expr, loc) {
                        Some(value) => value,
                        None => return Ok(()),
                    },
                    None => Value::Real(0.0),
                };
                let value = Value::Real(value.as_f64().unwrap_or(0.0));
                self.note(format!("real {name} = {value}"), loc);
                self.store.set_variable(name, value);
            }
            Command::DeclareArray { kind, name, size } => {
                let Some(len) = self.numeric(size, loc).as_whole() else {
                    self.report(ParseError::malformed("array size", size.clone()), loc);
                    return Ok(());
                };
                let declared = self
                    .store
                    .declare_array(name, kind, len)
                    .map(|array| (array.kind, array.len()));
                match declared {
                    Ok((kind, len)) => self.note(format!("array {kind} {name}[{len}]"), loc),
                    Err(err) => self.report(err, loc),
                }
            }
            Command::Poke { array, index, value } => {
                let Some(index) = self.index(index, loc) else {
                    return Ok(());
                };
                let Some(value) = self.numeric_or_skip(value, loc) else {
                    return Ok(());
                };
                match self.store.poke(array, index, &value) {
                    Ok(stored) => self.note(format!("poke {array}[{index}] = {stored}"), loc),
                    Err(err) => self.report(err, loc),
                }
            }
            Command::Peek { target, array, index } => {
                let Some(index) = self.index(index, loc) else {
                    return Ok(());
                };
                match self.store.peek(array, index) {
                    Ok(value) => {
                        self.note(format!("peek {target} = {array}[{index}] = {value}"), loc);
                        self.store.set_variable(target, value);
                    }
                    Err(err) => self.report(err, loc),
                }
            }
            Command::Assign { name, expr } => {
                let Some(value) = self.numeric_or_skip(expr, loc) else {
                    return Ok(());
                };
                let return_to = self
                    .frames
                    .last()
                    .filter(|frame| frame.canonical == *name)
                    .map(|frame| frame.call_site.clone());
                match return_to {
                    Some(call_site) => {
                        self.note(format!("{name} = {value} (return value)"), loc);
                        self.store.set_variable(&call_site, value.clone());
                        self.store.set_variable(name, value);
                    }
                    None => {
                        self.note(format!("{name} = {value}"), loc);
                        self.store.set_variable(name, value);
                    }
                }
            }
            Command::Write { text } => self.exec_write(text, loc)?,
            Command::Draw { op, args } => self.exec_draw(*op, args, loc)?,
            Command::Unknown(text) => {
                self.report(ResolutionError::UnknownCommand(text.clone()), loc);
            }
        }
        Ok(())
    }

    /// `write a + "text" + b`: quoted parts verbatim, other parts evaluated
    fn exec_write(&mut self, text: &str, loc: Loc) -> Result<(), CanvasError> {
        let mut output = String::new();
        for part in split_unquoted(text, '+') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            match unquote(part) {
                Some(inner) => output.push_str(inner),
                None => {
                    let value = self.eval(part, loc);
                    output.push_str(&value.to_string());
                }
            }
        }
        tracing::debug!(line = loc.line, text = %output, "write");
        self.canvas.write_text(&output)
    }

    fn exec_draw(&mut self, op: DrawOp, args: &str, loc: Loc) -> Result<(), CanvasError> {
        let parts = split_draw_args(args);
        let arity = op.arity();
        if parts.len() < arity {
            self.report(
                ParseError::MissingArguments {
                    command: op.name(),
                    expected: arity,
                    got: parts.len(),
                },
                loc,
            );
            return Ok(());
        }

        let mut values = Vec::with_capacity(arity);
        for part in &parts[..arity] {
            match self.numeric(part, loc).as_whole() {
                Some(n) => values.push(n),
                None => {
                    self.report(
                        ParseError::NonIntegerArgument {
                            command: op.name(),
                            text: part.clone(),
                        },
                        loc,
                    );
                    return Ok(());
                }
            }
        }

        tracing::debug!(line = loc.line, %op, ?values, "draw");
        match (op, values.as_slice()) {
            (DrawOp::MoveTo, &[x, y]) => self.canvas.move_to(x, y),
            (DrawOp::DrawTo, &[x, y]) => self.canvas.draw_to(x, y),
            (DrawOp::Circle, &[radius]) => self.canvas.draw_circle(radius),
            (DrawOp::Rect, &[width, height]) => self.canvas.draw_rectangle(width, height),
            (DrawOp::Pen, &[r, g, b]) => self.canvas.set_pen_color(r, g, b),
            (DrawOp::Clear, _) => self.canvas.clear(),
            (DrawOp::Reset, _) => self.canvas.reset(),
            _ => Ok(()),
        }
    }

    // ---- evaluation helpers ----

    fn eval(&mut self, text: &str, loc: Loc) -> Value {
        match evaluate(text, self.store.variables(), self.config.eval_mode) {
            Ok(value) => value,
            Err(err) => {
                let fallback = err.fallback();
                self.report(err, loc);
                fallback
            }
        }
    }

    /// Evaluate to a number; text is reported and yields `None`
    fn numeric_or_skip(&mut self, text: &str, loc: Loc) -> Option<Value> {
        match self.eval(text, loc) {
            Value::Text(s) => {
                self.report(EvalError::NotNumeric(s), loc);
                None
            }
            value => Some(value),
        }
    }

    /// Evaluate to a number; text is reported and yields `0.0`
    pub(super) fn numeric(&mut self, text: &str, loc: Loc) -> Value {
        self.numeric_or_skip(text, loc).unwrap_or(Value::Real(0.0))
    }

    fn number(&mut self, text: &str, loc: Loc) -> f64 {
        self.numeric(text, loc).as_f64().unwrap_or(0.0)
    }

    fn index(&mut self, text: &str, loc: Loc) -> Option<i64> {
        let index = self.numeric(text, loc).as_whole();
        if index.is_none() {
            self.report(BoundsError::NonIntegralIndex(text.to_string()), loc);
        }
        index
    }

    fn condition(&mut self, text: &str, loc: Loc) -> bool {
        let mut errors = Vec::new();
        let result = evaluate_condition(
            text,
            self.store.variables(),
            self.config.eval_mode,
            &mut errors,
        );
        for err in errors {
            self.report(err, loc);
        }
        result
    }

    // ---- diagnostics ----

    pub(super) fn report(&mut self, err: impl Into<InterpError>, loc: Loc) {
        let diagnostic = Diagnostic::from_error(err).located(loc.line, loc.span);
        tracing::warn!(line = loc.line, "{}", diagnostic.message);
        self.sink.report(diagnostic);
    }

    pub(super) fn note(&mut self, message: impl Into<String>, loc: Loc) {
        self.sink
            .report(Diagnostic::note(message).located(loc.line, loc.span));
    }

    fn warn(&mut self, message: impl Into<String>, loc: Loc) {
        let diagnostic = Diagnostic::warning(message).located(loc.line, loc.span);
        tracing::warn!(line = loc.line, "{}", diagnostic.message);
        self.sink.report(diagnostic);
    }
}

/// Split on `sep` outside double quotes
fn split_unquoted(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == sep && !in_quotes {
            parts.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Split drawing arguments. Whitespace around arithmetic operators is
/// dropped first, so `x + 10, y` gives `["x+10", "y"]`.
fn split_draw_args(text: &str) -> Vec<String> {
    let is_operator = |c: Option<&char>| matches!(c, Some('+' | '-' | '*' | '/'));
    let chars: Vec<char> = text.chars().collect();

    let mut compact = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() {
            let prev = chars[..i].iter().rev().find(|c| !c.is_whitespace());
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if !is_operator(prev) && !is_operator(next) {
                compact.push(' ');
            }
        } else if c == ',' {
            compact.push(' ');
        } else {
            compact.push(c);
        }
    }
    compact.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{CanvasOp, TraceCanvas};
    use crate::diagnostic::Severity;
    use crate::error::ErrorKind;

    fn run(source: &str) -> (Interpreter, TraceCanvas, Vec<Diagnostic>) {
        let mut interp = Interpreter::default();
        let mut canvas = TraceCanvas::new(640, 480).unwrap();
        let mut diagnostics = Vec::new();
        interp
            .run_program(source, &mut canvas, &mut diagnostics)
            .unwrap();
        (interp, canvas, diagnostics)
    }

    fn errors(diagnostics: &[Diagnostic]) -> Vec<&Diagnostic> {
        diagnostics
            .iter()
            .filter(|d| d.severity != Severity::Note)
            .collect()
    }

    #[test]
    fn test_split_unquoted() {
        assert_eq!(split_unquoted(r#""a+b" + x"#, '+'), vec![r#""a+b" "#, " x"]);
        assert_eq!(split_unquoted("x", '+'), vec!["x"]);
    }

    #[test]
    fn test_split_draw_args() {
        assert_eq!(split_draw_args("100, 200"), vec!["100", "200"]);
        assert_eq!(split_draw_args("x + 10, y"), vec!["x+10", "y"]);
        assert_eq!(split_draw_args("  50 "), vec!["50"]);
        assert!(split_draw_args("").is_empty());
    }

    #[test]
    fn test_declarations() {
        let (interp, _, diagnostics) = run("int x = 5\nreal r = 2\nint d");
        assert_eq!(interp.variable("x"), Some(&Value::Int(5)));
        assert_eq!(interp.variable("r"), Some(&Value::Real(2.0)));
        assert_eq!(interp.variable("d"), Some(&Value::Int(0)));
        assert!(errors(&diagnostics).is_empty());
        assert_eq!(diagnostics[1].message, "real r = 2.0");
    }

    #[test]
    fn test_int_declaration_of_fraction() {
        let (interp, _, diagnostics) = run("int x = 7 / 2");
        assert_eq!(interp.variable("x"), Some(&Value::Int(0)));
        let problems = errors(&diagnostics);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].kind, Some(ErrorKind::Evaluation));
    }

    #[test]
    fn test_text_assignment_is_skipped() {
        let (interp, _, diagnostics) = run("x = 1\nx = \"hello\"");
        assert_eq!(interp.variable("x"), Some(&Value::Int(1)));
        assert!(diagnostics.iter().any(|d| d.message.contains("not a number")));
    }

    #[test]
    fn test_write_concatenation() {
        let (_, canvas, _) = run("int x = 3\nreal y = 1.5\nwrite \"x = \" + x + \", y = \" + y");
        assert_eq!(canvas.written_text().collect::<Vec<_>>(), vec!["x = 3, y = 1.5"]);
    }

    #[test]
    fn test_draw_commands() {
        let (_, canvas, diagnostics) = run("int r = 20\nmoveto 100, 150\ncircle r\nrect r*2 30\npen 255 0 0\ndrawto 10 10");
        assert!(errors(&diagnostics).is_empty(), "{diagnostics:?}");
        assert_eq!(
            canvas.ops(),
            &[
                CanvasOp::MoveTo { x: 100, y: 150 },
                CanvasOp::Circle { x: 100, y: 150, radius: 20 },
                CanvasOp::Rect { x: 100, y: 150, width: 40, height: 30 },
                CanvasOp::Pen { r: 255, g: 0, b: 0 },
                CanvasOp::Line { from: (100, 150), to: (10, 10) },
            ]
        );
    }

    #[test]
    fn test_draw_argument_errors() {
        let (_, canvas, diagnostics) = run("moveto 10\ncircle 2.5");
        assert!(canvas.ops().is_empty());
        let problems = errors(&diagnostics);
        assert_eq!(problems.len(), 2);
        assert_eq!(problems[0].message, "'moveto' expects 2 argument(s), got 1");
        assert_eq!(problems[1].message, "'circle' argument '2.5' is not an integer");
    }

    #[test]
    fn test_canvas_error_stops_run() {
        let mut interp = Interpreter::default();
        let mut canvas = TraceCanvas::new(100, 100).unwrap();
        let mut diagnostics = Vec::new();
        let result = interp.run_program("int a = 1\nmoveto 500 5\na = 2", &mut canvas, &mut diagnostics);
        assert!(matches!(result, Err(CanvasError::OutOfBounds { x: 500, .. })));
        assert_eq!(interp.variable("a"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_unknown_command_reported() {
        let (_, _, diagnostics) = run("triangle 5");
        let problems = errors(&diagnostics);
        assert_eq!(problems[0].kind, Some(ErrorKind::Resolution));
        assert_eq!(problems[0].line, Some(1));
    }

    #[test]
    fn test_zero_step_rejected() {
        let (interp, _, diagnostics) = run("int n = 0\nfor i = 1 to 5 step 0\nn = n + 1\nend for");
        assert_eq!(interp.variable("n"), Some(&Value::Int(0)));
        assert!(diagnostics.iter().any(|d| d.message.contains("step cannot be zero")));
    }

    #[test]
    fn test_for_variable_removed_after_loop() {
        let (interp, _, _) = run("int last = 0\nfor i = 1 to 3\nlast = i\nend for");
        assert_eq!(interp.variable("last"), Some(&Value::Int(3)));
        assert_eq!(interp.variable("i"), None);
    }

    #[test]
    fn test_run_program_resets_state() {
        let mut interp = Interpreter::default();
        let mut canvas = TraceCanvas::new(100, 100).unwrap();
        let mut diagnostics = Vec::new();
        interp.run_program("int a = 1", &mut canvas, &mut diagnostics).unwrap();
        interp.run_program("int b = 2", &mut canvas, &mut diagnostics).unwrap();
        assert_eq!(interp.variable("a"), None);
        assert_eq!(interp.variable("b"), Some(&Value::Int(2)));
    }
}
