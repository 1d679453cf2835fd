//! REPL (Read-Eval-Print Loop) for BOOSE
//!
//! Program lines typed at the prompt are collected into a buffer; `:run`
//! executes the whole buffer from a clean state, the same way a host runs a
//! program file.

use crate::canvas::{CanvasError, TraceCanvas};
use crate::config::Config;
use crate::diagnostic::Diagnostic;
use crate::interp::Interpreter;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = "boose> ";
const HISTORY_FILE: &str = ".boose_history";

/// What the prompt loop should do after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Output of one `:run`
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Text passed to `write`, in order
    pub written: Vec<String>,
    pub error: Option<CanvasError>,
}

/// Program buffer and interpreter, independent of the terminal
#[derive(Debug)]
pub struct Session {
    buffer: Vec<String>,
    interpreter: Interpreter,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            buffer: Vec::new(),
            interpreter: Interpreter::new(config),
        }
    }

    pub fn buffer(&self) -> &[String] {
        &self.buffer
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn push_line(&mut self, line: &str) {
        self.buffer.push(line.to_string());
    }

    /// Forget the buffer and all program state
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.interpreter.reset();
    }

    /// Run the buffered program on a fresh canvas
    pub fn run(&mut self) -> RunReport {
        let source = self.buffer.join("\n");
        let size = self.interpreter.config().canvas;
        let mut diagnostics = Vec::new();

        let mut canvas = match TraceCanvas::new(size.width, size.height) {
            Ok(canvas) => canvas,
            Err(err) => {
                return RunReport {
                    diagnostics,
                    written: Vec::new(),
                    error: Some(err),
                };
            }
        };
        let error = self
            .interpreter
            .run_program(&source, &mut canvas, &mut diagnostics)
            .err();

        RunReport {
            diagnostics,
            written: canvas.written_text().map(str::to_string).collect(),
            error,
        }
    }

    /// Variables of the last run as `name = value` lines, sorted by name
    pub fn variables(&self) -> Vec<String> {
        let mut vars: Vec<_> = self.interpreter.store().variables().iter().collect();
        vars.sort_by(|a, b| a.0.cmp(b.0));
        vars.into_iter()
            .map(|(name, value)| format!("{name} = {value}"))
            .collect()
    }
}

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    session: Session,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL
    pub fn new(config: Config) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;

        // Try to find history file in home directory
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            session: Session::new(config),
            history_path,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("BOOSE REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("Enter program lines, then :run. Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(line);

                    if line.starts_with(':') {
                        if self.handle_command(line) == Flow::Quit {
                            break;
                        }
                        continue;
                    }
                    self.session.push_line(line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Handle REPL commands (starting with :)
    fn handle_command(&mut self, cmd: &str) -> Flow {
        match cmd {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                return Flow::Quit;
            }
            ":help" | ":h" | ":?" => print_help(),
            ":run" | ":r" => print_report(&self.session.run()),
            ":list" | ":l" => {
                for (n, line) in self.session.buffer().iter().enumerate() {
                    println!("{:>4}  {line}", n + 1);
                }
            }
            ":reset" => {
                self.session.reset();
                println!("Program buffer cleared.");
            }
            ":vars" => {
                for line in self.session.variables() {
                    println!("{line}");
                }
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
            }
        }
        Flow::Continue
    }
}

fn print_report(report: &RunReport) {
    for diagnostic in &report.diagnostics {
        println!("{diagnostic}");
    }
    for text in &report.written {
        println!("{text}");
    }
    if let Some(err) = &report.error {
        eprintln!("Canvas error: {err}");
    }
}

fn print_help() {
    println!("BOOSE REPL Commands:");
    println!("  :run, :r        Run the program buffer from a clean state");
    println!("  :list, :l       Show the program buffer");
    println!("  :vars           Show variables after the last run");
    println!("  :reset          Clear the program buffer and state");
    println!("  :help, :h, :?   Show this help");
    println!("  :quit, :q       Exit the REPL");
    println!();
    println!("Any other line is appended to the program, e.g.:");
    println!("  int size = 40");
    println!("  moveto 100, 100");
    println!("  circle size");
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::Value;

    fn session_with(lines: &[&str]) -> Session {
        let mut session = Session::new(Config::default());
        for line in lines {
            session.push_line(line);
        }
        session
    }

    #[test]
    fn test_constants() {
        assert_eq!(PROMPT, "boose> ");
        assert_eq!(HISTORY_FILE, ".boose_history");
    }

    #[test]
    fn test_session_run_collects_output() {
        let mut session = session_with(&["int x = 4", "write \"x is \" + x", "moveto 10 10"]);
        let report = session.run();
        assert_eq!(report.written, vec!["x is 4"]);
        assert!(report.error.is_none());
        assert_eq!(session.interpreter().variable("x"), Some(&Value::Int(4)));
    }

    #[test]
    fn test_session_run_reports_canvas_error() {
        let mut session = session_with(&["circle 0"]);
        let report = session.run();
        assert_eq!(report.error, Some(CanvasError::InvalidRadius(0)));
    }

    #[test]
    fn test_session_rerun_starts_clean() {
        let mut session = session_with(&["int a = 1"]);
        session.run();
        session.reset();
        session.push_line("int b = 2");
        session.run();
        assert_eq!(session.variables(), vec!["b = 2"]);
        assert_eq!(session.buffer(), &["int b = 2".to_string()]);
    }

    #[test]
    fn test_session_variables_sorted() {
        let mut session = session_with(&["int zeta = 1", "real alpha = 2"]);
        session.run();
        assert_eq!(session.variables(), vec!["alpha = 2.0", "zeta = 1"]);
    }

    #[test]
    fn test_handle_command_flow() {
        let Ok(mut repl) = Repl::new(Config::default()) else {
            return;
        };
        assert_eq!(repl.handle_command(":quit"), Flow::Quit);
        assert_eq!(repl.handle_command(":q"), Flow::Quit);
        assert_eq!(repl.handle_command(":help"), Flow::Continue);
        assert_eq!(repl.handle_command(":list"), Flow::Continue);
        assert_eq!(repl.handle_command(":unknown"), Flow::Continue);
    }
}
