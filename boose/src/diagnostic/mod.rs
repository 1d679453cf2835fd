//! Diagnostics reported while a program is parsed and executed
//!
//! The interpreter never prints. Everything it has to say (declaration
//! echoes, recovered errors, loop cap warnings) goes to a [`DiagnosticSink`]
//! that the host passes in.

use crate::ast::{SourceLine, Span};
use crate::error::{ErrorKind, InterpError};
use serde::Serialize;
use std::fmt;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    /// Program output such as `int x = 5`
    Note,
    /// Recovered problem; execution used a default or stopped a loop
    Warning,
    /// A construct was skipped
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Note => "note",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// One line of interpreter feedback
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: Option<ErrorKind>,
    /// 1-based source line, when the diagnostic belongs to one
    pub line: Option<usize>,
    pub span: Option<Span>,
    pub message: String,
}

impl Diagnostic {
    pub fn note(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Note,
            kind: None,
            line: None,
            span: None,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::note(message)
        }
    }

    /// Diagnostic for a recoverable error. Evaluation failures are warnings
    /// because a default value keeps the statement running; everything else
    /// skips the statement and is an error.
    pub fn from_error(error: impl Into<InterpError>) -> Self {
        let error = error.into();
        let severity = match error.kind() {
            ErrorKind::Evaluation => Severity::Warning,
            _ => Severity::Error,
        };
        Self {
            severity,
            kind: Some(error.kind()),
            line: None,
            span: None,
            message: error.to_string(),
        }
    }

    pub fn located(mut self, line: usize, span: Span) -> Self {
        self.line = Some(line);
        self.span = Some(span);
        self
    }

    /// Locate the diagnostic at a raw source line
    pub fn at_line(self, line: &SourceLine) -> Self {
        self.located(line.number, line.span)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{}] line {}: {}", self.severity, line, self.message),
            None => write!(f, "[{}] {}", self.severity, self.message),
        }
    }
}

/// Receiver for diagnostics, called once per event in program order
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// Sink that forwards to a closure
pub struct FnSink<F>(pub F);

impl<F: FnMut(Diagnostic)> DiagnosticSink for FnSink<F> {
    fn report(&mut self, diagnostic: Diagnostic) {
        (self.0)(diagnostic);
    }
}

/// Sink that turns diagnostics into `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        let line = diagnostic.line.unwrap_or(0);
        match diagnostic.severity {
            Severity::Note => tracing::info!(line, "{}", diagnostic.message),
            Severity::Warning => tracing::warn!(line, "{}", diagnostic.message),
            Severity::Error => tracing::error!(line, "{}", diagnostic.message),
        }
    }
}

/// Render a diagnostic against its source with ariadne
pub fn render(
    filename: &str,
    source: &str,
    diagnostic: &Diagnostic,
    out: &mut impl std::io::Write,
) -> std::io::Result<()> {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let (kind, color) = match diagnostic.severity {
        Severity::Error => (ReportKind::Error, Color::Red),
        Severity::Warning => (ReportKind::Warning, Color::Yellow),
        Severity::Note => (ReportKind::Advice, Color::Cyan),
    };
    let title = match diagnostic.kind {
        Some(kind) => format!("{kind} error"),
        None => diagnostic.severity.to_string(),
    };

    match diagnostic.span {
        Some(span) => Report::build(kind, (filename, span.start..span.end))
            .with_message(title)
            .with_label(
                Label::new((filename, span.start..span.end))
                    .with_message(&diagnostic.message)
                    .with_color(color),
            )
            .finish()
            .write((filename, Source::from(source)), out),
        None => Report::build(kind, (filename, 0..0))
            .with_message(format!("{title}: {}", diagnostic.message))
            .finish()
            .write((filename, Source::from(source)), out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EvalError, ParseError, ResolutionError};

    #[test]
    fn test_from_error_severity() {
        let d = Diagnostic::from_error(EvalError::DivisionByZero("1/0".into()));
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.kind, Some(ErrorKind::Evaluation));

        let d = Diagnostic::from_error(ParseError::ZeroStep);
        assert_eq!(d.severity, Severity::Error);
        assert_eq!(d.kind, Some(ErrorKind::Parse));
        assert!(d.is_error());
    }

    #[test]
    fn test_at_line() {
        let line = SourceLine::new(3, "call nope", Span::new(20, 29));
        let d = Diagnostic::from_error(ResolutionError::UnknownMethod("nope".into())).at_line(&line);
        assert_eq!(d.line, Some(3));
        assert_eq!(d.span, Some(Span::new(20, 29)));
        assert_eq!(d.to_string(), "[error] line 3: method 'nope' not found");
    }

    #[test]
    fn test_vec_and_fn_sinks() {
        let mut collected: Vec<Diagnostic> = Vec::new();
        collected.report(Diagnostic::note("int x = 1"));
        assert_eq!(collected.len(), 1);

        let mut count = 0;
        let mut sink = FnSink(|_d: Diagnostic| count += 1);
        sink.report(Diagnostic::warning("loop stopped"));
        sink.report(Diagnostic::note("done"));
        drop(sink);
        assert_eq!(count, 2);
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tracing_sink_emits_events() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut sink = TracingSink;
            sink.report(Diagnostic::note("int x = 1").located(1, Span::new(0, 9)));
            sink.report(Diagnostic::warning("loop stopped"));
        });

        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(text.contains("INFO"));
        assert!(text.contains("int x = 1"));
        assert!(text.contains("line=1"));
        assert!(text.contains("WARN"));
        assert!(text.contains("loop stopped"));
    }

    #[test]
    fn test_render_mentions_message() {
        let source = "int x = 1\ncall nope\n";
        let line = SourceLine::new(2, "call nope", Span::new(10, 19));
        let d = Diagnostic::from_error(ResolutionError::UnknownMethod("nope".into())).at_line(&line);
        let mut out = Vec::new();
        render("test.boose", source, &d, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("method 'nope' not found"));
    }
}
