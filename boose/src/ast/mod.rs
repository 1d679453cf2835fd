//! Statement tree for BOOSE programs
//!
//! Programs are line oriented: every statement occupies one line, and the
//! four block constructs (`while`, `for`, `if`, `method`) are delimited by a
//! header line and a matching `end <keyword>` line. The parser turns the
//! text into this tree once; expressions stay as text and are resolved by
//! the evaluator when the statement runs.

mod span;

pub use span::*;

use serde::Serialize;
use std::fmt;

/// A parsed program
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Program {
    pub stmts: Vec<Spanned<Stmt>>,
}

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// `while <cond>` ... `end while`
    While {
        cond: String,
        body: Vec<Spanned<Stmt>>,
    },
    /// `for <var> = <start> to <end> [step <n>]` ... `end for`
    For {
        header: ForHeader,
        body: Vec<Spanned<Stmt>>,
    },
    /// `if <cond>` ... [`else` ...] `end if`
    If {
        cond: String,
        then_body: Vec<Spanned<Stmt>>,
        else_body: Option<Vec<Spanned<Stmt>>>,
    },
    /// `method <type> <name> [params]` ... `end method`
    Method(MethodDef),
    /// `call <name> [args]`
    Call { name: String, args: Vec<String> },
    /// Any single-line statement
    Command(Command),
}

/// Header of a counted loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForHeader {
    pub var: String,
    pub start: String,
    pub end: String,
    pub step: Option<String>,
}

/// Method definition
///
/// Registered when execution reaches the definition and never mutated
/// afterwards. The method name doubles as the return binding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDef {
    pub name: String,
    /// Declared return type word (`int` or `real`)
    pub return_kind: String,
    pub params: Vec<String>,
    /// Raw body lines, as written between the header and `end method`
    pub lines: Vec<SourceLine>,
    /// The same body parsed into statements
    pub body: Vec<Spanned<Stmt>>,
}

impl MethodDef {
    /// Variable name a body assigns to in order to return a value
    pub fn return_binding(&self) -> &str {
        &self.name
    }
}

/// Single-line statement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Command {
    DeclareInt { name: String, init: Option<String> },
    DeclareReal { name: String, init: Option<String> },
    DeclareArray { kind: String, name: String, size: String },
    Poke { array: String, index: String, value: String },
    Peek { target: String, array: String, index: String },
    Assign { name: String, expr: String },
    Write { text: String },
    Draw { op: DrawOp, args: String },
    /// A line no statement form recognizes; reported when executed
    Unknown(String),
}

/// Drawing command forwarded to the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DrawOp {
    MoveTo,
    DrawTo,
    Circle,
    Rect,
    Pen,
    Clear,
    Reset,
}

impl DrawOp {
    /// Recognize a command word, ignoring case
    pub fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "moveto" => Some(DrawOp::MoveTo),
            "drawto" => Some(DrawOp::DrawTo),
            "circle" => Some(DrawOp::Circle),
            "rect" | "rectangle" => Some(DrawOp::Rect),
            "pen" => Some(DrawOp::Pen),
            "clear" => Some(DrawOp::Clear),
            "reset" => Some(DrawOp::Reset),
            _ => None,
        }
    }

    /// Number of integer arguments the command consumes
    pub fn arity(self) -> usize {
        match self {
            DrawOp::MoveTo | DrawOp::DrawTo | DrawOp::Rect => 2,
            DrawOp::Circle => 1,
            DrawOp::Pen => 3,
            DrawOp::Clear | DrawOp::Reset => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DrawOp::MoveTo => "moveto",
            DrawOp::DrawTo => "drawto",
            DrawOp::Circle => "circle",
            DrawOp::Rect => "rect",
            DrawOp::Pen => "pen",
            DrawOp::Clear => "clear",
            DrawOp::Reset => "reset",
        }
    }
}

impl fmt::Display for DrawOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of header/terminator block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BlockKind {
    While,
    For,
    If,
    Method,
}

impl BlockKind {
    pub const ALL: [BlockKind; 4] = [
        BlockKind::While,
        BlockKind::For,
        BlockKind::If,
        BlockKind::Method,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            BlockKind::While => "while",
            BlockKind::For => "for",
            BlockKind::If => "if",
            BlockKind::Method => "method",
        }
    }

    /// Accepted closing lines, already normalized to lowercase single-spaced form
    pub fn terminators(self) -> &'static [&'static str] {
        match self {
            BlockKind::While => &["end while", "endwhile"],
            BlockKind::For => &["end for", "endfor"],
            BlockKind::If => &["end if", "endif"],
            BlockKind::Method => &["end method", "endmethod"],
        }
    }

    /// Canonical spelling of the terminator
    pub fn closing(self) -> &'static str {
        self.terminators()[0]
    }

    /// Block kind opened by a header line, if it is one
    pub fn from_header(line: &str) -> Option<Self> {
        BlockKind::ALL
            .into_iter()
            .find(|kind| strip_keyword(line, kind.keyword()).is_some())
    }

    /// Whether `line` closes a block of this kind. Case and inner spacing are ignored.
    pub fn is_terminator(self, line: &str) -> bool {
        let normalized = normalize_words(line);
        self.terminators().contains(&normalized.as_str())
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// True for any block terminator line
pub fn is_any_terminator(line: &str) -> bool {
    BlockKind::ALL.into_iter().any(|kind| kind.is_terminator(line))
}

/// True for a bare `else` line
pub fn is_else(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("else")
}

/// Strip a leading keyword followed by whitespace (or nothing), returning the rest.
///
/// `strip_keyword("int x = 1", "int")` yields `"x = 1"`; `"integer"` does not match.
pub fn strip_keyword<'a>(line: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(keyword)?;
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim()),
        Some(_) => None,
    }
}

/// Identifier as accepted for variable, array and method names
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

fn normalize_words(line: &str) -> String {
    line.split_whitespace()
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
