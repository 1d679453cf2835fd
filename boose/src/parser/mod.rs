//! Line-oriented recursive-descent parser
//!
//! Each header line is matched with its terminator by the
//! [block extractor](crate::extract) and the extracted body is parsed
//! recursively, so the program text is scanned once and executed from the
//! resulting tree. Problems are collected as diagnostics: a malformed line is
//! dropped and parsing continues, except for a missing terminator, after
//! which the rest of the input belongs to the unclosed block and is dropped.

use crate::ast::{
    BlockKind, Command, DrawOp, ForHeader, MethodDef, Program, SourceLine, Span, Spanned, Stmt,
    is_any_terminator, is_else, is_identifier, strip_keyword,
};
use crate::diagnostic::Diagnostic;
use crate::error::ParseError;
use crate::extract::extract_block;
use crate::interp::{ElementKind, split_call_args};


/// Result of parsing a whole program
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub program: Program,
    pub diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Split program text into trimmed, numbered lines with byte spans
pub fn split_lines(source: &str) -> Vec<SourceLine> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for (index, raw) in source.split('\n').enumerate() {
        let leading = raw.len() - raw.trim_start().len();
        let text = raw.trim();
        let start = offset + leading;
        lines.push(SourceLine::new(
            index + 1,
            text,
            Span::new(start, start + text.len()),
        ));
        offset += raw.len() + 1;
    }
    lines
}

/// Parse program text
pub fn parse_program(source: &str) -> Parsed {
    let lines = split_lines(source);
    let mut diagnostics = Vec::new();
    let stmts = parse_lines(&lines, &mut diagnostics);
    tracing::debug!(
        statements = stmts.len(),
        problems = diagnostics.len(),
        "parsed program"
    );
    Parsed {
        program: Program { stmts },
        diagnostics,
    }
}

/// Parse a sequence of lines into statements
pub fn parse_lines(lines: &[SourceLine], diagnostics: &mut Vec<Diagnostic>) -> Vec<Spanned<Stmt>> {
    let mut stmts = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = &lines[i];
        if line.is_skippable() {
            i += 1;
            continue;
        }

        if let Some(kind) = BlockKind::from_header(&line.text) {
            let block = match extract_block(lines, i, kind) {
                Ok(block) => block,
                Err(err) => {
                    diagnostics.push(Diagnostic::from_error(err).at_line(line));
                    break;
                }
            };
            i = block.end + 1;
            match parse_block(line, kind, block.body, block.else_body, diagnostics) {
                Ok(stmt) => stmts.push(Spanned::at(stmt, line)),
                Err(err) => diagnostics.push(Diagnostic::from_error(err).at_line(line)),
            }
            continue;
        }

        if is_any_terminator(&line.text) {
            // a terminator with no open block is ignored
            tracing::trace!(line = line.number, "stray terminator '{}'", line.text);
        } else if is_else(&line.text) {
            diagnostics.push(Diagnostic::from_error(ParseError::StrayElse).at_line(line));
        } else {
            match parse_command(line) {
                Ok(stmt) => stmts.push(Spanned::at(stmt, line)),
                Err(err) => diagnostics.push(Diagnostic::from_error(err).at_line(line)),
            }
        }
        i += 1;
    }

    stmts
}

fn parse_block(
    header: &SourceLine,
    kind: BlockKind,
    body: Vec<SourceLine>,
    else_body: Option<Vec<SourceLine>>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<Stmt, ParseError> {
    let rest = strip_keyword(&header.text, kind.keyword()).unwrap_or_default();

    match kind {
        BlockKind::While => {
            let cond = condition(rest, kind)?;
            Ok(Stmt::While {
                cond,
                body: parse_lines(&body, diagnostics),
            })
        }
        BlockKind::If => {
            let cond = condition(rest, kind)?;
            Ok(Stmt::If {
                cond,
                then_body: parse_lines(&body, diagnostics),
                else_body: else_body.map(|lines| parse_lines(&lines, diagnostics)),
            })
        }
        BlockKind::For => {
            let header = parse_for_header(rest)?;
            Ok(Stmt::For {
                header,
                body: parse_lines(&body, diagnostics),
            })
        }
        BlockKind::Method => {
            let mut def = parse_method_header(rest)?;
            def.body = parse_lines(&body, diagnostics);
            def.lines = body;
            Ok(Stmt::Method(def))
        }
    }
}

fn condition(rest: &str, kind: BlockKind) -> Result<String, ParseError> {
    if rest.is_empty() {
        Err(ParseError::MissingCondition { kind })
    } else {
        Ok(rest.to_string())
    }
}

/// Parse `<var> = <start> to <end> [step <n>]`, the text after `for`
pub fn parse_for_header(rest: &str) -> Result<ForHeader, ParseError> {
    let parts: Vec<&str> = rest
        .split(|c: char| c.is_whitespace() || c == '=')
        .filter(|p| !p.is_empty())
        .collect();

    let to = parts
        .iter()
        .position(|p| p.eq_ignore_ascii_case("to"))
        .ok_or_else(|| ParseError::MissingTo(rest.to_string()))?;
    if to < 2 || !is_identifier(parts[0]) {
        return Err(ParseError::malformed("for header", rest));
    }

    let step_at = parts[to + 1..]
        .iter()
        .position(|p| p.eq_ignore_ascii_case("step"))
        .map(|i| i + to + 1);
    let end = parts[to + 1..step_at.unwrap_or(parts.len())].join(" ");
    let step = step_at.map(|s| parts[s + 1..].join(" "));
    if end.is_empty() || step.as_deref() == Some("") {
        return Err(ParseError::malformed("for header", rest));
    }

    Ok(ForHeader {
        var: parts[0].to_string(),
        start: parts[1..to].join(" "),
        end,
        step,
    })
}

/// Parse `<type> <name> [<type> <param>[, ...]]`, the text after `method`.
///
/// The returned definition has an empty body.
pub fn parse_method_header(rest: &str) -> Result<MethodDef, ParseError> {
    let parts: Vec<&str> = rest
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .collect();

    let [return_kind, name, params @ ..] = parts.as_slice() else {
        return Err(ParseError::malformed("method header", rest));
    };
    if ElementKind::parse(return_kind).is_none() {
        return Err(ParseError::InvalidKind(return_kind.to_string()));
    }
    if !is_identifier(name) {
        return Err(ParseError::malformed("method header", rest));
    }

    Ok(MethodDef {
        name: name.to_string(),
        return_kind: return_kind.to_string(),
        params: params
            .iter()
            .filter(|p| ElementKind::parse(p).is_none())
            .map(|p| p.to_string())
            .collect(),
        lines: Vec::new(),
        body: Vec::new(),
    })
}

/// Classify a single non-block line
pub fn parse_command(line: &SourceLine) -> Result<Stmt, ParseError> {
    let text = line.text.as_str();

    if let Some(rest) = strip_keyword(text, "call") {
        let (name, args) = split_first_word(rest);
        if name.is_empty() {
            return Err(ParseError::malformed("call", text));
        }
        return Ok(Stmt::Call {
            name: name.to_string(),
            args: split_call_args(args),
        });
    }

    let command = if let Some(rest) = strip_keyword(text, "int") {
        let (name, init) = parse_declaration(rest, text)?;
        Command::DeclareInt { name, init }
    } else if let Some(rest) = strip_keyword(text, "real") {
        let (name, init) = parse_declaration(rest, text)?;
        Command::DeclareReal { name, init }
    } else if let Some(rest) = strip_keyword(text, "array") {
        parse_array(rest, text)?
    } else if let Some(rest) = strip_keyword(text, "peek") {
        parse_peek(rest, text)?
    } else if let Some(rest) = strip_keyword(text, "poke") {
        parse_poke(rest, text)?
    } else if let Some(rest) = strip_keyword(text, "write") {
        Command::Write {
            text: rest.to_string(),
        }
    } else if let Some((name, expr)) = text.split_once('=') {
        let name = name.trim();
        let expr = expr.trim();
        if !is_identifier(name) || expr.is_empty() {
            return Err(ParseError::malformed("assignment", text));
        }
        Command::Assign {
            name: name.to_string(),
            expr: expr.to_string(),
        }
    } else {
        let (word, args) = split_first_word(text);
        match DrawOp::from_word(word) {
            Some(op) => Command::Draw {
                op,
                args: args.to_string(),
            },
            None => Command::Unknown(text.to_string()),
        }
    };

    Ok(Stmt::Command(command))
}

fn split_first_word(text: &str) -> (&str, &str) {
    let text = text.trim();
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

/// `<name> [= <expr>]`
fn parse_declaration(rest: &str, text: &str) -> Result<(String, Option<String>), ParseError> {
    let (name, init) = match rest.split_once('=') {
        Some((name, init)) => (name.trim(), Some(init.trim())),
        None => (rest.trim(), None),
    };
    if !is_identifier(name) || init == Some("") {
        return Err(ParseError::malformed("declaration", text));
    }
    Ok((name.to_string(), init.map(str::to_string)))
}

/// `<int|real> <name> <size>`
fn parse_array(rest: &str, text: &str) -> Result<Command, ParseError> {
    let words: Vec<&str> = rest.split_whitespace().collect();
    let [kind, name, size @ ..] = words.as_slice() else {
        return Err(ParseError::malformed("array declaration", text));
    };
    if size.is_empty() || !is_identifier(name) {
        return Err(ParseError::malformed("array declaration", text));
    }
    Ok(Command::DeclareArray {
        kind: kind.to_string(),
        name: name.to_string(),
        size: size.join(" "),
    })
}

/// `<name>[<idx>]` or `<name> <idx>`
fn parse_element(target: &str) -> Option<(String, String)> {
    let target = target.trim();
    let (name, index) = match target.split_once('[') {
        Some((name, rest)) => (name.trim(), rest.trim().strip_suffix(']')?.trim()),
        None => split_first_word(target),
    };
    (is_identifier(name) && !index.is_empty()).then(|| (name.to_string(), index.to_string()))
}

/// `<array element> = <expr>`
fn parse_poke(rest: &str, text: &str) -> Result<Command, ParseError> {
    let malformed = || ParseError::malformed("poke", text);
    let (target, value) = rest.split_once('=').ok_or_else(malformed)?;
    let (array, index) = parse_element(target).ok_or_else(malformed)?;
    let value = value.trim();
    if value.is_empty() {
        return Err(malformed());
    }
    Ok(Command::Poke {
        array,
        index,
        value: value.to_string(),
    })
}

/// `<name> = <array element>`
fn parse_peek(rest: &str, text: &str) -> Result<Command, ParseError> {
    let malformed = || ParseError::malformed("peek", text);
    let (target, source) = rest.split_once('=').ok_or_else(malformed)?;
    let target = target.trim();
    if !is_identifier(target) {
        return Err(malformed());
    }
    let (array, index) = parse_element(source).ok_or_else(malformed)?;
    Ok(Command::Peek {
        target: target.to_string(),
        array,
        index,
    })
}
