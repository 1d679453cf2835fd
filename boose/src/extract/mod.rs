//! Block extraction
//!
//! Locates the line that closes a `while`, `for`, `if` or `method` header and
//! collects the lines in between. Only `if` blocks track nesting: inner `if`
//! headers and their `end if` lines are kept in the body, and an `else` seen
//! at depth zero starts the else-body. Loops and methods close at the first
//! terminator of their kind, so a `while` directly inside a `while` is not
//! supported; its body ends at the inner `end while`.
//!
//! Blank lines and comments never become part of a body.

use crate::ast::{BlockKind, SourceLine, is_else};
use crate::error::ParseError;

/// Lines of one extracted block
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub body: Vec<SourceLine>,
    /// Lines after a depth-zero `else`; only `if` blocks have one
    pub else_body: Option<Vec<SourceLine>>,
    /// Index of the terminator line in the input
    pub end: usize,
}

/// Extract the block whose header is `lines[start]`
pub fn extract_block(lines: &[SourceLine], start: usize, kind: BlockKind) -> Result<Block, ParseError> {
    let mut body = Vec::new();
    let mut else_body: Option<Vec<SourceLine>> = None;
    let mut depth = 0usize;

    for (index, line) in lines.iter().enumerate().skip(start + 1) {
        if line.is_skippable() {
            continue;
        }
        let text = line.text.as_str();

        if kind == BlockKind::If {
            if BlockKind::from_header(text) == Some(BlockKind::If) {
                depth += 1;
            } else if BlockKind::If.is_terminator(text) {
                if depth == 0 {
                    return Ok(Block { body, else_body, end: index });
                }
                depth -= 1;
            } else if depth == 0 && else_body.is_none() && is_else(text) {
                else_body = Some(Vec::new());
                continue;
            }
        } else if kind.is_terminator(text) {
            return Ok(Block { body, else_body, end: index });
        }

        match else_body.as_mut() {
            Some(lines) => lines.push(line.clone()),
            None => body.push(line.clone()),
        }
    }

    Err(ParseError::MissingTerminator { kind })
}
