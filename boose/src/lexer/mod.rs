//! Expression lexer implementation using logos

mod token;

pub use token::Token;

use crate::ast::Span;
use crate::error::EvalError;
use logos::Logos;

/// Tokenize an expression
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>, EvalError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        match result {
            Ok(token) => tokens.push((token, span)),
            // integer literal too wide for i64
            Err(_) if is_digits(lexer.slice()) => {
                let value = lexer.slice().parse::<f64>().unwrap_or(f64::INFINITY);
                tokens.push((Token::RealLit(value), span));
            }
            Err(_) => {
                return Err(EvalError::UnexpectedCharacter {
                    text: source.to_string(),
                    offset: span.start,
                });
            }
        }
    }

    Ok(tokens)
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}
