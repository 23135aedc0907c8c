// Parser for textual shapes.
//
// Grammar:
//   shape := array | tuple
//   array := TYPE '[' (INT (',' INT)*)? ']'
//   tuple := '(' (shape (',' shape)*)? ')'
//
// This is the inverse of `Shape`'s `Display` impl. Uses chumsky combinators.
//
// Preconditions: none.
// Postconditions: returns a shape plus any parse errors (non-fatal).
// Failure modes: syntax errors, unknown element types, and tuples nested past
// `MAX_TUPLE_DEPTH` produce `Rich` errors.
// Side effects: none.

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use chumsky::span::SimpleSpan;

use crate::diag::{codes, Diagnostic};
use crate::lexer::{Span, Token};
use crate::shape::{PrimitiveType, Shape};

/// Deepest tuple nesting accepted in shape text. The parser recurses once per
/// level, so deeper input is rejected before parsing starts.
pub const MAX_TUPLE_DEPTH: usize = 64;

/// Result of parsing: shape plus any errors.
#[derive(Debug)]
pub struct ParseResult {
    pub shape: Option<Shape>,
    pub errors: Vec<Rich<'static, Token, SimpleSpan>>,
}

impl ParseResult {
    /// Errors as coded diagnostics, in source order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut errors: Vec<&Rich<'static, Token, SimpleSpan>> = self.errors.iter().collect();
        errors.sort_by_key(|e| e.span().start());
        errors
            .into_iter()
            .map(|e| {
                let span = e.span();
                Diagnostic::error(e.to_string())
                    .with_code(codes::E0001)
                    .with_span(Span {
                        start: span.start(),
                        end: span.end(),
                    })
            })
            .collect()
    }

    /// The parsed shape if there were no errors, else the diagnostics.
    pub fn into_result(self) -> Result<Shape, Vec<Diagnostic>> {
        match self.shape {
            Some(shape) if self.errors.is_empty() => Ok(shape),
            _ => Err(self.diagnostics()),
        }
    }
}

/// Parse shape text. Lexes then parses.
pub fn parse_shape(source: &str) -> ParseResult {
    let lex_result = crate::lexer::lex(source);
    let len = source.len();

    // Merge lex errors + parse errors.
    let mut all_errors: Vec<Rich<'static, Token, SimpleSpan>> = lex_result
        .errors
        .into_iter()
        .map(|e| {
            let span: SimpleSpan = (e.span.start..e.span.end).into();
            Rich::custom(span, e.message)
        })
        .collect();

    if let Some(err) = check_nesting(&lex_result.tokens) {
        all_errors.push(err);
        return ParseResult {
            shape: None,
            errors: all_errors,
        };
    }

    // Convert lexer output to chumsky stream.
    let token_iter = lex_result.tokens.into_iter().map(|(tok, span)| {
        let cspan: SimpleSpan = (span.start..span.end).into();
        (tok, cspan)
    });
    let eoi: SimpleSpan = (len..len).into();
    let stream = Stream::from_iter(token_iter).map(eoi, |(t, s): (_, _)| (t, s));

    let parser = shape_parser(source);
    let (shape, parse_errors) = parser.parse(stream).into_output_errors();
    all_errors.extend(parse_errors.into_iter().map(|e| e.into_owned()));

    ParseResult {
        shape,
        errors: all_errors,
    }
}

/// Error at the first `(` that opens a tuple deeper than `MAX_TUPLE_DEPTH`.
fn check_nesting(tokens: &[(Token, Span)]) -> Option<Rich<'static, Token, SimpleSpan>> {
    let mut depth = 0usize;
    for (tok, span) in tokens {
        match tok {
            Token::LParen => {
                depth += 1;
                if depth > MAX_TUPLE_DEPTH {
                    let span: SimpleSpan = (span.start..span.end).into();
                    return Some(Rich::custom(
                        span,
                        format!("tuples nested deeper than {} levels", MAX_TUPLE_DEPTH),
                    ));
                }
            }
            Token::RParen => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

fn shape_parser<'tokens, 'src: 'tokens, I>(
    source: &'src str,
) -> impl Parser<'tokens, I, Shape, extra::Err<Rich<'tokens, Token, SimpleSpan>>> + 'src
where
    'tokens: 'src,
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    recursive(move |shape| {
        // ── Element type: identifier resolved against the known names ──

        let element_type = just(Token::Ident)
            .map_with(move |_, e| {
                let span: SimpleSpan = e.span();
                &source[span.start()..span.end()]
            })
            .try_map(|name: &str, span| {
                name.parse::<PrimitiveType>()
                    .map_err(|message| Rich::custom(span, message))
            });

        // ── Array: TYPE '[' dims ']' ──

        let dims = select! { Token::Int(n) => n }
            .separated_by(just(Token::Comma))
            .collect::<Vec<u64>>()
            .delimited_by(just(Token::LBracket), just(Token::RBracket));

        let array = element_type
            .then(dims)
            .map(|(element_type, dims)| Shape::array(element_type, dims));

        // ── Tuple: '(' shapes ')' ──

        let tuple = shape
            .separated_by(just(Token::Comma))
            .collect::<Vec<Shape>>()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(Shape::Tuple);

        array.or(tuple)
    })
}
