// diag.rs — Unified diagnostics model
//
// Provides the shared diagnostic types reported by the shape front end,
// node construction, and lowering. `IrError::to_diagnostic` and
// `parser::ParseResult` both produce values of this type.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use crate::lexer::Span;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0001`, `E0101`).
///
/// Codes are `&'static str` constants defined in the `codes` module.
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    // E00xx: shape text
    pub const E0001: DiagCode = DiagCode("E0001"); // shape syntax error

    // E01xx: node construction and lowering
    pub const E0101: DiagCode = DiagCode("E0101"); // invalid operand shape
    pub const E0102: DiagCode = DiagCode("E0102"); // operand count mismatch
    pub const E0103: DiagCode = DiagCode("E0103"); // unknown builder handle
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A diagnostic emitted by any phase. `span` is set only for errors found
/// in shape text.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub span: Option<Span>,
    pub message: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic with no code, span, or hint.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            span: None,
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a stable diagnostic code.
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach the source location the diagnostic refers to.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = &self.code {
            write!(f, "error[{}]: {}", code, self.message)?;
        } else {
            write!(f, "error: {}", self.message)?;
        }
        if let Some(span) = &self.span {
            write!(f, " (at {}..{})", span.start, span.end)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}
