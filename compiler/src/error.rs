// error.rs — Errors raised by node construction, cloning, and lowering
//
// Every variant maps to a coded `Diagnostic` for display at the tool boundary.

use std::fmt;

use crate::diag::{codes, Diagnostic};
use crate::op::OpKind;
use crate::shape::{PrimitiveType, Shape};

/// Why an operand shape was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeViolation {
    NotAnArray,
    RankBelowTwo { rank: usize },
    NotSquare { rows: u64, cols: u64 },
    NotFloating { element_type: PrimitiveType },
    NoTupleElement { index: usize },
}

impl ShapeViolation {
    /// Remediation hint shown under the diagnostic, if one applies.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ShapeViolation::NotAnArray | ShapeViolation::RankBelowTwo { .. } => {
                Some("the operand must be a matrix or a batch of matrices, e.g. f32[4,5,5]")
            }
            ShapeViolation::NotSquare { .. } => {
                Some("the last two dimensions must be equal, e.g. f32[4,5,5]")
            }
            ShapeViolation::NotFloating { .. } => {
                Some("use a floating-point or complex element type, e.g. f32 or c64")
            }
            ShapeViolation::NoTupleElement { .. } => None,
        }
    }
}

impl fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeViolation::NotAnArray => write!(f, "expected an array, got a tuple"),
            ShapeViolation::RankBelowTwo { rank } => {
                write!(f, "expected rank >= 2, got rank {}", rank)
            }
            ShapeViolation::NotSquare { rows, cols } => {
                write!(f, "trailing dimensions must be square, got {}x{}", rows, cols)
            }
            ShapeViolation::NotFloating { element_type } => {
                write!(f, "expected a floating-point element type, got {}", element_type)
            }
            ShapeViolation::NoTupleElement { index } => write!(f, "no tuple element {}", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    /// An operand shape the operation is not defined on.
    InvalidShape {
        shape: Shape,
        violation: ShapeViolation,
    },
    /// Wrong number of operands supplied to `op`.
    Arity {
        op: OpKind,
        expected: usize,
        actual: usize,
    },
    /// A builder was asked about a handle it never produced.
    UnknownOp { handle: usize },
}

impl IrError {
    pub fn invalid_shape(shape: impl Into<Shape>, violation: ShapeViolation) -> Self {
        IrError::InvalidShape {
            shape: shape.into(),
            violation,
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            IrError::InvalidShape { violation, .. } => {
                let diag = Diagnostic::error(self.to_string()).with_code(codes::E0101);
                match violation.hint() {
                    Some(hint) => diag.with_hint(hint),
                    None => diag,
                }
            }
            IrError::Arity { .. } => Diagnostic::error(self.to_string()).with_code(codes::E0102),
            IrError::UnknownOp { .. } => Diagnostic::error(self.to_string()).with_code(codes::E0103),
        }
    }
}

impl fmt::Display for IrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrError::InvalidShape { shape, violation } => {
                write!(f, "invalid shape {}: {}", shape, violation)
            }
            IrError::Arity {
                op,
                expected,
                actual,
            } => write!(
                f,
                "{} expects {} operand{}, got {}",
                op,
                expected,
                if *expected == 1 { "" } else { "s" },
                actual
            ),
            IrError::UnknownOp { handle } => write!(f, "unknown op handle %{}", handle),
        }
    }
}

impl std::error::Error for IrError {}
