// lowering.rs — Boundary to the linear-algebra builder
//
// `LinalgBuilder` is the interface nodes lower onto. The eigensolver behind
// `self_adjoint_eig` belongs to the builder's implementation; nodes only
// choose its arguments and wire its results.
//
// `RecordingBuilder` is a builder that computes nothing. It validates
// operands, assigns shapes, and keeps the instructions it was asked to
// build so lowering can be inspected (`--emit lowered`, tests).
//
// Preconditions: handles passed to a builder were produced by that builder.
// Postconditions: every handle a builder returns has a shape.
// Failure modes: invalid operand shapes, foreign handles.
// Side effects: none outside the builder.

use std::fmt;

use crate::error::{IrError, ShapeViolation};
use crate::shape::{Shape, TensorShape};

/// Iteration cap passed to the self-adjoint eigensolver.
pub const SELF_ADJOINT_EIG_MAX_ITER: u32 = 100;
/// Convergence tolerance passed to the self-adjoint eigensolver.
pub const SELF_ADJOINT_EIG_EPSILON: f32 = 1e-6;

/// Handle to a value inside a builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpHandle(pub usize);

impl fmt::Display for OpHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Results of a self-adjoint eigendecomposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelfAdjointEigResult {
    /// Eigenvectors, same shape as the input.
    pub v: OpHandle,
    /// Eigenvalues, input shape without its last dimension.
    pub w: OpHandle,
}

/// Primitive operations nodes lower onto.
pub trait LinalgBuilder {
    fn shape_of(&self, op: OpHandle) -> Result<Shape, IrError>;

    /// A graph input of the given shape.
    fn parameter(&mut self, shape: Shape) -> Result<OpHandle, IrError>;

    /// Eigendecomposition of the symmetric (Hermitian) matrices in `input`,
    /// reading only the lower triangle when `lower` is set, the upper
    /// otherwise.
    fn self_adjoint_eig(
        &mut self,
        input: OpHandle,
        lower: bool,
        max_iter: u32,
        epsilon: f32,
    ) -> Result<SelfAdjointEigResult, IrError>;

    /// A zero-filled array of `shape`.
    fn zeros(&mut self, shape: TensorShape) -> Result<OpHandle, IrError>;
}

// ── Recording builder ───────────────────────────────────────────────────────

/// Opcode plus attributes of one recorded instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionKind {
    Parameter {
        number: u32,
    },
    SelfAdjointEig {
        lower: bool,
        max_iter: u32,
        epsilon: f32,
    },
    GetTupleElement {
        index: usize,
    },
    Zeros,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub result: OpHandle,
    pub kind: InstructionKind,
    pub operands: Vec<OpHandle>,
    pub shape: Shape,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} ", self.result, self.shape)?;
        match &self.kind {
            InstructionKind::Parameter { number } => write!(f, "parameter({})", number),
            InstructionKind::SelfAdjointEig {
                lower,
                max_iter,
                epsilon,
            } => write!(
                f,
                "self_adjoint_eig({}), lower={}, max_iter={}, epsilon={:e}",
                join_handles(&self.operands),
                u8::from(*lower),
                max_iter,
                epsilon
            ),
            InstructionKind::GetTupleElement { index } => write!(
                f,
                "get_tuple_element({}), index={}",
                join_handles(&self.operands),
                index
            ),
            InstructionKind::Zeros => write!(f, "zeros()"),
        }
    }
}

fn join_handles(handles: &[OpHandle]) -> String {
    handles
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builder that records instructions instead of emitting them anywhere.
#[derive(Debug, Default)]
pub struct RecordingBuilder {
    instructions: Vec<Instruction>,
    next_parameter: u32,
}

impl RecordingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn instruction(&self, op: OpHandle) -> Option<&Instruction> {
        self.instructions.get(op.0)
    }

    fn push(&mut self, kind: InstructionKind, operands: Vec<OpHandle>, shape: Shape) -> OpHandle {
        let result = OpHandle(self.instructions.len());
        self.instructions.push(Instruction {
            result,
            kind,
            operands,
            shape,
        });
        result
    }

    fn get_tuple_element(&mut self, tuple: OpHandle, index: usize) -> Result<OpHandle, IrError> {
        let tuple_shape = self.shape_of(tuple)?;
        let shape = tuple_shape.tuple_element(index).cloned().ok_or_else(|| {
            IrError::invalid_shape(tuple_shape.clone(), ShapeViolation::NoTupleElement { index })
        })?;
        Ok(self.push(
            InstructionKind::GetTupleElement { index },
            vec![tuple],
            shape,
        ))
    }
}

/// Check that `shape` holds floating-point square matrices and return it.
fn eig_operand(shape: &Shape) -> Result<&TensorShape, IrError> {
    let array = shape
        .as_array()
        .ok_or_else(|| IrError::invalid_shape(shape.clone(), ShapeViolation::NotAnArray))?;
    let rank = array.rank();
    if rank < 2 {
        return Err(IrError::invalid_shape(
            array.clone(),
            ShapeViolation::RankBelowTwo { rank },
        ));
    }
    let (rows, cols) = (array.dims[rank - 2], array.dims[rank - 1]);
    if rows != cols {
        return Err(IrError::invalid_shape(
            array.clone(),
            ShapeViolation::NotSquare { rows, cols },
        ));
    }
    if !array.element_type.is_floating() {
        return Err(IrError::invalid_shape(
            array.clone(),
            ShapeViolation::NotFloating {
                element_type: array.element_type,
            },
        ));
    }
    Ok(array)
}

impl LinalgBuilder for RecordingBuilder {
    fn shape_of(&self, op: OpHandle) -> Result<Shape, IrError> {
        self.instruction(op)
            .map(|inst| inst.shape.clone())
            .ok_or(IrError::UnknownOp { handle: op.0 })
    }

    fn parameter(&mut self, shape: Shape) -> Result<OpHandle, IrError> {
        let number = self.next_parameter;
        self.next_parameter += 1;
        Ok(self.push(InstructionKind::Parameter { number }, Vec::new(), shape))
    }

    fn self_adjoint_eig(
        &mut self,
        input: OpHandle,
        lower: bool,
        max_iter: u32,
        epsilon: f32,
    ) -> Result<SelfAdjointEigResult, IrError> {
        let input_shape = self.shape_of(input)?;
        let v_shape = eig_operand(&input_shape)?.clone();
        let mut w_shape = v_shape.clone();
        w_shape.delete_dimension(w_shape.rank() - 1);

        let tuple = self.push(
            InstructionKind::SelfAdjointEig {
                lower,
                max_iter,
                epsilon,
            },
            vec![input],
            Shape::tuple(vec![v_shape.into(), w_shape.into()]),
        );
        let v = self.get_tuple_element(tuple, 0)?;
        let w = self.get_tuple_element(tuple, 1)?;
        Ok(SelfAdjointEigResult { v, w })
    }

    fn zeros(&mut self, shape: TensorShape) -> Result<OpHandle, IrError> {
        Ok(self.push(InstructionKind::Zeros, Vec::new(), shape.into()))
    }
}

impl fmt::Display for RecordingBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inst in &self.instructions {
            writeln!(f, "{}", inst)?;
        }
        Ok(())
    }
}
