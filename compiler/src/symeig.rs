// symeig.rs — Symmetric eigendecomposition node
//
// `aten::symeig` takes one operand of shape `[..., M, M]` and produces two
// outputs: eigenvalues `[..., M]` and eigenvectors `[..., M, M]`. When
// eigenvectors are not requested the second output is an empty `[0]` array,
// so the node always has exactly two outputs.
//
// Preconditions: the operand is an array of rank >= 2.
// Postconditions: output shape is computed once, at construction.
// Failure modes: `InvalidShape` on construction, `Arity` on clone/lower.
// Side effects: none.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{IrError, ShapeViolation};
use crate::hash::{hash_hex, FingerprintHasher};
use crate::lowering::{
    LinalgBuilder, OpHandle, SELF_ADJOINT_EIG_EPSILON, SELF_ADJOINT_EIG_MAX_ITER,
};
use crate::node::{check_arity, Node, NodeInfo, NodePtr, Value};
use crate::op::OpKind;
use crate::shape::{Shape, TensorShape};

/// Number of outputs of every `SymEig` node: eigenvalues, eigenvectors.
pub const SYMEIG_NUM_OUTPUTS: usize = 2;

// ── Shape derivation ────────────────────────────────────────────────────────

/// Output shapes `(w, v)` for an eigendecomposition of `input`.
///
/// `w` drops the last dimension of `input`. `v` is `input` itself when
/// `eigenvectors` is set, otherwise a rank-1 `[0]` of the same element type.
/// The trailing dimensions are not checked for squareness here.
pub fn derive_shapes(
    input: &TensorShape,
    eigenvectors: bool,
) -> Result<(TensorShape, TensorShape), IrError> {
    let rank = input.rank();
    if rank < 2 {
        return Err(IrError::invalid_shape(
            input.clone(),
            ShapeViolation::RankBelowTwo { rank },
        ));
    }
    let mut w = input.clone();
    w.delete_dimension(rank - 1);
    let v = if eigenvectors {
        input.clone()
    } else {
        TensorShape::new(input.element_type, vec![0])
    };
    Ok((w, v))
}

/// Tuple output shape `(w, v)` for an operand of shape `input`.
pub fn output_shape(input: &Shape, eigenvectors: bool) -> Result<Shape, IrError> {
    let array = input
        .as_array()
        .ok_or_else(|| IrError::invalid_shape(input.clone(), ShapeViolation::NotAnArray))?;
    let (w, v) = derive_shapes(array, eigenvectors)?;
    Ok(Shape::tuple(vec![w.into(), v.into()]))
}

// ── Flags ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SymEigFlags {
    /// Materialize the eigenvector matrix.
    pub eigenvectors: bool,
    /// Read the lower triangle of the operand instead of the upper.
    pub lower: bool,
}

impl SymEigFlags {
    pub fn new(eigenvectors: bool, lower: bool) -> Self {
        Self {
            eigenvectors,
            lower,
        }
    }

    /// Structural hash of the flags alone.
    pub fn hash_seed(&self) -> u64 {
        FingerprintHasher::new()
            .with(&self.eigenvectors)
            .with(&self.lower)
            .finish()
    }
}

// ── Node ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymEig {
    info: NodeInfo,
    flags: SymEigFlags,
}

impl SymEig {
    pub fn new(input: Value, eigenvectors: bool, lower: bool) -> Result<Self, IrError> {
        Self::with_flags(input, SymEigFlags::new(eigenvectors, lower))
    }

    pub fn with_flags(input: Value, flags: SymEigFlags) -> Result<Self, IrError> {
        let shape = output_shape(input.shape(), flags.eigenvectors)?;
        Ok(Self {
            info: NodeInfo::new(
                OpKind::SymEig,
                vec![input],
                shape,
                SYMEIG_NUM_OUTPUTS,
                flags.hash_seed(),
            ),
            flags,
        })
    }

    pub fn flags(&self) -> SymEigFlags {
        self.flags
    }

    pub fn eigenvectors(&self) -> bool {
        self.flags.eigenvectors
    }

    /// Whether the lower triangle of the operand is authoritative.
    pub fn lower_triangle(&self) -> bool {
        self.flags.lower
    }

    pub fn input(&self) -> &Value {
        &self.info.operands()[0]
    }

    /// Shape of the eigenvalue output.
    pub fn eigenvalues_shape(&self) -> &Shape {
        self.tuple_output(0)
    }

    /// Shape of the eigenvector output (`[0]` when not requested).
    pub fn eigenvectors_shape(&self) -> &Shape {
        self.tuple_output(1)
    }

    fn tuple_output(&self, index: usize) -> &Shape {
        match self.info.shape() {
            Shape::Tuple(elems) => &elems[index],
            Shape::Array(_) => unreachable!("symeig output shape is always a pair"),
        }
    }
}

impl Node for SymEig {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn describe(&self) -> String {
        format!(
            "{}, eigenvectors={}, lower={}",
            self.info.describe(),
            u8::from(self.flags.eigenvectors),
            u8::from(self.flags.lower)
        )
    }

    fn clone_with(&self, operands: &[Value]) -> Result<NodePtr, IrError> {
        check_arity(OpKind::SymEig, 1, operands.len())?;
        Ok(Arc::new(SymEig::with_flags(operands[0].clone(), self.flags)?))
    }

    fn lower(
        &self,
        builder: &mut dyn LinalgBuilder,
        operands: &[OpHandle],
    ) -> Result<Vec<OpHandle>, IrError> {
        check_arity(OpKind::SymEig, 1, operands.len())?;
        let input = operands[0];
        let result = builder.self_adjoint_eig(
            input,
            self.flags.lower,
            SELF_ADJOINT_EIG_MAX_ITER,
            SELF_ADJOINT_EIG_EPSILON,
        )?;
        let v = if self.flags.eigenvectors {
            result.v
        } else {
            let element_type = match builder.shape_of(input)? {
                Shape::Array(a) => a.element_type,
                tuple @ Shape::Tuple(_) => {
                    return Err(IrError::invalid_shape(tuple, ShapeViolation::NotAnArray))
                }
            };
            builder.zeros(TensorShape::new(element_type, vec![0]))?
        };
        Ok(vec![result.w, v])
    }
}

// ── Report ──────────────────────────────────────────────────────────────────

/// Serializable summary of a `SymEig` node (`--emit json`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymEigReport {
    pub op: OpKind,
    pub input: Shape,
    #[serde(flatten)]
    pub flags: SymEigFlags,
    pub num_outputs: usize,
    pub outputs: SymEigOutputs,
    /// Node hash as 16 hex digits.
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymEigOutputs {
    pub eigenvalues: Shape,
    pub eigenvectors: Shape,
}

impl SymEig {
    pub fn report(&self) -> SymEigReport {
        SymEigReport {
            op: self.op(),
            input: self.input().shape().clone(),
            flags: self.flags,
            num_outputs: self.num_outputs(),
            outputs: SymEigOutputs {
                eigenvalues: self.eigenvalues_shape().clone(),
                eigenvectors: self.eigenvectors_shape().clone(),
            },
            hash: hash_hex(self.hash()),
        }
    }
}

impl fmt::Display for SymEig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeId;
    use crate::lowering::{InstructionKind, RecordingBuilder};
    use crate::shape::PrimitiveType;

    fn f32_shape(dims: &[u64]) -> TensorShape {
        TensorShape::new(PrimitiveType::F32, dims.to_vec())
    }

    fn input(dims: &[u64]) -> Value {
        Value::new(NodeId(0), 0, f32_shape(dims).into())
    }

    // ── derive_shapes ──

    #[test]
    fn batched_with_eigenvectors() {
        let (w, v) = derive_shapes(&f32_shape(&[4, 5, 5]), true).unwrap();
        assert_eq!(w, f32_shape(&[4, 5]));
        assert_eq!(v, f32_shape(&[4, 5, 5]));
    }

    #[test]
    fn batched_without_eigenvectors() {
        let (w, v) = derive_shapes(&f32_shape(&[4, 5, 5]), false).unwrap();
        assert_eq!(w, f32_shape(&[4, 5]));
        assert_eq!(v, f32_shape(&[0]));
    }

    #[test]
    fn placeholder_keeps_element_type() {
        let input = TensorShape::new(PrimitiveType::C128, vec![3, 3]);
        let (w, v) = derive_shapes(&input, false).unwrap();
        assert_eq!(w, TensorShape::new(PrimitiveType::C128, vec![3]));
        assert_eq!(v, TensorShape::new(PrimitiveType::C128, vec![0]));
    }

    #[test]
    fn rejects_rank_below_two() {
        for dims in [&[][..], &[5][..]] {
            let err = derive_shapes(&f32_shape(dims), true).unwrap_err();
            assert!(matches!(err, IrError::InvalidShape { .. }), "{:?}", err);
        }
        assert_eq!(
            derive_shapes(&f32_shape(&[5]), false)
                .unwrap_err()
                .to_string(),
            "invalid shape f32[5]: expected rank >= 2, got rank 1"
        );
    }

    #[test]
    fn non_square_is_accepted() {
        let (w, v) = derive_shapes(&f32_shape(&[3, 4]), true).unwrap();
        assert_eq!(w, f32_shape(&[3]));
        assert_eq!(v, f32_shape(&[3, 4]));
    }

    #[test]
    fn output_shape_rejects_tuple() {
        let tuple = Shape::tuple(vec![f32_shape(&[3, 3]).into()]);
        assert!(matches!(
            output_shape(&tuple, true),
            Err(IrError::InvalidShape { .. })
        ));
    }

    // ── node ──

    #[test]
    fn node_fields() {
        let node = SymEig::new(input(&[4, 5, 5]), true, false).unwrap();
        assert_eq!(node.op(), OpKind::SymEig);
        assert_eq!(node.num_outputs(), 2);
        assert_eq!(node.operands().len(), 1);
        assert_eq!(node.input(), &input(&[4, 5, 5]));
        assert_eq!(node.eigenvalues_shape(), &Shape::from(f32_shape(&[4, 5])));
        assert_eq!(
            node.eigenvectors_shape(),
            &Shape::from(f32_shape(&[4, 5, 5]))
        );
        assert!(node.eigenvectors());
        assert!(!node.lower_triangle());
    }

    #[test]
    fn construction_rejects_vector() {
        assert!(SymEig::new(input(&[7]), true, true).is_err());
    }

    #[test]
    fn describe_line() {
        let node = SymEig::new(input(&[4, 5, 5]), true, false).unwrap();
        assert_eq!(
            node.describe(),
            "(f32[4,5], f32[4,5,5]) aten::symeig, num_outputs=2, eigenvectors=1, lower=0"
        );
        let node = SymEig::new(input(&[4, 5, 5]), false, true).unwrap();
        assert!(node.to_string().contains("eigenvectors=0, lower=1"));
    }

    #[test]
    fn hash_follows_flags_only() {
        let a = SymEig::new(input(&[4, 5, 5]), true, false).unwrap();
        let b = SymEig::new(input(&[2, 2]), true, false).unwrap();
        let c = SymEig::new(input(&[4, 5, 5]), true, true).unwrap();
        let d = SymEig::new(input(&[4, 5, 5]), false, false).unwrap();
        assert_eq!(a.hash(), b.hash());
        assert_ne!(a.hash(), c.hash());
        assert_ne!(a.hash(), d.hash());
        assert_eq!(a.info().hash_seed(), a.flags().hash_seed());
    }

    #[test]
    fn clone_rederives_shapes() {
        let node = SymEig::new(input(&[4, 5, 5]), true, true).unwrap();
        let cloned = node.clone_with(&[input(&[3, 3])]).unwrap();
        assert_eq!(
            cloned.shape(),
            &Shape::tuple(vec![f32_shape(&[3]).into(), f32_shape(&[3, 3]).into()])
        );
        assert_eq!(cloned.hash(), node.hash());
        // original untouched
        assert_eq!(node.input(), &input(&[4, 5, 5]));
    }

    #[test]
    fn clone_arity() {
        let node = SymEig::new(input(&[3, 3]), false, false).unwrap();
        for operands in [Vec::new(), vec![input(&[3, 3]), input(&[3, 3])]] {
            let err = node.clone_with(&operands).unwrap_err();
            assert_eq!(
                err,
                IrError::Arity {
                    op: OpKind::SymEig,
                    expected: 1,
                    actual: operands.len()
                }
            );
        }
    }

    #[test]
    fn clone_propagates_shape_error() {
        let node = SymEig::new(input(&[3, 3]), false, false).unwrap();
        assert!(matches!(
            node.clone_with(&[input(&[3])]),
            Err(IrError::InvalidShape { .. })
        ));
    }

    #[test]
    fn report_json() {
        let node = SymEig::new(input(&[2, 2]), false, true).unwrap();
        let json = serde_json::to_value(node.report()).unwrap();
        assert_eq!(json["op"], "aten::symeig");
        assert_eq!(json["eigenvectors"], false);
        assert_eq!(json["lower"], true);
        assert_eq!(json["num_outputs"], 2);
        assert_eq!(json["input"]["dims"], serde_json::json!([2, 2]));
        assert_eq!(json["outputs"]["eigenvalues"]["dims"], serde_json::json!([2]));
        assert_eq!(json["outputs"]["eigenvectors"]["dims"], serde_json::json!([0]));
        assert_eq!(json["hash"].as_str().map(str::len), Some(16));
    }

    // ── lowering ──

    fn lower_on_parameter(node: &SymEig) -> (RecordingBuilder, Vec<OpHandle>) {
        let mut builder = RecordingBuilder::new();
        let p = builder.parameter(node.input().shape().clone()).unwrap();
        let outs = node.lower(&mut builder, &[p]).unwrap();
        (builder, outs)
    }

    #[test]
    fn lower_with_eigenvectors() {
        let node = SymEig::new(input(&[4, 5, 5]), true, true).unwrap();
        let (builder, outs) = lower_on_parameter(&node);
        assert_eq!(outs.len(), 2);
        assert_eq!(&builder.shape_of(outs[0]).unwrap(), node.eigenvalues_shape());
        assert_eq!(&builder.shape_of(outs[1]).unwrap(), node.eigenvectors_shape());
        assert_eq!(
            builder.instructions()[1].kind,
            InstructionKind::SelfAdjointEig {
                lower: true,
                max_iter: 100,
                epsilon: 1e-6
            }
        );
    }

    #[test]
    fn lower_without_eigenvectors_substitutes_zeros() {
        let node = SymEig::new(input(&[4, 5, 5]), false, false).unwrap();
        let (builder, outs) = lower_on_parameter(&node);
        assert_eq!(
            builder.shape_of(outs[1]).unwrap(),
            Shape::from(f32_shape(&[0]))
        );
        assert_eq!(
            builder.instruction(outs[1]).unwrap().kind,
            InstructionKind::Zeros
        );
        assert_eq!(
            builder.shape_of(outs[0]).unwrap(),
            Shape::from(f32_shape(&[4, 5]))
        );
    }

    #[test]
    fn lower_arity() {
        let node = SymEig::new(input(&[2, 2]), true, false).unwrap();
        let mut builder = RecordingBuilder::new();
        assert!(matches!(
            node.lower(&mut builder, &[]),
            Err(IrError::Arity { actual: 0, .. })
        ));
    }

    #[test]
    fn shared_across_threads() {
        let node: NodePtr = Arc::new(SymEig::new(input(&[4, 5, 5]), true, false).unwrap());
        let expected = node.describe();
        std::thread::scope(|s| {
            for _ in 0..4 {
                let node = Arc::clone(&node);
                let expected = expected.clone();
                s.spawn(move || {
                    assert_eq!(node.describe(), expected);
                    let cloned = node.clone_with(&[input(&[4, 5, 5])]).unwrap();
                    assert_eq!(cloned.hash(), node.hash());
                });
            }
        });
    }
}
