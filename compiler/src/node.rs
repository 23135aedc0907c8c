// node.rs — Graph node interface shared by all operator variants
//
// A node is immutable once built: operand references, output shape, output
// count, and structural hash are fixed at construction. Rewrites produce new
// nodes through `Node::clone_with` instead of mutating existing ones.
//
// Preconditions: operand `Value`s refer to nodes owned by the caller's graph.
// Postconditions: `NodeInfo::hash` depends only on the op kind and hash seed.
// Failure modes: variant constructors reject operands they are not defined on.
// Side effects: none.

use std::fmt;
use std::sync::Arc;

use crate::error::IrError;
use crate::hash::{hash_combine, FingerprintHasher};
use crate::id::NodeId;
use crate::lowering::{LinalgBuilder, OpHandle};
use crate::op::OpKind;
use crate::shape::Shape;

/// Shared handle to an immutable node.
pub type NodePtr = Arc<dyn Node>;

// ── Operand reference ───────────────────────────────────────────────────────

/// Non-owning reference to output `index` of node `node`.
///
/// Carries the referenced output's shape so consumers can derive their own
/// shapes without reaching back into the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Value {
    pub node: NodeId,
    pub index: usize,
    shape: Shape,
}

impl Value {
    pub fn new(node: NodeId, index: usize, shape: Shape) -> Self {
        Self { node, index, shape }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.index)
    }
}

// ── Shared node fields ──────────────────────────────────────────────────────

/// Fields every node variant carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    op: OpKind,
    operands: Vec<Value>,
    shape: Shape,
    num_outputs: usize,
    hash_seed: u64,
    node_hash: u64,
}

impl NodeInfo {
    pub fn new(
        op: OpKind,
        operands: Vec<Value>,
        shape: Shape,
        num_outputs: usize,
        hash_seed: u64,
    ) -> Self {
        Self {
            op,
            operands,
            shape,
            num_outputs,
            hash_seed,
            node_hash: hash_combine(op.hash(), hash_seed),
        }
    }

    pub fn op(&self) -> OpKind {
        self.op
    }

    pub fn operands(&self) -> &[Value] {
        &self.operands
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Hash of the variant's own parameters, without the op kind.
    pub fn hash_seed(&self) -> u64 {
        self.hash_seed
    }

    /// `hash_seed` combined with the op kind's hash.
    pub fn hash(&self) -> u64 {
        self.node_hash
    }

    /// Base description: `<shape> <op>[, num_outputs=<n>]`.
    pub fn describe(&self) -> String {
        if self.num_outputs > 1 {
            format!(
                "{} {}, num_outputs={}",
                self.shape, self.op, self.num_outputs
            )
        } else {
            format!("{} {}", self.shape, self.op)
        }
    }
}

// ── Node trait ──────────────────────────────────────────────────────────────

/// Interface every operator variant implements.
pub trait Node: fmt::Debug + Send + Sync {
    fn info(&self) -> &NodeInfo;

    fn op(&self) -> OpKind {
        self.info().op()
    }

    fn operands(&self) -> &[Value] {
        self.info().operands()
    }

    fn shape(&self) -> &Shape {
        self.info().shape()
    }

    fn num_outputs(&self) -> usize {
        self.info().num_outputs()
    }

    fn hash(&self) -> u64 {
        self.info().hash()
    }

    /// One-line diagnostic summary. Variants with parameters append them to
    /// the base description.
    fn describe(&self) -> String {
        self.info().describe()
    }

    /// A new node of the same variant and parameters over `operands`.
    fn clone_with(&self, operands: &[Value]) -> Result<NodePtr, IrError>;

    /// Emit this node through `builder`. `operands` are the builder handles
    /// for `self.operands()`, in order. Returns one handle per output.
    fn lower(
        &self,
        builder: &mut dyn LinalgBuilder,
        operands: &[OpHandle],
    ) -> Result<Vec<OpHandle>, IrError>;
}

impl fmt::Display for dyn Node + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Fail with `IrError::Arity` unless `actual == expected`.
pub(crate) fn check_arity(op: OpKind, expected: usize, actual: usize) -> Result<(), IrError> {
    if actual == expected {
        Ok(())
    } else {
        Err(IrError::Arity {
            op,
            expected,
            actual,
        })
    }
}

// ── Device data ─────────────────────────────────────────────────────────────

/// Leaf node standing for a graph input already resident on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceData {
    info: NodeInfo,
}

impl DeviceData {
    pub fn new(shape: Shape) -> Self {
        let seed = FingerprintHasher::new().with(&shape).finish();
        Self {
            info: NodeInfo::new(OpKind::DeviceData, Vec::new(), shape, 1, seed),
        }
    }

    /// Reference to this node's single output, given the id the graph
    /// assigned to it.
    pub fn output(&self, id: NodeId) -> Value {
        Value::new(id, 0, self.info.shape().clone())
    }
}

impl Node for DeviceData {
    fn info(&self) -> &NodeInfo {
        &self.info
    }

    fn clone_with(&self, operands: &[Value]) -> Result<NodePtr, IrError> {
        check_arity(OpKind::DeviceData, 0, operands.len())?;
        Ok(Arc::new(self.clone()))
    }

    fn lower(
        &self,
        builder: &mut dyn LinalgBuilder,
        operands: &[OpHandle],
    ) -> Result<Vec<OpHandle>, IrError> {
        check_arity(OpKind::DeviceData, 0, operands.len())?;
        Ok(vec![builder.parameter(self.info.shape().clone())?])
    }
}
