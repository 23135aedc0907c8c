// symeig — symmetric eigendecomposition IR node
//
// Library root. Shape text front end (lexer, parser), shape and hashing
// primitives, the node interface, the `aten::symeig` node, and the builder
// boundary it lowers onto.

pub mod diag;
pub mod error;
pub mod hash;
pub mod id;
pub mod lexer;
pub mod lowering;
pub mod node;
pub mod op;
pub mod parser;
pub mod shape;
pub mod symeig;

pub use error::{IrError, ShapeViolation};
pub use node::{Node, NodePtr, Value};
pub use shape::{PrimitiveType, Shape, TensorShape};
pub use symeig::{derive_shapes, SymEig, SymEigFlags};
