// op.rs — Operator kinds
//
// Closed enumeration of the operator kinds a graph node can carry. The
// qualified name (`<namespace>::<name>`) is what diagnostics print and what
// the kind's hash is computed from.

use std::fmt;

use serde::Serialize;

use crate::hash::FingerprintHasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum OpKind {
    /// Graph input backed by device memory.
    #[serde(rename = "xla::device_data")]
    DeviceData,
    /// Symmetric eigendecomposition.
    #[serde(rename = "aten::symeig")]
    SymEig,
}

impl OpKind {
    pub fn qualified_name(self) -> &'static str {
        match self {
            OpKind::DeviceData => "xla::device_data",
            OpKind::SymEig => "aten::symeig",
        }
    }

    pub fn hash(self) -> u64 {
        FingerprintHasher::new().with(self.qualified_name()).finish()
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualified_name())
    }
}
