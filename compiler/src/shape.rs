// shape.rs — Tensor shapes and element types
//
// Array shapes are an element type plus an ordered list of dimension sizes.
// Tuple shapes group several shapes into one value (multi-output nodes).
//
// Preconditions: none (value types only).
// Postconditions: `Display` output parses back through `parser::parse_shape`.
// Failure modes: `PrimitiveType::from_str` rejects unknown type names.
// Side effects: none.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

// ── Element types ───────────────────────────────────────────────────────────

/// Element type tag of an array shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    Pred,
    S8,
    S16,
    S32,
    S64,
    U8,
    U16,
    U32,
    U64,
    F16,
    Bf16,
    F32,
    F64,
    C64,
    C128,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 15] = [
        PrimitiveType::Pred,
        PrimitiveType::S8,
        PrimitiveType::S16,
        PrimitiveType::S32,
        PrimitiveType::S64,
        PrimitiveType::U8,
        PrimitiveType::U16,
        PrimitiveType::U32,
        PrimitiveType::U64,
        PrimitiveType::F16,
        PrimitiveType::Bf16,
        PrimitiveType::F32,
        PrimitiveType::F64,
        PrimitiveType::C64,
        PrimitiveType::C128,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Pred => "pred",
            PrimitiveType::S8 => "s8",
            PrimitiveType::S16 => "s16",
            PrimitiveType::S32 => "s32",
            PrimitiveType::S64 => "s64",
            PrimitiveType::U8 => "u8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::F16 => "f16",
            PrimitiveType::Bf16 => "bf16",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::C64 => "c64",
            PrimitiveType::C128 => "c128",
        }
    }

    /// Real or complex floating point.
    pub fn is_floating(self) -> bool {
        matches!(
            self,
            PrimitiveType::F16
                | PrimitiveType::Bf16
                | PrimitiveType::F32
                | PrimitiveType::F64
                | PrimitiveType::C64
                | PrimitiveType::C128
        )
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PrimitiveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrimitiveType::ALL
            .iter()
            .copied()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| format!("unknown element type `{}`", s))
    }
}

// ── Array shape ─────────────────────────────────────────────────────────────

/// An array shape: element type plus dimension sizes, major to minor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TensorShape {
    pub element_type: PrimitiveType,
    pub dims: Vec<u64>,
}

impl TensorShape {
    pub fn new(element_type: PrimitiveType, dims: Vec<u64>) -> Self {
        Self { element_type, dims }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Remove dimension `index`. Panics if `index >= rank()`.
    pub fn delete_dimension(&mut self, index: usize) {
        self.dims.remove(index);
    }
}

impl fmt::Display for TensorShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[", self.element_type)?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

// ── Shape ───────────────────────────────────────────────────────────────────

/// Shape of a node output: a single array or a tuple of shapes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Shape {
    Array(TensorShape),
    Tuple(Vec<Shape>),
}

impl Shape {
    pub fn array(element_type: PrimitiveType, dims: Vec<u64>) -> Self {
        Shape::Array(TensorShape::new(element_type, dims))
    }

    pub fn tuple(elements: Vec<Shape>) -> Self {
        Shape::Tuple(elements)
    }

    pub fn as_array(&self) -> Option<&TensorShape> {
        match self {
            Shape::Array(a) => Some(a),
            Shape::Tuple(_) => None,
        }
    }

    /// Element `index` of a tuple shape.
    pub fn tuple_element(&self, index: usize) -> Option<&Shape> {
        match self {
            Shape::Tuple(elems) => elems.get(index),
            Shape::Array(_) => None,
        }
    }
}

impl From<TensorShape> for Shape {
    fn from(shape: TensorShape) -> Self {
        Shape::Array(shape)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Array(a) => write!(f, "{}", a),
            Shape::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
        }
    }
}
