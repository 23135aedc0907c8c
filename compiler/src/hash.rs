// hash.rs — Structural hashing for IR nodes
//
// Node hashes are the first 8 bytes of a SHA-256 digest over a tagged byte
// encoding of the hashed values, so they are stable across runs and
// platforms. The graph framework combines a node's hash with its operands'
// identities; this module only hashes the values it is given.

use sha2::{Digest, Sha256};

use crate::shape::{PrimitiveType, Shape, TensorShape};

/// Values that can be fed into a `FingerprintHasher`.
pub trait Fingerprint {
    fn fingerprint(&self, hasher: &mut FingerprintHasher);
}

/// Incremental hasher producing a 64-bit structural hash.
#[derive(Default)]
pub struct FingerprintHasher {
    inner: Sha256,
}

impl FingerprintHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write<T: Fingerprint + ?Sized>(&mut self, value: &T) {
        value.fingerprint(self);
    }

    /// Builder-style `write`.
    pub fn with<T: Fingerprint + ?Sized>(mut self, value: &T) -> Self {
        self.write(value);
        self
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    pub fn finish(self) -> u64 {
        let digest = self.inner.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_be_bytes(head)
    }
}

/// Combine two hashes into one. Order matters.
pub fn hash_combine(a: u64, b: u64) -> u64 {
    FingerprintHasher::new().with(&a).with(&b).finish()
}

/// Render a hash as 16 lowercase hex digits.
pub fn hash_hex(hash: u64) -> String {
    format!("{:016x}", hash)
}

// Each impl writes a one-byte tag first so values of different types never
// collide on the same encoding.

impl Fingerprint for bool {
    fn fingerprint(&self, hasher: &mut FingerprintHasher) {
        hasher.write_bytes(&[b'b', u8::from(*self)]);
    }
}

impl Fingerprint for u64 {
    fn fingerprint(&self, hasher: &mut FingerprintHasher) {
        hasher.write_bytes(b"q");
        hasher.write_bytes(&self.to_be_bytes());
    }
}

impl Fingerprint for usize {
    fn fingerprint(&self, hasher: &mut FingerprintHasher) {
        (*self as u64).fingerprint(hasher);
    }
}

impl Fingerprint for str {
    fn fingerprint(&self, hasher: &mut FingerprintHasher) {
        hasher.write_bytes(b"s");
        hasher.write_bytes(&(self.len() as u64).to_be_bytes());
        hasher.write_bytes(self.as_bytes());
    }
}

impl Fingerprint for PrimitiveType {
    fn fingerprint(&self, hasher: &mut FingerprintHasher) {
        hasher.write_bytes(b"t");
        hasher.write(self.name());
    }
}

impl Fingerprint for TensorShape {
    fn fingerprint(&self, hasher: &mut FingerprintHasher) {
        hasher.write_bytes(b"a");
        hasher.write(&self.element_type);
        hasher.write(&self.dims.len());
        for d in &self.dims {
            hasher.write(d);
        }
    }
}

impl Fingerprint for Shape {
    fn fingerprint(&self, hasher: &mut FingerprintHasher) {
        match self {
            Shape::Array(a) => hasher.write(a),
            Shape::Tuple(elems) => {
                hasher.write_bytes(b"(");
                hasher.write(&elems.len());
                for e in elems {
                    hasher.write(e);
                }
            }
        }
    }
}
