//! Raw binary payload representation.

use ncfs_core::{ArrayData, DataRepresentation};

/// Exposes a payload as its raw in-memory bytes.
///
/// Elements appear in row-major order and native byte order with no
/// delimiters, so the file can be mapped straight back onto an array of the
/// variable's element type.
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryRepr;

impl BinaryRepr {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DataRepresentation for BinaryRepr {
    fn name(&self) -> &str {
        "binary"
    }

    fn encode(&self, data: &ArrayData) -> Vec<u8> {
        data.values().to_ne_bytes()
    }

    /// Computed from the element count, without materializing the bytes.
    fn size(&self, data: &ArrayData) -> u64 {
        data.byte_len() as u64
    }
}
