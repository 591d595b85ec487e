//! Attribute representation.

use ncfs_core::{AttrValue, AttributeRepresentation};

/// Exposes an attribute as its printable form followed by a newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttrTextRepr;

impl AttrTextRepr {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AttributeRepresentation for AttrTextRepr {
    fn name(&self) -> &str {
        "text"
    }

    fn encode(&self, value: &AttrValue) -> Vec<u8> {
        format!("{value}\n").into_bytes()
    }
}
