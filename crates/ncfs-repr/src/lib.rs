//! # ncfs-repr
//!
//! Representations that turn dataset content into file bytes.
//!
//! | Representation | Trait | Content |
//! |----------------|-------|---------|
//! | [`BinaryRepr`] | [`DataRepresentation`] | raw native-order element bytes |
//! | [`FlatTextRepr`] | [`DataRepresentation`] | one printf-formatted element per line |
//! | [`AttrTextRepr`] | [`AttributeRepresentation`] | printable value plus newline |
//!
//! Use [`DataReprKind::build`] to construct the payload representation
//! chosen at mount time.

pub mod attribute;
pub mod binary;
pub mod format;
pub mod text;

use std::fmt;
use std::str::FromStr;

use ncfs_core::{DataRepresentation, ReprError};
use tracing::debug;

pub use attribute::AttrTextRepr;
pub use binary::BinaryRepr;
pub use format::NumericFormat;
pub use text::{DEFAULT_FLOAT_FORMAT, FlatTextRepr};

/// Payload representations selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataReprKind {
    /// Raw bytes, see [`BinaryRepr`]
    Binary,
    /// Formatted text, see [`FlatTextRepr`]
    #[default]
    Text,
}

impl DataReprKind {
    /// Name used on the command line and in configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Text => "text",
        }
    }

    /// Build the representation. `float_format` only applies to text.
    pub fn build(self, float_format: &str) -> Result<Box<dyn DataRepresentation>, ReprError> {
        debug!("Building {self} representation (float format {float_format:?})");
        Ok(match self {
            Self::Binary => Box::new(BinaryRepr::new()),
            Self::Text => Box::new(FlatTextRepr::new(float_format)?),
        })
    }
}

impl FromStr for DataReprKind {
    type Err = ReprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "raw" => Ok(Self::Binary),
            "text" | "flat" => Ok(Self::Text),
            other => Err(ReprError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for DataReprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
