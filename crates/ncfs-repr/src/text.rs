//! Flat text payload representation.

use ncfs_core::{ArrayData, DataRepresentation, ReprError};

use crate::format::NumericFormat;

/// Default numeric format for [`FlatTextRepr`].
pub const DEFAULT_FLOAT_FORMAT: &str = "%f";

/// Exposes a payload as text, one formatted element per line.
///
/// Multi-dimensional payloads are flattened in row-major order; every line,
/// including the last, ends with `\n`. An empty payload renders as an empty
/// file.
#[derive(Debug, Clone)]
pub struct FlatTextRepr {
    format: NumericFormat,
}

impl FlatTextRepr {
    /// Create a text representation using a printf-style format.
    pub fn new(format: &str) -> Result<Self, ReprError> {
        Ok(Self {
            format: NumericFormat::parse(format)?,
        })
    }

    /// Create a text representation from an already parsed format.
    #[must_use]
    pub fn with_format(format: NumericFormat) -> Self {
        Self { format }
    }

    /// The element format in use.
    #[must_use]
    pub fn format(&self) -> &NumericFormat {
        &self.format
    }
}

impl DataRepresentation for FlatTextRepr {
    fn name(&self) -> &str {
        "text"
    }

    fn encode(&self, data: &ArrayData) -> Vec<u8> {
        let mut out = String::new();
        for value in data.values().iter() {
            out.push_str(&self.format.format(value));
            out.push('\n');
        }
        out.into_bytes()
    }
}
