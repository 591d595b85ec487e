//! Core traits for NCFS components.
//!
//! - [`Dataset`]: Read access to variables, attributes and payloads
//! - [`DataRepresentation`]: Render a variable's payload as file content
//! - [`AttributeRepresentation`]: Render an attribute value as file content
//!
//! Representations are swapped at mount-configuration time without changing
//! the rest of the system.

use std::path::Path;

use crate::error::DatasetError;
use crate::types::{ArrayData, AttrValue};

// ============================================================================
// Dataset Access
// ============================================================================

/// Read-only access to a hierarchical numeric-array dataset.
///
/// Implementations must tolerate concurrent reads if the caller dispatches
/// from more than one thread.
pub trait Dataset: Send + Sync {
    /// File backing the dataset, if any. Used for access checks.
    fn source(&self) -> Option<&Path>;

    /// Variable names in dataset order.
    fn variable_names(&self) -> Vec<String>;

    /// Check whether a variable exists.
    fn has_variable(&self, name: &str) -> bool {
        self.variable_names().iter().any(|n| n == name)
    }

    /// Dimension lengths of a variable, outermost first.
    fn shape(&self, variable: &str) -> Result<Vec<usize>, DatasetError>;

    /// Attribute names of a variable in dataset order.
    fn attribute_names(&self, variable: &str) -> Result<Vec<String>, DatasetError>;

    /// Look up one attribute value by name.
    fn attribute(&self, variable: &str, name: &str) -> Result<AttrValue, DatasetError>;

    /// Read a variable's full payload.
    fn values(&self, variable: &str) -> Result<ArrayData, DatasetError>;
}

// ============================================================================
// Representations
// ============================================================================

/// Strategy turning a variable's payload into file bytes.
///
/// `size(data)` must equal `encode(data).len()` for every payload.
pub trait DataRepresentation: Send + Sync {
    /// Name of this representation.
    fn name(&self) -> &str;

    /// Materialize the full representation.
    fn encode(&self, data: &ArrayData) -> Vec<u8>;

    /// Exact byte length of the representation.
    fn size(&self, data: &ArrayData) -> u64 {
        self.encode(data).len() as u64
    }
}

/// Strategy turning an attribute value into file bytes.
///
/// `size(value)` must equal `encode(value).len()` for every value.
pub trait AttributeRepresentation: Send + Sync {
    /// Name of this representation.
    fn name(&self) -> &str;

    /// Materialize the full representation.
    fn encode(&self, value: &AttrValue) -> Vec<u8>;

    /// Exact byte length of the representation.
    fn size(&self, value: &AttrValue) -> u64 {
        self.encode(value).len() as u64
    }
}
