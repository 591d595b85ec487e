//! # ncfs-core
//!
//! Core types and traits for NCFS, a read-oriented filesystem view of
//! self-describing numeric-array datasets.
//!
//! A dataset is a collection of named multi-dimensional variables, each
//! carrying named attributes. NCFS presents every variable as a directory,
//! every attribute as a file, and the variable's payload as a synthetic
//! `DATA_REPR` file rendered by a pluggable representation.
//!
//! ## Architecture
//!
//! ```text
//! Dataset ──values()──▶ DataRepresentation ──▶ bytes ──▶ /<var>/DATA_REPR
//!         ──attribute()─▶ AttributeRepresentation ──▶ bytes ──▶ /<var>/<attr>
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ArrayData`] | A variable's payload: shape plus flat typed values |
//! | [`Values`] | Flat vector of one numeric element type |
//! | [`AttrValue`] | An attribute: text or a short numeric array |
//! | [`Error`] | Error taxonomy shared by every crate |
//!
//! ## Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`Dataset`] | Read variables, attributes and payloads |
//! | [`DataRepresentation`] | Render payloads as file content |
//! | [`AttributeRepresentation`] | Render attributes as file content |
//!
//! ## Related Crates
//!
//! - `ncfs-repr`: Representation implementations
//! - `ncfs-dataset`: In-memory and netCDF dataset access
//! - `ncfs-namespace`: Path resolution and the namespace engine
//! - `ncfs-fuse`: FUSE adapter

pub mod error;
pub mod traits;
pub mod types;

pub use error::{DatasetError, Error, ErrorKind, ReprError, Result};
pub use traits::*;
pub use types::*;
