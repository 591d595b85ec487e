//! # ncfs-namespace
//!
//! Maps filesystem paths onto a dataset.
//!
//! ```text
//! /                       directory: one entry per variable
//! /<variable>/            directory: attributes plus DATA_REPR
//! /<variable>/<attribute> file: printable value + "\n"
//! /<variable>/DATA_REPR   file: the payload representation
//! /<variable>/dimensions  recognized, never served
//! *.Trash*                stub file, dataset never consulted
//! ```
//!
//! - [`resolver`]: pure path classification into [`PathRef`]
//! - [`metadata`]: [`StatRecord`] synthesis and [`make_into_dir`]
//! - [`listing`]: directory entries
//! - [`namespace`]: [`NamespaceCore`], the operations a filesystem adapter
//!   forwards to
//!
//! Nothing here is FUSE specific; see `ncfs-fuse` for the adapter.

pub mod listing;
pub mod metadata;
pub mod namespace;
pub mod resolver;

pub use listing::{list_root, list_variable};
pub use metadata::{
    BASE_FILE_MODE, MountContext, NOMINAL_DIR_SIZE, StatRecord, make_into_dir, synthesize,
};
pub use namespace::{NamespaceCore, WriteOutcome, window};
pub use resolver::{DATA_REPR, DIMENSIONS, PathRef, TRASH_MARKER, classify};
