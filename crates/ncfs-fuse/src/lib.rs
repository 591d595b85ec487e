//! FUSE adapter for NCFS.
//!
//! Translates inode-addressed kernel callbacks into path-addressed
//! [`NamespaceCore`](ncfs_namespace::NamespaceCore) calls.
//!
//! # Mounted Layout
//!
//! ```text
//! /mountpoint/
//! ├── temp/                 # one directory per variable
//! │   ├── units             # attribute: printable value + "\n"
//! │   ├── long_name
//! │   └── DATA_REPR         # payload as text or raw bytes
//! └── pressure/
//!     └── DATA_REPR
//! ```
//!
//! Reads are served from the dataset on every call. Writes are acknowledged
//! and discarded; every other mutation fails with `EROFS`.
//!
//! # Usage
//!
//! ```bash
//! ncfs mount data.nc /mnt/data -f
//! cat /mnt/data/temp/units
//! head /mnt/data/temp/DATA_REPR
//! ```
//!
//! ```rust,ignore
//! use ncfs_fuse::{NcFs, mount_options};
//!
//! let fs = NcFs::new(core);
//! fuser::mount2(fs, mountpoint, &mount_options("ncfs", false))?;
//! ```

pub mod filesystem;
pub mod inode;

use fuser::MountOption;

pub use filesystem::{FsStats, NcFs, make_attr};
pub use inode::{InodeEntry, InodeTable, ROOT_INO};

/// Options for `fuser::mount2`.
pub fn mount_options(fs_name: &str, allow_other: bool) -> Vec<MountOption> {
    let mut options = vec![
        MountOption::FSName(fs_name.to_string()),
        MountOption::Subtype("ncfs".to_string()),
        MountOption::AutoUnmount,
        MountOption::NoExec,
    ];
    if allow_other {
        options.push(MountOption::AllowOther);
    }
    options
}
