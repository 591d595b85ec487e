//! Stat synthesis.
//!
//! Every entry starts from the same baseline: a regular `rw-r--r--` file,
//! one link, the nominal 4096-byte size, the mount time for all three
//! timestamps and the owner of the mounting process. Directories are derived
//! from that baseline with [`make_into_dir`].

use std::time::SystemTime;

use ncfs_core::{AttributeRepresentation, DataRepresentation, Dataset, Error, Result};

use crate::resolver::PathRef;

/// Reported size of directories and blacklisted stubs.
pub const NOMINAL_DIR_SIZE: u64 = 4096;

/// Regular file, `rw-r--r--`.
pub const BASE_FILE_MODE: u32 = 0o100_644;

const S_IFREG: u32 = 0o100_000;
const S_IFDIR: u32 = 0o040_000;

/// Immutable facts captured once when the namespace is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountContext {
    pub mount_time: SystemTime,
    pub uid: u32,
    pub gid: u32,
}

impl MountContext {
    #[must_use]
    pub fn new(mount_time: SystemTime, uid: u32, gid: u32) -> Self {
        Self {
            mount_time,
            uid,
            gid,
        }
    }

    /// Capture the current time and the process owner.
    #[must_use]
    #[allow(unsafe_code)]
    pub fn capture() -> Self {
        // SAFETY: getuid() and getgid() are always safe to call
        let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };
        Self::new(SystemTime::now(), uid, gid)
    }
}

/// Synthesized metadata for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatRecord {
    pub is_dir: bool,
    pub size: u64,
    /// Full mode word, file type bits included
    pub mode: u32,
    pub nlink: u32,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    pub uid: u32,
    pub gid: u32,
}

impl StatRecord {
    /// The baseline record: a regular file of nominal size.
    #[must_use]
    pub fn baseline(ctx: &MountContext) -> Self {
        Self {
            is_dir: false,
            size: NOMINAL_DIR_SIZE,
            mode: BASE_FILE_MODE,
            nlink: 1,
            atime: ctx.mount_time,
            mtime: ctx.mount_time,
            ctime: ctx.mount_time,
            uid: ctx.uid,
            gid: ctx.gid,
        }
    }

    /// A regular file of `size` bytes.
    #[must_use]
    pub fn file(size: u64, ctx: &MountContext) -> Self {
        Self {
            size,
            ..Self::baseline(ctx)
        }
    }

    /// A directory of nominal size.
    #[must_use]
    pub fn directory(ctx: &MountContext) -> Self {
        let base = Self::baseline(ctx);
        Self {
            is_dir: true,
            mode: make_into_dir(base.mode),
            ..base
        }
    }

    /// Permission bits only.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn perm(&self) -> u16 {
        (self.mode & 0o7777) as u16
    }
}

/// Turn a regular-file mode word into a directory mode word.
///
/// The regular-file bit is toggled off, the directory bit set, and every
/// class (owner, group, other) with read permission gains execute
/// permission. Existing execute bits are left alone.
#[must_use]
pub fn make_into_dir(mode: u32) -> u32 {
    let mut mode = (mode ^ S_IFREG) | S_IFDIR;
    for (read, exec) in [(0o400, 0o100), (0o040, 0o010), (0o004, 0o001)] {
        if mode & read != 0 {
            mode |= exec;
        }
    }
    mode
}

/// Build the stat record for a classified path.
///
/// Directories and blacklisted stubs never touch the dataset. Files read
/// the payload or attribute to size it exactly.
pub fn synthesize(
    path: &PathRef,
    dataset: &dyn Dataset,
    data_repr: &dyn DataRepresentation,
    attr_repr: &dyn AttributeRepresentation,
    ctx: &MountContext,
) -> Result<StatRecord> {
    match path {
        PathRef::Root | PathRef::VariableDir(_) => Ok(StatRecord::directory(ctx)),
        PathRef::Blacklisted(_) => Ok(StatRecord::baseline(ctx)),
        PathRef::DataNode(variable) => {
            let data = dataset.values(variable)?;
            Ok(StatRecord::file(data_repr.size(&data), ctx))
        }
        PathRef::AttributeNode {
            variable,
            attribute,
        } => {
            let value = dataset.attribute(variable, attribute)?;
            Ok(StatRecord::file(attr_repr.size(&value), ctx))
        }
        PathRef::DimensionsNode(_) => Err(Error::NotFound(path.to_string())),
    }
}
