//! FUSE filesystem implementation.

use std::ffi::{CString, OsStr};
use std::mem::MaybeUninit;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::time::{Duration, SystemTime};

use fuser::{
    FileAttr, FileType, Filesystem, KernelConfig, ReplyAttr, ReplyCreate, ReplyData,
    ReplyDirectory, ReplyEmpty, ReplyEntry, ReplyOpen, ReplyStatfs, ReplyWrite, ReplyXattr,
    Request, TimeOrNow,
};
use libc::{EINVAL, ENODATA, ENOENT, ENOTDIR, c_int};
use ncfs_core::{Error, ErrorKind};
use ncfs_namespace::{NamespaceCore, StatRecord};
use tracing::{debug, error, info, warn};

use crate::inode::{InodeTable, ROOT_INO, child_path};

const TTL: Duration = Duration::from_secs(1);
const BLOCK_SIZE: u64 = 512;

/// Directory entry as handed to `readdir`.
pub type DirEntry = (u64, FileType, String);

/// Filesystem totals reported by `statfs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsStats {
    pub blocks: u64,
    pub bfree: u64,
    pub bavail: u64,
    pub files: u64,
    pub ffree: u64,
    pub bsize: u32,
    pub namelen: u32,
    pub frsize: u32,
}

/// NCFS FUSE filesystem.
pub struct NcFs {
    /// Path-addressed namespace
    core: NamespaceCore,
    /// Inode table
    inodes: InodeTable,
}

impl NcFs {
    #[must_use]
    pub fn new(core: NamespaceCore) -> Self {
        Self {
            core,
            inodes: InodeTable::new(),
        }
    }

    /// The namespace being served.
    #[must_use]
    pub fn core(&self) -> &NamespaceCore {
        &self.core
    }

    fn path_of(&self, ino: u64) -> Result<String, c_int> {
        self.inodes
            .path(ino)
            .map(str::to_string)
            .ok_or(ENOENT)
    }

    /// Log a namespace failure and pick the errno to reply with.
    fn errno(op: &str, path: &str, err: &Error) -> c_int {
        match err.kind() {
            ErrorKind::InternalInconsistency => error!("{op}: {path}: {err}"),
            ErrorKind::NotFound => debug!("{op}: {path}: {err}"),
            _ => warn!("{op}: {path}: {err}"),
        }
        err.errno()
    }

    fn read_only(op: &'static str) -> c_int {
        let err = Error::ReadOnly(op);
        warn!("{err}");
        err.errno()
    }

    /// Resolve `name` inside `parent` and register it in the inode table.
    pub fn resolve(&mut self, parent: u64, name: &OsStr) -> Result<FileAttr, c_int> {
        let name = name.to_str().ok_or(ENOENT)?;
        let parent_path = self.path_of(parent)?;
        let path = child_path(&parent_path, name);

        let record = self
            .core
            .attributes_of(&path)
            .map_err(|e| Self::errno("lookup", &path, &e))?;
        let ino = self.inodes.get_or_create(parent, name).ok_or(ENOENT)?;
        self.inodes.lookup(ino);
        Ok(make_attr(ino, &record))
    }

    /// Attributes of a known inode.
    pub fn attr(&self, ino: u64) -> Result<FileAttr, c_int> {
        let path = self.path_of(ino)?;
        let record = self
            .core
            .attributes_of(&path)
            .map_err(|e| Self::errno("getattr", &path, &e))?;
        Ok(make_attr(ino, &record))
    }

    /// Entries of a directory inode, `.` and `..` included.
    pub fn dir_entries(&mut self, ino: u64) -> Result<Vec<DirEntry>, c_int> {
        let path = self.path_of(ino)?;
        let names = self
            .core
            .list(&path)
            .map_err(|e| Self::errno("readdir", &path, &e))?;
        let parent = self.inodes.parent(ino).unwrap_or(ROOT_INO);

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            let entry = match name.as_str() {
                "." => (ino, FileType::Directory, name),
                ".." => (parent, FileType::Directory, name),
                _ => {
                    let kind = if self.core.classify(&child_path(&path, &name)).is_dir() {
                        FileType::Directory
                    } else {
                        FileType::RegularFile
                    };
                    let Some(child) = self.inodes.get_or_create(ino, &name) else {
                        continue;
                    };
                    (child, kind, name)
                }
            };
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Bytes `[offset, offset + size)` of a file inode.
    pub fn read_bytes(&self, ino: u64, offset: i64, size: u32) -> Result<Vec<u8>, c_int> {
        let path = self.path_of(ino)?;
        let offset = u64::try_from(offset).map_err(|_| EINVAL)?;
        self.core
            .read(&path, offset, size as usize)
            .map_err(|e| Self::errno("read", &path, &e))
    }

    /// Totals of the filesystem holding the dataset file, zeros without one.
    pub fn stats(&self) -> FsStats {
        self.core
            .dataset()
            .source()
            .and_then(statvfs)
            .unwrap_or_default()
    }
}

/// Convert a synthesized stat record into a FUSE attribute.
#[allow(clippy::cast_possible_truncation)]
pub fn make_attr(ino: u64, record: &StatRecord) -> FileAttr {
    FileAttr {
        ino,
        size: record.size,
        blocks: record.size.div_ceil(BLOCK_SIZE),
        atime: record.atime,
        mtime: record.mtime,
        ctime: record.ctime,
        crtime: record.ctime,
        kind: if record.is_dir {
            FileType::Directory
        } else {
            FileType::RegularFile
        },
        perm: record.perm(),
        nlink: record.nlink,
        uid: record.uid,
        gid: record.gid,
        rdev: 0,
        blksize: BLOCK_SIZE as u32,
        flags: 0,
    }
}

#[allow(unsafe_code, clippy::useless_conversion)]
fn statvfs(path: &Path) -> Option<FsStats> {
    let c_path = CString::new(path.as_os_str().as_bytes()).ok()?;
    let mut raw = MaybeUninit::<libc::statvfs>::uninit();
    // SAFETY: c_path is NUL-terminated and raw points to writable storage
    // large enough for a statvfs struct
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), raw.as_mut_ptr()) };
    if rc != 0 {
        return None;
    }
    // SAFETY: statvfs returned success, so raw is initialized
    let raw = unsafe { raw.assume_init() };
    Some(FsStats {
        blocks: u64::from(raw.f_blocks),
        bfree: u64::from(raw.f_bfree),
        bavail: u64::from(raw.f_bavail),
        files: u64::from(raw.f_files),
        ffree: u64::from(raw.f_ffree),
        bsize: u32::try_from(raw.f_bsize).unwrap_or(u32::MAX),
        namelen: u32::try_from(raw.f_namemax).unwrap_or(u32::MAX),
        frsize: u32::try_from(raw.f_frsize).unwrap_or(u32::MAX),
    })
}

impl Filesystem for NcFs {
    fn init(&mut self, _req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), c_int> {
        info!(
            "FUSE init: {} variables, {} representation",
            self.core.dataset().variable_names().len(),
            self.core.data_repr_name()
        );
        Ok(())
    }

    fn destroy(&mut self) {
        info!("FUSE destroy");
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        debug!("lookup: parent={}, name={:?}", parent, name);
        match self.resolve(parent, name) {
            Ok(attr) => reply.entry(&TTL, &attr, 0),
            Err(errno) => reply.error(errno),
        }
    }

    fn forget(&mut self, _req: &Request<'_>, ino: u64, nlookup: u64) {
        debug!("forget: ino={}, nlookup={}", ino, nlookup);
        self.inodes.forget(ino, nlookup);
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        debug!("getattr: ino={}", ino);
        match self.attr(ino) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(errno) => reply.error(errno),
        }
    }

    fn setattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        _atime: Option<TimeOrNow>,
        _mtime: Option<TimeOrNow>,
        _ctime: Option<SystemTime>,
        _fh: Option<u64>,
        _crtime: Option<SystemTime>,
        _chgtime: Option<SystemTime>,
        _bkuptime: Option<SystemTime>,
        flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        debug!("setattr: ino={}, mode={:?}, size={:?}", ino, mode, size);

        if mode.is_some() || uid.is_some() || gid.is_some() || size.is_some() || flags.is_some() {
            reply.error(Self::read_only("setattr"));
            return;
        }

        // Timestamp-only updates (touch) succeed without changing anything
        match self.attr(ino) {
            Ok(attr) => reply.attr(&TTL, &attr),
            Err(errno) => reply.error(errno),
        }
    }

    fn mknod(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _rdev: u32,
        reply: ReplyEntry,
    ) {
        debug!("mknod: parent={}, name={:?}", parent, name);
        reply.error(Self::read_only("mknod"));
    }

    fn mkdir(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        reply: ReplyEntry,
    ) {
        debug!("mkdir: parent={}, name={:?}", parent, name);
        reply.error(Self::read_only("mkdir"));
    }

    fn unlink(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        debug!("unlink: parent={}, name={:?}", parent, name);
        reply.error(Self::read_only("unlink"));
    }

    fn rmdir(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        debug!("rmdir: parent={}, name={:?}", parent, name);
        reply.error(Self::read_only("rmdir"));
    }

    fn symlink(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        link_name: &OsStr,
        _target: &Path,
        reply: ReplyEntry,
    ) {
        debug!("symlink: parent={}, name={:?}", parent, link_name);
        reply.error(Self::read_only("symlink"));
    }

    fn rename(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        newparent: u64,
        newname: &OsStr,
        _flags: u32,
        reply: ReplyEmpty,
    ) {
        debug!(
            "rename: parent={}, name={:?}, newparent={}, newname={:?}",
            parent, name, newparent, newname
        );
        reply.error(Self::read_only("rename"));
    }

    fn link(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        newparent: u64,
        newname: &OsStr,
        reply: ReplyEntry,
    ) {
        debug!("link: ino={}, newparent={}, newname={:?}", ino, newparent, newname);
        reply.error(Self::read_only("link"));
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        debug!("open: ino={}, flags={}", ino, flags);
        let path = match self.path_of(ino) {
            Ok(path) => path,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };
        match self.core.open(&path) {
            Ok(()) => reply.opened(0, 0),
            Err(e) => reply.error(Self::errno("open", &path, &e)),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        debug!("read: ino={}, offset={}, size={}", ino, offset, size);
        match self.read_bytes(ino, offset, size) {
            Ok(bytes) => reply.data(&bytes),
            Err(errno) => reply.error(errno),
        }
    }

    fn write(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        data: &[u8],
        _write_flags: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyWrite,
    ) {
        debug!("write: ino={}, offset={}, len={}", ino, offset, data.len());
        let path = match self.path_of(ino) {
            Ok(path) => path,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };
        let offset = u64::try_from(offset).unwrap_or_default();
        match self.core.write(&path, data, offset) {
            Ok(outcome) => reply.written(u32::try_from(outcome.len()).unwrap_or(u32::MAX)),
            Err(e) => reply.error(Self::errno("write", &path, &e)),
        }
    }

    fn flush(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
        debug!("flush: ino={}", ino);
        reply.ok();
    }

    fn release(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        _flags: i32,
        _lock_owner: Option<u64>,
        _flush: bool,
        reply: ReplyEmpty,
    ) {
        debug!("release: ino={}", ino);
        if let Some(path) = self.inodes.path(ino) {
            self.core.close(path);
        }
        reply.ok();
    }

    fn opendir(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        debug!("opendir: ino={}, flags={}", ino, flags);
        match self.inodes.path(ino) {
            Some(path) if self.core.classify(path).is_dir() => reply.opened(0, 0),
            Some(_) => reply.error(ENOTDIR),
            None => reply.error(ENOENT),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        debug!("readdir: ino={}, offset={}", ino, offset);
        let entries = match self.dir_entries(ino) {
            Ok(entries) => entries,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };

        let skip = usize::try_from(offset).unwrap_or_default();
        for (i, (entry_ino, kind, name)) in entries.iter().enumerate().skip(skip) {
            let next = i64::try_from(i + 1).unwrap_or(i64::MAX);
            if reply.add(*entry_ino, next, *kind, name) {
                break;
            }
        }
        reply.ok();
    }

    fn releasedir(&mut self, _req: &Request<'_>, ino: u64, _fh: u64, _flags: i32, reply: ReplyEmpty) {
        debug!("releasedir: ino={}", ino);
        reply.ok();
    }

    fn statfs(&mut self, _req: &Request<'_>, ino: u64, reply: ReplyStatfs) {
        debug!("statfs: ino={}", ino);
        let s = self.stats();
        reply.statfs(
            s.blocks, s.bfree, s.bavail, s.files, s.ffree, s.bsize, s.namelen, s.frsize,
        );
    }

    fn setxattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        name: &OsStr,
        _value: &[u8],
        _flags: i32,
        _position: u32,
        reply: ReplyEmpty,
    ) {
        debug!("setxattr: ino={}, name={:?}", ino, name);
        reply.error(Self::read_only("setxattr"));
    }

    fn getxattr(&mut self, _req: &Request<'_>, ino: u64, name: &OsStr, size: u32, reply: ReplyXattr) {
        debug!("getxattr: ino={}, name={:?}, size={}", ino, name, size);
        reply.error(ENODATA);
    }

    fn listxattr(&mut self, _req: &Request<'_>, ino: u64, size: u32, reply: ReplyXattr) {
        debug!("listxattr: ino={}, size={}", ino, size);
        if size == 0 {
            reply.size(0);
        } else {
            reply.data(&[]);
        }
    }

    fn removexattr(&mut self, _req: &Request<'_>, ino: u64, name: &OsStr, reply: ReplyEmpty) {
        debug!("removexattr: ino={}, name={:?}", ino, name);
        reply.error(Self::read_only("removexattr"));
    }

    fn access(&mut self, _req: &Request<'_>, ino: u64, mask: i32, reply: ReplyEmpty) {
        debug!("access: ino={}, mask={}", ino, mask);
        let path = match self.path_of(ino) {
            Ok(path) => path,
            Err(errno) => {
                reply.error(errno);
                return;
            }
        };
        match self.core.access(&path, mask) {
            Ok(()) => reply.ok(),
            Err(e) => reply.error(Self::errno("access", &path, &e)),
        }
    }

    fn create(
        &mut self,
        _req: &Request<'_>,
        parent: u64,
        name: &OsStr,
        _mode: u32,
        _umask: u32,
        _flags: i32,
        reply: ReplyCreate,
    ) {
        debug!("create: parent={}, name={:?}", parent, name);
        reply.error(Self::read_only("create"));
    }
}
