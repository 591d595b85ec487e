//! Inode management.
//!
//! The namespace is path addressed while FUSE is inode addressed. The table
//! hands out an inode number the first time a path is seen and keeps it for
//! the rest of the session.

use std::collections::HashMap;

/// Inode of the mount root, `/`.
pub const ROOT_INO: u64 = 1;

/// First inode handed out for paths below the root.
pub const FIRST_DYNAMIC_INO: u64 = 2;

/// Entry in the inode table.
#[derive(Debug, Clone)]
pub struct InodeEntry {
    /// Inode number
    pub ino: u64,
    /// Absolute namespace path
    pub path: String,
    /// Parent inode
    pub parent: u64,
    /// Lookup count (for FUSE reference counting)
    pub lookup_count: u64,
}

/// Bidirectional map between inode numbers and namespace paths.
pub struct InodeTable {
    /// Inode number -> entry
    inodes: HashMap<u64, InodeEntry>,
    /// Path -> inode
    path_to_ino: HashMap<String, u64>,
    /// Next available inode
    next_ino: u64,
}

impl InodeTable {
    /// Create a table holding only the root.
    #[must_use]
    pub fn new() -> Self {
        let mut table = Self {
            inodes: HashMap::new(),
            path_to_ino: HashMap::new(),
            next_ino: FIRST_DYNAMIC_INO,
        };
        table.inodes.insert(
            ROOT_INO,
            InodeEntry {
                ino: ROOT_INO,
                path: "/".to_string(),
                parent: ROOT_INO,
                lookup_count: 1,
            },
        );
        table.path_to_ino.insert("/".to_string(), ROOT_INO);
        table
    }

    /// Get an inode entry.
    pub fn get(&self, ino: u64) -> Option<&InodeEntry> {
        self.inodes.get(&ino)
    }

    /// Path of an inode.
    pub fn path(&self, ino: u64) -> Option<&str> {
        self.inodes.get(&ino).map(|e| e.path.as_str())
    }

    /// Parent inode of an inode.
    pub fn parent(&self, ino: u64) -> Option<u64> {
        self.inodes.get(&ino).map(|e| e.parent)
    }

    /// Get inode by path.
    pub fn get_by_path(&self, path: &str) -> Option<u64> {
        self.path_to_ino.get(path).copied()
    }

    /// Get or create the inode for `name` inside `parent`.
    ///
    /// Returns `None` if `parent` is unknown.
    pub fn get_or_create(&mut self, parent: u64, name: &str) -> Option<u64> {
        let path = child_path(self.path(parent)?, name);
        if let Some(&ino) = self.path_to_ino.get(&path) {
            return Some(ino);
        }

        let ino = self.next_ino;
        self.next_ino += 1;

        self.inodes.insert(
            ino,
            InodeEntry {
                ino,
                path: path.clone(),
                parent,
                lookup_count: 0,
            },
        );
        self.path_to_ino.insert(path, ino);

        Some(ino)
    }

    /// Increment lookup count.
    pub fn lookup(&mut self, ino: u64) {
        if let Some(entry) = self.inodes.get_mut(&ino) {
            entry.lookup_count += 1;
        }
    }

    /// Decrement lookup count. Entries stay allocated so inode numbers
    /// remain stable.
    pub fn forget(&mut self, ino: u64, nlookup: u64) {
        if let Some(entry) = self.inodes.get_mut(&ino) {
            entry.lookup_count = entry.lookup_count.saturating_sub(nlookup);
        }
    }

    /// Number of allocated inodes, root included.
    pub fn len(&self) -> usize {
        self.inodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inodes.is_empty()
    }
}

impl Default for InodeTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Join a directory path and an entry name.
pub fn child_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}
