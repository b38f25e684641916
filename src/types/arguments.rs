use std::ffi::OsString;
use std::time::SystemTime;

use super::inode::Inode;

/// Kind of a filesystem entry. Anything that is not a regular file, a
/// directory or a symlink (fifo, socket, device) is reported as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    RegularFile,
    Directory,
    Symlink,
    Other,
}

/// Protocol-neutral attributes of an entry
#[derive(Debug, Clone, PartialEq)]
pub struct Stat {
    pub ino: Inode,
    pub kind: FileKind,
    /// Type bit OR'd with the nine permission bits
    pub mode: u32,
    pub size: u64,
    pub blocks: u64,
    pub nlink: u64,
    pub uid: u32,
    pub gid: u32,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    pub crtime: SystemTime,
    /// Changes whenever the modification time changes
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOrNow {
    SpecificTime(SystemTime),
    Now,
}

/// Attribute changes requested through `setattr`.
///
/// Only `size`, `mtime` and `mode` are honored; `uid`, `gid` and `atime`
/// are rejected as unsupported.
#[derive(Debug, Default, Clone)]
pub struct SetAttrRequest {
    pub mode: Option<u32>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub size: Option<u64>,
    pub atime: Option<TimeOrNow>,
    pub mtime: Option<TimeOrNow>,
}

impl SetAttrRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn gid(mut self, gid: u32) -> Self {
        self.gid = Some(gid);
        self
    }

    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    pub fn atime(mut self, atime: TimeOrNow) -> Self {
        self.atime = Some(atime);
        self
    }

    pub fn mtime(mut self, mtime: TimeOrNow) -> Self {
        self.mtime = Some(mtime);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirEntry {
    pub name: OsString,
    pub ino: Inode,
    pub stat: Stat,
}

/// Space and file counters of the served tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsStat {
    pub total_bytes: u64,
    pub free_bytes: u64,
    pub available_bytes: u64,
    pub total_files: u64,
    pub free_files: u64,
    /// Number of entries currently holding an inode number
    pub used_files: u64,
}

/// Raw counters returned by `statvfs`, before translation into [`FsStat`]
#[derive(Debug, Clone)]
pub struct StatVfs {
    pub total_blocks: u64,        // Total number of blocks
    pub free_blocks: u64,         // Number of free blocks
    pub available_blocks: u64,    // Number of blocks available to non-root users
    pub total_files: u64,         // Total number of files
    pub free_files: u64,          // Number of free file nodes
    pub fragment_size: u64,       // Fragment size in bytes
}
