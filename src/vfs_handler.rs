use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use log::warn;

use crate::types::*;

/// Operations an upstream file server calls on a storage backend.
///
/// Every file is addressed by its [`Inode`], or by a parent inode and a child
/// name. Implementations are shared between request threads, hence the
/// `Send + Sync` bound.
///
/// All methods have a default body that logs the call and fails with
/// [`FsError::Unsupported`], so a backend only implements what it supports.
pub trait VfsHandler: Send + Sync + 'static {
    fn root_inode(&self) -> Inode {
        ROOT_INODE
    }

    /// Create an entry of `kind` named `name` inside `parent` and return its number.
    fn create(&self, parent: Inode, name: &OsStr, kind: FileKind, mode: u32) -> FsResult<Inode> {
        warn!(
            "[Not Implemented] create(parent: {}, name: {:?}, kind: {:?}, mode: {:o})",
            parent, name, kind, mode
        );
        Err(FsError::Unsupported("create"))
    }

    fn mkdir(&self, parent: Inode, name: &OsStr, mode: u32) -> FsResult<Inode> {
        warn!(
            "[Not Implemented] mkdir(parent: {}, name: {:?}, mode: {:o})",
            parent, name, mode
        );
        Err(FsError::Unsupported("mkdir"))
    }

    fn lookup(&self, parent: Inode, name: &OsStr) -> FsResult<Inode> {
        warn!("[Not Implemented] lookup(parent: {}, name: {:?})", parent, name);
        Err(FsError::Unsupported("lookup"))
    }

    /// All entries of a directory, or an error. Never a partial listing.
    fn list(&self, dir: Inode) -> FsResult<Vec<DirEntry>> {
        warn!("[Not Implemented] list(dir: {})", dir);
        Err(FsError::Unsupported("list"))
    }

    /// Move an entry, keeping its inode number.
    fn rename(
        &self,
        parent: Inode,
        name: &OsStr,
        new_parent: Inode,
        new_name: &OsStr,
    ) -> FsResult<()> {
        warn!(
            "[Not Implemented] rename(parent: {}, name: {:?}, new_parent: {}, new_name: {:?})",
            parent, name, new_parent, new_name
        );
        Err(FsError::Unsupported("rename"))
    }

    fn remove(&self, parent: Inode, name: &OsStr) -> FsResult<()> {
        warn!("[Not Implemented] remove(parent: {}, name: {:?})", parent, name);
        Err(FsError::Unsupported("remove"))
    }

    fn read(&self, ino: Inode, offset: u64, count: u32) -> FsResult<Vec<u8>> {
        warn!(
            "[Not Implemented] read(ino: {}, offset: {}, count: {})",
            ino, offset, count
        );
        Err(FsError::Unsupported("read"))
    }

    fn write(&self, ino: Inode, offset: u64, data: &[u8]) -> FsResult<u32> {
        warn!(
            "[Not Implemented] write(ino: {}, offset: {}, len: {})",
            ino,
            offset,
            data.len()
        );
        Err(FsError::Unsupported("write"))
    }

    fn getattr(&self, ino: Inode) -> FsResult<Stat> {
        warn!("[Not Implemented] getattr(ino: {})", ino);
        Err(FsError::Unsupported("getattr"))
    }

    fn setattr(&self, ino: Inode, attrs: SetAttrRequest) -> FsResult<Stat> {
        warn!("[Not Implemented] setattr(ino: {}, attrs: {:?})", ino, attrs);
        Err(FsError::Unsupported("setattr"))
    }

    fn readlink(&self, ino: Inode) -> FsResult<PathBuf> {
        warn!("[Not Implemented] readlink(ino: {})", ino);
        Err(FsError::Unsupported("readlink"))
    }

    fn link(&self, parent: Inode, target: Inode, name: &OsStr) -> FsResult<Inode> {
        warn!(
            "[Not Implemented] link(parent: {}, target: {}, name: {:?})",
            parent, target, name
        );
        Err(FsError::Unsupported("link"))
    }

    fn symlink(&self, parent: Inode, name: &OsStr, target: &Path, mode: u32) -> FsResult<Inode> {
        warn!(
            "[Not Implemented] symlink(parent: {}, name: {:?}, target: {:?}, mode: {:o})",
            parent, name, target, mode
        );
        Err(FsError::Unsupported("symlink"))
    }

    fn commit(&self, ino: Inode, offset: u64, count: u32) -> FsResult<()> {
        warn!(
            "[Not Implemented] commit(ino: {}, offset: {}, count: {})",
            ino, offset, count
        );
        Err(FsError::Unsupported("commit"))
    }

    /// Directory containing `ino`. The root is its own parent.
    fn parent_of(&self, ino: Inode) -> FsResult<Inode> {
        warn!("[Not Implemented] parent_of(ino: {})", ino);
        Err(FsError::Unsupported("parent_of"))
    }

    /// Resolve a handle previously produced by [`FileHandle::encode`].
    fn inode_of(&self, handle: &[u8]) -> FsResult<Inode> {
        warn!("[Not Implemented] inode_of(handle: {:?})", handle);
        Err(FsError::Unsupported("inode_of"))
    }

    fn fs_stat(&self) -> FsResult<FsStat> {
        warn!("[Not Implemented] fs_stat()");
        Err(FsError::Unsupported("fs_stat"))
    }
}
