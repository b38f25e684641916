use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::attributes::{convert_stat, convert_statvfs, file_kind};
use crate::config::LocalFsConfig;
use crate::core::{init_tree, InodeTable, NameLocks};
use crate::posix_fs;
use crate::types::*;
use crate::vfs_handler::VfsHandler;

/// Serve a directory of the local disk through stable inode numbers.
///
/// The tree under the root is numbered once at startup; afterwards every
/// entry created, moved or removed through this handler keeps the
/// [`InodeTable`] in sync. Entries that appear on disk behind its back get a
/// number the first time they are listed.
///
/// No descriptor outlives a call: `read`, `write` and truncation open the
/// file, use it, and close it before returning.
///
/// The following operations are not supported:
/// - link
/// - symlink
/// - commit
pub struct LocalFs {
    root: PathBuf,
    table: InodeTable,
    names: NameLocks,
    max_io_size: u32,
}

impl LocalFs {
    /// Create the configured exports and number the existing tree.
    pub fn new(config: LocalFsConfig) -> FsResult<Self> {
        let table = init_tree(&config.root, &config.exports)?;
        let root = table.root()?;
        Ok(Self {
            root,
            table,
            names: NameLocks::new(),
            max_io_size: config.max_io_size,
        })
    }

    /// Canonical path of the served root
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    pub fn table(&self) -> &InodeTable {
        &self.table
    }

    fn child_path(&self, parent: Inode, name: &OsStr) -> FsResult<PathBuf> {
        validate_name(name)?;
        Ok(self.table.resolve_path(parent)?.join(name))
    }

    fn stat_of(&self, ino: Inode, path: &Path) -> FsResult<Stat> {
        let statbuf = posix_fs::lstat(path).map_err(|e| FsError::from_io(e, path))?;
        Ok(convert_stat(ino, &statbuf))
    }

    fn kind_of(&self, path: &Path) -> FsResult<FileKind> {
        let statbuf = posix_fs::lstat(path).map_err(|e| FsError::from_io(e, path))?;
        Ok(file_kind(statbuf.st_mode))
    }
}

/// A child name must be a single, real path component.
fn validate_name(name: &OsStr) -> FsResult<()> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || name == "." || name == ".." || bytes.contains(&b'/') || bytes.contains(&0)
    {
        return Err(FsError::InvalidName(name.to_string_lossy().into_owned()));
    }
    Ok(())
}

impl VfsHandler for LocalFs {
    fn create(&self, parent: Inode, name: &OsStr, kind: FileKind, mode: u32) -> FsResult<Inode> {
        match kind {
            FileKind::RegularFile => {}
            FileKind::Directory => return self.mkdir(parent, name, mode),
            FileKind::Symlink => return Err(FsError::Unsupported("symlink")),
            FileKind::Other => return Err(FsError::Unsupported("special files")),
        }
        let path = self.child_path(parent, name)?;
        let _guard = self.names.lock(&path);
        posix_fs::create_exclusive(&path, mode).map_err(|e| FsError::from_io(e, &path))?;
        let ino = self.table.map_or_get(path);
        debug!("create(parent: {}, name: {:?}) -> {}", parent, name, ino);
        Ok(ino)
    }

    fn mkdir(&self, parent: Inode, name: &OsStr, mode: u32) -> FsResult<Inode> {
        let path = self.child_path(parent, name)?;
        let _guard = self.names.lock(&path);
        posix_fs::mkdir(&path, mode).map_err(|e| FsError::from_io(e, &path))?;
        let ino = self.table.map_or_get(path);
        debug!("mkdir(parent: {}, name: {:?}) -> {}", parent, name, ino);
        Ok(ino)
    }

    fn lookup(&self, parent: Inode, name: &OsStr) -> FsResult<Inode> {
        let parent_path = self.table.resolve_path(parent)?;
        if name == "." {
            return Ok(parent);
        }
        if name == ".." {
            return self.parent_of(parent);
        }
        validate_name(name)?;
        self.table.resolve_inode(&parent_path.join(name))
    }

    fn list(&self, dir: Inode) -> FsResult<Vec<DirEntry>> {
        let dir_path = self.table.resolve_path(dir)?;
        let names = posix_fs::readdir(&dir_path).map_err(|e| FsError::from_io(e, &dir_path))?;
        let entries = names
            .into_iter()
            .map(|name| -> FsResult<DirEntry> {
                let path = dir_path.join(&name);
                let _guard = self.names.lock(&path);
                let (ino, inserted) = self.table.map_or_insert(path.clone());
                match self.stat_of(ino, &path) {
                    Ok(stat) => Ok(DirEntry { name, ino, stat }),
                    Err(err) => {
                        // Removed or moved away since readdir saw it
                        if inserted && matches!(err, FsError::NotFound(_)) {
                            self.table.unmap_if(ino, &path);
                        }
                        Err(err)
                    }
                }
            })
            .collect::<FsResult<Vec<_>>>()?;
        debug!("list(dir: {}) -> {} entries", dir, entries.len());
        Ok(entries)
    }

    fn rename(
        &self,
        parent: Inode,
        name: &OsStr,
        new_parent: Inode,
        new_name: &OsStr,
    ) -> FsResult<()> {
        let old_path = self.child_path(parent, name)?;
        let new_path = self.child_path(new_parent, new_name)?;
        let _guard = self.names.lock_pair(&old_path, &new_path);
        let ino = self.table.resolve_inode(&old_path)?;
        let kind = self.kind_of(&old_path)?;

        posix_fs::rename(&old_path, &new_path, RenameFlags::NOREPLACE)
            .map_err(|e| FsError::from_io(e, (&old_path, &new_path)))?;

        let remapped = if kind == FileKind::Directory {
            match self.table.remap_tree(ino, &old_path, new_path.clone()) {
                Some(moved) => {
                    debug!("rename: {} and {} descendants moved", ino, moved);
                    true
                }
                None => false,
            }
        } else {
            self.table.remap_if(ino, &old_path, new_path.clone())
        };
        if !remapped {
            // A parent directory moved while this entry was renamed
            warn!(
                "{} left {:?} before it could be moved to {:?}",
                ino, old_path, new_path
            );
        }
        Ok(())
    }

    fn remove(&self, parent: Inode, name: &OsStr) -> FsResult<()> {
        let path = self.child_path(parent, name)?;
        let _guard = self.names.lock(&path);
        let ino = self.table.resolve_inode(&path)?;
        let result = match self.kind_of(&path)? {
            FileKind::Directory => posix_fs::rmdir(&path),
            _ => posix_fs::unlink(&path),
        };
        result.map_err(|e| FsError::from_io(e, &path))?;
        if !self.table.unmap_if(ino, &path) {
            // A parent directory moved while this entry was removed
            warn!("{} left {:?} before it could be retired", ino, path);
        }
        debug!("remove(parent: {}, name: {:?}) retired {}", parent, name, ino);
        Ok(())
    }

    fn read(&self, ino: Inode, offset: u64, count: u32) -> FsResult<Vec<u8>> {
        let path = self.table.resolve_path(ino)?;
        let fd = posix_fs::open(
            &path,
            OpenFlags::READ_ONLY | OpenFlags::DO_NOT_FOLLOW_SYMLINKS,
        )
        .map_err(|e| FsError::from_io(e, &path))?;
        let data = posix_fs::read(&fd, offset, count.min(self.max_io_size))
            .map_err(|e| FsError::from_io(e, &path))?;
        Ok(data)
    }

    fn write(&self, ino: Inode, offset: u64, data: &[u8]) -> FsResult<u32> {
        let path = self.table.resolve_path(ino)?;
        let fd = posix_fs::open(
            &path,
            OpenFlags::WRITE_ONLY | OpenFlags::DO_NOT_FOLLOW_SYMLINKS,
        )
        .map_err(|e| FsError::from_io(e, &path))?;
        let written = posix_fs::write(&fd, offset, data).map_err(|e| FsError::from_io(e, &path))?;
        Ok(written)
    }

    fn getattr(&self, ino: Inode) -> FsResult<Stat> {
        let path = self.table.resolve_path(ino)?;
        self.stat_of(ino, &path)
    }

    fn setattr(&self, ino: Inode, attrs: SetAttrRequest) -> FsResult<Stat> {
        if attrs.uid.is_some() || attrs.gid.is_some() {
            return Err(FsError::Unsupported("changing owner or group"));
        }
        if attrs.atime.is_some() {
            return Err(FsError::Unsupported("changing access time"));
        }
        let path = self.table.resolve_path(ino)?;
        debug!("setattr({}, {:?})", ino, attrs);

        // Reject everything that cannot be applied before changing anything
        if attrs.mode.is_some() || attrs.size.is_some() {
            match self.kind_of(&path)? {
                FileKind::RegularFile => {}
                FileKind::Directory if attrs.size.is_some() => {
                    return Err(FsError::IsADirectory(format!("{:?}", path)))
                }
                FileKind::Directory => {}
                // chmod follows symlinks, which could reach outside the root
                FileKind::Symlink if attrs.mode.is_some() => {
                    return Err(FsError::Unsupported("changing mode of a symlink"))
                }
                _ if attrs.size.is_some() => {
                    return Err(FsError::Unsupported("changing size of a non-regular file"))
                }
                _ => {}
            }
        }
        if let Some(mode) = attrs.mode {
            posix_fs::chmod(&path, mode & 0o7777).map_err(|e| FsError::from_io(e, &path))?;
        }
        if let Some(size) = attrs.size {
            posix_fs::truncate(&path, size).map_err(|e| FsError::from_io(e, &path))?;
        }
        // After truncation, which would bump the modification time again
        if let Some(mtime) = attrs.mtime {
            posix_fs::set_mtime(&path, mtime).map_err(|e| FsError::from_io(e, &path))?;
        }
        self.stat_of(ino, &path)
    }

    fn readlink(&self, ino: Inode) -> FsResult<PathBuf> {
        let path = self.table.resolve_path(ino)?;
        if self.kind_of(&path)? != FileKind::Symlink {
            return Err(FsError::not_found(&path));
        }
        posix_fs::readlink(&path).map_err(|e| FsError::from_io(e, &path))
    }

    fn parent_of(&self, ino: Inode) -> FsResult<Inode> {
        let path = self.table.resolve_path(ino)?;
        if ino.is_root() {
            return Ok(ino);
        }
        match path.parent() {
            Some(parent) => self.table.resolve_inode(parent),
            None => Err(FsError::not_found(&path)),
        }
    }

    fn inode_of(&self, handle: &[u8]) -> FsResult<Inode> {
        let ino = FileHandle::decode(handle)?;
        self.table.resolve_path(ino)?;
        Ok(ino)
    }

    fn fs_stat(&self) -> FsResult<FsStat> {
        let raw = posix_fs::statvfs(&self.root).map_err(|e| FsError::from_io(e, &self.root))?;
        Ok(convert_statvfs(&raw, self.table.len() as u64))
    }
}
