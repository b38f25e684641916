use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, warn};

use crate::types::*;

/// Bidirectional mapping between inode numbers and canonical paths.
///
/// Both directions live in sharded maps, so operations on unrelated keys do
/// not contend. Every mutation locks the forward shard first and the reverse
/// shard second; nothing in the crate takes them in the other order.
///
/// Corruption (a conflicting `map`, a mismatched `unmap`) panics: a table that
/// no longer is a bijection cannot be trusted to hand out handles. Callers
/// racing with other requests use [`unmap_if`](Self::unmap_if) and
/// [`remap_if`](Self::remap_if), which report a pair that has already moved on
/// instead.
pub struct InodeTable {
    forward: DashMap<Inode, PathBuf>,
    reverse: DashMap<PathBuf, Inode>,
    next_inode: AtomicU64,
}

/// Why a pair could not be inserted
enum MapConflict {
    /// The inode number already points at another path
    Inode(PathBuf),
    /// The path is already held by another inode number
    Path(Inode),
}

impl fmt::Display for MapConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapConflict::Inode(path) => write!(f, "number already maps to {:?}", path),
            MapConflict::Path(ino) => write!(f, "path already held by {}", ino),
        }
    }
}

impl InodeTable {
    /// Create a table whose only entry is the root, holding [`ROOT_INODE`].
    ///
    /// `root` must already be canonical.
    pub fn new(root: PathBuf) -> Self {
        let table = Self {
            forward: DashMap::new(),
            reverse: DashMap::new(),
            next_inode: AtomicU64::new(u64::from(ROOT_INODE) + 1),
        };
        table.map(ROOT_INODE, root);
        table
    }

    /// Next unused inode number. Numbers are never handed out twice.
    pub fn allocate(&self) -> Inode {
        Inode::from(self.next_inode.fetch_add(1, Ordering::SeqCst))
    }

    /// Insert both directions of `ino <-> path`.
    ///
    /// Panics if either side is already paired with something else.
    pub fn map(&self, ino: Inode, path: PathBuf) {
        if let Err(conflict) = self.try_map(ino, path.clone()) {
            panic!(
                "inode table corrupted: cannot map {} to {:?}: {}",
                ino, path, conflict
            );
        }
    }

    fn try_map(&self, ino: Inode, path: PathBuf) -> Result<(), MapConflict> {
        let forward = match self.forward.entry(ino) {
            Entry::Occupied(entry) if entry.get() == &path => {
                // Re-mapping an identical pair is a no-op as long as both sides agree
                return match self.reverse.get(&path).map(|other| *other) {
                    Some(other) if other == ino => Ok(()),
                    Some(other) => Err(MapConflict::Path(other)),
                    None => Err(MapConflict::Inode(path)),
                };
            }
            Entry::Occupied(entry) => return Err(MapConflict::Inode(entry.get().clone())),
            Entry::Vacant(entry) => entry,
        };
        match self.reverse.entry(path.clone()) {
            Entry::Occupied(entry) => Err(MapConflict::Path(*entry.get())),
            Entry::Vacant(entry) => {
                entry.insert(ino);
                forward.insert(path);
                Ok(())
            }
        }
    }

    /// Remove both directions of `ino <-> path`.
    ///
    /// Panics if the table does not hold exactly this pair.
    pub fn unmap(&self, ino: Inode, path: &Path) {
        if !self.unmap_if(ino, path) {
            panic!(
                "inode table corrupted: cannot unmap {} from {:?}: currently {:?}",
                ino,
                path,
                self.forward.get(&ino).map(|p| p.clone())
            );
        }
    }

    /// Remove `ino <-> path` if the table still holds exactly this pair.
    ///
    /// Returns `false`, changing nothing, when `ino` no longer maps to `path`.
    pub fn unmap_if(&self, ino: Inode, path: &Path) -> bool {
        let forward = match self.forward.entry(ino) {
            Entry::Occupied(entry) if entry.get() == path => entry,
            _ => return false,
        };
        match self.reverse.entry(path.to_path_buf()) {
            Entry::Occupied(entry) if *entry.get() == ino => {
                entry.remove();
                forward.remove();
                true
            }
            Entry::Occupied(entry) => panic!(
                "inode table corrupted: {} maps to {:?} but {:?} maps to {}",
                ino,
                path,
                path,
                entry.get()
            ),
            Entry::Vacant(_) => panic!(
                "inode table corrupted: {} maps to {:?} but the path is not mapped",
                ino, path
            ),
        }
    }

    /// Move `ino` from `old` to `new`, keeping the number.
    ///
    /// This is `unmap` followed by `map`: between the two steps neither path
    /// resolves. If `new` was lazily given a number in that window (a listing
    /// that saw the renamed entry first), that number is retired in favour of
    /// `ino`.
    pub fn remap(&self, ino: Inode, old: &Path, new: PathBuf) {
        if !self.remap_if(ino, old, new.clone()) {
            panic!(
                "inode table corrupted: cannot remap {} from {:?} to {:?}",
                ino, old, new
            );
        }
    }

    /// [`remap`](Self::remap), unless `ino` no longer maps to `old`.
    pub fn remap_if(&self, ino: Inode, old: &Path, new: PathBuf) -> bool {
        if !self.unmap_if(ino, old) {
            return false;
        }
        loop {
            match self.try_map(ino, new.clone()) {
                Ok(()) => return true,
                Err(MapConflict::Path(other)) => {
                    warn!(
                        "{:?} was mapped to {} while {} moved there, retiring {}",
                        new, other, ino, other
                    );
                    self.unmap_if(other, &new);
                }
                Err(conflict) => panic!(
                    "inode table corrupted: cannot remap {} to {:?}: {}",
                    ino, new, conflict
                ),
            }
        }
    }

    /// Remap `ino` from `old` to `new`, then every mapped entry below `old`.
    ///
    /// Returns how many descendants were re-keyed, or `None` if `ino` no
    /// longer maps to `old`. Descendants removed concurrently are skipped.
    pub fn remap_tree(&self, ino: Inode, old: &Path, new: PathBuf) -> Option<usize> {
        if !self.remap_if(ino, old, new.clone()) {
            return None;
        }
        let mut moved = 0;
        for (child, child_path) in self.descendants_of(old) {
            // strip_prefix cannot fail, descendants_of only returns paths below `old`
            if let Ok(relative) = child_path.strip_prefix(old) {
                if self.remap_if(child, &child_path, new.join(relative)) {
                    moved += 1;
                }
            }
        }
        Some(moved)
    }

    /// Every mapped entry strictly below `dir`
    pub fn descendants_of(&self, dir: &Path) -> Vec<(Inode, PathBuf)> {
        self.forward
            .iter()
            .filter(|entry| entry.value() != dir && entry.value().starts_with(dir))
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }

    /// Number already held by `path`, or a freshly allocated one.
    ///
    /// When two callers race on the same path, the first insertion wins and
    /// the loser's number is retired unused.
    pub fn map_or_get(&self, path: PathBuf) -> Inode {
        self.map_or_insert(path).0
    }

    /// Like [`map_or_get`](Self::map_or_get), also telling whether this call
    /// inserted the pair.
    pub fn map_or_insert(&self, path: PathBuf) -> (Inode, bool) {
        if let Some(ino) = self.reverse.get(&path) {
            return (*ino, false);
        }
        let ino = self.allocate();
        match self.try_map(ino, path.clone()) {
            Ok(()) => {
                debug!("mapped {} to {:?}", ino, path);
                (ino, true)
            }
            Err(MapConflict::Path(other)) => (other, false),
            Err(conflict) => panic!(
                "inode table corrupted: fresh {} already in use: {}",
                ino, conflict
            ),
        }
    }

    pub fn resolve_path(&self, ino: Inode) -> FsResult<PathBuf> {
        self.forward
            .get(&ino)
            .map(|path| path.clone())
            .ok_or_else(|| FsError::not_found(ino))
    }

    pub fn resolve_inode(&self, path: &Path) -> FsResult<Inode> {
        self.reverse
            .get(path)
            .map(|ino| *ino)
            .ok_or_else(|| FsError::not_found(path))
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.reverse.contains_key(path)
    }

    pub fn root(&self) -> FsResult<PathBuf> {
        self.resolve_path(ROOT_INODE)
    }

    /// Number of live mappings, root included
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}
