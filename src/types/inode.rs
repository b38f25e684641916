/// Represents an inode number handed out to the upstream server.
///
/// Inode numbers are the only identity the upstream layer ever sees: they are
/// allocated by the [`InodeTable`](crate::InodeTable), stay attached to an entry
/// across renames, and are retired (never reused) once the entry is removed.
///
/// The root directory of the served tree is always [`ROOT_INODE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Inode(u64);

/// Number of the served root directory
pub const ROOT_INODE: Inode = Inode(1);

impl Inode {
    pub fn is_root(&self) -> bool {
        *self == ROOT_INODE
    }
}

impl From<u64> for Inode {
    /// Converts a u64 into an Inode.
    fn from(value: u64) -> Self {
        Inode(value)
    }
}

impl From<Inode> for u64 {
    fn from(value: Inode) -> Self {
        value.0
    }
}

impl std::fmt::Display for Inode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ino:{}", self.0)
    }
}
