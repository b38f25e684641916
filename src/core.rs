mod inode_table;
mod name_locks;
mod tree_init;

pub use inode_table::InodeTable;
pub(crate) use name_locks::NameLocks;
pub use tree_init::{export_relative_path, init_tree};
