mod vfs_handler;
pub use vfs_handler::VfsHandler;

pub mod attributes;
pub mod posix_fs;
pub mod types;

mod config;
pub use config::{LocalFsConfig, DEFAULT_MAX_IO_SIZE};

mod core;
pub use self::core::{export_relative_path, init_tree, InodeTable};

mod local_fs;
pub use local_fs::LocalFs;

pub mod prelude {
    pub use crate::types::*;
    pub use crate::{LocalFs, LocalFsConfig, VfsHandler};
}
