use std::path::{Path, PathBuf};

/// Default cap on the number of bytes a single `read` returns
pub const DEFAULT_MAX_IO_SIZE: u32 = 1024 * 1024;

/// Startup configuration of a [`LocalFs`](crate::LocalFs).
///
/// The export list is consumed once, when the tree is first walked; changing
/// it afterwards has no effect on a running filesystem.
#[derive(Debug, Clone)]
pub struct LocalFsConfig {
    pub root: PathBuf,
    pub exports: Vec<PathBuf>,
    pub max_io_size: u32,
}

impl LocalFsConfig {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            exports: Vec::new(),
            max_io_size: DEFAULT_MAX_IO_SIZE,
        }
    }

    pub fn export<P: AsRef<Path>>(mut self, export: P) -> Self {
        self.exports.push(export.as_ref().to_path_buf());
        self
    }

    pub fn exports<I, P>(mut self, exports: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.exports
            .extend(exports.into_iter().map(|p| p.as_ref().to_path_buf()));
        self
    }

    pub fn max_io_size(mut self, max_io_size: u32) -> Self {
        self.max_io_size = max_io_size;
        self
    }
}
