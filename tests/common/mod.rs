use easy_localfs::{LocalFs, LocalFsConfig};
use tempfile::TempDir;

pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// Fresh filesystem over an empty temporary root
pub fn empty_fs() -> (TempDir, LocalFs) {
    init_logger();
    let root = TempDir::new().unwrap();
    let fs = LocalFs::new(LocalFsConfig::new(root.path())).unwrap();
    (root, fs)
}
