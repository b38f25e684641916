use std::fs;
use std::path::{Component, Path, PathBuf};

use log::{debug, info};

use super::inode_table::InodeTable;
use crate::types::*;

/// Build the inode table for `root`.
///
/// Every export in `exports` (relative to `root`) is created first if it is
/// missing. The tree is then walked in pre-order, each directory before its
/// contents and siblings in `read_dir` order, and every entry gets the next
/// inode number. The root keeps [`ROOT_INODE`]. Symlinks are numbered but not
/// followed. Any failure aborts the whole initialization.
pub fn init_tree<P: AsRef<Path>>(root: &Path, exports: &[P]) -> FsResult<InodeTable> {
    let root = fs::canonicalize(root).map_err(|e| FsError::from_io(e, root))?;
    if !fs::metadata(&root)
        .map_err(|e| FsError::from_io(e, &root))?
        .is_dir()
    {
        return Err(FsError::NotADirectory(format!("{:?}", root)));
    }

    for export in exports {
        let export_path = root.join(export_relative_path(export.as_ref())?);
        if !export_path.is_dir() {
            info!("Creating export directory {:?}", export_path);
            fs::create_dir_all(&export_path).map_err(|e| FsError::from_io(e, &export_path))?;
        }
    }

    let table = InodeTable::new(root.clone());
    walk(&table, &root)?;
    info!(
        "Initialized {:?} with {} entries",
        root,
        table.len()
    );
    Ok(table)
}

fn walk(table: &InodeTable, dir: &Path) -> FsResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| FsError::from_io(e, dir))?;
    for entry in entries {
        let entry = entry.map_err(|e| FsError::from_io(e, dir))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| FsError::from_io(e, &path))?;

        let ino = table.allocate();
        table.map(ino, path.clone());
        debug!("walk: {} -> {:?}", ino, path);

        // DirEntry::file_type does not follow symlinks
        if file_type.is_dir() {
            walk(table, &path)?;
        }
    }
    Ok(())
}

/// Normalize an export to a path relative to the root.
///
/// Exports are usually written with a leading `/`, which is dropped. `.`
/// components are ignored; `..` would escape the root and is rejected.
pub fn export_relative_path(export: &Path) -> FsResult<PathBuf> {
    let mut relative = PathBuf::new();
    for component in export.components() {
        match component {
            Component::RootDir | Component::CurDir => {}
            Component::Normal(name) => relative.push(name),
            Component::ParentDir | Component::Prefix(_) => {
                return Err(FsError::InvalidName(export.display().to_string()))
            }
        }
    }
    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_export_relative_path() {
        assert_eq!(
            export_relative_path(Path::new("/data/share")).unwrap(),
            PathBuf::from("data/share")
        );
        assert_eq!(
            export_relative_path(Path::new("./data")).unwrap(),
            PathBuf::from("data")
        );
        assert_eq!(export_relative_path(Path::new("/")).unwrap(), PathBuf::new());
        assert!(matches!(
            export_relative_path(Path::new("/data/../../etc")),
            Err(FsError::InvalidName(_))
        ));
    }

    #[test]
    fn test_empty_root() {
        let tmpdir = TempDir::new().unwrap();
        let table = init_tree::<&str>(tmpdir.path(), &[]).unwrap();
        let root = fs::canonicalize(tmpdir.path()).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.resolve_inode(&root).unwrap(), ROOT_INODE);
        assert_eq!(table.allocate(), Inode::from(2));
    }

    #[test]
    fn test_exports_are_created() {
        let tmpdir = TempDir::new().unwrap();
        fs::create_dir(tmpdir.path().join("existing")).unwrap();

        let table = init_tree(tmpdir.path(), &["/existing", "/new/nested"]).unwrap();
        let root = fs::canonicalize(tmpdir.path()).unwrap();

        assert!(root.join("new/nested").is_dir());
        for path in ["existing", "new", "new/nested"] {
            assert!(table.contains_path(&root.join(path)), "{} not mapped", path);
        }
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_walk_is_preorder() {
        let tmpdir = TempDir::new().unwrap();
        fs::create_dir_all(tmpdir.path().join("a/b")).unwrap();
        File::create(tmpdir.path().join("a/b/file")).unwrap();
        File::create(tmpdir.path().join("a/other")).unwrap();

        let table = init_tree::<&str>(tmpdir.path(), &[]).unwrap();
        let root = fs::canonicalize(tmpdir.path()).unwrap();

        let a = table.resolve_inode(&root.join("a")).unwrap();
        let b = table.resolve_inode(&root.join("a/b")).unwrap();
        let file = table.resolve_inode(&root.join("a/b/file")).unwrap();
        let other = table.resolve_inode(&root.join("a/other")).unwrap();

        assert_eq!(a, Inode::from(2));
        assert!(a < b && b < file);
        assert!(a < other);
        // A directory's whole subtree is numbered before its next sibling
        if other > b {
            assert!(other > file);
        }
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_symlinks_are_not_followed() {
        let tmpdir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        File::create(outside.path().join("secret")).unwrap();
        std::os::unix::fs::symlink(outside.path(), tmpdir.path().join("link")).unwrap();

        let table = init_tree::<&str>(tmpdir.path(), &[]).unwrap();
        let root = fs::canonicalize(tmpdir.path()).unwrap();

        assert!(table.contains_path(&root.join("link")));
        assert!(!table.contains_path(&root.join("link/secret")));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_missing_root_fails() {
        let tmpdir = TempDir::new().unwrap();
        let missing = tmpdir.path().join("missing");
        assert!(matches!(
            init_tree::<&str>(&missing, &[]),
            Err(FsError::NotFound(_))
        ));
    }

    #[test]
    fn test_root_must_be_directory() {
        let tmpdir = TempDir::new().unwrap();
        let file = tmpdir.path().join("file");
        File::create(&file).unwrap();
        assert!(matches!(
            init_tree::<&str>(&file, &[]),
            Err(FsError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_export_creation_failure_is_surfaced() {
        let tmpdir = TempDir::new().unwrap();
        File::create(tmpdir.path().join("blocker")).unwrap();
        assert!(init_tree(tmpdir.path(), &["blocker/export"]).is_err());
    }
}
