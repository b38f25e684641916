//! Thin wrappers over the libc calls used by [`LocalFs`](crate::LocalFs).
//!
//! Every function takes an absolute path (or a descriptor), performs exactly
//! one OS-level operation, and reports failures as `io::Error` built from
//! `errno`. None of them touch the inode table.

use std::ffi::{CString, OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use std::{fs, io};

use libc::{c_char, c_void, timespec};

use crate::types::*;

fn system_time_to_timespec(time: SystemTime) -> Result<timespec, io::Error> {
    let duration = time
        .duration_since(std::time::UNIX_EPOCH)
        .map_err(|_| PosixError::INVALID_ARGUMENT)?;
    Ok(timespec {
        tv_sec: duration.as_secs() as libc::time_t,
        tv_nsec: duration.subsec_nanos() as libc::c_long,
    })
}

fn cstring_from_path(path: &Path) -> Result<CString, io::Error> {
    Ok(CString::new(path.as_os_str().as_bytes()).map_err(PosixError::from)?)
}

/// Get the attributes of a path without following a trailing symlink
pub fn lstat(path: &Path) -> Result<libc::stat, io::Error> {
    let c_path = cstring_from_path(path)?;
    let mut statbuf: libc::stat = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::lstat(c_path.as_ptr(), &mut statbuf) };
    if result == -1 {
        return Err(from_last_errno());
    }
    Ok(statbuf)
}

/// Open a descriptor that lives as long as the returned guard
pub fn open(path: &Path, flags: OpenFlags) -> Result<FileDescriptorGuard, io::Error> {
    let c_path = cstring_from_path(path)?;
    let flags = flags | OpenFlags::CLOSE_ON_EXEC;
    let fd = unsafe { libc::open(c_path.as_ptr(), flags.bits()) };
    if fd == -1 {
        return Err(from_last_errno());
    }
    Ok(FileDescriptorGuard::new(fd.into()))
}

/// Create a regular file, failing with `EEXIST` if anything already exists at `path`
pub fn create_exclusive(path: &Path, mode: u32) -> Result<(), io::Error> {
    let c_path = cstring_from_path(path)?;
    let flags = OpenFlags::CREATE
        | OpenFlags::CREATE_EXCLUSIVE
        | OpenFlags::WRITE_ONLY
        | OpenFlags::CLOSE_ON_EXEC;
    let fd = unsafe { libc::open(c_path.as_ptr(), flags.bits(), mode as libc::c_uint) };
    if fd == -1 {
        return Err(from_last_errno());
    }
    drop(FileDescriptorGuard::new(fd.into()));
    Ok(())
}

/// Positioned read, returns fewer bytes than requested at end of file
pub fn read(fd: &FileDescriptor, offset: u64, size: u32) -> Result<Vec<u8>, io::Error> {
    let offset = libc::off_t::try_from(offset).map_err(|_| PosixError::INVALID_ARGUMENT)?;
    let mut buffer = vec![0; size as usize];
    let bytes_read = unsafe {
        libc::pread(
            (*fd).into(),
            buffer.as_mut_ptr() as *mut c_void,
            size as usize,
            offset,
        )
    };
    if bytes_read == -1 {
        return Err(from_last_errno());
    }
    buffer.truncate(bytes_read as usize);
    Ok(buffer)
}

/// Positioned write, returns the number of bytes written
pub fn write(fd: &FileDescriptor, offset: u64, data: &[u8]) -> Result<u32, io::Error> {
    let offset = libc::off_t::try_from(offset).map_err(|_| PosixError::INVALID_ARGUMENT)?;
    let bytes_written = unsafe {
        libc::pwrite(
            (*fd).into(),
            data.as_ptr() as *const c_void,
            data.len(),
            offset,
        )
    };
    if bytes_written == -1 {
        return Err(from_last_errno());
    }
    Ok(bytes_written as u32)
}

/// Truncate or extend a file through a descriptor opened for this call only
pub fn truncate(path: &Path, size: u64) -> Result<(), io::Error> {
    let size = libc::off_t::try_from(size).map_err(|_| PosixError::INVALID_ARGUMENT)?;
    let fd = open(
        path,
        OpenFlags::WRITE_ONLY | OpenFlags::DO_NOT_FOLLOW_SYMLINKS,
    )?;
    let result = unsafe { libc::ftruncate((*fd).into(), size) };
    if result == -1 {
        return Err(from_last_errno());
    }
    Ok(())
}

/// Update the modification time, leaving the access time untouched
pub fn set_mtime(path: &Path, mtime: TimeOrNow) -> Result<(), io::Error> {
    let c_path = cstring_from_path(path)?;
    let omit = timespec {
        tv_sec: 0,
        tv_nsec: libc::UTIME_OMIT,
    };
    let mtime = match mtime {
        TimeOrNow::Now => timespec {
            tv_sec: 0,
            tv_nsec: libc::UTIME_NOW,
        },
        TimeOrNow::SpecificTime(time) => system_time_to_timespec(time)?,
    };
    let times = [omit, mtime];
    let result = unsafe {
        libc::utimensat(
            libc::AT_FDCWD,
            c_path.as_ptr(),
            times.as_ptr(),
            libc::AT_SYMLINK_NOFOLLOW,
        )
    };
    if result == -1 {
        return Err(from_last_errno());
    }
    Ok(())
}

pub fn chmod(path: &Path, mode: u32) -> Result<(), io::Error> {
    let c_path = cstring_from_path(path)?;
    let result = unsafe { libc::chmod(c_path.as_ptr(), mode as libc::mode_t) };
    if result == -1 {
        return Err(from_last_errno());
    }
    Ok(())
}

pub fn mkdir(path: &Path, mode: u32) -> Result<(), io::Error> {
    let c_path = cstring_from_path(path)?;
    let ret = unsafe { libc::mkdir(c_path.as_ptr(), mode as libc::mode_t) };
    if ret == -1 {
        return Err(from_last_errno());
    }
    Ok(())
}

pub fn unlink(path: &Path) -> Result<(), io::Error> {
    fs::remove_file(path)
}

pub fn rmdir(path: &Path) -> Result<(), io::Error> {
    fs::remove_dir(path)
}

/// Atomic rename. With `RenameFlags::NOREPLACE` an existing target fails with `EEXIST`.
pub fn rename(oldpath: &Path, newpath: &Path, flags: RenameFlags) -> Result<(), io::Error> {
    let old_cstr = cstring_from_path(oldpath)?;
    let new_cstr = cstring_from_path(newpath)?;
    let result = unsafe {
        libc::renameat2(
            libc::AT_FDCWD,
            old_cstr.as_ptr(),
            libc::AT_FDCWD,
            new_cstr.as_ptr(),
            flags.bits(),
        )
    };
    if result == 0 {
        return Ok(());
    }
    Err(from_last_errno())
}

pub fn readlink(path: &Path) -> Result<PathBuf, io::Error> {
    let c_path = cstring_from_path(path)?;
    let mut buf = vec![0u8; libc::PATH_MAX as usize];
    let ret =
        unsafe { libc::readlink(c_path.as_ptr(), buf.as_mut_ptr() as *mut c_char, buf.len()) };
    if ret == -1 {
        return Err(from_last_errno());
    }
    buf.truncate(ret as usize);
    Ok(PathBuf::from(OsStr::from_bytes(&buf)))
}

/// Entry names of a directory, in the order the OS returns them
pub fn readdir(path: &Path) -> Result<Vec<OsString>, io::Error> {
    let entries = fs::read_dir(path)?;
    let mut result = Vec::new();
    for entry in entries {
        result.push(entry?.file_name());
    }
    Ok(result)
}

pub fn statvfs(path: &Path) -> Result<StatVfs, io::Error> {
    let c_path = cstring_from_path(path)?;
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if result != 0 {
        return Err(from_last_errno());
    }

    Ok(StatVfs {
        total_blocks: stat.f_blocks as u64,
        free_blocks: stat.f_bfree as u64,
        available_blocks: stat.f_bavail as u64,
        total_files: stat.f_files as u64,
        free_files: stat.f_ffree as u64,
        fragment_size: stat.f_frsize as u64,
    })
}

/// Close a descriptor. Only [`FileDescriptorGuard`] should need this.
pub fn release(fd: FileDescriptor) -> Result<(), io::Error> {
    let result = unsafe { libc::close(fd.into()) };
    if result == -1 {
        return Err(from_last_errno());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::{NamedTempFile, TempDir};

    use super::*;
    use std::fs::File;

    #[test]
    fn test_system_time_to_timespec() {
        let system_time = SystemTime::now();
        let timespec = system_time_to_timespec(system_time).unwrap();

        assert!(timespec.tv_sec > 0);
        assert!(timespec.tv_nsec >= 0);
    }

    #[test]
    fn test_cstring_from_path() {
        let path = PathBuf::from("test_cstring");
        let c_string = cstring_from_path(&path).unwrap();
        assert_eq!(c_string.to_str().unwrap(), path.to_str().unwrap());

        let bad = PathBuf::from(OsStr::from_bytes(b"bad\0name"));
        let err = cstring_from_path(&bad).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
    }

    #[test]
    fn test_create_exclusive() {
        let tmpdir = TempDir::new().unwrap();
        let file_path = tmpdir.path().join("file");
        create_exclusive(&file_path, 0o644).unwrap();
        assert!(file_path.exists());

        let err = create_exclusive(&file_path, 0o644).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EEXIST));
    }

    #[test]
    fn test_read() {
        let tmpfile = NamedTempFile::new().unwrap();
        fs::write(tmpfile.path(), b"Hello, world!").unwrap();

        let fd = open(tmpfile.path(), OpenFlags::READ_ONLY).unwrap();
        assert_eq!(read(&fd, 0, 5).unwrap(), b"Hello");
        assert_eq!(read(&fd, 7, 5).unwrap(), b"world");

        // Attempt to read past the end of the file
        assert_eq!(read(&fd, 50, 10).unwrap().len(), 0);
    }

    #[test]
    fn test_write() {
        let tmpfile = NamedTempFile::new().unwrap();
        let fd = open(tmpfile.path(), OpenFlags::READ_WRITE).unwrap();

        assert_eq!(write(&fd, 0, b"Hello, world!").unwrap(), 13);
        assert_eq!(write(&fd, 7, b"Rustaceans!").unwrap(), 11);

        let content = read(&fd, 0, 100).unwrap();
        assert_eq!(&String::from_utf8(content).unwrap(), "Hello, Rustaceans!");
    }

    #[test]
    fn test_truncate() {
        let tmpfile = NamedTempFile::new().unwrap();
        fs::write(tmpfile.path(), b"Initial content").unwrap();
        truncate(tmpfile.path(), 5).unwrap();
        assert_eq!(fs::read(tmpfile.path()).unwrap(), b"Initi");
    }

    #[test]
    fn test_set_mtime_keeps_atime() {
        let tmpfile = NamedTempFile::new().unwrap();
        let before = lstat(tmpfile.path()).unwrap();
        let target = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000);
        set_mtime(tmpfile.path(), TimeOrNow::SpecificTime(target)).unwrap();
        let after = lstat(tmpfile.path()).unwrap();
        assert_eq!(after.st_mtime, 1_000_000);
        assert_eq!(after.st_atime, before.st_atime);
    }

    #[test]
    fn test_mkdir_and_rmdir() {
        let tmpdir = TempDir::new().unwrap();
        let dir_path = tmpdir.path().join("dir");
        mkdir(&dir_path, 0o755).unwrap();
        assert!(dir_path.is_dir());

        rmdir(&dir_path).unwrap();
        assert!(!dir_path.exists());
    }

    #[test]
    fn test_rename_noreplace() {
        let tmpdir = TempDir::new().unwrap();
        let src_path = tmpdir.path().join("src");
        let dest_path = tmpdir.path().join("dest");
        File::create(&src_path).unwrap();
        File::create(&dest_path).unwrap();

        let err = rename(&src_path, &dest_path, RenameFlags::NOREPLACE).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EEXIST));

        fs::remove_file(&dest_path).unwrap();
        rename(&src_path, &dest_path, RenameFlags::NOREPLACE).unwrap();
        assert!(!src_path.exists());
        assert!(dest_path.exists());
    }

    #[test]
    fn test_readlink() {
        let tmpdir = TempDir::new().unwrap();
        let target_path = tmpdir.path().join("link_target");
        File::create(&target_path).unwrap();
        let symlink_path = tmpdir.path().join("symlink");
        std::os::unix::fs::symlink(&target_path, &symlink_path).unwrap();

        assert_eq!(readlink(&symlink_path).unwrap(), target_path);

        let err = readlink(&target_path).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::EINVAL));
    }

    #[test]
    fn test_readdir() {
        let tmpdir = TempDir::new().unwrap();
        File::create(tmpdir.path().join("file1")).unwrap();

        let entries = readdir(tmpdir.path()).unwrap();
        assert_eq!(entries, vec![OsString::from("file1")]);
    }

    #[test]
    fn test_statvfs() {
        let tmpdir = TempDir::new().unwrap();
        let stat = statvfs(tmpdir.path()).unwrap();

        assert!(stat.total_blocks > 0);
        assert!(stat.fragment_size > 0);
    }
}
