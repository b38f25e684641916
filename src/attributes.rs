//! Translation of POSIX attributes into [`Stat`].
//!
//! The translation is pure: it only reads the `libc::stat` it is given, so the
//! same attributes always produce the same record.

use std::time::{Duration, SystemTime};

use crate::types::*;

/// POSIX permission bit to output permission bit, one row per rwx bit.
const PERMISSION_TABLE: [(libc::mode_t, PermissionBits); 9] = [
    (libc::S_IRUSR, PermissionBits::OWNER_READ),
    (libc::S_IWUSR, PermissionBits::OWNER_WRITE),
    (libc::S_IXUSR, PermissionBits::OWNER_EXECUTE),
    (libc::S_IRGRP, PermissionBits::GROUP_READ),
    (libc::S_IWGRP, PermissionBits::GROUP_WRITE),
    (libc::S_IXGRP, PermissionBits::GROUP_EXECUTE),
    (libc::S_IROTH, PermissionBits::OTHERS_READ),
    (libc::S_IWOTH, PermissionBits::OTHERS_WRITE),
    (libc::S_IXOTH, PermissionBits::OTHERS_EXECUTE),
];

pub fn file_kind(st_mode: libc::mode_t) -> FileKind {
    match st_mode & libc::S_IFMT {
        libc::S_IFREG => FileKind::RegularFile,
        libc::S_IFDIR => FileKind::Directory,
        libc::S_IFLNK => FileKind::Symlink,
        _ => FileKind::Other,
    }
}

/// Type bit reported for each kind
pub fn kind_bits(kind: FileKind) -> u32 {
    match kind {
        FileKind::RegularFile => libc::S_IFREG as u32,
        FileKind::Directory => libc::S_IFDIR as u32,
        FileKind::Symlink => libc::S_IFLNK as u32,
        FileKind::Other => libc::S_IFSOCK as u32,
    }
}

pub fn permission_bits(st_mode: libc::mode_t) -> PermissionBits {
    PERMISSION_TABLE
        .iter()
        .filter(|(posix, _)| st_mode & posix != 0)
        .fold(PermissionBits::empty(), |acc, (_, bit)| acc | *bit)
}

/// Full mode word: type bit OR'd with the translated permission bits.
/// Setuid, setgid and sticky bits are not carried over.
pub fn mode_word(st_mode: libc::mode_t) -> u32 {
    kind_bits(file_kind(st_mode)) | permission_bits(st_mode).bits()
}

fn to_system_time(secs: i64, nsecs: i64) -> SystemTime {
    let nsecs = nsecs.clamp(0, 999_999_999) as u32;
    if secs >= 0 {
        SystemTime::UNIX_EPOCH + Duration::new(secs as u64, nsecs)
    } else {
        SystemTime::UNIX_EPOCH - Duration::new(secs.unsigned_abs(), 0) + Duration::new(0, nsecs)
    }
}

/// Generation derived from the modification time, in nanoseconds since the epoch
fn generation(mtime_secs: i64, mtime_nsecs: i64) -> u64 {
    (mtime_secs as u64)
        .wrapping_mul(1_000_000_000)
        .wrapping_add(mtime_nsecs as u64)
}

/// Convert the result of `lstat` into a [`Stat`] for inode `ino`.
///
/// POSIX has no creation time, `crtime` carries the modification time.
pub fn convert_stat(ino: Inode, statbuf: &libc::stat) -> Stat {
    let atime = to_system_time(statbuf.st_atime as i64, statbuf.st_atime_nsec as i64);
    let mtime = to_system_time(statbuf.st_mtime as i64, statbuf.st_mtime_nsec as i64);
    let ctime = to_system_time(statbuf.st_ctime as i64, statbuf.st_ctime_nsec as i64);

    Stat {
        ino,
        kind: file_kind(statbuf.st_mode),
        mode: mode_word(statbuf.st_mode),
        size: statbuf.st_size as u64,
        blocks: statbuf.st_blocks as u64,
        nlink: statbuf.st_nlink as u64,
        uid: statbuf.st_uid as u32,
        gid: statbuf.st_gid as u32,
        atime,
        mtime,
        ctime,
        crtime: mtime,
        generation: generation(statbuf.st_mtime as i64, statbuf.st_mtime_nsec as i64),
    }
}

/// Convert `statvfs` counters into byte-based totals
pub fn convert_statvfs(raw: &StatVfs, used_files: u64) -> FsStat {
    FsStat {
        total_bytes: raw.total_blocks.saturating_mul(raw.fragment_size),
        free_bytes: raw.free_blocks.saturating_mul(raw.fragment_size),
        available_bytes: raw.available_blocks.saturating_mul(raw.fragment_size),
        total_files: raw.total_files,
        free_files: raw.free_files,
        used_files,
    }
}
