use std::{ffi::NulError, io};

use thiserror::Error;

/// Errno value an upstream server puts on the wire for a failed operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PosixError(i32);

impl PosixError {
    pub const PERMISSION_DENIED: PosixError = PosixError(libc::EPERM);
    pub const FILE_NOT_FOUND: PosixError = PosixError(libc::ENOENT);
    pub const INPUT_OUTPUT_ERROR: PosixError = PosixError(libc::EIO);
    pub const PERMISSION_DENIED_ACCESS: PosixError = PosixError(libc::EACCES);
    pub const FILE_EXISTS: PosixError = PosixError(libc::EEXIST);
    pub const INVALID_CROSS_DEVICE_LINK: PosixError = PosixError(libc::EXDEV);
    pub const NOT_A_DIRECTORY: PosixError = PosixError(libc::ENOTDIR);
    pub const IS_A_DIRECTORY: PosixError = PosixError(libc::EISDIR);
    pub const INVALID_ARGUMENT: PosixError = PosixError(libc::EINVAL);
    pub const NO_SPACE_LEFT_ON_DEVICE: PosixError = PosixError(libc::ENOSPC);
    pub const READ_ONLY_FILE_SYSTEM: PosixError = PosixError(libc::EROFS);
    pub const FILE_NAME_TOO_LONG: PosixError = PosixError(libc::ENAMETOOLONG);
    pub const DIRECTORY_NOT_EMPTY: PosixError = PosixError(libc::ENOTEMPTY);
    pub const STALE_FILE_HANDLE: PosixError = PosixError(libc::ESTALE);
    pub const NOT_SUPPORTED: PosixError = PosixError(libc::ENOTSUP);

    pub fn from_raw(errno: i32) -> Self {
        PosixError(errno)
    }
}

impl From<PosixError> for io::Error {
    fn from(value: PosixError) -> Self {
        Self::from_raw_os_error(value.0)
    }
}

impl From<PosixError> for i32 {
    fn from(value: PosixError) -> Self {
        value.0
    }
}

impl From<NulError> for PosixError {
    fn from(_value: NulError) -> Self {
        PosixError::INVALID_ARGUMENT
    }
}

pub fn from_last_errno() -> io::Error {
    io::Error::last_os_error()
}

/// Failure of a filesystem operation, as seen by the upstream server.
///
/// Corruption of the inode table is not represented here: it panics inside
/// [`InodeTable`](crate::InodeTable) since no caller can recover from it.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such file or directory: {0}")]
    NotFound(String),
    #[error("entry already exists: {0}")]
    AlreadyExists(String),
    #[error("directory not empty: {0}")]
    NotEmpty(String),
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    #[error("malformed file handle ({0} bytes)")]
    BadHandle(usize),
    #[error("not a directory: {0}")]
    NotADirectory(String),
    #[error("is a directory: {0}")]
    IsADirectory(String),
    #[error(transparent)]
    Io(io::Error),
}

pub type FsResult<T> = Result<T, FsError>;

impl FsError {
    pub fn not_found(what: impl std::fmt::Debug) -> Self {
        FsError::NotFound(format!("{:?}", what))
    }

    /// Error code to report on the wire.
    pub fn errno(&self) -> PosixError {
        match self {
            FsError::NotFound(_) => PosixError::FILE_NOT_FOUND,
            FsError::AlreadyExists(_) => PosixError::FILE_EXISTS,
            FsError::NotEmpty(_) => PosixError::DIRECTORY_NOT_EMPTY,
            FsError::Unsupported(_) => PosixError::NOT_SUPPORTED,
            FsError::InvalidName(_) => PosixError::INVALID_ARGUMENT,
            FsError::BadHandle(_) => PosixError::STALE_FILE_HANDLE,
            FsError::NotADirectory(_) => PosixError::NOT_A_DIRECTORY,
            FsError::IsADirectory(_) => PosixError::IS_A_DIRECTORY,
            FsError::Io(e) => e
                .raw_os_error()
                .map(PosixError::from_raw)
                .unwrap_or(PosixError::INPUT_OUTPUT_ERROR),
        }
    }

    /// Classify an OS error, attaching `context` (usually the path involved).
    pub fn from_io(err: io::Error, context: impl std::fmt::Debug) -> Self {
        let context = format!("{:?}", context);
        match err.raw_os_error() {
            Some(libc::ENOENT) => FsError::NotFound(context),
            Some(libc::EEXIST) => FsError::AlreadyExists(context),
            Some(libc::ENOTEMPTY) => FsError::NotEmpty(context),
            Some(libc::ENOTDIR) => FsError::NotADirectory(context),
            Some(libc::EISDIR) => FsError::IsADirectory(context),
            Some(libc::ENOTSUP) => FsError::Unsupported("rejected by the underlying filesystem"),
            _ => match err.kind() {
                io::ErrorKind::NotFound => FsError::NotFound(context),
                io::ErrorKind::AlreadyExists => FsError::AlreadyExists(context),
                _ => FsError::Io(err),
            },
        }
    }
}

impl From<io::Error> for FsError {
    fn from(err: io::Error) -> Self {
        let context = err.to_string();
        FsError::from_io(err, context)
    }
}

impl From<PosixError> for FsError {
    fn from(err: PosixError) -> Self {
        io::Error::from(err).into()
    }
}

impl From<FsError> for io::Error {
    fn from(err: FsError) -> Self {
        match err {
            FsError::Io(e) => e,
            other => io::Error::from(other.errno()),
        }
    }
}
