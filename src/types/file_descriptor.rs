use std::ops::Deref;

use crate::posix_fs::release;

/// Represents the file descriptor of an open file on the system
#[derive(Debug, Clone, Copy)]
pub struct FileDescriptor(i32);

impl From<FileDescriptor> for i32 {
    fn from(value: FileDescriptor) -> Self {
        value.0
    }
}

impl From<i32> for FileDescriptor {
    fn from(value: i32) -> Self {
        FileDescriptor(value)
    }
}

/// Descriptor scoped to a single operation, closed when dropped.
///
/// Descriptors are never cached between calls, so every read, write or
/// truncate goes through one of these.
#[derive(Debug)]
pub struct FileDescriptorGuard {
    fd: FileDescriptor,
}

impl FileDescriptorGuard {
    pub fn new(fd: FileDescriptor) -> Self {
        Self { fd }
    }
}

impl Deref for FileDescriptorGuard {
    type Target = FileDescriptor;

    fn deref(&self) -> &Self::Target {
        &self.fd
    }
}

impl Drop for FileDescriptorGuard {
    fn drop(&mut self) {
        if let Err(e) = release(self.fd) {
            log::error!("Failed to release file descriptor: {}", e);
        }
    }
}
