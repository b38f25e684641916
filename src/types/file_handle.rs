//! Wire encoding of inode numbers.
//!
//! The upstream server stores handles as opaque bytes and replays them on
//! later requests, so the encoding is fixed: the inode number as an 8-byte
//! big-endian integer. Anything that is not exactly 8 bytes is rejected.

use super::errors::{FsError, FsResult};
use super::inode::Inode;

pub const FILE_HANDLE_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileHandle([u8; FILE_HANDLE_LEN]);

impl FileHandle {
    pub fn encode(ino: Inode) -> Self {
        FileHandle(u64::from(ino).to_be_bytes())
    }

    pub fn decode(bytes: &[u8]) -> FsResult<Inode> {
        let raw: [u8; FILE_HANDLE_LEN] = bytes
            .try_into()
            .map_err(|_| FsError::BadHandle(bytes.len()))?;
        Ok(Inode::from(u64::from_be_bytes(raw)))
    }

    pub fn inode(&self) -> Inode {
        Inode::from(u64::from_be_bytes(self.0))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Inode> for FileHandle {
    fn from(ino: Inode) -> Self {
        FileHandle::encode(ino)
    }
}

impl AsRef<[u8]> for FileHandle {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_layout() {
        let fh = FileHandle::encode(Inode::from(0x0102_0304_0506_0708));
        assert_eq!(fh.as_bytes(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_round_trip_edges() {
        for raw in [1u64, 2, 255, 256, u32::MAX as u64 + 1, u64::MAX] {
            let ino = Inode::from(raw);
            let fh = FileHandle::encode(ino);
            assert_eq!(FileHandle::decode(fh.as_bytes()).unwrap(), ino);
            assert_eq!(fh.inode(), ino);
        }
    }

    #[test]
    fn test_reject_wrong_length() {
        assert!(matches!(
            FileHandle::decode(&[0, 0, 0, 1]),
            Err(FsError::BadHandle(4))
        ));
        assert!(matches!(
            FileHandle::decode(&[0; 9]),
            Err(FsError::BadHandle(9))
        ));
        assert!(matches!(FileHandle::decode(&[]), Err(FsError::BadHandle(0))));
    }
}
