use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Copy, Clone)]
    pub struct OpenFlags: i32 {
        const READ_ONLY = libc::O_RDONLY;
        const WRITE_ONLY = libc::O_WRONLY;
        const READ_WRITE = libc::O_RDWR;
        const CREATE = libc::O_CREAT;
        const CREATE_EXCLUSIVE = libc::O_EXCL;
        const DO_NOT_FOLLOW_SYMLINKS = libc::O_NOFOLLOW;
        const CLOSE_ON_EXEC = libc::O_CLOEXEC;
        const _ = !0;
    }
}

bitflags! {
    #[derive(Debug, Copy, Clone)]
    pub struct RenameFlags: u32 {
        const NOREPLACE = libc::RENAME_NOREPLACE;
        const _ = !0;
    }
}

bitflags! {
    /// The nine rwx permission bits of a mode word, as reported in [`Stat::mode`](crate::types::Stat).
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct PermissionBits: u32 {
        const OWNER_READ = 0o400;
        const OWNER_WRITE = 0o200;
        const OWNER_EXECUTE = 0o100;
        const GROUP_READ = 0o040;
        const GROUP_WRITE = 0o020;
        const GROUP_EXECUTE = 0o010;
        const OTHERS_READ = 0o004;
        const OTHERS_WRITE = 0o002;
        const OTHERS_EXECUTE = 0o001;
    }
}
