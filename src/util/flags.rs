use bitflags::bitflags;
use nix::fcntl::FlockArg;

bitflags! {
    /// The access requested when creating a handle.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct DesiredAccess: u32 {
        /// `GENERIC_READ`
        const GENERIC_READ = 0x8000_0000;
        /// `GENERIC_WRITE`
        const GENERIC_WRITE = 0x4000_0000;
        /// `GENERIC_EXECUTE`
        const GENERIC_EXECUTE = 0x2000_0000;
        /// `GENERIC_ALL`
        const GENERIC_ALL = 0x1000_0000;
    }
}

bitflags! {
    /// How other handles may share the file. Emulated with a whole-file advisory lock.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ShareMode: u32 {
        /// `FILE_SHARE_READ`: others may read, so a shared lock is taken.
        const READ = 0x0000_0001;
        /// `FILE_SHARE_WRITE`: an exclusive lock is taken.
        const WRITE = 0x0000_0002;
        /// `FILE_SHARE_DELETE`: accepted, not emulated.
        const DELETE = 0x0000_0004;
    }
}

bitflags! {
    /// Flags and attributes passed on creation. Retained for diagnostics only.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FileAttributes: u32 {
        /// `FILE_ATTRIBUTE_READONLY`
        const READONLY = 0x0000_0001;
        /// `FILE_ATTRIBUTE_HIDDEN`
        const HIDDEN = 0x0000_0002;
        /// `FILE_ATTRIBUTE_SYSTEM`
        const SYSTEM = 0x0000_0004;
        /// `FILE_ATTRIBUTE_ARCHIVE`
        const ARCHIVE = 0x0000_0020;
        /// `FILE_ATTRIBUTE_NORMAL`
        const NORMAL = 0x0000_0080;
        /// `FILE_ATTRIBUTE_TEMPORARY`
        const TEMPORARY = 0x0000_0100;
        /// `FILE_FLAG_OVERLAPPED`: accepted, but every overlapped request fails.
        const FLAG_OVERLAPPED = 0x4000_0000;
        /// `FILE_FLAG_WRITE_THROUGH`
        const FLAG_WRITE_THROUGH = 0x8000_0000;
    }
}

bitflags! {
    /// Flags of `LockFileEx`.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct LockFlags: u32 {
        /// `LOCKFILE_FAIL_IMMEDIATELY`: fail instead of waiting for a conflicting lock.
        const FAIL_IMMEDIATELY = 0x0000_0001;
        /// `LOCKFILE_EXCLUSIVE_LOCK`: exclusive instead of shared.
        const EXCLUSIVE_LOCK = 0x0000_0002;
    }
}

impl ShareMode {
    /// The non-blocking `flock` emulating this share mode, if any. Write sharing wins over read sharing.
    pub(crate) fn lock_arg(self) -> Option<FlockArg> {
        if self.contains(ShareMode::WRITE) {
            Some(FlockArg::LockExclusiveNonblock)
        } else if self.contains(ShareMode::READ) {
            Some(FlockArg::LockSharedNonblock)
        } else {
            None
        }
    }
}

impl LockFlags {
    pub(crate) fn lock_arg(self) -> FlockArg {
        match (
            self.contains(LockFlags::EXCLUSIVE_LOCK),
            self.contains(LockFlags::FAIL_IMMEDIATELY),
        ) {
            (true, true) => FlockArg::LockExclusiveNonblock,
            (true, false) => FlockArg::LockExclusive,
            (false, true) => FlockArg::LockSharedNonblock,
            (false, false) => FlockArg::LockShared,
        }
    }
}
