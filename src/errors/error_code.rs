use std::fmt::{Display, Formatter, Result as FmtResult};

/// A Win32 last-error code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCode {
    /// `ERROR_SUCCESS`
    Success = 0,
    /// `ERROR_FILE_NOT_FOUND`
    FileNotFound = 2,
    /// `ERROR_ACCESS_DENIED`
    AccessDenied = 5,
    /// `ERROR_INVALID_HANDLE`
    InvalidHandle = 6,
    /// `ERROR_NOT_ENOUGH_MEMORY`
    NotEnoughMemory = 8,
    /// `ERROR_WRITE_FAULT`
    WriteFault = 29,
    /// `ERROR_GEN_FAILURE`
    GenFailure = 31,
    /// `ERROR_SHARING_VIOLATION`
    SharingViolation = 32,
    /// `ERROR_LOCK_VIOLATION`
    LockViolation = 33,
    /// `ERROR_HANDLE_EOF`
    HandleEof = 38,
    /// `ERROR_NOT_SUPPORTED`
    NotSupported = 50,
    /// `ERROR_FILE_EXISTS`
    FileExists = 80,
    /// `ERROR_INVALID_PARAMETER`
    InvalidParameter = 87,
    /// `ERROR_DISK_FULL`
    DiskFull = 112,
    /// `ERROR_NEGATIVE_SEEK`
    NegativeSeek = 131,
    /// `ERROR_NOT_LOCKED`
    NotLocked = 158,
    /// `ERROR_NO_DATA`
    NoData = 232,
}

impl ErrorCode {
    /// The raw numeric value stored in the last-error register.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Translate a host `errno` into the closest Win32 error code.
    pub fn from_errno(errno: i32) -> Self {
        match errno {
            0 => ErrorCode::Success,
            libc::ENOENT | libc::ENOTDIR => ErrorCode::FileNotFound,
            libc::EACCES | libc::EPERM | libc::EROFS => ErrorCode::AccessDenied,
            libc::EBADF => ErrorCode::InvalidHandle,
            libc::ENOMEM => ErrorCode::NotEnoughMemory,
            libc::ENOSPC => ErrorCode::DiskFull,
            libc::EEXIST => ErrorCode::FileExists,
            libc::EINVAL => ErrorCode::InvalidParameter,
            libc::EBUSY | libc::ETXTBSY => ErrorCode::SharingViolation,
            libc::ENOLCK => ErrorCode::LockViolation,
            libc::EOPNOTSUPP => ErrorCode::NotSupported,
            errno if errno == libc::EAGAIN || errno == libc::EWOULDBLOCK => ErrorCode::NoData,
            _ => ErrorCode::GenFailure,
        }
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:?} ({})", self, self.code())
    }
}
