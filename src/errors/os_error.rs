use std::io::{Error as IoError, ErrorKind};

use nix::errno::Errno;

use super::ErrorCode;

/// A call into the host operating system failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{call} failed with {} [{errno:08X}]", describe(.errno))]
pub struct OsError {
    call: &'static str,
    errno: i32,
}

fn describe(errno: &i32) -> IoError {
    IoError::from_raw_os_error(*errno)
}

impl OsError {
    /// Record a failure of `call` with a specific `errno`.
    pub const fn new(call: &'static str, errno: i32) -> Self {
        OsError { call, errno }
    }

    /// Record a failure of `call` reported through `nix`.
    pub fn from_errno(call: &'static str, errno: Errno) -> Self {
        OsError::new(call, errno as i32)
    }

    /// Record a failure of `call` reported through the standard library.
    pub fn from_io(call: &'static str, error: &IoError) -> Self {
        let errno = error.raw_os_error().unwrap_or(match error.kind() {
            ErrorKind::NotFound => libc::ENOENT,
            ErrorKind::PermissionDenied => libc::EACCES,
            ErrorKind::AlreadyExists => libc::EEXIST,
            ErrorKind::WouldBlock => libc::EWOULDBLOCK,
            ErrorKind::InvalidInput | ErrorKind::InvalidData => libc::EINVAL,
            ErrorKind::Interrupted => libc::EINTR,
            _ => libc::EIO,
        });
        OsError { call, errno }
    }

    /// The name of the failed host call.
    pub fn call(&self) -> &'static str {
        self.call
    }

    /// The raw `errno` reported by the host.
    pub fn errno(&self) -> i32 {
        self.errno
    }
}

impl super::Error for OsError {
    fn error_code(&self) -> ErrorCode {
        ErrorCode::from_errno(self.errno)
    }
}
