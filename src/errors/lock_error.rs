use super::{ErrorCode, OsError};

/// An error occurring while locking or unlocking a handle.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum LockError {
    /// This handle already holds a lock.
    #[error("Error during locking: The file is already locked by this handle")]
    AlreadyLocked,
    /// This handle holds no lock to release.
    #[error("Error during unlocking: The file is not locked by this handle")]
    NotLocked,
    /// Overlapped (asynchronous) locking was requested.
    #[error("Error during locking: Overlapped locking is not supported")]
    Overlapped,
    /// The host refused the lock operation.
    #[error("Error during locking: {0}")]
    Os(#[from] OsError),
}

impl super::Error for LockError {
    fn error_code(&self) -> ErrorCode {
        match self {
            LockError::AlreadyLocked => ErrorCode::LockViolation,
            LockError::NotLocked => ErrorCode::NotLocked,
            LockError::Overlapped => ErrorCode::NotSupported,
            LockError::Os(error)
                if error.errno() == libc::EWOULDBLOCK || error.errno() == libc::EAGAIN =>
            {
                ErrorCode::LockViolation
            }
            LockError::Os(error) => super::Error::error_code(error),
        }
    }
}
