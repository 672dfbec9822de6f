use super::{Error, ErrorCode, LockError, OsError, PositionError, TransferError};
use crate::Operation;

/// An error raised while dispatching an operation on a handle.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum HandleError {
    /// The handle's kind has no entry for the operation.
    #[error("The operation '{0}' is not supported by this handle")]
    Unsupported(Operation),
    /// Reading or writing failed.
    #[error(transparent)]
    Transfer(#[from] TransferError),
    /// Locking or unlocking failed.
    #[error(transparent)]
    Lock(#[from] LockError),
    /// Positioning, sizing or truncating failed.
    #[error(transparent)]
    Position(#[from] PositionError),
    /// A host call failed.
    #[error(transparent)]
    Os(#[from] OsError),
}

impl Error for HandleError {
    fn error_code(&self) -> ErrorCode {
        match self {
            HandleError::Unsupported(_) => ErrorCode::NotSupported,
            HandleError::Transfer(error) => error.error_code(),
            HandleError::Lock(error) => error.error_code(),
            HandleError::Position(error) => error.error_code(),
            HandleError::Os(error) => error.error_code(),
        }
    }
}
