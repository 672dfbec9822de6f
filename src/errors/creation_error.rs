use super::{ErrorCode, OsError};

/// An error occurring while creating a handle.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CreationError {
    /// The owned copy of the path could not be allocated.
    #[error("Error during handle creation: Out of memory")]
    OutOfMemory,
    /// The host refused to open or create the file.
    #[error("Error during handle creation: {0}")]
    Open(OsError),
    /// The advisory lock requested by the share mode is held elsewhere.
    #[error("Error during handle creation: The requested sharing is not possible ('{0}')")]
    SharingViolation(OsError),
    /// The descriptor to adopt is not open.
    #[error("Error during handle creation: Descriptor {0} is not open")]
    InvalidDescriptor(i32),
    /// The access mode of the descriptor to adopt could not be queried.
    #[error("Error during handle creation: {0}")]
    Descriptor(OsError),
}

impl super::Error for CreationError {
    fn error_code(&self) -> ErrorCode {
        match self {
            CreationError::OutOfMemory => ErrorCode::NotEnoughMemory,
            CreationError::Open(error) | CreationError::Descriptor(error) => {
                super::Error::error_code(error)
            }
            CreationError::SharingViolation(_) => ErrorCode::SharingViolation,
            CreationError::InvalidDescriptor(_) => ErrorCode::InvalidHandle,
        }
    }
}
