use super::{ErrorCode, OsError};

/// An error occurring while reading from or writing to a handle.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TransferError {
    /// Overlapped (asynchronous) I/O was requested.
    #[error("Error during transfer: Overlapped I/O is not supported")]
    Overlapped,
    /// The stream was not opened in a mode allowing this direction.
    #[error("Error during transfer: The stream is not open for {0}")]
    WrongDirection(&'static str),
    /// The end of the file was reached before the requested amount was read.
    #[error("Error during transfer: Only {transferred} of {requested} bytes available")]
    EndOfFile {
        /// The number of bytes asked for.
        requested: usize,
        /// The number of bytes actually moved.
        transferred: usize,
    },
    /// The stream accepted fewer bytes than requested.
    #[error("Error during transfer: Only {transferred} of {requested} bytes written")]
    ShortWrite {
        /// The number of bytes asked for.
        requested: usize,
        /// The number of bytes actually moved.
        transferred: usize,
    },
    /// The descriptor is non-blocking and no data is available.
    #[error("Error during transfer: No data available")]
    WouldBlock,
    /// The host failed the transfer.
    #[error("Error during transfer: {0}")]
    Os(#[from] OsError),
}

impl super::Error for TransferError {
    fn error_code(&self) -> ErrorCode {
        match self {
            TransferError::Overlapped => ErrorCode::NotSupported,
            TransferError::WrongDirection(_) => ErrorCode::AccessDenied,
            TransferError::EndOfFile { .. } => ErrorCode::HandleEof,
            TransferError::ShortWrite { .. } => ErrorCode::WriteFault,
            TransferError::WouldBlock => ErrorCode::NoData,
            TransferError::Os(error) => super::Error::error_code(error),
        }
    }
}
