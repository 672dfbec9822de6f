use super::{ErrorCode, OsError};

/// An error occurring while positioning, sizing or truncating a handle.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum PositionError {
    /// The move method is none of begin, current and end.
    #[error("Error during positioning: Unknown move method {0}")]
    InvalidMoveMethod(u32),
    /// The requested position lies before the start of the file.
    #[error("Error during positioning: Position {0} lies before the start of the file")]
    Negative(i64),
    /// The host failed the operation.
    #[error("Error during positioning: {0}")]
    Os(#[from] OsError),
}

impl super::Error for PositionError {
    fn error_code(&self) -> ErrorCode {
        match self {
            PositionError::InvalidMoveMethod(_) => ErrorCode::InvalidParameter,
            PositionError::Negative(_) => ErrorCode::NegativeSeek,
            PositionError::Os(error) => super::Error::error_code(error),
        }
    }
}
