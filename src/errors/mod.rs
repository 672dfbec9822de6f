//! Various errors occurring while operating on file handles.

use std::fmt::{Debug, Display};

mod creation_error;
mod error_code;
mod handle_error;
mod lock_error;
mod os_error;
mod position_error;
mod transfer_error;

pub use self::creation_error::CreationError;
pub use self::error_code::ErrorCode;
pub use self::handle_error::HandleError;
pub use self::lock_error::LockError;
pub use self::os_error::OsError;
pub use self::position_error::PositionError;
pub use self::transfer_error::TransferError;

/// An error occurring while operating on a file handle.
pub trait Error: PartialEq + Debug + Display {
    /// Generate a human-readable version of the error.
    fn error_message(&self) -> String {
        format!("{}", &self)
    }

    /// The Win32 last-error code a caller of the Windows API would observe.
    fn error_code(&self) -> ErrorCode;
}
