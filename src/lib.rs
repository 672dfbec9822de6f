//! This crate emulates the Windows file-handle API on POSIX hosts.
//!
//! Files are opened by path with `CreateFile` semantics (creation disposition, share mode) or
//! adopted from open descriptors. Every handle dispatches through the operations table of its
//! kind, so adopted streams fail cleanly on operations only regular files support.
#![cfg(unix)]
#![warn(missing_docs)]

use const_format::concatcp;

pub mod errors;
mod file;
mod handle;
mod operations;
mod sys;
mod util;

pub use self::file::{FileHandle, HandleKind};
pub use self::handle::Handle;
pub use self::operations::{
    Operation, OperationsTable, ADOPTED_STREAM_OPERATIONS, REGULAR_FILE_OPERATIONS,
};
pub use self::util::time;
pub use self::util::{
    resolve, CreateOptions, CreationDisposition, DesiredAccess, FileAttributes, LockFlags,
    OpenMode, Overlapped, Resolution, SeekOrigin, ShareMode, StandardStream,
};

/// The log target of all file operations.
pub(crate) const TAG: &str = concatcp!(env!("CARGO_PKG_NAME"), ".file");
