use std::fmt::{Display, Formatter, Result as FmtResult};
use std::os::unix::io::RawFd;

use super::errors::{LockError, OsError, PositionError, TransferError};
use super::file::{FileHandle, HandleKind};
use super::util::time::{FileTime, FileTimes};
use super::util::{LockFlags, Overlapped, SeekOrigin};

/// Reads exactly the length of the buffer.
pub type ReadFn = fn(&mut FileHandle, &mut [u8], Option<&Overlapped>) -> Result<usize, TransferError>;
/// Writes the whole buffer.
pub type WriteFn = fn(&mut FileHandle, &[u8], Option<&Overlapped>) -> Result<usize, TransferError>;
/// Queries the size of the file.
pub type SizeFn = fn(&mut FileHandle) -> Result<u64, PositionError>;
/// Truncates or extends the file to the current position.
pub type SetEndOfFileFn = fn(&mut FileHandle) -> Result<(), PositionError>;
/// Moves the position.
pub type SeekFn = fn(&mut FileHandle, i64, SeekOrigin) -> Result<u64, PositionError>;
/// Takes an advisory lock.
pub type LockFn = fn(&mut FileHandle, LockFlags, Option<&Overlapped>) -> Result<(), LockError>;
/// Releases the advisory lock.
pub type UnlockFn = fn(&mut FileHandle) -> Result<(), LockError>;
/// Releases the advisory lock, rejecting overlapped requests.
pub type UnlockExFn = fn(&mut FileHandle, Option<&Overlapped>) -> Result<(), LockError>;
/// Sets creation (ignored), last access and last write time.
pub type SetTimesFn =
    fn(&mut FileHandle, Option<&FileTime>, Option<&FileTime>, Option<&FileTime>) -> Result<(), OsError>;
/// Queries the timestamps.
pub type TimesFn = fn(&mut FileHandle) -> Result<FileTimes, OsError>;

/// An operation a handle may support.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Check that the handle refers to a file.
    IsHandled,
    /// Close the handle.
    CloseHandle,
    /// Query the underlying descriptor.
    GetFileDescriptor,
    /// Read from the current position.
    ReadFile,
    /// Write at the current position.
    WriteFile,
    /// Query the size.
    GetFileSize,
    /// Truncate or extend to the current position.
    SetEndOfFile,
    /// Move the position.
    SetFilePointer,
    /// Take an advisory lock.
    LockFileEx,
    /// Release the advisory lock.
    UnlockFile,
    /// Release the advisory lock (extended variant).
    UnlockFileEx,
    /// Set the timestamps.
    SetFileTime,
    /// Query the timestamps.
    GetFileTime,
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:?}", self)
    }
}

/// The operations of one handle kind. An absent entry means the kind does not support it.
pub struct OperationsTable {
    /// Whether the handle still refers to an open file.
    pub is_handled: Option<fn(&FileHandle) -> bool>,
    /// Destroys the handle.
    pub close: Option<fn(FileHandle)>,
    /// The underlying descriptor.
    pub descriptor: Option<fn(&FileHandle) -> Option<RawFd>>,
    /// `ReadFile`
    pub read: Option<ReadFn>,
    /// `WriteFile`
    pub write: Option<WriteFn>,
    /// `GetFileSize`
    pub size: Option<SizeFn>,
    /// `SetEndOfFile`
    pub set_end_of_file: Option<SetEndOfFileFn>,
    /// `SetFilePointer`
    pub seek: Option<SeekFn>,
    /// `LockFileEx`
    pub lock: Option<LockFn>,
    /// `UnlockFile`
    pub unlock: Option<UnlockFn>,
    /// `UnlockFileEx`
    pub unlock_ex: Option<UnlockExFn>,
    /// `SetFileTime`
    pub set_times: Option<SetTimesFn>,
    /// `GetFileTime`
    pub times: Option<TimesFn>,
}

/// Files opened by path.
pub static REGULAR_FILE_OPERATIONS: OperationsTable = OperationsTable {
    is_handled: Some(FileHandle::is_handled),
    close: Some(FileHandle::close),
    descriptor: Some(FileHandle::descriptor),
    read: Some(FileHandle::read),
    write: Some(FileHandle::write),
    size: Some(FileHandle::size),
    set_end_of_file: Some(FileHandle::set_end_of_file),
    seek: Some(FileHandle::seek),
    lock: Some(FileHandle::lock),
    unlock: Some(FileHandle::unlock),
    unlock_ex: Some(FileHandle::unlock_ex),
    set_times: Some(FileHandle::set_times),
    times: Some(FileHandle::times),
};

/// Adopted descriptors such as the standard streams.
pub static ADOPTED_STREAM_OPERATIONS: OperationsTable = OperationsTable {
    is_handled: Some(FileHandle::is_handled),
    close: Some(FileHandle::close),
    descriptor: Some(FileHandle::descriptor),
    read: Some(FileHandle::read),
    write: Some(FileHandle::write),
    size: None,
    set_end_of_file: None,
    seek: None,
    lock: None,
    unlock: None,
    unlock_ex: None,
    set_times: None,
    times: None,
};

impl HandleKind {
    /// The table every operation on a handle of this kind is routed through.
    pub fn operations(self) -> &'static OperationsTable {
        match self {
            HandleKind::RegularFile => &REGULAR_FILE_OPERATIONS,
            HandleKind::AdoptedStream => &ADOPTED_STREAM_OPERATIONS,
        }
    }
}

impl OperationsTable {
    /// Whether the table has an entry for `operation`.
    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::IsHandled => self.is_handled.is_some(),
            Operation::CloseHandle => self.close.is_some(),
            Operation::GetFileDescriptor => self.descriptor.is_some(),
            Operation::ReadFile => self.read.is_some(),
            Operation::WriteFile => self.write.is_some(),
            Operation::GetFileSize => self.size.is_some(),
            Operation::SetEndOfFile => self.set_end_of_file.is_some(),
            Operation::SetFilePointer => self.seek.is_some(),
            Operation::LockFileEx => self.lock.is_some(),
            Operation::UnlockFile => self.unlock.is_some(),
            Operation::UnlockFileEx => self.unlock_ex.is_some(),
            Operation::SetFileTime => self.set_times.is_some(),
            Operation::GetFileTime => self.times.is_some(),
        }
    }
}
