use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::os::unix::io::RawFd;
use std::path::Path;

use log::warn;

use super::errors::{CreationError, HandleError, OsError};
use super::file::{FileHandle, HandleKind};
use super::operations::{Operation, OperationsTable};
use super::util::time::{FileTime, FileTimes};
use super::util::{CreateOptions, LockFlags, Overlapped, SeekOrigin, StandardStream};
use super::TAG;

/// An open handle. Every operation is routed through the operations table of its kind.
pub struct Handle {
    file: FileHandle,
    operations: &'static OperationsTable,
}

impl Handle {
    fn new(file: FileHandle) -> Handle {
        let operations = file.kind().operations();
        Handle { file, operations }
    }

    /// Open or create the file at `path` (`CreateFile`).
    ///
    /// # Example
    /// ```no_run
    /// use winfile::{CreateOptions, CreationDisposition, Handle};
    ///
    /// let options = CreateOptions::new().disposition(CreationDisposition::CREATE_ALWAYS);
    /// let mut handle = Handle::create("out.bin", &options).expect("Creation failed");
    /// handle.write(b"Hello", None).expect("Writing failed");
    /// handle.close().expect("Closing failed");
    /// ```
    pub fn create<P: AsRef<Path>>(path: P, options: &CreateOptions) -> Result<Handle, CreationError> {
        FileHandle::create(path.as_ref(), options).map(Handle::new)
    }

    /// Adopt an open descriptor (`GetFileHandleForFileDescriptor`).
    ///
    /// # Safety
    ///
    /// The descriptor is closed together with the handle unless it is a standard stream, so it
    /// must not be owned by anything else.
    pub unsafe fn from_descriptor(fd: RawFd) -> Result<Handle, CreationError> {
        FileHandle::adopt(fd).map(Handle::new)
    }

    /// Wrap a standard stream (`GetStdHandle`).
    pub fn standard(stream: StandardStream) -> Result<Handle, CreationError> {
        FileHandle::standard(stream).map(Handle::new)
    }

    /// The kind of the handle.
    pub fn kind(&self) -> HandleKind {
        self.file.kind()
    }

    /// The state behind the handle.
    pub fn file(&self) -> &FileHandle {
        &self.file
    }

    /// The operations table the handle dispatches through.
    pub fn operations(&self) -> &'static OperationsTable {
        self.operations
    }

    fn entry<T>(&self, entry: Option<T>, operation: Operation) -> Result<T, HandleError> {
        entry.ok_or_else(|| {
            warn!(target: TAG, "{} is not supported for {}", operation, self.file.path().display());
            HandleError::Unsupported(operation)
        })
    }

    /// Whether the handle refers to an open file.
    pub fn is_handled(&self) -> bool {
        self.operations
            .is_handled
            .map_or(false, |is_handled| is_handled(&self.file))
    }

    /// The underlying descriptor (`GetFileDescriptor`).
    pub fn descriptor(&self) -> Result<RawFd, HandleError> {
        let descriptor = self.entry(self.operations.descriptor, Operation::GetFileDescriptor)?;
        descriptor(&self.file)
            .ok_or_else(|| HandleError::Os(OsError::new("fileno", libc::EBADF)))
    }

    /// Read exactly `buffer.len()` bytes (`ReadFile`).
    pub fn read(&mut self, buffer: &mut [u8], overlapped: Option<&Overlapped>) -> Result<usize, HandleError> {
        let read = self.entry(self.operations.read, Operation::ReadFile)?;
        Ok(read(&mut self.file, buffer, overlapped)?)
    }

    /// Write all of `buffer` (`WriteFile`).
    pub fn write(&mut self, buffer: &[u8], overlapped: Option<&Overlapped>) -> Result<usize, HandleError> {
        let write = self.entry(self.operations.write, Operation::WriteFile)?;
        Ok(write(&mut self.file, buffer, overlapped)?)
    }

    /// The size of the file, keeping the position (`GetFileSize`).
    pub fn size(&mut self) -> Result<u64, HandleError> {
        let size = self.entry(self.operations.size, Operation::GetFileSize)?;
        Ok(size(&mut self.file)?)
    }

    /// Truncate or extend the file to the current position (`SetEndOfFile`).
    pub fn set_end_of_file(&mut self) -> Result<(), HandleError> {
        let set_end_of_file = self.entry(self.operations.set_end_of_file, Operation::SetEndOfFile)?;
        Ok(set_end_of_file(&mut self.file)?)
    }

    /// Move the position and return the new absolute position (`SetFilePointer`).
    pub fn seek(&mut self, distance: i64, origin: SeekOrigin) -> Result<u64, HandleError> {
        let seek = self.entry(self.operations.seek, Operation::SetFilePointer)?;
        Ok(seek(&mut self.file, distance, origin)?)
    }

    /// Take a whole-file advisory lock (`LockFileEx`). Byte ranges are not supported.
    pub fn lock(&mut self, flags: LockFlags, overlapped: Option<&Overlapped>) -> Result<(), HandleError> {
        let lock = self.entry(self.operations.lock, Operation::LockFileEx)?;
        Ok(lock(&mut self.file, flags, overlapped)?)
    }

    /// Release the lock (`UnlockFile`).
    pub fn unlock(&mut self) -> Result<(), HandleError> {
        let unlock = self.entry(self.operations.unlock, Operation::UnlockFile)?;
        Ok(unlock(&mut self.file)?)
    }

    /// Release the lock (`UnlockFileEx`).
    pub fn unlock_ex(&mut self, overlapped: Option<&Overlapped>) -> Result<(), HandleError> {
        let unlock_ex = self.entry(self.operations.unlock_ex, Operation::UnlockFileEx)?;
        Ok(unlock_ex(&mut self.file, overlapped)?)
    }

    /// Set the timestamps (`SetFileTime`). The creation time is ignored.
    pub fn set_times(
        &mut self,
        creation: Option<&FileTime>,
        last_access: Option<&FileTime>,
        last_write: Option<&FileTime>,
    ) -> Result<(), HandleError> {
        let set_times = self.entry(self.operations.set_times, Operation::SetFileTime)?;
        Ok(set_times(&mut self.file, creation, last_access, last_write)?)
    }

    /// Query the timestamps (`GetFileTime`).
    pub fn times(&mut self) -> Result<FileTimes, HandleError> {
        let times = self.entry(self.operations.times, Operation::GetFileTime)?;
        Ok(times(&mut self.file)?)
    }

    /// Release the handle (`CloseHandle`). Standard streams stay open for the process.
    pub fn close(self) -> Result<(), HandleError> {
        let close = self.entry(self.operations.close, Operation::CloseHandle)?;
        close(self.file);
        Ok(())
    }
}

impl Debug for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Handle")
            .field("file", &self.file)
            .field("kind", &self.file.kind())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Handle;
    use crate::errors::{CreationError, Error, ErrorCode, HandleError};
    use crate::util::time::FileTime;
    use crate::{CreateOptions, CreationDisposition, HandleKind, LockFlags, Operation, SeekOrigin, StandardStream};
    use nix::fcntl::{fcntl, FcntlArg};
    use std::os::unix::io::IntoRawFd;

    #[test]
    fn test_regular_file() {
        let tmp_dir = tempfile::TempDir::new().expect("Unable to create temporary directory");
        let path = tmp_dir.path().join("out.bin");
        let options = CreateOptions::new().disposition(CreationDisposition::CREATE_ALWAYS);

        let mut handle = Handle::create(&path, &options).expect("Creation failed");
        assert_eq!(handle.kind(), HandleKind::RegularFile);
        assert!(handle.is_handled());
        assert!(handle.descriptor().expect("Descriptor missing") > 2);

        assert_eq!(handle.write(b"Hello", None), Ok(5));
        assert_eq!(handle.seek(0, SeekOrigin::Begin), Ok(0));
        assert_eq!(handle.size(), Ok(5));

        let mut buffer = [0u8; 5];
        assert_eq!(handle.read(&mut buffer, None), Ok(5));
        assert_eq!(&buffer, b"Hello");

        handle.close().expect("Closing failed");
        assert_eq!(std::fs::read(&path).expect("Reading failed"), b"Hello");
    }

    #[test]
    fn test_adopted_stream_unsupported() {
        let tmp_dir = tempfile::TempDir::new().expect("Unable to create temporary directory");
        let path = tmp_dir.path().join("stream");
        let fd = std::fs::File::create(&path)
            .expect("Creating file failed")
            .into_raw_fd();

        let mut handle = unsafe { Handle::from_descriptor(fd) }.expect("Adopting failed");
        assert_eq!(handle.kind(), HandleKind::AdoptedStream);
        assert_eq!(handle.descriptor(), Ok(fd));

        assert_eq!(
            handle.seek(0, SeekOrigin::Begin),
            Err(HandleError::Unsupported(Operation::SetFilePointer))
        );
        assert_eq!(
            handle.lock(LockFlags::EXCLUSIVE_LOCK, None),
            Err(HandleError::Unsupported(Operation::LockFileEx))
        );
        assert_eq!(handle.size(), Err(HandleError::Unsupported(Operation::GetFileSize)));
        assert_eq!(
            handle.set_times(None, Some(&FileTime::from_ticks(0)), None),
            Err(HandleError::Unsupported(Operation::SetFileTime))
        );
        assert_eq!(
            handle.times().map_err(|error| error.error_code()),
            Err(ErrorCode::NotSupported)
        );

        // Write-only descriptors are adopted for writing.
        assert_eq!(handle.write(b"abc", None), Ok(3));
        let mut buffer = [0u8; 1];
        assert_eq!(
            handle.read(&mut buffer, None).map_err(|error| error.error_code()),
            Err(ErrorCode::AccessDenied)
        );

        handle.close().expect("Closing failed");
        assert_eq!(std::fs::read(&path).expect("Reading failed"), b"abc");
    }

    #[test]
    fn test_invalid_descriptor() {
        let error = unsafe { Handle::from_descriptor(987_654) }.expect_err("Adopting succeeded");
        assert_eq!(error, CreationError::InvalidDescriptor(987_654));
        assert_eq!(error.error_code(), ErrorCode::InvalidHandle);
    }

    #[test]
    fn test_standard_stream_survives_close() {
        let handle = Handle::standard(StandardStream::Error).expect("Wrapping stderr failed");
        assert_eq!(handle.kind(), HandleKind::AdoptedStream);
        assert_eq!(handle.descriptor(), Ok(2));
        handle.close().expect("Closing failed");

        assert!(fcntl(2, FcntlArg::F_GETFD).is_ok());
    }
}
