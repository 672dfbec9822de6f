use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::fs::{File, OpenOptions};
use std::io::{Error as IoError, Read, Seek, SeekFrom, Write};
use std::os::unix::fs::{MetadataExt, OpenOptionsExt};
use std::os::unix::io::{AsRawFd, FromRawFd, IntoRawFd, RawFd};
use std::path::{Path, PathBuf};

use log::{debug, error, warn};
use nix::fcntl::{Flock, FlockArg, OFlag};

use super::errors::{CreationError, LockError, OsError, PositionError, TransferError};
use super::sys;
use super::util::time::{FileTime, FileTimes, HostTime};
use super::util::{
    resolve, CreateOptions, CreationDisposition, DesiredAccess, FileAttributes, LockFlags,
    Overlapped, Resolution, SeekOrigin, ShareMode, StandardStream,
};
use super::TAG;

/// Descriptors at or below this number are the standard streams and are never closed.
const LAST_STANDARD_DESCRIPTOR: RawFd = 2;

/// The kind of a handle, selecting the operations it supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// A file opened by path. Supports every operation.
    RegularFile,
    /// An already open descriptor such as a standard stream. Supports reading, writing and closing.
    AdoptedStream,
}

/// The direction a stream was opened for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    ReadWrite,
    Read,
    Write,
}

impl Direction {
    fn readable(self) -> bool {
        self != Direction::Write
    }

    fn writable(self) -> bool {
        self != Direction::Read
    }
}

/// An open stream. While the handle holds a lock, the stream lives inside its `Flock`.
enum Stream {
    Unlocked(File),
    Locked(Flock<File>),
}

impl Stream {
    fn file(&self) -> &File {
        match self {
            Stream::Unlocked(file) => file,
            Stream::Locked(locked) => &**locked,
        }
    }

    fn file_mut(&mut self) -> &mut File {
        match self {
            Stream::Unlocked(file) => file,
            Stream::Locked(locked) => &mut **locked,
        }
    }
}

impl Debug for Stream {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Stream::Unlocked(_) => write!(f, "Unlocked({})", self.file().as_raw_fd()),
            Stream::Locked(_) => write!(f, "Locked({})", self.file().as_raw_fd()),
        }
    }
}

/// The state behind a handle: the stream and the name it was opened under.
#[derive(Debug)]
pub struct FileHandle {
    stream: Option<Stream>,
    path: PathBuf,
    access: DesiredAccess,
    share: ShareMode,
    disposition: CreationDisposition,
    attributes: FileAttributes,
    direction: Direction,
    kind: HandleKind,
}

impl FileHandle {
    /// Open or create a file by path, following the disposition and share mode.
    pub(crate) fn create(path: &Path, options: &CreateOptions) -> Result<FileHandle, CreationError> {
        let resolution = resolve(options.desired_access(), options.creation_disposition());
        let path = owned_path(path.as_os_str().len(), |owned| owned.push(path))?;

        let stream = match open_stream(&path, &resolution) {
            Ok(stream) => stream,
            Err(error) => {
                // A missing file under a non-creating disposition ends up here as well.
                return Err(CreationError::Open(report(&path, error)));
            }
        };

        let mut file = FileHandle {
            stream: Some(Stream::Unlocked(stream)),
            path,
            access: options.desired_access(),
            share: options.share_mode(),
            disposition: options.creation_disposition(),
            attributes: options.flags_and_attributes(),
            direction: Direction::ReadWrite,
            kind: HandleKind::RegularFile,
        };

        if let Some(arg) = options.share_mode().lock_arg() {
            if let Err(error) = file.flock(arg) {
                let error = file.report(error);
                file.close();
                return Err(CreationError::SharingViolation(error));
            }
        }

        debug!(target: TAG, "Opened {} with mode {}", file.path.display(), resolution.mode);
        Ok(file)
    }

    /// Take ownership of an open descriptor.
    ///
    /// # Safety
    ///
    /// `fd` must not be owned by anything else: the handle closes it (unless it is a standard stream).
    pub(crate) unsafe fn adopt(fd: RawFd) -> Result<FileHandle, CreationError> {
        let direction = if access_mode(fd)? == OFlag::O_WRONLY {
            Direction::Write
        } else {
            Direction::Read
        };
        FileHandle::wrap_descriptor(fd, direction)
    }

    /// Wrap one of the process's standard streams.
    pub(crate) fn standard(stream: StandardStream) -> Result<FileHandle, CreationError> {
        let fd = stream.descriptor();
        access_mode(fd)?;
        let direction = match stream {
            StandardStream::Input => Direction::Read,
            StandardStream::Output | StandardStream::Error => Direction::Write,
        };
        // SAFETY: the descriptor is open and, being a standard stream, is never closed by `release`.
        unsafe { FileHandle::wrap_descriptor(fd, direction) }
    }

    unsafe fn wrap_descriptor(fd: RawFd, direction: Direction) -> Result<FileHandle, CreationError> {
        let name = format!("device_{}", fd);
        let path = owned_path(name.len(), |owned| owned.push(&name))?;
        debug!(target: TAG, "Adopted descriptor {} for {:?}", fd, direction);
        Ok(FileHandle {
            stream: Some(Stream::Unlocked(File::from_raw_fd(fd))),
            path,
            access: DesiredAccess::empty(),
            share: ShareMode::empty(),
            disposition: CreationDisposition(0),
            attributes: FileAttributes::empty(),
            direction,
            kind: HandleKind::AdoptedStream,
        })
    }

    /// The name the handle was opened under (`device_<fd>` for adopted streams).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The kind of the handle.
    pub fn kind(&self) -> HandleKind {
        self.kind
    }

    /// Whether this handle currently holds an advisory lock.
    pub fn is_locked(&self) -> bool {
        matches!(self.stream, Some(Stream::Locked(_)))
    }

    /// The access requested on creation.
    pub fn desired_access(&self) -> DesiredAccess {
        self.access
    }

    /// The share mode requested on creation.
    pub fn share_mode(&self) -> ShareMode {
        self.share
    }

    /// The creation disposition requested on creation.
    pub fn creation_disposition(&self) -> CreationDisposition {
        self.disposition
    }

    /// The flags and attributes requested on creation.
    pub fn flags_and_attributes(&self) -> FileAttributes {
        self.attributes
    }

    fn stream(&mut self) -> Result<&mut File, OsError> {
        self.stream
            .as_mut()
            .map(Stream::file_mut)
            .ok_or_else(|| OsError::new("stream", libc::EBADF))
    }

    fn report(&self, error: OsError) -> OsError {
        report(&self.path, error)
    }

    /// Move the stream into a `Flock`. The caller checks that no lock is held yet.
    fn flock(&mut self, arg: FlockArg) -> Result<(), OsError> {
        let (stream, result) = match self.stream.take() {
            Some(Stream::Unlocked(file)) => match sys::lock(file, arg) {
                Ok(locked) => (Stream::Locked(locked), Ok(())),
                Err((file, error)) => (Stream::Unlocked(file), Err(error)),
            },
            Some(stream) => (stream, Err(OsError::new("flock", libc::EINVAL))),
            None => return Err(OsError::new("stream", libc::EBADF)),
        };
        self.stream = Some(stream);
        result
    }

    /// Move the stream out of its `Flock`.
    fn funlock(&mut self) -> Result<(), OsError> {
        let (stream, result) = match self.stream.take() {
            Some(Stream::Locked(locked)) => match sys::unlock(locked) {
                Ok(file) => (Stream::Unlocked(file), Ok(())),
                Err((locked, error)) => (Stream::Locked(locked), Err(error)),
            },
            Some(stream) => (stream, Err(OsError::new("flock", libc::EINVAL))),
            None => return Err(OsError::new("stream", libc::EBADF)),
        };
        self.stream = Some(stream);
        result
    }

    pub(crate) fn is_handled(&self) -> bool {
        self.stream.is_some()
    }

    pub(crate) fn descriptor(&self) -> Option<RawFd> {
        self.stream.as_ref().map(|stream| stream.file().as_raw_fd())
    }

    /// Read exactly `buffer.len()` bytes.
    pub(crate) fn read(&mut self, buffer: &mut [u8], overlapped: Option<&Overlapped>) -> Result<usize, TransferError> {
        if overlapped.is_some() {
            error!(target: TAG, "Overlapped read not supported.");
            return Err(TransferError::Overlapped);
        }
        if !self.direction.readable() {
            return Err(TransferError::WrongDirection("reading"));
        }

        let requested = buffer.len();
        let (transferred, failure) = transfer(requested, |offset| self.stream()?.read(&mut buffer[offset..]).map_err(|error| OsError::from_io("fread", &error)));
        match failure {
            None if transferred == requested => Ok(requested),
            None => Err(TransferError::EndOfFile { requested, transferred }),
            Some(error) if is_would_block(&error) => Err(TransferError::WouldBlock),
            Some(error) => Err(self.report(error).into()),
        }
    }

    /// Write all of `buffer`.
    pub(crate) fn write(&mut self, buffer: &[u8], overlapped: Option<&Overlapped>) -> Result<usize, TransferError> {
        if overlapped.is_some() {
            error!(target: TAG, "Overlapped write not supported.");
            return Err(TransferError::Overlapped);
        }
        if !self.direction.writable() {
            return Err(TransferError::WrongDirection("writing"));
        }

        let requested = buffer.len();
        let (transferred, failure) = transfer(requested, |offset| self.stream()?.write(&buffer[offset..]).map_err(|error| OsError::from_io("fwrite", &error)));
        match failure {
            None if transferred == requested => Ok(requested),
            None => Err(TransferError::ShortWrite { requested, transferred }),
            Some(error) => Err(self.report(error).into()),
        }
    }

    /// Move the position and return the new absolute position.
    pub(crate) fn seek(&mut self, distance: i64, origin: SeekOrigin) -> Result<u64, PositionError> {
        let target = origin.seek_from(distance)?;
        let result = self.stream().and_then(|stream| {
            stream
                .seek(target)
                .map_err(|error| OsError::from_io("fseek", &error))
        });
        result.map_err(|error| self.report(error).into())
    }

    /// The size of the file.
    ///
    /// Implemented by seeking to the end and back to the saved position. The three steps are not
    /// atomic: another user of the same handle moving the position in between corrupts the result.
    pub(crate) fn size(&mut self) -> Result<u64, PositionError> {
        let result = self.stream().and_then(|stream| {
            let current = stream
                .stream_position()
                .map_err(|error| OsError::from_io("ftell", &error))?;
            let size = stream
                .seek(SeekFrom::End(0))
                .map_err(|error| OsError::from_io("fseek", &error))?;
            stream
                .seek(SeekFrom::Start(current))
                .map_err(|error| OsError::from_io("fseek", &error))?;
            Ok(size)
        });
        result.map_err(|error| self.report(error).into())
    }

    /// Truncate or extend the file to the current position.
    pub(crate) fn set_end_of_file(&mut self) -> Result<(), PositionError> {
        let result = self.stream().and_then(|stream| {
            let size = stream
                .stream_position()
                .map_err(|error| OsError::from_io("ftell", &error))?;
            stream
                .set_len(size)
                .map_err(|error| OsError::from_io("ftruncate", &error))
        });
        result.map_err(|error| self.report(error).into())
    }

    /// Take a whole-file advisory lock.
    pub(crate) fn lock(&mut self, flags: LockFlags, overlapped: Option<&Overlapped>) -> Result<(), LockError> {
        if self.is_locked() {
            error!(target: TAG, "File {} already locked!", self.path.display());
            return Err(LockError::AlreadyLocked);
        }
        if overlapped.is_some() {
            error!(target: TAG, "Overlapped locking of {} not implemented!", self.path.display());
            return Err(LockError::Overlapped);
        }

        self.flock(flags.lock_arg())
            .map_err(|error| self.report(error))
            .map_err(LockError::from)
    }

    /// Release the lock taken by this handle.
    pub(crate) fn unlock(&mut self) -> Result<(), LockError> {
        self.unlock_ex(None)
    }

    /// Release the lock taken by this handle, rejecting overlapped requests.
    pub(crate) fn unlock_ex(&mut self, overlapped: Option<&Overlapped>) -> Result<(), LockError> {
        if !self.is_locked() {
            error!(target: TAG, "File {} is not locked!", self.path.display());
            return Err(LockError::NotLocked);
        }
        if overlapped.is_some() {
            error!(target: TAG, "Overlapped unlocking of {} not implemented!", self.path.display());
            return Err(LockError::Overlapped);
        }

        self.funlock()
            .map_err(|error| self.report(error))
            .map_err(LockError::from)
    }

    /// Set the last access and last write time. Absent times are kept; the creation time cannot
    /// be set on POSIX and is ignored.
    pub(crate) fn set_times(
        &mut self,
        creation: Option<&FileTime>,
        last_access: Option<&FileTime>,
        last_write: Option<&FileTime>,
    ) -> Result<(), OsError> {
        if creation.is_some() {
            debug!(target: TAG, "Ignoring creation time of {}", self.path.display());
        }

        let last_access = last_access.map(|time| time.to_host(sys::PRECISION));
        let last_write = last_write.map(|time| time.to_host(sys::PRECISION));
        let result = match self.stream.as_ref() {
            Some(stream) => sys::set_file_times(stream.file(), &self.path, last_access, last_write),
            None => Err(OsError::new("stream", libc::EBADF)),
        };
        result.map_err(|error| self.report(error))
    }

    /// The timestamps of the file.
    pub(crate) fn times(&mut self) -> Result<FileTimes, OsError> {
        let result = self.stream().and_then(|stream| {
            stream
                .metadata()
                .map_err(|error| OsError::from_io("fstat", &error))
        });
        let metadata = result.map_err(|error| self.report(error))?;

        Ok(FileTimes {
            creation: metadata.created().ok().map(FileTime::from),
            last_access: FileTime::from_host(HostTime::new(
                metadata.atime(),
                metadata.atime_nsec() as u32,
            )),
            last_write: FileTime::from_host(HostTime::new(
                metadata.mtime(),
                metadata.mtime_nsec() as u32,
            )),
        })
    }

    /// Release the stream (unless it is a standard stream) and the record.
    pub(crate) fn close(mut self) {
        if let Some(stream) = self.stream.take() {
            release(stream, &self.path);
        }
        debug!(target: TAG, "Closed {}", self.path.display());
    }
}

impl Drop for FileHandle {
    fn drop(&mut self) {
        if let Some(stream) = self.stream.take() {
            release(stream, &self.path);
        }
    }
}

fn report(path: &Path, error: OsError) -> OsError {
    error!(target: TAG, "{}({}) failed with {} [{:08X}]", error.call(), path.display(),
        IoError::from_raw_os_error(error.errno()), error.errno());
    error
}

/// The access mode of an adopted descriptor.
fn access_mode(fd: RawFd) -> Result<OFlag, CreationError> {
    sys::access_mode(fd).map_err(|error| {
        error!(target: TAG, "Querying descriptor {} failed: {}", fd, error);
        error
    })
}

/// Copy a name into a freshly allocated buffer, reporting exhaustion instead of aborting.
fn owned_path<F: FnOnce(&mut PathBuf)>(length: usize, fill: F) -> Result<PathBuf, CreationError> {
    let mut owned = PathBuf::new();
    owned
        .try_reserve_exact(length)
        .map_err(|_| CreationError::OutOfMemory)?;
    fill(&mut owned);
    Ok(owned)
}

fn open_stream(path: &Path, resolution: &Resolution) -> Result<File, OsError> {
    if resolution.pre_create {
        // Create the file without touching existing content, then reopen with the real mode.
        if let Err(error) = OpenOptions::new()
            .append(true)
            .create(true)
            .mode(0o666)
            .open(path)
        {
            debug!(target: TAG, "Pre-creating {} failed ({}), opening directly", path.display(), error);
        }
    }

    resolution
        .mode
        .options()
        .open(path)
        .map_err(|error| OsError::from_io("fopen", &error))
}

/// Repeat `step` until `requested` bytes moved, the stream is exhausted or an error occurs.
/// Interrupted calls are retried.
fn transfer<F>(requested: usize, mut step: F) -> (usize, Option<OsError>)
where
    F: FnMut(usize) -> Result<usize, OsError>,
{
    let mut transferred = 0;
    while transferred < requested {
        match step(transferred) {
            Ok(0) => break,
            Ok(size) => transferred += size,
            Err(error) if error.errno() == libc::EINTR => {
                // Just try again...
            }
            Err(error) => return (transferred, Some(error)),
        }
    }
    (transferred, None)
}

fn is_would_block(error: &OsError) -> bool {
    error.errno() == libc::EWOULDBLOCK || error.errno() == libc::EAGAIN
}

fn release(stream: Stream, path: &Path) {
    let file = match stream {
        Stream::Unlocked(file) => file,
        Stream::Locked(locked) => match sys::unlock(locked) {
            Ok(file) => file,
            Err((locked, error)) => {
                warn!(target: TAG, "Unlocking {} failed with {}", path.display(), error);
                drop(locked);
                return;
            }
        },
    };

    let fd = file.into_raw_fd();
    if fd <= LAST_STANDARD_DESCRIPTOR {
        // Shared with the rest of the process.
        return;
    }
    if let Err(error) = sys::close(fd) {
        warn!(target: TAG, "Closing {} failed with {}", path.display(), error);
    }
}
