//! Host calls the standard library does not offer, through the safe `nix` wrappers.

use std::fs::File;
use std::os::unix::io::RawFd;
use std::path::Path;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, Flock, FlockArg, OFlag};

use crate::errors::{CreationError, OsError};
use crate::util::time::{HostTime, Precision};

pub(crate) use self::times::{set_file_times, PRECISION};

/// Apply an advisory whole-file lock. A refused lock hands the file back.
pub(crate) fn lock(file: File, arg: FlockArg) -> Result<Flock<File>, (File, OsError)> {
    Flock::lock(file, arg).map_err(|(file, errno)| (file, OsError::from_errno("flock", errno)))
}

/// Release the lock. A failed release keeps the lock and hands it back.
pub(crate) fn unlock(locked: Flock<File>) -> Result<File, (Flock<File>, OsError)> {
    locked
        .unlock()
        .map_err(|(locked, errno)| (locked, OsError::from_errno("flock", errno)))
}

/// Close a descriptor released from its owner.
pub(crate) fn close(fd: RawFd) -> Result<(), OsError> {
    nix::unistd::close(fd).map_err(|errno| OsError::from_errno("close", errno))
}

/// The access mode (`O_RDONLY`, `O_WRONLY` or `O_RDWR`) of an open descriptor.
pub(crate) fn access_mode(fd: RawFd) -> Result<OFlag, CreationError> {
    if let Err(Errno::EBADF) = fcntl(fd, FcntlArg::F_GETFD) {
        return Err(CreationError::InvalidDescriptor(fd));
    }

    let flags = fcntl(fd, FcntlArg::F_GETFL)
        .map_err(|errno| CreationError::Descriptor(OsError::from_errno("fcntl(F_GETFL)", errno)))?;
    Ok(OFlag::from_bits_truncate(flags) & OFlag::O_ACCMODE)
}

#[cfg(not(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "android",
    target_os = "freebsd"
)))]
mod times {
    use super::*;
    use nix::sys::stat::futimens;
    use nix::sys::time::TimeSpec;
    use std::os::unix::io::AsRawFd;

    pub(crate) const PRECISION: Precision = Precision::Nanoseconds;

    fn timespec(time: Option<HostTime>) -> TimeSpec {
        match time {
            Some(time) => TimeSpec::new(time.seconds() as libc::time_t, time.nanoseconds() as _),
            None => TimeSpec::UTIME_OMIT,
        }
    }

    /// Set the access and modification time; absent values stay untouched.
    pub(crate) fn set_file_times(
        file: &File,
        _path: &Path,
        access: Option<HostTime>,
        write: Option<HostTime>,
    ) -> Result<(), OsError> {
        futimens(file.as_raw_fd(), &timespec(access), &timespec(write))
            .map_err(|errno| OsError::from_errno("futimens", errno))
    }
}

#[cfg(any(
    target_os = "macos",
    target_os = "ios",
    target_os = "android",
    target_os = "freebsd"
))]
mod times {
    use super::*;
    use nix::sys::stat::utimes;
    use nix::sys::time::TimeVal;
    use std::os::unix::fs::MetadataExt;

    pub(crate) const PRECISION: Precision = Precision::Microseconds;

    fn timeval(time: HostTime) -> TimeVal {
        TimeVal::new(time.seconds() as libc::time_t, time.microseconds() as libc::suseconds_t)
    }

    fn current(file: &File) -> Result<(HostTime, HostTime), OsError> {
        let metadata = file
            .metadata()
            .map_err(|error| OsError::from_io("fstat", &error))?;
        Ok((
            HostTime::new(metadata.atime(), metadata.atime_nsec() as u32),
            HostTime::new(metadata.mtime(), metadata.mtime_nsec() as u32),
        ))
    }

    /// Set the access and modification time by path; absent values are preserved from `fstat`.
    pub(crate) fn set_file_times(
        file: &File,
        path: &Path,
        access: Option<HostTime>,
        write: Option<HostTime>,
    ) -> Result<(), OsError> {
        let (current_access, current_write) = current(file)?;
        utimes(
            path,
            &timeval(access.unwrap_or(current_access)),
            &timeval(write.unwrap_or(current_write)),
        )
        .map_err(|errno| OsError::from_errno("utimes", errno))
    }
}
