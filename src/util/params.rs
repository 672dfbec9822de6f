use std::convert::TryFrom;
use std::io::SeekFrom;
use std::os::unix::io::RawFd;

use super::{CreationDisposition, DesiredAccess, FileAttributes, ShareMode};
use crate::errors::PositionError;

/// The parameters of `CreateFile`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateOptions {
    access: DesiredAccess,
    share: ShareMode,
    disposition: CreationDisposition,
    attributes: FileAttributes,
}

impl Default for CreateOptions {
    fn default() -> Self {
        CreateOptions {
            access: DesiredAccess::GENERIC_READ | DesiredAccess::GENERIC_WRITE,
            share: ShareMode::empty(),
            disposition: CreationDisposition::OPEN_EXISTING,
            attributes: FileAttributes::NORMAL,
        }
    }
}

impl CreateOptions {
    /// Options with read/write access, no sharing and `OPEN_EXISTING`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the desired access.
    pub fn access(mut self, access: DesiredAccess) -> Self {
        self.access = access;
        self
    }

    /// Set the share mode.
    pub fn share(mut self, share: ShareMode) -> Self {
        self.share = share;
        self
    }

    /// Set the creation disposition.
    pub fn disposition(mut self, disposition: CreationDisposition) -> Self {
        self.disposition = disposition;
        self
    }

    /// Set the flags and attributes.
    pub fn attributes(mut self, attributes: FileAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// The desired access.
    pub fn desired_access(&self) -> DesiredAccess {
        self.access
    }

    /// The share mode.
    pub fn share_mode(&self) -> ShareMode {
        self.share
    }

    /// The creation disposition.
    pub fn creation_disposition(&self) -> CreationDisposition {
        self.disposition
    }

    /// The flags and attributes.
    pub fn flags_and_attributes(&self) -> FileAttributes {
        self.attributes
    }
}

/// The origin of `SetFilePointer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum SeekOrigin {
    /// `FILE_BEGIN`
    Begin = 0,
    /// `FILE_CURRENT`
    Current = 1,
    /// `FILE_END`
    End = 2,
}

impl TryFrom<u32> for SeekOrigin {
    type Error = PositionError;

    fn try_from(move_method: u32) -> Result<Self, Self::Error> {
        match move_method {
            0 => Ok(SeekOrigin::Begin),
            1 => Ok(SeekOrigin::Current),
            2 => Ok(SeekOrigin::End),
            unknown => Err(PositionError::InvalidMoveMethod(unknown)),
        }
    }
}

impl SeekOrigin {
    pub(crate) fn seek_from(self, distance: i64) -> Result<SeekFrom, PositionError> {
        Ok(match self {
            SeekOrigin::Begin => SeekFrom::Start(
                u64::try_from(distance).map_err(|_| PositionError::Negative(distance))?,
            ),
            SeekOrigin::Current => SeekFrom::Current(distance),
            SeekOrigin::End => SeekFrom::End(distance),
        })
    }
}

/// One of the three standard streams.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StandardStream {
    /// `STD_INPUT_HANDLE`
    Input,
    /// `STD_OUTPUT_HANDLE`
    Output,
    /// `STD_ERROR_HANDLE`
    Error,
}

impl StandardStream {
    /// `STD_INPUT_HANDLE`, i.e. `(DWORD)-10`.
    pub const STD_INPUT_HANDLE: u32 = -10i32 as u32;
    /// `STD_OUTPUT_HANDLE`, i.e. `(DWORD)-11`.
    pub const STD_OUTPUT_HANDLE: u32 = -11i32 as u32;
    /// `STD_ERROR_HANDLE`, i.e. `(DWORD)-12`.
    pub const STD_ERROR_HANDLE: u32 = -12i32 as u32;

    /// Map the `GetStdHandle` selector.
    pub fn from_raw(std_handle: u32) -> Option<Self> {
        match std_handle {
            Self::STD_INPUT_HANDLE => Some(StandardStream::Input),
            Self::STD_OUTPUT_HANDLE => Some(StandardStream::Output),
            Self::STD_ERROR_HANDLE => Some(StandardStream::Error),
            _ => None,
        }
    }

    /// The process-wide descriptor of the stream.
    pub fn descriptor(self) -> RawFd {
        match self {
            StandardStream::Input => libc::STDIN_FILENO,
            StandardStream::Output => libc::STDOUT_FILENO,
            StandardStream::Error => libc::STDERR_FILENO,
        }
    }
}

/// An overlapped request. Accepted only to be rejected: no asynchronous completion exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Overlapped {
    /// The file offset the request was aimed at.
    pub offset: u64,
}
