//! The Windows file API as a C ABI over the `winfile` core.
//!
//! Failing calls return the Windows failure value (`FALSE`, `INVALID_HANDLE_VALUE`,
//! `INVALID_FILE_SIZE`, ...) and leave the reason in the calling thread's last-error register.
#![allow(clippy::missing_safety_doc)] // Well, using C-pointers *is* unsafe...
#![allow(non_snake_case, non_camel_case_types)]

use std::cell::Cell;
use std::ffi::{c_void, CStr, OsStr};
use std::os::raw::{c_char, c_int};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use const_format::concatcp;
use log::{debug, error};

use winfile::errors::{Error, ErrorCode, HandleError, TransferError};
use winfile::time::FileTime;
use winfile::{
    CreateOptions, CreationDisposition, DesiredAccess, FileAttributes, Handle, LockFlags,
    Overlapped, SeekOrigin, ShareMode, StandardStream,
};

/// `BOOL`
pub type BOOL = c_int;
/// `DWORD`
pub type DWORD = u32;
/// `LONG`
pub type LONG = i32;
/// `HANDLE`
pub type HANDLE = *mut FileHandle;

/// `TRUE`
pub const TRUE: BOOL = 1;
/// `FALSE`
pub const FALSE: BOOL = 0;
/// Returned by `SetFilePointer` on failure.
pub const INVALID_SET_FILE_POINTER: DWORD = 0xFFFF_FFFF;
/// Returned by `GetFileSize` on failure.
pub const INVALID_FILE_SIZE: DWORD = 0xFFFF_FFFF;
/// cbindgen:ignore
pub const INVALID_HANDLE_VALUE: HANDLE = usize::MAX as HANDLE;

/// The log target of the C surface.
const TAG: &str = concatcp!(env!("CARGO_PKG_NAME"), ".api");

thread_local! {
    static LAST_ERROR: Cell<DWORD> = Cell::new(0);
}

/// The handle to a file.
pub struct FileHandle(Handle);

/// A Windows file time: 100-nanosecond ticks since 1601-01-01, split into two halves.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FILETIME {
    /// The lower 32 bits.
    pub dwLowDateTime: DWORD,
    /// The upper 32 bits.
    pub dwHighDateTime: DWORD,
}

impl From<FILETIME> for FileTime {
    fn from(value: FILETIME) -> Self {
        FileTime {
            low_date_time: value.dwLowDateTime,
            high_date_time: value.dwHighDateTime,
        }
    }
}

impl From<FileTime> for FILETIME {
    fn from(value: FileTime) -> Self {
        FILETIME {
            dwLowDateTime: value.low_date_time,
            dwHighDateTime: value.high_date_time,
        }
    }
}

/// The parameters of an asynchronous request. Asynchronous I/O is not supported: passing one
/// makes the call fail with `ERROR_NOT_SUPPORTED`.
#[repr(C)]
pub struct OVERLAPPED {
    /// Reserved.
    pub Internal: usize,
    /// Reserved.
    pub InternalHigh: usize,
    /// The lower half of the file offset.
    pub Offset: DWORD,
    /// The upper half of the file offset.
    pub OffsetHigh: DWORD,
    /// The event signalled on completion.
    pub hEvent: *mut c_void,
}

impl From<&OVERLAPPED> for Overlapped {
    fn from(value: &OVERLAPPED) -> Self {
        Overlapped {
            offset: (u64::from(value.OffsetHigh) << 32) | u64::from(value.Offset),
        }
    }
}

struct Environment;

impl Environment {
    pub fn execute<T, C: FnOnce() -> Result<T, ErrorCode>>(body: C) -> Option<T> {
        match body() {
            Ok(value) => Some(value),
            Err(code) => {
                Environment::fail(code);
                None
            }
        }
    }

    pub fn status<C: FnOnce() -> Result<(), ErrorCode>>(body: C) -> BOOL {
        match Environment::execute(body) {
            Some(()) => TRUE,
            None => FALSE,
        }
    }

    pub fn create_handle<C: FnOnce() -> Result<Handle, ErrorCode>>(body: C) -> HANDLE {
        match Environment::execute(body) {
            Some(handle) => Box::into_raw(Box::new(FileHandle(handle))),
            None => INVALID_HANDLE_VALUE,
        }
    }

    pub fn fail(code: ErrorCode) {
        debug!(target: TAG, "Failing with {}", code);
        LAST_ERROR.with(|last_error| last_error.set(code.code()));
    }

    pub fn code<E: Error>(error: E) -> ErrorCode {
        error.error_code()
    }

    pub unsafe fn handle<'a>(handle: HANDLE) -> Result<&'a mut Handle, ErrorCode> {
        if handle == INVALID_HANDLE_VALUE || handle.is_null() {
            error!(target: TAG, "Invalid handle passed");
            return Err(ErrorCode::InvalidHandle);
        }
        Ok(&mut (*handle).0)
    }

    pub unsafe fn parse_path<'a>(c_string: *const c_char) -> Result<&'a Path, ErrorCode> {
        (!c_string.is_null())
            .then(|| CStr::from_ptr(c_string))
            .map(|raw_str| Path::new(OsStr::from_bytes(raw_str.to_bytes())))
            .ok_or(ErrorCode::InvalidParameter)
    }

    pub unsafe fn write<T>(pointer: *mut T, value: T) {
        if let Some(target) = pointer.as_mut() {
            *target = value;
        }
    }

    pub unsafe fn overlapped(overlapped: *const OVERLAPPED) -> Option<Overlapped> {
        overlapped.as_ref().map(Overlapped::from)
    }
}

/// Return the last-error code of the calling thread.
#[no_mangle]
pub extern "C" fn GetLastError() -> DWORD {
    LAST_ERROR.with(Cell::get)
}

/// Set the last-error code of the calling thread.
///
/// @param dwErrCode The new code.
#[no_mangle]
pub extern "C" fn SetLastError(dwErrCode: DWORD) {
    LAST_ERROR.with(|last_error| last_error.set(dwErrCode));
}

/// Open or create a file.
///
/// @param lpFileName The path of the file.
///
/// @param dwDesiredAccess `GENERIC_READ` and/or `GENERIC_WRITE`.
///
/// @param dwShareMode `FILE_SHARE_READ` takes a shared, `FILE_SHARE_WRITE` an exclusive advisory lock.
///
/// @param lpSecurityAttributes Ignored.
///
/// @param dwCreationDisposition One of `CREATE_NEW`, `CREATE_ALWAYS`, `OPEN_EXISTING`, `OPEN_ALWAYS` or `TRUNCATE_EXISTING`.
///
/// @param dwFlagsAndAttributes Recorded on the handle.
///
/// @param hTemplateFile Ignored.
///
/// @return The handle or `INVALID_HANDLE_VALUE` on failure.
#[no_mangle]
pub unsafe extern "C" fn CreateFileA(
    lpFileName: *const c_char,
    dwDesiredAccess: DWORD,
    dwShareMode: DWORD,
    _lpSecurityAttributes: *mut c_void,
    dwCreationDisposition: DWORD,
    dwFlagsAndAttributes: DWORD,
    _hTemplateFile: HANDLE,
) -> HANDLE {
    Environment::create_handle(|| {
        let path = Environment::parse_path(lpFileName)?;
        let options = CreateOptions::new()
            .access(DesiredAccess::from_bits_retain(dwDesiredAccess))
            .share(ShareMode::from_bits_retain(dwShareMode))
            .disposition(CreationDisposition(dwCreationDisposition))
            .attributes(FileAttributes::from_bits_retain(dwFlagsAndAttributes));
        Handle::create(path, &options).map_err(Environment::code)
    })
}

/// Wrap one of the standard streams.
///
/// @param nStdHandle `STD_INPUT_HANDLE`, `STD_OUTPUT_HANDLE` or `STD_ERROR_HANDLE`.
///
/// @return The handle or `INVALID_HANDLE_VALUE` on failure. Closing it keeps the stream open.
#[no_mangle]
pub extern "C" fn GetStdHandle(nStdHandle: DWORD) -> HANDLE {
    Environment::create_handle(|| {
        let stream = StandardStream::from_raw(nStdHandle).ok_or(ErrorCode::InvalidParameter)?;
        Handle::standard(stream).map_err(Environment::code)
    })
}

/// Replacing the standard streams is not supported.
///
/// @return Always `FALSE`.
#[no_mangle]
pub extern "C" fn SetStdHandle(_nStdHandle: DWORD, _hHandle: HANDLE) -> BOOL {
    Environment::fail(ErrorCode::NotSupported);
    FALSE
}

/// Replacing the standard streams is not supported.
///
/// @return Always `FALSE`.
#[no_mangle]
pub extern "C" fn SetStdHandleEx(
    _dwStdHandle: DWORD,
    _hNewHandle: HANDLE,
    _phOldHandle: *mut HANDLE,
) -> BOOL {
    Environment::fail(ErrorCode::NotSupported);
    FALSE
}

/// Adopt an open descriptor. The handle owns it from now on.
///
/// @param fd The descriptor.
///
/// @return The handle or `INVALID_HANDLE_VALUE` if `fd` is not open.
#[no_mangle]
pub unsafe extern "C" fn GetFileHandleForFileDescriptor(fd: c_int) -> HANDLE {
    Environment::create_handle(|| Handle::from_descriptor(fd).map_err(Environment::code))
}

/// Every name is treated as a file.
///
/// @return Always `TRUE`.
#[no_mangle]
pub extern "C" fn IsFileDevice(_lpDeviceName: *const c_char) -> BOOL {
    TRUE
}

/// Read exactly `nNumberOfBytesToRead` bytes.
///
/// @param lpNumberOfBytesRead Receives the requested count whenever the read was attempted, even if it failed.
///
/// @param lpOverlapped Must be nullptr.
///
/// @return `TRUE` if all bytes were read.
#[no_mangle]
pub unsafe extern "C" fn ReadFile(
    hFile: HANDLE,
    lpBuffer: *mut c_void,
    nNumberOfBytesToRead: DWORD,
    lpNumberOfBytesRead: *mut DWORD,
    lpOverlapped: *mut OVERLAPPED,
) -> BOOL {
    Environment::status(|| {
        let handle = Environment::handle(hFile)?;
        let length = nNumberOfBytesToRead as usize;
        let buffer: &mut [u8] = match lpBuffer.is_null() {
            true if length > 0 => return Err(ErrorCode::InvalidParameter),
            true => &mut [],
            false => std::slice::from_raw_parts_mut(lpBuffer as *mut u8, length),
        };

        let result = handle.read(buffer, Environment::overlapped(lpOverlapped).as_ref());
        match &result {
            Err(HandleError::Unsupported(_))
            | Err(HandleError::Transfer(TransferError::Overlapped)) => {}
            _ => Environment::write(lpNumberOfBytesRead, nNumberOfBytesToRead),
        }
        result.map(|_| ()).map_err(Environment::code)
    })
}

/// Write all `nNumberOfBytesToWrite` bytes.
///
/// @param lpNumberOfBytesWritten Receives the count on success only.
///
/// @param lpOverlapped Must be nullptr.
///
/// @return `TRUE` if all bytes were written.
#[no_mangle]
pub unsafe extern "C" fn WriteFile(
    hFile: HANDLE,
    lpBuffer: *const c_void,
    nNumberOfBytesToWrite: DWORD,
    lpNumberOfBytesWritten: *mut DWORD,
    lpOverlapped: *mut OVERLAPPED,
) -> BOOL {
    Environment::status(|| {
        let handle = Environment::handle(hFile)?;
        let length = nNumberOfBytesToWrite as usize;
        let buffer: &[u8] = match lpBuffer.is_null() {
            true if length > 0 => return Err(ErrorCode::InvalidParameter),
            true => &[],
            false => std::slice::from_raw_parts(lpBuffer as *const u8, length),
        };

        handle
            .write(buffer, Environment::overlapped(lpOverlapped).as_ref())
            .map_err(Environment::code)?;
        Environment::write(lpNumberOfBytesWritten, nNumberOfBytesToWrite);
        Ok(())
    })
}

/// Query the size of a file without moving its position.
///
/// @param lpFileSizeHigh Receives the upper half of the size. May be nullptr.
///
/// @return The lower half of the size or `INVALID_FILE_SIZE` on failure.
#[no_mangle]
pub unsafe extern "C" fn GetFileSize(hFile: HANDLE, lpFileSizeHigh: *mut DWORD) -> DWORD {
    Environment::execute(|| {
        let size = Environment::handle(hFile)?
            .size()
            .map_err(Environment::code)?;
        Environment::write(lpFileSizeHigh, (size >> 32) as DWORD);
        Ok(size as DWORD)
    })
    .unwrap_or(INVALID_FILE_SIZE)
}

/// Truncate or extend a file to its current position.
#[no_mangle]
pub unsafe extern "C" fn SetEndOfFile(hFile: HANDLE) -> BOOL {
    Environment::status(|| {
        Environment::handle(hFile)?
            .set_end_of_file()
            .map_err(Environment::code)
    })
}

/// Move the position of a file.
///
/// @param lDistanceToMove The lower half of the distance, or the whole distance if `lpDistanceToMoveHigh` is nullptr.
///
/// @param lpDistanceToMoveHigh The upper half of the distance; receives the upper half of the new position. May be nullptr.
///
/// @param dwMoveMethod `FILE_BEGIN`, `FILE_CURRENT` or `FILE_END`.
///
/// @return The lower half of the new position or `INVALID_SET_FILE_POINTER` on failure.
#[no_mangle]
pub unsafe extern "C" fn SetFilePointer(
    hFile: HANDLE,
    lDistanceToMove: LONG,
    lpDistanceToMoveHigh: *mut LONG,
    dwMoveMethod: DWORD,
) -> DWORD {
    Environment::execute(|| {
        let handle = Environment::handle(hFile)?;
        let origin = SeekOrigin::try_from(dwMoveMethod).map_err(Environment::code)?;
        let distance = match lpDistanceToMoveHigh.as_ref() {
            Some(high) => (i64::from(*high) << 32) | i64::from(lDistanceToMove as u32),
            None => i64::from(lDistanceToMove),
        };

        let position = handle.seek(distance, origin).map_err(Environment::code)?;
        Environment::write(lpDistanceToMoveHigh, (position >> 32) as LONG);
        Ok(position as DWORD)
    })
    .unwrap_or(INVALID_SET_FILE_POINTER)
}

/// Take an advisory lock on the whole file; the byte range is ignored.
///
/// @param dwFlags `LOCKFILE_EXCLUSIVE_LOCK` and/or `LOCKFILE_FAIL_IMMEDIATELY`.
///
/// @param lpOverlapped Must be nullptr.
#[no_mangle]
pub unsafe extern "C" fn LockFileEx(
    hFile: HANDLE,
    dwFlags: DWORD,
    _dwReserved: DWORD,
    _nNumberOfBytesToLockLow: DWORD,
    _nNumberOfBytesToLockHigh: DWORD,
    lpOverlapped: *mut OVERLAPPED,
) -> BOOL {
    Environment::status(|| {
        Environment::handle(hFile)?
            .lock(
                LockFlags::from_bits_retain(dwFlags),
                Environment::overlapped(lpOverlapped).as_ref(),
            )
            .map_err(Environment::code)
    })
}

/// Release the lock taken through this handle; the byte range is ignored.
#[no_mangle]
pub unsafe extern "C" fn UnlockFile(
    hFile: HANDLE,
    _dwFileOffsetLow: DWORD,
    _dwFileOffsetHigh: DWORD,
    _nNumberOfBytesToUnlockLow: DWORD,
    _nNumberOfBytesToUnlockHigh: DWORD,
) -> BOOL {
    Environment::status(|| {
        Environment::handle(hFile)?
            .unlock()
            .map_err(Environment::code)
    })
}

/// Release the lock taken through this handle; the byte range is ignored.
///
/// @param lpOverlapped Must be nullptr.
#[no_mangle]
pub unsafe extern "C" fn UnlockFileEx(
    hFile: HANDLE,
    _dwReserved: DWORD,
    _nNumberOfBytesToUnlockLow: DWORD,
    _nNumberOfBytesToUnlockHigh: DWORD,
    lpOverlapped: *mut OVERLAPPED,
) -> BOOL {
    Environment::status(|| {
        Environment::handle(hFile)?
            .unlock_ex(Environment::overlapped(lpOverlapped).as_ref())
            .map_err(Environment::code)
    })
}

/// Set the timestamps of a file. Null pointers keep the current value; the creation time cannot be set.
#[no_mangle]
pub unsafe extern "C" fn SetFileTime(
    hFile: HANDLE,
    lpCreationTime: *const FILETIME,
    lpLastAccessTime: *const FILETIME,
    lpLastWriteTime: *const FILETIME,
) -> BOOL {
    Environment::status(|| {
        let convert = |time: *const FILETIME| time.as_ref().map(|time| FileTime::from(*time));
        let (creation, last_access, last_write) = (
            convert(lpCreationTime),
            convert(lpLastAccessTime),
            convert(lpLastWriteTime),
        );
        Environment::handle(hFile)?
            .set_times(creation.as_ref(), last_access.as_ref(), last_write.as_ref())
            .map_err(Environment::code)
    })
}

/// Query the timestamps of a file. Null pointers are skipped; without a birth time the
/// creation time receives the last write time.
#[no_mangle]
pub unsafe extern "C" fn GetFileTime(
    hFile: HANDLE,
    lpCreationTime: *mut FILETIME,
    lpLastAccessTime: *mut FILETIME,
    lpLastWriteTime: *mut FILETIME,
) -> BOOL {
    Environment::status(|| {
        let times = Environment::handle(hFile)?
            .times()
            .map_err(Environment::code)?;
        Environment::write(
            lpCreationTime,
            times.creation.unwrap_or(times.last_write).into(),
        );
        Environment::write(lpLastAccessTime, times.last_access.into());
        Environment::write(lpLastWriteTime, times.last_write.into());
        Ok(())
    })
}

/// Return the descriptor behind a handle.
///
/// @return The descriptor or -1 on failure.
#[no_mangle]
pub unsafe extern "C" fn GetFileDescriptor(hFile: HANDLE) -> c_int {
    Environment::execute(|| {
        Environment::handle(hFile)?
            .descriptor()
            .map_err(Environment::code)
    })
    .unwrap_or(-1)
}

/// Close a handle. The handle must not be used afterwards, even if the call fails.
#[no_mangle]
pub unsafe extern "C" fn CloseHandle(hFile: HANDLE) -> BOOL {
    Environment::status(|| {
        Environment::handle(hFile)?;
        let FileHandle(handle) = *Box::from_raw(hFile);
        handle.close().map_err(Environment::code)
    })
}
