use std::ffi::CString;
use std::os::unix::io::IntoRawFd;
use std::path::Path;
use std::ptr::{null, null_mut};

use test_case::test_case;
use winfile_ffi::{
    CloseHandle, CreateFileA, GetFileDescriptor, GetFileHandleForFileDescriptor, GetFileSize,
    GetFileTime, GetLastError, GetStdHandle, IsFileDevice, LockFileEx, ReadFile, SetEndOfFile,
    SetFilePointer, SetFileTime, SetLastError, SetStdHandle, SetStdHandleEx, UnlockFile,
    UnlockFileEx, WriteFile, BOOL, DWORD, FALSE, FILETIME, HANDLE, INVALID_FILE_SIZE,
    INVALID_HANDLE_VALUE, INVALID_SET_FILE_POINTER, LONG, OVERLAPPED, TRUE,
};

const GENERIC_READ: DWORD = 0x8000_0000;
const GENERIC_WRITE: DWORD = 0x4000_0000;
const FILE_SHARE_WRITE: DWORD = 0x2;
const CREATE_NEW: DWORD = 1;
const CREATE_ALWAYS: DWORD = 2;
const OPEN_EXISTING: DWORD = 3;
const OPEN_ALWAYS: DWORD = 4;
const TRUNCATE_EXISTING: DWORD = 5;
const FILE_ATTRIBUTE_NORMAL: DWORD = 0x80;
const FILE_BEGIN: DWORD = 0;
const FILE_CURRENT: DWORD = 1;
const FILE_END: DWORD = 2;
const LOCKFILE_FAIL_IMMEDIATELY: DWORD = 1;
const LOCKFILE_EXCLUSIVE_LOCK: DWORD = 2;
const STD_OUTPUT_HANDLE: DWORD = -11i32 as DWORD;

const ERROR_FILE_NOT_FOUND: DWORD = 2;
const ERROR_INVALID_HANDLE: DWORD = 6;
const ERROR_SHARING_VIOLATION: DWORD = 32;
const ERROR_LOCK_VIOLATION: DWORD = 33;
const ERROR_HANDLE_EOF: DWORD = 38;
const ERROR_NOT_SUPPORTED: DWORD = 50;
const ERROR_INVALID_PARAMETER: DWORD = 87;
const ERROR_NOT_LOCKED: DWORD = 158;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn create(path: &Path, access: DWORD, share: DWORD, disposition: DWORD) -> HANDLE {
    let name = CString::new(path.to_str().expect("Invalid TMP path")).expect("NULL in path");
    unsafe {
        CreateFileA(
            name.as_ptr(),
            access,
            share,
            null_mut(),
            disposition,
            FILE_ATTRIBUTE_NORMAL,
            null_mut(),
        )
    }
}

fn write(handle: HANDLE, data: &[u8]) -> (BOOL, DWORD) {
    let mut written: DWORD = 0;
    let status = unsafe {
        WriteFile(
            handle,
            data.as_ptr().cast(),
            data.len() as DWORD,
            &mut written,
            null_mut(),
        )
    };
    (status, written)
}

#[test_case(CREATE_NEW, true; "create new")]
#[test_case(CREATE_ALWAYS, true; "create always")]
#[test_case(OPEN_EXISTING, false; "open existing")]
#[test_case(OPEN_ALWAYS, true; "open always")]
#[test_case(TRUNCATE_EXISTING, false; "truncate existing")]
fn test_dispositions(disposition: DWORD, creates: bool) {
    init_logger();
    let tmp_dir = tempfile::TempDir::new().expect("Unable to create temporary directory");
    let path = tmp_dir.path().join("missing.bin");

    let handle = create(&path, GENERIC_READ | GENERIC_WRITE, 0, disposition);
    if creates {
        assert_ne!(handle, INVALID_HANDLE_VALUE);
        assert_eq!(unsafe { CloseHandle(handle) }, TRUE);
    } else {
        assert_eq!(handle, INVALID_HANDLE_VALUE);
        assert_eq!(GetLastError(), ERROR_FILE_NOT_FOUND);
    }
    assert_eq!(path.exists(), creates);
}

#[test]
fn test_write_size_reopen() {
    init_logger();
    let tmp_dir = tempfile::TempDir::new().expect("Unable to create temporary directory");
    let path = tmp_dir.path().join("out.bin");

    let handle = create(&path, GENERIC_WRITE, 0, CREATE_ALWAYS);
    assert_ne!(handle, INVALID_HANDLE_VALUE);
    assert_eq!(write(handle, b"0123456789"), (TRUE, 10));

    let mut high: DWORD = 42;
    assert_eq!(unsafe { GetFileSize(handle, &mut high) }, 10);
    assert_eq!(high, 0);
    assert_eq!(unsafe { CloseHandle(handle) }, TRUE);

    let handle = create(&path, GENERIC_READ, 0, OPEN_EXISTING);
    assert_ne!(handle, INVALID_HANDLE_VALUE);
    let mut buffer = [0u8; 10];
    let mut read: DWORD = 0;
    let status = unsafe {
        ReadFile(
            handle,
            buffer.as_mut_ptr().cast(),
            10,
            &mut read,
            null_mut(),
        )
    };
    assert_eq!(status, TRUE);
    assert_eq!(read, 10);
    assert_eq!(&buffer, b"0123456789");
    assert_eq!(unsafe { CloseHandle(handle) }, TRUE);
}

#[test]
fn test_short_read_reports_requested_count() {
    init_logger();
    let tmp_dir = tempfile::TempDir::new().expect("Unable to create temporary directory");
    let path = tmp_dir.path().join("short.bin");
    std::fs::write(&path, b"abc").expect("Writing file failed");

    let handle = create(&path, GENERIC_READ, 0, OPEN_EXISTING);
    let mut buffer = [0u8; 8];
    let mut read: DWORD = 0;
    let status = unsafe { ReadFile(handle, buffer.as_mut_ptr().cast(), 8, &mut read, null_mut()) };
    assert_eq!(status, FALSE);
    assert_eq!(read, 8);
    assert_eq!(GetLastError(), ERROR_HANDLE_EOF);
    assert_eq!(unsafe { CloseHandle(handle) }, TRUE);
}

#[test]
fn test_seek_and_truncate() {
    init_logger();
    let tmp_dir = tempfile::TempDir::new().expect("Unable to create temporary directory");
    let path = tmp_dir.path().join("seek.bin");

    let handle = create(&path, GENERIC_READ | GENERIC_WRITE, 0, CREATE_NEW);
    assert_eq!(write(handle, b"Hello, world"), (TRUE, 12));

    unsafe {
        assert_eq!(SetFilePointer(handle, 0, null_mut(), FILE_BEGIN), 0);
        assert_eq!(GetFileSize(handle, null_mut()), 12);
        assert_eq!(SetFilePointer(handle, 0, null_mut(), FILE_CURRENT), 0);

        assert_eq!(SetFilePointer(handle, -7, null_mut(), FILE_END), 5);
        assert_eq!(SetEndOfFile(handle), TRUE);
        assert_eq!(GetFileSize(handle, null_mut()), 5);

        let mut high: LONG = 0;
        assert_eq!(SetFilePointer(handle, 3, &mut high, FILE_BEGIN), 3);
        assert_eq!(high, 0);

        assert_eq!(
            SetFilePointer(handle, 0, null_mut(), 7),
            INVALID_SET_FILE_POINTER
        );
        assert_eq!(GetLastError(), ERROR_INVALID_PARAMETER);

        assert_eq!(CloseHandle(handle), TRUE);
    }
}

#[test]
fn test_seek_beyond_four_gigabytes() {
    init_logger();
    let tmp_dir = tempfile::TempDir::new().expect("Unable to create temporary directory");
    let path = tmp_dir.path().join("sparse.bin");

    let handle = create(&path, GENERIC_READ | GENERIC_WRITE, 0, CREATE_NEW);
    unsafe {
        // 0x1_4000_0000 bytes, split into a high and a low half.
        let mut high: LONG = 1;
        assert_eq!(SetFilePointer(handle, 0x4000_0000, &mut high, FILE_BEGIN), 0x4000_0000);
        assert_eq!(high, 1);
        assert_eq!(SetEndOfFile(handle), TRUE);

        let mut size_high: DWORD = 0;
        assert_eq!(GetFileSize(handle, &mut size_high), 0x4000_0000);
        assert_eq!(size_high, 1);

        let mut high: LONG = -1;
        assert_eq!(SetFilePointer(handle, -1, &mut high, FILE_END), 0x3FFF_FFFF);
        assert_eq!(high, 1);

        let mut high: LONG = 0;
        assert_eq!(SetFilePointer(handle, 0, &mut high, FILE_CURRENT), 0x3FFF_FFFF);
        assert_eq!(high, 1);

        assert_eq!(CloseHandle(handle), TRUE);
    }
    assert_eq!(
        std::fs::metadata(&path).expect("Reading metadata failed").len(),
        0x1_4000_0000
    );
}

#[test]
fn test_locking() {
    init_logger();
    let tmp_dir = tempfile::TempDir::new().expect("Unable to create temporary directory");
    let path = tmp_dir.path().join("lock.bin");

    let first = create(&path, GENERIC_READ | GENERIC_WRITE, 0, CREATE_NEW);
    let second = create(&path, GENERIC_READ | GENERIC_WRITE, 0, OPEN_EXISTING);
    let exclusive = LOCKFILE_EXCLUSIVE_LOCK | LOCKFILE_FAIL_IMMEDIATELY;

    unsafe {
        assert_eq!(LockFileEx(first, exclusive, 0, 0, 0, null_mut()), TRUE);
        assert_eq!(LockFileEx(first, exclusive, 0, 0, 0, null_mut()), FALSE);
        assert_eq!(GetLastError(), ERROR_LOCK_VIOLATION);

        assert_eq!(LockFileEx(second, exclusive, 0, 0, 0, null_mut()), FALSE);
        assert_eq!(GetLastError(), ERROR_LOCK_VIOLATION);

        assert_eq!(UnlockFile(first, 0, 0, 0, 0), TRUE);
        assert_eq!(UnlockFile(first, 0, 0, 0, 0), FALSE);
        assert_eq!(GetLastError(), ERROR_NOT_LOCKED);

        assert_eq!(LockFileEx(second, exclusive, 0, 0, 0, null_mut()), TRUE);
        assert_eq!(UnlockFileEx(second, 0, 0, 0, null_mut()), TRUE);

        assert_eq!(CloseHandle(first), TRUE);
        assert_eq!(CloseHandle(second), TRUE);
    }
}

#[test]
fn test_sharing_violation() {
    init_logger();
    let tmp_dir = tempfile::TempDir::new().expect("Unable to create temporary directory");
    let path = tmp_dir.path().join("shared.bin");

    let first = create(&path, GENERIC_READ | GENERIC_WRITE, FILE_SHARE_WRITE, CREATE_NEW);
    assert_ne!(first, INVALID_HANDLE_VALUE);
    let second = create(&path, GENERIC_READ | GENERIC_WRITE, FILE_SHARE_WRITE, OPEN_EXISTING);
    assert_eq!(second, INVALID_HANDLE_VALUE);
    assert_eq!(GetLastError(), ERROR_SHARING_VIOLATION);
    assert_eq!(unsafe { CloseHandle(first) }, TRUE);
}

#[test]
fn test_overlapped_rejected() {
    init_logger();
    let tmp_dir = tempfile::TempDir::new().expect("Unable to create temporary directory");
    let path = tmp_dir.path().join("overlapped.bin");
    let handle = create(&path, GENERIC_READ | GENERIC_WRITE, 0, CREATE_NEW);
    let mut overlapped = OVERLAPPED {
        Internal: 0,
        InternalHigh: 0,
        Offset: 0,
        OffsetHigh: 0,
        hEvent: null_mut(),
    };

    unsafe {
        let mut written: DWORD = 0;
        let data = b"abc";
        let status = WriteFile(handle, data.as_ptr().cast(), 3, &mut written, &mut overlapped);
        assert_eq!(status, FALSE);
        assert_eq!(written, 0);
        assert_eq!(GetLastError(), ERROR_NOT_SUPPORTED);

        let mut buffer = [0u8; 3];
        let mut read: DWORD = 0;
        let status = ReadFile(handle, buffer.as_mut_ptr().cast(), 3, &mut read, &mut overlapped);
        assert_eq!(status, FALSE);
        assert_eq!(read, 0);
        assert_eq!(GetLastError(), ERROR_NOT_SUPPORTED);

        let exclusive = LOCKFILE_EXCLUSIVE_LOCK;
        assert_eq!(LockFileEx(handle, exclusive, 0, 0, 0, &mut overlapped), FALSE);
        assert_eq!(GetLastError(), ERROR_NOT_SUPPORTED);

        assert_eq!(GetFileSize(handle, null_mut()), 0);
        assert_eq!(CloseHandle(handle), TRUE);
    }
}

#[test]
fn test_file_time() {
    init_logger();
    let tmp_dir = tempfile::TempDir::new().expect("Unable to create temporary directory");
    let path = tmp_dir.path().join("time.bin");
    let handle = create(&path, GENERIC_READ | GENERIC_WRITE, 0, CREATE_NEW);

    // 2001-09-09T01:46:40Z
    let ticks: u64 = 116_444_736_000_000_000 + 1_000_000_000 * 10_000_000;
    let last_write = FILETIME {
        dwLowDateTime: ticks as DWORD,
        dwHighDateTime: (ticks >> 32) as DWORD,
    };

    unsafe {
        assert_eq!(SetFileTime(handle, null(), null(), &last_write), TRUE);

        let mut written = FILETIME::default();
        assert_eq!(GetFileTime(handle, null_mut(), null_mut(), &mut written), TRUE);
        assert_eq!(written, last_write);

        assert_eq!(CloseHandle(handle), TRUE);
    }

    let modified = std::fs::metadata(&path)
        .expect("Reading metadata failed")
        .modified()
        .expect("Modification time missing");
    assert_eq!(
        modified
            .duration_since(std::time::UNIX_EPOCH)
            .expect("Time before epoch")
            .as_secs(),
        1_000_000_000
    );
}

#[test]
fn test_adopted_descriptor() {
    init_logger();
    let tmp_dir = tempfile::TempDir::new().expect("Unable to create temporary directory");
    let path = tmp_dir.path().join("adopted.bin");
    let fd = std::fs::File::create(&path)
        .expect("Creating file failed")
        .into_raw_fd();

    unsafe {
        let handle = GetFileHandleForFileDescriptor(fd);
        assert_ne!(handle, INVALID_HANDLE_VALUE);
        assert_eq!(GetFileDescriptor(handle), fd);

        assert_eq!(write(handle, b"abc"), (TRUE, 3));
        assert_eq!(GetFileSize(handle, null_mut()), INVALID_FILE_SIZE);
        assert_eq!(GetLastError(), ERROR_NOT_SUPPORTED);
        assert_eq!(
            SetFilePointer(handle, 0, null_mut(), FILE_BEGIN),
            INVALID_SET_FILE_POINTER
        );
        assert_eq!(GetLastError(), ERROR_NOT_SUPPORTED);
        assert_eq!(SetEndOfFile(handle), FALSE);
        assert_eq!(LockFileEx(handle, LOCKFILE_EXCLUSIVE_LOCK, 0, 0, 0, null_mut()), FALSE);
        assert_eq!(UnlockFile(handle, 0, 0, 0, 0), FALSE);
        assert_eq!(SetFileTime(handle, null(), null(), null()), FALSE);
        assert_eq!(GetLastError(), ERROR_NOT_SUPPORTED);

        assert_eq!(CloseHandle(handle), TRUE);
    }
    assert_eq!(std::fs::read(&path).expect("Reading file failed"), b"abc");

    assert_eq!(
        unsafe { GetFileHandleForFileDescriptor(987_654) },
        INVALID_HANDLE_VALUE
    );
    assert_eq!(GetLastError(), ERROR_INVALID_HANDLE);
}

#[test]
fn test_standard_output_survives_close() {
    init_logger();
    let handle = GetStdHandle(STD_OUTPUT_HANDLE);
    assert_ne!(handle, INVALID_HANDLE_VALUE);
    unsafe {
        assert_eq!(GetFileDescriptor(handle), 1);
        assert_eq!(CloseHandle(handle), TRUE);
        assert_eq!(libc::write(1, b"".as_ptr().cast(), 0), 0);
        assert_ne!(libc::fcntl(1, libc::F_GETFD), -1);
    }

    assert_eq!(GetStdHandle(0), INVALID_HANDLE_VALUE);
    assert_eq!(GetLastError(), ERROR_INVALID_PARAMETER);
}

#[test]
fn test_invalid_handles() {
    init_logger();
    unsafe {
        SetLastError(0);
        assert_eq!(CloseHandle(INVALID_HANDLE_VALUE), FALSE);
        assert_eq!(GetLastError(), ERROR_INVALID_HANDLE);
        assert_eq!(GetFileSize(null_mut(), null_mut()), INVALID_FILE_SIZE);
        assert_eq!(GetFileDescriptor(null_mut()), -1);
        assert_eq!(SetEndOfFile(INVALID_HANDLE_VALUE), FALSE);
        assert_eq!(GetLastError(), ERROR_INVALID_HANDLE);
    }
}

#[test]
fn test_standard_handles_fixed() {
    assert_eq!(SetStdHandle(STD_OUTPUT_HANDLE, null_mut()), FALSE);
    assert_eq!(GetLastError(), ERROR_NOT_SUPPORTED);
    SetLastError(0);
    assert_eq!(
        SetStdHandleEx(STD_OUTPUT_HANDLE, null_mut(), null_mut()),
        FALSE
    );
    assert_eq!(GetLastError(), ERROR_NOT_SUPPORTED);
    assert_eq!(IsFileDevice(null()), TRUE);
}
