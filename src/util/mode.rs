use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;

use super::DesiredAccess;

/// Permissions of newly created files before the umask applies.
const CREATION_PERMISSIONS: u32 = 0o666;

/// The creation disposition of `CreateFile`. Unknown values are kept and resolve to no mode at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CreationDisposition(pub u32);

impl CreationDisposition {
    /// `CREATE_NEW`
    pub const CREATE_NEW: CreationDisposition = CreationDisposition(1);
    /// `CREATE_ALWAYS`
    pub const CREATE_ALWAYS: CreationDisposition = CreationDisposition(2);
    /// `OPEN_EXISTING`
    pub const OPEN_EXISTING: CreationDisposition = CreationDisposition(3);
    /// `OPEN_ALWAYS`
    pub const OPEN_ALWAYS: CreationDisposition = CreationDisposition(4);
    /// `TRUNCATE_EXISTING`
    pub const TRUNCATE_EXISTING: CreationDisposition = CreationDisposition(5);
}

impl From<u32> for CreationDisposition {
    fn from(raw_value: u32) -> Self {
        CreationDisposition(raw_value)
    }
}

/// The mode a stream is opened with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenMode {
    read: bool,
    write: bool,
    create: bool,
    truncate: bool,
}

impl OpenMode {
    /// No access at all. Opening with it always fails.
    pub const NONE: OpenMode = OpenMode {
        read: false,
        write: false,
        create: false,
        truncate: false,
    };
    /// Read and write an existing file (`rb+`).
    pub const READ_WRITE: OpenMode = OpenMode {
        read: true,
        write: true,
        create: false,
        truncate: false,
    };
    /// Read and write a file, creating or truncating it (`wb+`).
    pub const READ_WRITE_TRUNCATE: OpenMode = OpenMode {
        read: true,
        write: true,
        create: true,
        truncate: true,
    };
    /// Read and write an existing file after truncating it.
    pub const READ_WRITE_TRUNCATE_EXISTING: OpenMode = OpenMode {
        read: true,
        write: true,
        create: false,
        truncate: true,
    };

    /// The stream-mode token describing this mode.
    pub fn token(&self) -> &'static str {
        match (self.read || self.write, self.truncate) {
            (false, _) => "",
            (true, true) => "wb+",
            (true, false) => "rb+",
        }
    }

    pub(crate) fn options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options
            .read(self.read)
            .write(self.write)
            .create(self.create)
            .truncate(self.truncate)
            .mode(CREATION_PERMISSIONS);
        options
    }
}

impl Display for OpenMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "\"{}\"", self.token())
    }
}

/// The outcome of resolving access and disposition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// The mode the stream is finally opened with.
    pub mode: OpenMode,
    /// Whether the file has to be created (without touching existing content) before opening.
    pub pre_create: bool,
}

/// Map desired access and creation disposition to the open mode of the stream.
pub fn resolve(access: DesiredAccess, disposition: CreationDisposition) -> Resolution {
    let writable = access.contains(DesiredAccess::GENERIC_WRITE);
    let (mode, pre_create) = match disposition {
        CreationDisposition::CREATE_ALWAYS if writable => (OpenMode::READ_WRITE_TRUNCATE, true),
        CreationDisposition::CREATE_ALWAYS => (OpenMode::READ_WRITE, true),
        CreationDisposition::CREATE_NEW => (OpenMode::READ_WRITE_TRUNCATE, true),
        CreationDisposition::OPEN_ALWAYS => (OpenMode::READ_WRITE, true),
        CreationDisposition::OPEN_EXISTING => (OpenMode::READ_WRITE, false),
        CreationDisposition::TRUNCATE_EXISTING => (OpenMode::READ_WRITE_TRUNCATE_EXISTING, false),
        _ => (OpenMode::NONE, false),
    };
    Resolution { mode, pre_create }
}
