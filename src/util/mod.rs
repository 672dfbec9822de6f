mod flags;
mod mode;
mod params;
pub mod time;

pub use self::flags::{DesiredAccess, FileAttributes, LockFlags, ShareMode};
pub use self::mode::{resolve, CreationDisposition, OpenMode, Resolution};
pub use self::params::{CreateOptions, Overlapped, SeekOrigin, StandardStream};
