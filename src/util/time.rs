//! Conversion between Windows file times and host timestamps.
//!
//! A Windows file time counts 100-nanosecond ticks since 1601-01-01T00:00:00Z, split into two
//! 32-bit halves. Host timestamps count seconds and a sub-second fraction since the Unix epoch.

use std::convert::TryFrom;
use std::time::{SystemTime, UNIX_EPOCH};

/// Ticks per second.
pub const TICKS_PER_SECOND: u64 = 10_000_000;
/// Seconds between 1601-01-01 and 1970-01-01.
pub const EPOCH_DIFFERENCE_SECONDS: u64 = 11_644_473_600;
/// Ticks between 1601-01-01 and 1970-01-01.
pub const EPOCH_DIFFERENCE_TICKS: u64 = EPOCH_DIFFERENCE_SECONDS * TICKS_PER_SECOND;

const NANOSECONDS_PER_TICK: u32 = 100;
const NANOSECONDS_PER_SECOND: u32 = 1_000_000_000;
const NANOSECONDS_PER_MICROSECOND: u32 = 1_000;

/// A Windows file time.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FileTime {
    /// The lower 32 bits of the tick count.
    pub low_date_time: u32,
    /// The upper 32 bits of the tick count.
    pub high_date_time: u32,
}

/// The sub-second resolution of the host's timestamps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precision {
    /// Nanoseconds, as with `futimens`.
    Nanoseconds,
    /// Microseconds, as with `utimes` and `futimes`.
    Microseconds,
    /// Whole seconds only.
    Seconds,
}

/// A host timestamp relative to the Unix epoch. The fraction is always non-negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostTime {
    seconds: i64,
    nanoseconds: u32,
}

/// The three timestamps of a file as Windows file times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileTimes {
    /// The birth time, if the host records one.
    pub creation: Option<FileTime>,
    /// The last access time.
    pub last_access: FileTime,
    /// The last modification time.
    pub last_write: FileTime,
}

impl FileTime {
    /// Split a tick count into its halves.
    pub const fn from_ticks(ticks: u64) -> Self {
        FileTime {
            low_date_time: ticks as u32,
            high_date_time: (ticks >> 32) as u32,
        }
    }

    /// Combine both halves into the tick count.
    pub const fn ticks(&self) -> u64 {
        ((self.high_date_time as u64) << 32) | self.low_date_time as u64
    }

    /// Convert to a host timestamp with the given sub-second resolution.
    pub fn to_host(&self, precision: Precision) -> HostTime {
        let ticks_per_second = i128::from(TICKS_PER_SECOND);
        let relative = i128::from(self.ticks()) - i128::from(EPOCH_DIFFERENCE_TICKS);
        // Both values are in range: |relative| < 2^64 and the remainder is below one second.
        let seconds = relative.div_euclid(ticks_per_second) as i64;
        let fraction = relative.rem_euclid(ticks_per_second) as u32;
        HostTime {
            seconds,
            nanoseconds: fraction * NANOSECONDS_PER_TICK,
        }
        .with_precision(precision)
    }

    /// Convert from a host timestamp. Instants outside the representable range saturate.
    pub fn from_host(time: HostTime) -> Self {
        let ticks = i128::from(time.seconds) * i128::from(TICKS_PER_SECOND)
            + i128::from(time.nanoseconds / NANOSECONDS_PER_TICK)
            + i128::from(EPOCH_DIFFERENCE_TICKS);
        let ticks = u64::try_from(ticks.max(0)).unwrap_or(u64::MAX);
        FileTime::from_ticks(ticks)
    }
}

impl HostTime {
    /// Create a timestamp; an overflowing fraction carries into the seconds.
    pub fn new(seconds: i64, nanoseconds: u32) -> Self {
        HostTime {
            seconds: seconds.saturating_add(i64::from(nanoseconds / NANOSECONDS_PER_SECOND)),
            nanoseconds: nanoseconds % NANOSECONDS_PER_SECOND,
        }
    }

    /// Whole seconds since the Unix epoch (floored).
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// The sub-second fraction in nanoseconds.
    pub fn nanoseconds(&self) -> u32 {
        self.nanoseconds
    }

    /// The sub-second fraction in microseconds.
    pub fn microseconds(&self) -> u32 {
        self.nanoseconds / NANOSECONDS_PER_MICROSECOND
    }

    /// Drop the part of the fraction finer than `precision`.
    pub fn with_precision(self, precision: Precision) -> Self {
        let nanoseconds = match precision {
            Precision::Nanoseconds => self.nanoseconds,
            Precision::Microseconds => self.microseconds() * NANOSECONDS_PER_MICROSECOND,
            Precision::Seconds => 0,
        };
        HostTime {
            seconds: self.seconds,
            nanoseconds,
        }
    }
}

impl From<SystemTime> for HostTime {
    fn from(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(elapsed) => HostTime::new(
                i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX),
                elapsed.subsec_nanos(),
            ),
            Err(error) => {
                let before = error.duration();
                let seconds = i64::try_from(before.as_secs()).unwrap_or(i64::MAX);
                match before.subsec_nanos() {
                    0 => HostTime::new(-seconds, 0),
                    nanoseconds => HostTime::new(-seconds - 1, NANOSECONDS_PER_SECOND - nanoseconds),
                }
            }
        }
    }
}

impl From<SystemTime> for FileTime {
    fn from(time: SystemTime) -> Self {
        FileTime::from_host(time.into())
    }
}
