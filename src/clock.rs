//! Calendar time model and the real-time-clock facade.
//!
//! [`Timestamp`] is the six-field calendar value exchanged with the RTC chip
//! and the network time collaborator. [`TimeOfDay`] is the `(hour, minute)`
//! pair the alarm compares against; it also carries the wrapping minute
//! arithmetic used to compute snooze targets.

use core::fmt::Write as _;

/// Errors from calendar validation and RTC access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// A calendar field is out of range.
    InvalidTime,

    /// The RTC chip could not be read.
    ReadFailed,

    /// The RTC chip could not be written.
    WriteFailed,
}

impl core::fmt::Display for ClockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ClockError::InvalidTime => write!(f, "calendar field out of range"),
            ClockError::ReadFailed => write!(f, "RTC read failed"),
            ClockError::WriteFailed => write!(f, "RTC write failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ClockError {}

/// Trait for abstracting the battery-backed real-time clock.
///
/// Implement this over your RTC driver (DS3231 or similar). Both operations
/// are fallible; the controller treats a failure as "skip this feature for
/// this cycle" and tries again next iteration.
pub trait Rtc {
    /// Reads the current calendar time.
    fn read(&mut self) -> Result<Timestamp, ClockError>;

    /// Writes a new calendar time to the chip.
    fn write(&mut self, timestamp: &Timestamp) -> Result<(), ClockError>;
}

/// An hour/minute pair, the granularity at which alarms fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

impl TimeOfDay {
    /// Creates a time of day, rejecting out-of-range fields.
    pub fn new(hour: u8, minute: u8) -> Result<Self, ClockError> {
        if hour > 23 || minute > 59 {
            return Err(ClockError::InvalidTime);
        }
        Ok(Self { hour, minute })
    }

    /// Adds minutes, wrapping through the hour and the 24:00 day boundary.
    pub fn add_minutes(self, minutes: u32) -> Self {
        let total = self.hour as u32 * 60 + self.minute as u32 + minutes;
        Self {
            hour: ((total / 60) % 24) as u8,
            minute: (total % 60) as u8,
        }
    }

    /// Formats as `HH:MM`.
    pub fn format(&self) -> heapless::String<5> {
        let mut s = heapless::String::new();
        let _ = write!(s, "{:02}:{:02}", self.hour, self.minute);
        s
    }
}

/// A full calendar timestamp as read from or written to the RTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Timestamp {
    /// Creates a timestamp, rejecting out-of-range fields.
    ///
    /// Day validation is calendar-agnostic (1–31); the RTC chip itself is
    /// the authority on month lengths.
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, ClockError> {
        if year < 2000
            || !(1..=12).contains(&month)
            || !(1..=31).contains(&day)
            || hour > 23
            || minute > 59
            || second > 59
        {
            return Err(ClockError::InvalidTime);
        }
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// The hour/minute pair used for alarm comparison.
    pub fn time_of_day(&self) -> TimeOfDay {
        TimeOfDay {
            hour: self.hour,
            minute: self.minute,
        }
    }

    /// Formats the time part as `HH:MM:SS`.
    pub fn format_time(&self) -> heapless::String<8> {
        let mut s = heapless::String::new();
        let _ = write!(s, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second);
        s
    }

    /// Formats the date part as `DD.MM.YYYY`.
    pub fn format_date(&self) -> heapless::String<10> {
        let mut s = heapless::String::new();
        let _ = write!(s, "{:02}.{:02}.{}", self.day, self.month, self.year);
        s
    }
}
