//! Serial command channel: line parsing and the status response.
//!
//! One ASCII command per newline-terminated line. Parsing happens once at
//! the boundary into the closed [`RemoteCommand`] enum, which the
//! controller matches exhaustively — adding a command is a compile-checked
//! change, not a string comparison sprinkled through the loop.

use core::fmt::Write as _;

use crate::alarm::{AlarmConfig, AlarmStatus};
use crate::clock::{TimeOfDay, Timestamp};

/// Longest accepted command line (`NTP_SET:YYYY:MM:DD:HH:MM:SS` plus slack).
pub const MAX_LINE_LEN: usize = 48;

/// An owned command line as handed over by the serial driver.
pub type CommandLine = heapless::String<MAX_LINE_LEN>;

/// A status response or error line.
pub type ResponseLine = heapless::String<32>;

/// Trait for abstracting the serial link to the companion application.
///
/// `poll_line` must not block: it returns a complete line when one has
/// arrived and `None` otherwise. `write_line` appends the line terminator
/// itself and absorbs transport errors.
pub trait SerialPort {
    fn poll_line(&mut self) -> Option<CommandLine>;
    fn write_line(&mut self, line: &str);
}

/// A parsed remote command. Ephemeral; consumed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RemoteCommand {
    /// `ALARM_SET:HH:MM` — set and enable the alarm.
    SetAlarm(TimeOfDay),

    /// `ALARM_CLEAR` — disable and forget the alarm, stop if ringing.
    ClearAlarm,

    /// `ALARM_PAUSE`
    Pause,

    /// `ALARM_RESUME`
    Resume,

    /// `ALARM_SNOOZE`
    Snooze,

    /// `ALARM_STATUS` — query; answered with a status line.
    QueryStatus,

    /// `NTP_SET:YYYY:MM:DD:HH:MM:SS` — write the RTC directly.
    SetClock(Timestamp),
}

/// Why a command line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// The verb is not part of the protocol.
    UnknownCommand,

    /// Wrong field count or a non-numeric field.
    MalformedBody,

    /// Numeric fields present but out of calendar range.
    InvalidTime,
}

impl core::fmt::Display for CommandError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CommandError::UnknownCommand => write!(f, "unknown command"),
            CommandError::MalformedBody => write!(f, "malformed command body"),
            CommandError::InvalidTime => write!(f, "time field out of range"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}

/// Parses one trimmed command line.
pub fn parse_line(line: &str) -> Result<RemoteCommand, CommandError> {
    let line = line.trim();
    if let Some(body) = line.strip_prefix("ALARM_SET:") {
        return parse_alarm_set(body);
    }
    if let Some(body) = line.strip_prefix("NTP_SET:") {
        return parse_ntp_set(body);
    }
    match line {
        "ALARM_CLEAR" => Ok(RemoteCommand::ClearAlarm),
        "ALARM_PAUSE" => Ok(RemoteCommand::Pause),
        "ALARM_RESUME" => Ok(RemoteCommand::Resume),
        "ALARM_SNOOZE" => Ok(RemoteCommand::Snooze),
        "ALARM_STATUS" => Ok(RemoteCommand::QueryStatus),
        _ => Err(CommandError::UnknownCommand),
    }
}

fn parse_alarm_set(body: &str) -> Result<RemoteCommand, CommandError> {
    let mut fields = body.split(':');
    let hour = parse_field(fields.next())?;
    let minute = parse_field(fields.next())?;
    if fields.next().is_some() {
        return Err(CommandError::MalformedBody);
    }
    let time = TimeOfDay::new(
        u8::try_from(hour).map_err(|_| CommandError::InvalidTime)?,
        u8::try_from(minute).map_err(|_| CommandError::InvalidTime)?,
    )
    .map_err(|_| CommandError::InvalidTime)?;
    Ok(RemoteCommand::SetAlarm(time))
}

fn parse_ntp_set(body: &str) -> Result<RemoteCommand, CommandError> {
    let mut fields = body.split(':');
    let year = parse_field(fields.next())?;
    let month = parse_field(fields.next())?;
    let day = parse_field(fields.next())?;
    let hour = parse_field(fields.next())?;
    let minute = parse_field(fields.next())?;
    let second = parse_field(fields.next())?;
    if fields.next().is_some() {
        return Err(CommandError::MalformedBody);
    }

    let narrow = |v: u32| u8::try_from(v).map_err(|_| CommandError::InvalidTime);
    let timestamp = Timestamp::new(
        u16::try_from(year).map_err(|_| CommandError::InvalidTime)?,
        narrow(month)?,
        narrow(day)?,
        narrow(hour)?,
        narrow(minute)?,
        narrow(second)?,
    )
    .map_err(|_| CommandError::InvalidTime)?;
    Ok(RemoteCommand::SetClock(timestamp))
}

fn parse_field(field: Option<&str>) -> Result<u32, CommandError> {
    field
        .ok_or(CommandError::MalformedBody)?
        .parse()
        .map_err(|_| CommandError::MalformedBody)
}

/// Formats the `ALARM_STATUS:` response covering all five runtime cases.
pub fn status_line(config: AlarmConfig, status: AlarmStatus) -> ResponseLine {
    let mut line = ResponseLine::new();
    let _ = line.push_str("ALARM_STATUS:");
    match (config.armed(), status) {
        (true, AlarmStatus::Playing) => {
            let _ = line.push_str("PLAYING");
        }
        (true, AlarmStatus::Paused) => {
            let _ = line.push_str("PAUSED");
        }
        (true, AlarmStatus::Snoozed(target)) => {
            let _ = write!(line, "SNOOZED:{:02}:{:02}", target.hour, target.minute);
        }
        (true, AlarmStatus::Idle) => {
            // armed() guarantees the time is present
            let time = config.time.unwrap_or(TimeOfDay { hour: 0, minute: 0 });
            let _ = write!(line, "SET:{:02}:{:02}", time.hour, time.minute);
        }
        (false, _) => {
            let _ = line.push_str("STOPPED");
        }
    }
    line
}

/// Formats an `ERR:` line for a rejected command body.
pub fn error_line(error: CommandError) -> ResponseLine {
    let mut line = ResponseLine::new();
    let _ = match error {
        CommandError::UnknownCommand => line.push_str("ERR:unknown command"),
        CommandError::MalformedBody => line.push_str("ERR:malformed command"),
        CommandError::InvalidTime => line.push_str("ERR:invalid time"),
    };
    line
}
