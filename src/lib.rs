#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Controller`**: owns all state and runs one scheduler iteration per `service()` call
//! - **`Alarm`**: the alarm lifecycle state machine (idle → playing/paused/snoozed) with persistence
//! - **`Navigator`**: the menu state machine; screens and their item lists are data
//! - **`MelodyPlayer`**: advances a looping note table on a fixed tick
//! - **`EdgeCell`**: the lock-free pending-edge cell shared with the button interrupt
//! - **`ButtonDebouncer` / `EncoderDebouncer`**: raw edges and positions → clean input events
//! - **`RemoteCommand`**: the serial protocol, parsed once into a closed enum
//! - **Hardware traits**: `Rtc`, `TextDisplay`, `Buzzer`, `RotaryEncoder`,
//!   `SettingsStore`, `SerialPort`, `NetTime`, `TickSource` — implement these
//!   for your platform's drivers
//!
//! All timing is `u32` milliseconds from a monotonic counter and is
//! wraparound-safe. All strings are bounded `heapless` buffers; the crate
//! never allocates.

// Logged-and-continue diagnostics; visible on RTT when the `defmt` feature
// is enabled, free otherwise.
#[cfg(feature = "defmt")]
macro_rules! warn_log {
    ($($arg:tt)*) => { defmt::warn!($($arg)*) };
}

#[cfg(not(feature = "defmt"))]
macro_rules! warn_log {
    ($s:literal $(, $arg:expr)* $(,)?) => {{ $(let _ = &$arg;)* }};
}

pub mod alarm;
pub mod clock;
pub mod command;
pub mod controller;
pub mod input;
pub mod melody;
pub mod menu;
pub mod render;
pub mod time;

pub use alarm::{Alarm, AlarmConfig, AlarmEvent, AlarmStatus, SettingsStore, StoreError};
pub use clock::{ClockError, Rtc, TimeOfDay, Timestamp};
pub use command::{
    CommandError, CommandLine, RemoteCommand, ResponseLine, SerialPort, error_line, parse_line,
    status_line,
};
pub use controller::{Config, Controller, Hardware, NetTime, NetTimeError};
pub use input::{ButtonDebouncer, EdgeCell, EncoderDebouncer, InputEvent, RotaryEncoder};
pub use melody::{Buzzer, DEFAULT_MELODY, DEFAULT_TICK_MS, MAX_FREQUENCY_HZ, MelodyPlayer};
pub use menu::{MenuAction, Navigator, Screen};
pub use render::{DISPLAY_COLS, DISPLAY_ROWS, TextDisplay};
pub use time::TickSource;
