//! Alarm lifecycle: configuration, runtime state machine and persistence.
//!
//! [`Alarm`] owns the persisted configuration (time of day + enabled flag)
//! and the transient runtime status. Firing decisions are made by
//! [`Alarm::check`], which is throttled to one RTC read per second no matter
//! how fast the scheduler loop spins. Every configuration mutation is
//! written through to the settings store immediately; a store failure is
//! logged and the in-memory change kept (durability is best-effort, not
//! transactional).

use crate::clock::{ClockError, Rtc, TimeOfDay};
use crate::time::elapsed_ms;

/// Settings-store keys for the persisted alarm configuration.
///
/// All three are always written together; a cleared alarm is stored as
/// `0, 0, 0`.
pub const KEY_ALARM_HOUR: &str = "alarm_hour";
pub const KEY_ALARM_MINUTE: &str = "alarm_minute";
pub const KEY_ALARM_ENABLED: &str = "alarm_enabled";

/// Errors from the non-volatile settings store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// The key is absent or the backing store could not be read.
    ReadFailed,

    /// The value could not be written or committed.
    WriteFailed,
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StoreError::ReadFailed => write!(f, "settings read failed"),
            StoreError::WriteFailed => write!(f, "settings write failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StoreError {}

/// Trait for abstracting the non-volatile key/value settings store.
///
/// Implement this over NVS, EEPROM, a flash page or a file. Values are
/// small integers; `commit` makes previous `set` calls durable.
pub trait SettingsStore {
    fn get(&mut self, key: &str) -> Result<i32, StoreError>;
    fn set(&mut self, key: &str, value: i32) -> Result<(), StoreError>;
    fn commit(&mut self) -> Result<(), StoreError>;
}

/// The persisted alarm configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AlarmConfig {
    /// Configured firing time, if any.
    pub time: Option<TimeOfDay>,

    /// Whether the alarm is armed.
    pub enabled: bool,
}

impl AlarmConfig {
    /// Armed with a configured time: the state in which firing is possible.
    pub fn armed(&self) -> bool {
        self.enabled && self.time.is_some()
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            time: None,
            enabled: false,
        }
    }
}

/// The transient runtime status of the alarm. In-memory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmStatus {
    /// Not ringing; waiting for the configured time (if armed).
    Idle,

    /// Triggered and sounding the melody.
    Playing,

    /// Triggered but muted by the user; still counts as ringing.
    Paused,

    /// Silenced until the snooze target, which supersedes the configured
    /// time while pending.
    Snoozed(TimeOfDay),
}

/// State transition reported by [`Alarm::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AlarmEvent {
    /// Idle/Snoozed → Playing: the firing time was reached.
    Triggered,

    /// Playing → Idle: the maximum ring duration elapsed unacknowledged.
    Expired,
}

/// The alarm lifecycle state machine.
///
/// Owns the settings store; every mutation of [`AlarmConfig`] is persisted
/// as it happens. `pause`/`resume`/`stop`/`snooze` are deliberate no-ops
/// outside their applicable states (a remote command racing a button press
/// must not be an error), and report whether they changed anything.
pub struct Alarm<S: SettingsStore> {
    store: S,
    config: AlarmConfig,
    status: AlarmStatus,
    triggered_at_ms: u32,
    last_check_ms: u32,
    snooze_minutes: u32,
    max_ring_ms: u32,
}

impl<S: SettingsStore> Alarm<S> {
    /// Loads the persisted configuration and starts in `Idle`.
    ///
    /// A missing or out-of-range stored value yields the disarmed default;
    /// first boot is not an error.
    pub fn new(mut store: S, snooze_minutes: u32, max_ring_ms: u32) -> Self {
        let config = Self::load(&mut store).unwrap_or_default();
        Self {
            store,
            config,
            status: AlarmStatus::Idle,
            triggered_at_ms: 0,
            last_check_ms: 0,
            snooze_minutes,
            max_ring_ms,
        }
    }

    fn load(store: &mut S) -> Result<AlarmConfig, StoreError> {
        let hour = store.get(KEY_ALARM_HOUR)?;
        let minute = store.get(KEY_ALARM_MINUTE)?;
        let enabled = store.get(KEY_ALARM_ENABLED)?;

        if !(0..=23).contains(&hour) || !(0..=59).contains(&minute) {
            return Ok(AlarmConfig::default());
        }
        let Ok(time) = TimeOfDay::new(hour as u8, minute as u8) else {
            return Ok(AlarmConfig::default());
        };
        Ok(AlarmConfig {
            time: Some(time),
            enabled: enabled != 0,
        })
    }

    fn try_persist(&mut self) -> Result<(), StoreError> {
        let (hour, minute, enabled) = match self.config.time {
            Some(t) => (t.hour as i32, t.minute as i32, self.config.enabled as i32),
            None => (0, 0, 0),
        };
        self.store.set(KEY_ALARM_HOUR, hour)?;
        self.store.set(KEY_ALARM_MINUTE, minute)?;
        self.store.set(KEY_ALARM_ENABLED, enabled)?;
        self.store.commit()
    }

    /// Best-effort persistence: the in-memory change is kept either way.
    fn persist(&mut self) {
        if self.try_persist().is_err() {
            warn_log!("alarm settings save failed");
        }
    }

    /// Sets and arms the alarm. Rejects out-of-range times without touching
    /// any state.
    pub fn set(&mut self, hour: u8, minute: u8) -> Result<(), ClockError> {
        let time = TimeOfDay::new(hour, minute)?;
        self.config.time = Some(time);
        self.config.enabled = true;
        self.persist();
        Ok(())
    }

    /// Disarms and forgets the configured time; also silences a ringing or
    /// snoozed alarm. Returns `true` if it was ringing.
    pub fn clear(&mut self) -> bool {
        let was_ringing = self.is_ringing();
        self.config = AlarmConfig::default();
        self.status = AlarmStatus::Idle;
        self.persist();
        was_ringing
    }

    /// Playing → Paused. No-op otherwise.
    pub fn pause(&mut self) -> bool {
        if self.status != AlarmStatus::Playing {
            return false;
        }
        self.status = AlarmStatus::Paused;
        true
    }

    /// Paused → Playing. No-op otherwise.
    pub fn resume(&mut self) -> bool {
        if self.status != AlarmStatus::Paused {
            return false;
        }
        self.status = AlarmStatus::Playing;
        true
    }

    /// Stops a ringing alarm and disarms it (firing is one-shot: the alarm
    /// stays configured but must be re-enabled to fire again). No-op when
    /// not ringing.
    pub fn stop(&mut self) -> bool {
        if !self.is_ringing() {
            return false;
        }
        self.status = AlarmStatus::Idle;
        self.config.enabled = false;
        self.persist();
        true
    }

    /// Silences a ringing alarm until `now + snooze_minutes`, wrapping
    /// through the 24:00 boundary. Returns the target, or `None` when not
    /// ringing.
    pub fn snooze(&mut self, now: TimeOfDay) -> Option<TimeOfDay> {
        if !self.is_ringing() {
            return None;
        }
        let target = now.add_minutes(self.snooze_minutes);
        self.status = AlarmStatus::Snoozed(target);
        Some(target)
    }

    /// Runs the once-per-second firing/expiry check.
    ///
    /// Calls more frequent than one second apart return immediately, so the
    /// scheduler may call this every iteration without hammering the RTC.
    /// The equality comparison fires at most once per minute value: while
    /// ringing no re-check happens, and `stop` disarms. An RTC read failure
    /// skips the cycle (the throttle stamp still advances).
    pub fn check<R: Rtc>(&mut self, rtc: &mut R, now_ms: u32) -> Option<AlarmEvent> {
        if elapsed_ms(now_ms, self.last_check_ms) < 1000 {
            return None;
        }
        self.last_check_ms = now_ms;

        match self.status {
            AlarmStatus::Playing => {
                if elapsed_ms(now_ms, self.triggered_at_ms) > self.max_ring_ms {
                    self.stop();
                    Some(AlarmEvent::Expired)
                } else {
                    None
                }
            }
            AlarmStatus::Paused => None,
            AlarmStatus::Idle | AlarmStatus::Snoozed(_) => {
                if !self.config.armed() {
                    return None;
                }
                let now_tod = match rtc.read() {
                    Ok(ts) => ts.time_of_day(),
                    Err(_) => {
                        warn_log!("RTC read failed during alarm check");
                        return None;
                    }
                };
                let target = match self.status {
                    AlarmStatus::Snoozed(t) => t,
                    _ => self.config.time?,
                };
                if now_tod == target {
                    self.status = AlarmStatus::Playing;
                    self.triggered_at_ms = now_ms;
                    Some(AlarmEvent::Triggered)
                } else {
                    None
                }
            }
        }
    }

    /// Current runtime status.
    pub fn status(&self) -> AlarmStatus {
        self.status
    }

    /// Current configuration.
    pub fn config(&self) -> AlarmConfig {
        self.config
    }

    /// True while triggered, whether sounding or paused.
    pub fn is_ringing(&self) -> bool {
        matches!(self.status, AlarmStatus::Playing | AlarmStatus::Paused)
    }

    /// True exactly when the melody should advance.
    pub fn is_playing(&self) -> bool {
        self.status == AlarmStatus::Playing
    }
}
